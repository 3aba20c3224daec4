//! Feed composition strategies.
//!
//! A collateral is priced in the unit of account (`{UoA}`) per reference unit
//! (`{ref}`), while its peg is checked on `{target/ref}`. When the target is
//! the unit of account (a USD stablecoin priced in USD) one feed answers both
//! questions. When it is not (an ETH-pegged token priced in USD) a second feed
//! converts `{target}` into `{UoA}`.

use serde::{Deserialize, Serialize};
use vigil_fixed::Fix;
use vigil_types::{PriceInterval, Timestamp};

use crate::reader::{read_feed, FeedParams};
use crate::source::FeedSource;
use crate::Result;

/// How feed answers combine into a `{UoA/ref}` interval and a peg price.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedComposition {
    /// One `{target/ref}` feed where `{target} == {UoA}`.
    Direct(FeedParams),
    /// `{target/ref}` followed by `{UoA/target}`.
    Chained {
        /// Peg feed.
        target_per_ref: FeedParams,
        /// Conversion of the target unit into the unit of account.
        uoa_per_target: FeedParams,
    },
}

/// Result of reading every feed of a composition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComposedFeed {
    /// Observed `{target/ref}`, compared against the peg.
    pub peg_price: Fix,
    /// `{UoA/ref}` with every feed's error band applied.
    pub interval: PriceInterval,
    /// Oldest update time among the feeds read.
    pub updated_at: Timestamp,
}

impl FeedComposition {
    /// The feed whose rate is checked against the peg.
    pub fn peg_feed(&self) -> &FeedParams {
        match self {
            FeedComposition::Direct(params) => params,
            FeedComposition::Chained { target_per_ref, .. } => target_per_ref,
        }
    }

    /// Every feed in read order.
    pub fn feeds(&self) -> Vec<&FeedParams> {
        match self {
            FeedComposition::Direct(params) => vec![params],
            FeedComposition::Chained {
                target_per_ref,
                uoa_per_target,
            } => vec![target_per_ref, uoa_per_target],
        }
    }

    /// Read all feeds and combine them.
    ///
    /// Any leg failing fails the whole read.
    pub fn read<S: FeedSource + ?Sized>(&self, source: &S, now: Timestamp) -> Result<ComposedFeed> {
        match self {
            FeedComposition::Direct(params) => {
                let quote = read_feed(source, params, now)?;
                Ok(ComposedFeed {
                    peg_price: quote.rate,
                    interval: quote.interval,
                    updated_at: quote.updated_at,
                })
            }
            FeedComposition::Chained {
                target_per_ref,
                uoa_per_target,
            } => {
                let peg = read_feed(source, target_per_ref, now)?;
                let conversion = read_feed(source, uoa_per_target, now)?;
                Ok(ComposedFeed {
                    peg_price: peg.rate,
                    interval: peg.interval.product(&conversion.interval),
                    updated_at: peg.updated_at.min(conversion.updated_at),
                })
            }
        }
    }
}
