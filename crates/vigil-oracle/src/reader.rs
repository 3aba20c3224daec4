//! Single-feed reads.
//!
//! A read succeeds only if the feed answered with a positive rate no older
//! than `oracle_timeout`. The result is an interval
//! `[rate * (1 - oracle_error), rate * (1 + oracle_error)]` rounded outward.
//!
//! Reads are pure: recording when the last good read happened is up to the
//! caller.

use serde::{Deserialize, Serialize};
use vigil_fixed::Fix;
use vigil_types::{FeedId, PriceInterval, Seconds, Timestamp};

use crate::source::FeedSource;
use crate::{OracleError, Result};

/// How one feed is read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedParams {
    /// Feed identifier.
    pub feed: FeedId,
    /// Relative error budget of the feed.
    pub oracle_error: Fix,
    /// Maximum age of a usable answer, in seconds.
    pub oracle_timeout: Seconds,
}

/// A fresh feed answer with its error band applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeedQuote {
    /// Raw rate reported by the feed.
    pub rate: Fix,
    /// When the feed last updated.
    pub updated_at: Timestamp,
    /// `rate` widened by the feed's error budget.
    pub interval: PriceInterval,
}

/// Read `params.feed` from `source` at time `now`.
///
/// # Arguments
///
/// * `source` - Where feed answers come from
/// * `params` - Feed id, error budget and staleness timeout
/// * `now` - Current time in unix seconds
///
/// # Errors
///
/// - [`OracleError::FeedUnavailable`] if the source cannot answer
/// - [`OracleError::StaleFeed`] if the answer is older than `oracle_timeout`
/// - [`OracleError::InvalidRate`] if the rate is zero
/// - [`OracleError::Arithmetic`] if `oracle_error` is above 1
///
/// # Examples
///
/// ```
/// use vigil_fixed::Fix;
/// use vigil_oracle::reader::{read_feed, FeedParams};
/// use vigil_oracle::stub::StubFeeds;
/// use vigil_types::FeedId;
///
/// let feeds = StubFeeds::new();
/// feeds.dev_set_rate(&FeedId::new("USDC/USD"), Fix::ONE, 1_000);
///
/// let params = FeedParams {
///     feed: FeedId::new("USDC/USD"),
///     oracle_error: "0.0025".parse().unwrap(),
///     oracle_timeout: 3_600,
/// };
/// let quote = read_feed(&feeds, &params, 1_060).unwrap();
/// assert_eq!(quote.interval.low(), "0.9975".parse::<Fix>().unwrap());
/// assert_eq!(quote.interval.high(), "1.0025".parse::<Fix>().unwrap());
/// ```
pub fn read_feed<S: FeedSource + ?Sized>(
    source: &S,
    params: &FeedParams,
    now: Timestamp,
) -> Result<FeedQuote> {
    let reading = source.latest(&params.feed)?;

    if reading.age(now) > params.oracle_timeout {
        return Err(OracleError::StaleFeed {
            feed: params.feed.clone(),
            updated_at: reading.updated_at,
            now,
            timeout: params.oracle_timeout,
        });
    }
    if reading.rate.is_zero() {
        return Err(OracleError::InvalidRate {
            feed: params.feed.clone(),
        });
    }

    let interval = PriceInterval::around(reading.rate, params.oracle_error)?;

    tracing::debug!(
        feed = %params.feed,
        rate = %reading.rate,
        updated_at = reading.updated_at,
        low = %interval.low(),
        high = %interval.high(),
        "feed read"
    );

    Ok(FeedQuote {
        rate: reading.rate,
        updated_at: reading.updated_at,
        interval,
    })
}
