//! Boundaries to the external world.
//!
//! The engine never owns a feed or a pool. It only queries them through these
//! read-only traits, and any implementation may block or fail.

use vigil_fixed::Fix;
use vigil_types::{FeedId, FeedReading};

use crate::Result;

/// A set of oracle feeds keyed by identifier.
pub trait FeedSource: Send + Sync {
    /// Latest answer of `feed`.
    ///
    /// Implementations report an unreachable or unknown feed as
    /// [`OracleError::FeedUnavailable`](crate::OracleError::FeedUnavailable).
    fn latest(&self, feed: &FeedId) -> Result<FeedReading>;
}

/// The pool whose exchange rate backs the collateral token.
pub trait RateSource: Send + Sync {
    /// How many reference units one collateral token is worth.
    fn exchange_rate(&self) -> Result<Fix>;
}

impl<T: FeedSource + ?Sized> FeedSource for std::sync::Arc<T> {
    fn latest(&self, feed: &FeedId) -> Result<FeedReading> {
        (**self).latest(feed)
    }
}

impl<T: RateSource + ?Sized> RateSource for std::sync::Arc<T> {
    fn exchange_rate(&self) -> Result<Fix> {
        (**self).exchange_rate()
    }
}
