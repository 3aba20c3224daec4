//! # vigil-oracle
//!
//! Oracle feed reading and price decay for collateral pricing.
//!
//! Feeds report a rate and the time it was last updated. A reading older than
//! the feed's timeout is stale; stale data is not a fault but a signal that
//! the price is currently unknowable. The last good interval is then widened
//! over time until it carries no information at all.
//!
//! ## Modules
//!
//! - [`source`] — Traits for the external feeds and the monitored pool
//! - [`reader`] — Single-feed read with staleness check and error band
//! - [`composition`] — Direct and chained feed strategies
//! - [`decay`] — Widening of a saved price as it ages
//! - [`stub`] — In-memory feeds and pool for development and tests

pub mod composition;
pub mod decay;
pub mod reader;
pub mod source;
pub mod stub;

use vigil_fixed::FixedError;
use vigil_types::{FeedId, Timestamp};

/// Error types for oracle operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// Feed data is older than its timeout.
    #[error("feed {feed} is stale: updated at {updated_at}, now {now}, timeout {timeout}s")]
    StaleFeed {
        /// The stale feed.
        feed: FeedId,
        /// When the feed last updated.
        updated_at: Timestamp,
        /// Time of the read.
        now: Timestamp,
        /// Configured timeout in seconds.
        timeout: u64,
    },

    /// The feed could not be queried at all.
    #[error("feed {feed} unavailable: {reason}")]
    FeedUnavailable {
        /// The failing feed.
        feed: FeedId,
        /// Reason reported by the source.
        reason: String,
    },

    /// The feed answered with a zero rate.
    #[error("feed {feed} reported an invalid rate")]
    InvalidRate {
        /// The offending feed.
        feed: FeedId,
    },

    /// The monitored pool could not report a positive exchange rate.
    #[error("pool read failed: {0}")]
    PoolRead(String),

    /// Arithmetic failure while processing a reading.
    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] FixedError),
}

/// Convenience result type for oracle operations.
pub type Result<T> = std::result::Result<T, OracleError>;
