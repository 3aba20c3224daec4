//! In-memory feeds and pool.
//!
//! Stand-ins for the external oracle network and the monitored pool. Rates
//! are set through `dev_*` setters, which log a warning because nothing in
//! production should ever call them.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use vigil_fixed::Fix;
use vigil_types::{FeedId, FeedReading, Timestamp};

use crate::source::{FeedSource, RateSource};
use crate::{OracleError, Result};

/// Default pool exchange rate: one reference unit per token.
pub const DEFAULT_EXCHANGE_RATE: Fix = Fix::ONE;

#[derive(Debug, Clone)]
enum FeedState {
    Answering(FeedReading),
    Failing(String),
}

/// A set of feeds whose answers are set by hand.
#[derive(Debug, Default)]
pub struct StubFeeds {
    feeds: RwLock<HashMap<FeedId, FeedState>>,
}

impl StubFeeds {
    /// Create an empty feed set. Reading an unset feed fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the answer of `feed` (development/testing only).
    pub fn dev_set_rate(&self, feed: &FeedId, rate: Fix, updated_at: Timestamp) {
        tracing::warn!(%feed, %rate, updated_at, "stub feed: rate changed (dev only)");
        self.feeds
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(feed.clone(), FeedState::Answering(FeedReading::new(rate, updated_at)));
    }

    /// Move the update time of `feed` without changing its rate.
    ///
    /// Has no effect on a feed that is unset or failing.
    pub fn dev_set_updated_at(&self, feed: &FeedId, updated_at: Timestamp) {
        let mut feeds = self.feeds.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(FeedState::Answering(reading)) = feeds.get_mut(feed) {
            reading.updated_at = updated_at;
        }
    }

    /// Make every read of `feed` fail with `reason`.
    pub fn dev_fail(&self, feed: &FeedId, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(%feed, %reason, "stub feed: failing (dev only)");
        self.feeds
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(feed.clone(), FeedState::Failing(reason));
    }
}

impl FeedSource for StubFeeds {
    fn latest(&self, feed: &FeedId) -> Result<FeedReading> {
        let feeds = self.feeds.read().unwrap_or_else(PoisonError::into_inner);
        match feeds.get(feed) {
            Some(FeedState::Answering(reading)) => Ok(*reading),
            Some(FeedState::Failing(reason)) => Err(OracleError::FeedUnavailable {
                feed: feed.clone(),
                reason: reason.clone(),
            }),
            None => Err(OracleError::FeedUnavailable {
                feed: feed.clone(),
                reason: "unknown feed".to_string(),
            }),
        }
    }
}

/// A pool with a hand-set exchange rate.
#[derive(Debug)]
pub struct StubPool {
    /// `Err` holds the failure reason.
    rate: RwLock<std::result::Result<Fix, String>>,
}

impl StubPool {
    /// Create a pool at [`DEFAULT_EXCHANGE_RATE`].
    pub fn new() -> Self {
        Self::with_rate(DEFAULT_EXCHANGE_RATE)
    }

    /// Create a pool at a custom rate.
    pub fn with_rate(rate: Fix) -> Self {
        Self {
            rate: RwLock::new(Ok(rate)),
        }
    }

    /// Set the exchange rate (development/testing only).
    pub fn dev_set_rate(&self, rate: Fix) {
        tracing::warn!(new_rate = %rate, "stub pool: rate changed (dev only)");
        *self.rate.write().unwrap_or_else(PoisonError::into_inner) = Ok(rate);
    }

    /// Make every query fail with `reason`.
    pub fn dev_fail(&self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(%reason, "stub pool: failing (dev only)");
        *self.rate.write().unwrap_or_else(PoisonError::into_inner) = Err(reason);
    }
}

impl Default for StubPool {
    fn default() -> Self {
        Self::new()
    }
}

impl RateSource for StubPool {
    fn exchange_rate(&self) -> Result<Fix> {
        self.rate
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .map_err(OracleError::PoolRead)
    }
}
