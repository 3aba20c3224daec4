//! Oracle feed identifiers and readings.

use std::fmt;

use serde::{Deserialize, Serialize};
use vigil_fixed::Fix;

use crate::Timestamp;

/// Identifier of an external price feed, e.g. `"USDC/USD"`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedId(String);

impl FeedId {
    /// Create a feed identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FeedId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// The latest answer of a feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedReading {
    /// Reported rate.
    pub rate: Fix,
    /// When the feed last updated.
    pub updated_at: Timestamp,
}

impl FeedReading {
    /// Create a reading.
    pub fn new(rate: Fix, updated_at: Timestamp) -> Self {
        Self { rate, updated_at }
    }

    /// Seconds since the feed updated. A reading from the future counts as
    /// fresh.
    pub fn age(&self, now: Timestamp) -> u64 {
        now.saturating_sub(self.updated_at)
    }
}
