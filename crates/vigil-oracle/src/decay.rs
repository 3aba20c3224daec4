//! Price decay for stale feeds.
//!
//! When a feed cannot be read, the last good interval is still the best
//! information available, but it becomes less trustworthy the older it gets.
//! The decay policy widens it linearly in confidence until `price_timeout`
//! seconds after it was saved, at which point the price is UNPRICED.
//!
//! ## Widening
//!
//! With `delta = now - saved_at` and `m = (price_timeout - delta) / price_timeout`:
//!
//! ```text
//! low  = saved_low  * m      (round down)
//! high = saved_high / m      (round up)
//! ```
//!
//! `m` falls from 1 to 0, so `low` falls to 0 and `high` grows without bound.
//! A bound that no longer fits is UNPRICED.

use serde::{Deserialize, Serialize};
use vigil_fixed::Rounding;
use vigil_types::{PriceInterval, Seconds, Timestamp};

/// A feed interval remembered from the last successful read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPrice {
    /// The interval as read.
    pub interval: PriceInterval,
    /// When it was read.
    pub saved_at: Timestamp,
}

/// Decay policy parameterised by the price timeout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriceDecay {
    /// Seconds after which a saved price carries no information.
    price_timeout: Seconds,
}

impl PriceDecay {
    /// Create a decay policy.
    pub fn new(price_timeout: Seconds) -> Self {
        Self { price_timeout }
    }

    /// Whether a price saved at `saved_at` is fully decayed at `now`.
    pub fn is_expired(&self, saved_at: Timestamp, now: Timestamp) -> bool {
        let delta = now.saturating_sub(saved_at);
        delta > 0 && delta >= self.price_timeout
    }

    /// The saved interval widened for its age at `now`.
    ///
    /// A missing saved price is UNPRICED.
    pub fn decayed(&self, saved: Option<&SavedPrice>, now: Timestamp) -> PriceInterval {
        let Some(saved) = saved else {
            return PriceInterval::UNPRICED;
        };
        let delta = now.saturating_sub(saved.saved_at);
        if delta == 0 {
            return saved.interval;
        }
        if self.is_expired(saved.saved_at, now) {
            return PriceInterval::UNPRICED;
        }

        let remaining = self.price_timeout - delta;
        let low = saved
            .interval
            .low()
            .mul_div_int(remaining, self.price_timeout, Rounding::Floor);
        let high = saved
            .interval
            .high()
            .mul_div_int(self.price_timeout, remaining, Rounding::Ceil);
        match (low, high) {
            (Ok(low), Ok(high)) => PriceInterval::new(low, high).unwrap_or(PriceInterval::UNPRICED),
            _ => PriceInterval::UNPRICED,
        }
    }
}
