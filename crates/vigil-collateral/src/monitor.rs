//! Default detection state machine.
//!
//! ```text
//!            unhealthy                    now >= when_default
//!   SOUND ─────────────────▶ IFFY ─────────────────────────▶ DISABLED
//!     ▲                        │                                 ▲
//!     └──── healthy, before ───┘                                 │
//!           when_default                                         │
//!   SOUND / IFFY ───────────── hard default ─────────────────────┘
//! ```
//!
//! The deadline is armed once, on the SOUND → IFFY edge, and is never pushed
//! back by later unhealthy refreshes. DISABLED is terminal.

use serde::{Deserialize, Serialize};
use vigil_fixed::Fix;
use vigil_types::{CollateralStatus, Seconds, Timestamp};

/// Monitor state. The default deadline only exists while IFFY.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "UPPERCASE")]
pub enum DefaultState {
    /// Healthy.
    Sound,
    /// Suspicious since some refresh; defaults at `when_default`.
    Iffy {
        /// Deadline armed on entry.
        when_default: Timestamp,
    },
    /// Defaulted.
    Disabled {
        /// When the default took effect.
        since: Timestamp,
    },
}

/// What one refresh observed, reduced to a single input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HealthSignal {
    /// Feeds fresh, pool readable, peg within bounds.
    Healthy,
    /// Anything short of healthy.
    Unhealthy,
    /// The reference rate fell below its exposed value.
    HardDefault,
}

/// Per-refresh health observations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Health {
    /// All feeds read fresh.
    pub feed_healthy: bool,
    /// The pool answered with a positive rate.
    pub ref_healthy: bool,
    /// Peg price out of bounds, or no usable price.
    pub suspicious: bool,
    /// The reference rate fell below the exposed rate.
    pub hard_default: bool,
}

impl Health {
    /// Collapse the observations into a signal.
    pub fn signal(&self) -> HealthSignal {
        if self.hard_default {
            HealthSignal::HardDefault
        } else if self.feed_healthy && self.ref_healthy && !self.suspicious {
            HealthSignal::Healthy
        } else {
            HealthSignal::Unhealthy
        }
    }
}

impl DefaultState {
    /// Public status.
    pub fn status(&self) -> CollateralStatus {
        match self {
            DefaultState::Sound => CollateralStatus::Sound,
            DefaultState::Iffy { .. } => CollateralStatus::Iffy,
            DefaultState::Disabled { .. } => CollateralStatus::Disabled,
        }
    }

    /// The armed deadline, if IFFY.
    pub fn when_default(&self) -> Option<Timestamp> {
        match self {
            DefaultState::Iffy { when_default } => Some(*when_default),
            _ => None,
        }
    }

    /// Whether the state is terminal.
    pub fn is_disabled(&self) -> bool {
        matches!(self, DefaultState::Disabled { .. })
    }

    /// Advance the machine by one refresh.
    ///
    /// An IFFY state whose deadline has passed defaults even if this refresh
    /// is healthy: recovery is only possible before the deadline. With a zero
    /// delay the SOUND → IFFY edge defaults in the same step.
    pub fn transition(self, signal: HealthSignal, now: Timestamp, delay: Seconds) -> DefaultState {
        match (self, signal) {
            (DefaultState::Disabled { .. }, _) => self,
            (_, HealthSignal::HardDefault) => DefaultState::Disabled { since: now },
            (DefaultState::Iffy { when_default }, _) if now >= when_default => {
                DefaultState::Disabled {
                    since: when_default,
                }
            }
            (DefaultState::Iffy { .. }, HealthSignal::Healthy) => DefaultState::Sound,
            (DefaultState::Iffy { .. }, HealthSignal::Unhealthy) => self,
            (DefaultState::Sound, HealthSignal::Healthy) => DefaultState::Sound,
            (DefaultState::Sound, HealthSignal::Unhealthy) => {
                let when_default = now.saturating_add(delay);
                if now >= when_default {
                    DefaultState::Disabled { since: now }
                } else {
                    DefaultState::Iffy { when_default }
                }
            }
        }
    }
}

/// Acceptable band for the observed `{target/ref}`.
///
/// The default threshold and the feed's error budget add up:
/// `peg * (1 ± (default_threshold + oracle_error))`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PegBounds {
    bottom: Fix,
    top: Fix,
}

impl PegBounds {
    /// Bounds around `peg`.
    pub fn new(peg: Fix, default_threshold: Fix, oracle_error: Fix) -> vigil_fixed::Result<Self> {
        let tolerance = default_threshold.checked_add(oracle_error)?;
        let delta = peg.mul(tolerance)?;
        Ok(Self {
            bottom: peg.checked_sub(delta)?,
            top: peg.checked_add(delta)?,
        })
    }

    /// Lowest acceptable peg price.
    pub fn bottom(&self) -> Fix {
        self.bottom
    }

    /// Highest acceptable peg price.
    pub fn top(&self) -> Fix {
        self.top
    }

    /// Whether `peg_price` lies outside the band.
    pub fn is_off_peg(&self, peg_price: Fix) -> bool {
        peg_price < self.bottom || peg_price > self.top
    }
}
