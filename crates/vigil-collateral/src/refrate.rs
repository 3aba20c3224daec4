//! Reference-rate ratchet with revenue hiding.
//!
//! The pool's exchange rate (`{ref/tok}`) normally only grows, but it can
//! wobble down by tiny amounts. To keep that noise from looking like a loss,
//! only `raw * (1 - revenue_hiding)` is ever exposed, and the exposed value
//! only moves up. The hidden slack absorbs small dips.
//!
//! A dip deeper than the slack, i.e. `raw < exposed`, is a real devaluation:
//! the exposed value follows `raw` down and the caller treats it as a hard
//! default.

use serde::{Deserialize, Serialize};
use vigil_fixed::{Fix, Rounding};
use vigil_oracle::source::RateSource;
use vigil_oracle::OracleError;
use vigil_types::Timestamp;

/// How the exposed rate reacts to a new raw observation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefMove {
    /// The hidden floor rose above the exposed rate.
    Rise(Fix),
    /// Within the hidden slack; nothing changes.
    Hold,
    /// The raw rate fell below the exposed rate.
    Fall(Fix),
}

/// Decide the next exposed rate.
///
/// The floor `raw * showing` rounds down so rounding never exposes more than
/// the pool reports.
///
/// # Arguments
///
/// * `exposed` - Currently exposed `{ref/tok}`
/// * `raw` - `{ref/tok}` just reported by the pool
/// * `showing` - `1 - revenue_hiding`
///
/// # Errors
///
/// - [`FixedError::Overflow`](vigil_fixed::FixedError::Overflow) if
///   `raw * showing` does not fit
///
/// # Examples
///
/// ```
/// use vigil_collateral::refrate::{ratchet, RefMove};
/// use vigil_fixed::Fix;
///
/// let showing: Fix = "0.99".parse().unwrap();
/// let exposed: Fix = "1.98".parse().unwrap();
///
/// // A small dip stays inside the hidden slack.
/// let dip = ratchet(exposed, "1.99".parse().unwrap(), showing).unwrap();
/// assert_eq!(dip, RefMove::Hold);
///
/// // Growth moves the floor up.
/// let rise = ratchet(exposed, "2.1".parse().unwrap(), showing).unwrap();
/// assert_eq!(rise, RefMove::Rise("2.079".parse().unwrap()));
///
/// // Falling below the exposed rate is a devaluation.
/// let fall = ratchet(exposed, "1.9".parse().unwrap(), showing).unwrap();
/// assert_eq!(fall, RefMove::Fall("1.9".parse().unwrap()));
/// ```
pub fn ratchet(exposed: Fix, raw: Fix, showing: Fix) -> vigil_fixed::Result<RefMove> {
    if raw < exposed {
        return Ok(RefMove::Fall(raw));
    }
    let cap = raw.mul_rounded(showing, Rounding::Floor)?;
    if cap > exposed {
        Ok(RefMove::Rise(cap))
    } else {
        Ok(RefMove::Hold)
    }
}

/// Exposed and raw reference rates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefRateTracker {
    exposed: Fix,
    raw: Fix,
    last_update: Option<Timestamp>,
}

/// Outcome of a successful pool query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefObservation {
    /// Rate reported by the pool.
    pub raw: Fix,
    /// Exposed rate after the ratchet.
    pub exposed: Fix,
    /// What the ratchet did.
    pub movement: RefMove,
}

impl RefRateTracker {
    /// Start tracking from an initial pool rate, exposed as-is.
    pub fn new(initial: Fix) -> Self {
        Self {
            exposed: initial,
            raw: initial,
            last_update: None,
        }
    }

    /// The publicly reported `{ref/tok}`.
    pub fn exposed(&self) -> Fix {
        self.exposed
    }

    /// The last rate the pool reported.
    pub fn raw(&self) -> Fix {
        self.raw
    }

    /// When the pool was last read successfully.
    pub fn last_update(&self) -> Option<Timestamp> {
        self.last_update
    }

    /// Query the pool and apply the ratchet.
    ///
    /// On failure the tracker is left unchanged.
    ///
    /// # Errors
    ///
    /// - [`OracleError::PoolRead`] if the pool fails or reports zero
    /// - [`OracleError::Arithmetic`] if the hidden floor overflows
    pub fn update<P: RateSource + ?Sized>(
        &mut self,
        pool: &P,
        showing: Fix,
        now: Timestamp,
    ) -> Result<RefObservation, OracleError> {
        let raw = pool.exchange_rate()?;
        if raw.is_zero() {
            return Err(OracleError::PoolRead(
                "pool reported a zero exchange rate".to_string(),
            ));
        }

        let movement = ratchet(self.exposed, raw, showing)?;
        match movement {
            RefMove::Rise(next) => {
                tracing::debug!(from = %self.exposed, to = %next, %raw, "exposed ref rate raised");
                self.exposed = next;
            }
            RefMove::Fall(next) => {
                tracing::warn!(from = %self.exposed, to = %next, "pool rate fell below exposed ref rate");
                self.exposed = next;
            }
            RefMove::Hold => {}
        }
        self.raw = raw;
        self.last_update = Some(now);

        Ok(RefObservation {
            raw,
            exposed: self.exposed,
            movement,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_oracle::stub::StubPool;

    fn fix(s: &str) -> Fix {
        s.parse().expect("valid literal")
    }

    #[test]
    fn test_ratchet_rise() {
        let moved = ratchet(Fix::ONE, fix("2"), fix("0.99")).expect("ratchet");
        assert_eq!(moved, RefMove::Rise(fix("1.98")));
    }

    #[test]
    fn test_ratchet_hold_within_slack() {
        let moved = ratchet(fix("1.98"), fix("1.98001"), fix("0.99")).expect("ratchet");
        assert_eq!(moved, RefMove::Hold);
    }

    #[test]
    fn test_ratchet_hold_at_exposed() {
        let moved = ratchet(fix("1.98"), fix("1.98"), fix("0.99")).expect("ratchet");
        assert_eq!(moved, RefMove::Hold);
    }

    #[test]
    fn test_ratchet_fall_below_exposed() {
        let moved = ratchet(fix("1.98"), fix("1.97999"), fix("0.99")).expect("ratchet");
        assert_eq!(moved, RefMove::Fall(fix("1.97999")));
    }

    #[test]
    fn test_no_hiding_tracks_every_rise() {
        let moved = ratchet(Fix::ONE, fix("1.000001"), Fix::ONE).expect("ratchet");
        assert_eq!(moved, RefMove::Rise(fix("1.000001")));
    }

    #[test]
    fn test_update_records_observation() {
        let pool = StubPool::with_rate(fix("2"));
        let mut tracker = RefRateTracker::new(Fix::ONE);

        let obs = tracker.update(&pool, fix("0.99"), 100).expect("update");
        assert_eq!(obs.raw, fix("2"));
        assert_eq!(obs.exposed, fix("1.98"));
        assert_eq!(tracker.last_update(), Some(100));
        assert_eq!(tracker.raw(), fix("2"));
    }

    #[test]
    fn test_update_failure_leaves_state() {
        let pool = StubPool::new();
        pool.dev_fail("paused");
        let mut tracker = RefRateTracker::new(Fix::ONE);

        let err = tracker.update(&pool, Fix::ONE, 100).expect_err("pool down");
        assert!(matches!(err, OracleError::PoolRead(_)));
        assert_eq!(tracker, RefRateTracker::new(Fix::ONE));
    }

    #[test]
    fn test_update_zero_rate_is_pool_error() {
        let pool = StubPool::with_rate(Fix::ZERO);
        let mut tracker = RefRateTracker::new(Fix::ONE);
        let err = tracker.update(&pool, Fix::ONE, 100).expect_err("zero");
        assert!(matches!(err, OracleError::PoolRead(_)));
    }
}
