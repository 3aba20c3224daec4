//! Collateral configuration.
//!
//! All parameters are fixed at construction. Fractions are decimal strings in
//! serialized form (`oracle_error = "0.0025"`), durations are seconds.

use serde::{Deserialize, Serialize};
use vigil_fixed::Fix;
use vigil_oracle::composition::FeedComposition;
use vigil_oracle::reader::FeedParams;
use vigil_types::{FeedId, Seconds, ONE_DAY, ONE_WEEK};

use crate::{CollateralError, Result};

/// Immutable parameters of one collateral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralConfig {
    /// Monitored token or pool.
    pub underlying: String,
    /// Economic peg, e.g. "USD" or "ETH".
    pub target_name: String,
    /// Seconds after the last good read at which the price is UNPRICED.
    #[serde(default = "default_price_timeout")]
    pub price_timeout: Seconds,
    /// `{target/ref}` feed.
    pub feed: FeedId,
    /// Relative error budget of `feed`.
    pub oracle_error: Fix,
    /// Maximum age of a usable `feed` answer.
    pub oracle_timeout: Seconds,
    /// Per-transaction notional cap for downstream consumers.
    pub max_trade_volume: Fix,
    /// Tolerated relative deviation of `{target/ref}` from the peg.
    pub default_threshold: Fix,
    /// Seconds a suspicious condition must persist before default.
    #[serde(default = "default_delay_until_default")]
    pub delay_until_default: Seconds,
    /// Fraction of the pool rate withheld from the exposed rate.
    #[serde(default)]
    pub revenue_hiding: Fix,
    /// Ideal `{target/ref}`.
    #[serde(default = "default_target_per_ref")]
    pub target_per_ref: Fix,
    /// `{UoA/target}` feed for targets that are not the unit of account.
    #[serde(default)]
    pub uoa_per_target: Option<FeedParams>,
}

fn default_price_timeout() -> Seconds {
    ONE_WEEK
}

fn default_delay_until_default() -> Seconds {
    ONE_DAY
}

fn default_target_per_ref() -> Fix {
    Fix::ONE
}

impl CollateralConfig {
    /// Check every invariant.
    ///
    /// # Errors
    ///
    /// - [`CollateralError::InvalidConfig`] naming the first violation
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(CollateralError::InvalidConfig(msg));

        if self.underlying.is_empty() {
            return invalid("underlying must be set".to_string());
        }
        if self.target_name.is_empty() {
            return invalid("target_name must be set".to_string());
        }
        if self.feed.is_empty() {
            return invalid("feed must be set".to_string());
        }
        check_fraction("oracle_error", self.oracle_error)?;
        check_fraction("default_threshold", self.default_threshold)?;
        check_fraction("revenue_hiding", self.revenue_hiding)?;

        let peg_tolerance = self
            .default_threshold
            .checked_add(self.oracle_error)
            .map_err(|e| CollateralError::InvalidConfig(e.to_string()))?;
        if peg_tolerance >= Fix::ONE {
            return invalid(format!(
                "default_threshold + oracle_error must be below 1, got {peg_tolerance}"
            ));
        }
        if self.target_per_ref.is_zero() {
            return invalid("target_per_ref must be positive".to_string());
        }
        if self.max_trade_volume.is_zero() {
            return invalid("max_trade_volume must be positive".to_string());
        }
        if let Some(second) = &self.uoa_per_target {
            if second.feed.is_empty() {
                return invalid("uoa_per_target.feed must be set".to_string());
            }
            check_fraction("uoa_per_target.oracle_error", second.oracle_error)?;
        }
        Ok(())
    }

    /// The feed composition implied by the configured feeds.
    pub fn composition(&self) -> FeedComposition {
        let primary = FeedParams {
            feed: self.feed.clone(),
            oracle_error: self.oracle_error,
            oracle_timeout: self.oracle_timeout,
        };
        match &self.uoa_per_target {
            None => FeedComposition::Direct(primary),
            Some(second) => FeedComposition::Chained {
                target_per_ref: primary,
                uoa_per_target: second.clone(),
            },
        }
    }

    /// `1 - revenue_hiding`.
    pub fn revenue_showing(&self) -> Result<Fix> {
        Ok(self.revenue_hiding.complement()?)
    }
}

fn check_fraction(name: &str, value: Fix) -> Result<()> {
    if value >= Fix::ONE {
        return Err(CollateralError::InvalidConfig(format!(
            "{name} must be in [0, 1), got {value}"
        )));
    }
    Ok(())
}
