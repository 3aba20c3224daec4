//! Scenario file format.
//!
//! A scenario is a TOML file with the collateral parameters, the initial
//! state of the pool and feeds, and a list of steps. Each step changes some
//! inputs, refreshes the collateral and optionally checks the status.
//!
//! ```toml
//! [collateral]
//! underlying = "MPL-mcUSDC2"
//! target_name = "USD"
//! feed = "USDC/USD"
//! oracle_error = "0.0025"
//! oracle_timeout = 3600
//! max_trade_volume = "1000000"
//! default_threshold = "0.05"
//! revenue_hiding = "0.000001"
//!
//! [initial]
//! time = 1700000000
//! feeds = [{ feed = "USDC/USD", answer = 100000000, decimals = 8 }]
//!
//! [[step]]
//! time = 1700000000
//! expect_status = "SOUND"
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use vigil_collateral::CollateralConfig;
use vigil_fixed::Fix;
use vigil_types::{CollateralStatus, FeedId, Timestamp};

/// Environment variable naming the scenario file.
pub const SCENARIO_ENV: &str = "VIGIL_SCENARIO";

/// A complete scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Collateral under test.
    pub collateral: CollateralConfig,
    /// Inputs before construction.
    pub initial: InitialState,
    /// Refresh steps in order.
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

/// Inputs before construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitialState {
    /// Scenario start time.
    pub time: Timestamp,
    /// Pool exchange rate at construction.
    #[serde(default = "default_pool_rate")]
    pub pool_rate: Fix,
    /// Initial feed answers.
    #[serde(default)]
    pub feeds: Vec<FeedAnswer>,
}

/// One refresh.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Step {
    /// Refresh time.
    pub time: Timestamp,
    /// New pool rate.
    #[serde(default)]
    pub pool_rate: Option<Fix>,
    /// Make the pool fail with this reason.
    #[serde(default)]
    pub pool_failure: Option<String>,
    /// Feed changes.
    #[serde(default)]
    pub feeds: Vec<FeedAnswer>,
    /// Status the refresh must produce.
    #[serde(default)]
    pub expect_status: Option<CollateralStatus>,
}

/// A feed change. Give either `rate`, or `answer` with `decimals`, or
/// `failure`. `updated_at` defaults to the time of the step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedAnswer {
    /// Feed identifier.
    pub feed: FeedId,
    /// Rate as a decimal.
    #[serde(default)]
    pub rate: Option<Fix>,
    /// Rate as a scaled integer.
    #[serde(default)]
    pub answer: Option<u64>,
    /// Decimals of `answer`.
    #[serde(default = "default_answer_decimals")]
    pub decimals: u32,
    /// Feed update time.
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
    /// Make the feed fail with this reason.
    #[serde(default)]
    pub failure: Option<String>,
}

fn default_pool_rate() -> Fix {
    Fix::ONE
}

fn default_answer_decimals() -> u32 {
    8
}

impl FeedAnswer {
    /// The rate this change sets, or `None` for a failure.
    pub fn resolved_rate(&self) -> anyhow::Result<Option<Fix>> {
        if self.failure.is_some() {
            return Ok(None);
        }
        match (self.rate, self.answer) {
            (Some(rate), None) => Ok(Some(rate)),
            (None, Some(answer)) => Ok(Some(Fix::from_scaled(u128::from(answer), self.decimals)?)),
            (Some(_), Some(_)) => {
                anyhow::bail!("feed {}: give either rate or answer, not both", self.feed)
            }
            (None, None) => anyhow::bail!("feed {}: rate, answer or failure is required", self.feed),
        }
    }
}

impl Scenario {
    /// Parse a scenario from TOML.
    pub fn from_toml(src: &str) -> anyhow::Result<Self> {
        let scenario: Scenario = toml::from_str(src)?;
        scenario.collateral.validate()?;
        Ok(scenario)
    }

    /// Load a scenario file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("parsing scenario {}", path.display()))
    }
}

/// Scenario path from the first argument, or from [`SCENARIO_ENV`].
pub fn scenario_path() -> anyhow::Result<PathBuf> {
    if let Some(arg) = std::env::args().nth(1) {
        return Ok(PathBuf::from(arg));
    }
    std::env::var(SCENARIO_ENV)
        .map(PathBuf::from)
        .map_err(|_| anyhow::anyhow!("usage: vigil-sim <scenario.toml> (or set {SCENARIO_ENV})"))
}
