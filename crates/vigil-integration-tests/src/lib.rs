//! Integration tests for the vigil collateral engine.
//!
//! The tests under `tests/` drive a [`Collateral`] end to end against stub
//! feeds and a stub pool. This library only holds the shared fixtures.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p vigil-integration-tests
//! ```

use std::sync::Arc;

use vigil_collateral::{Collateral, CollateralConfig};
use vigil_fixed::Fix;
use vigil_oracle::reader::FeedParams;
use vigil_oracle::stub::{StubFeeds, StubPool};
use vigil_types::{FeedId, Timestamp, ONE_DAY, ONE_WEEK};

/// Simulated start time.
pub const T0: Timestamp = 1_700_000_000;

/// `{USD/USDC}` feed.
pub const USDC_USD: &str = "USDC/USD";
/// `{ETH/WETH}` feed, a constant 1 in practice.
pub const WETH_ETH: &str = "WETH/ETH";
/// `{USD/ETH}` feed.
pub const ETH_USD: &str = "ETH/USD";

/// 0.25%
pub const USDC_ORACLE_ERROR: Fix = Fix::from_parts(25, 4);
/// 0.5%
pub const ETH_ORACLE_ERROR: Fix = Fix::from_parts(5, 3);
/// 5%
pub const DEFAULT_THRESHOLD: Fix = Fix::from_parts(5, 2);

/// A Maple USDC pool share, priced directly off `USDC/USD`.
pub fn usdc_pool_config(revenue_hiding: Fix) -> CollateralConfig {
    CollateralConfig {
        underlying: "MPL-mcUSDC2".to_string(),
        target_name: "USD".to_string(),
        price_timeout: ONE_WEEK,
        feed: FeedId::new(USDC_USD),
        oracle_error: USDC_ORACLE_ERROR,
        oracle_timeout: ONE_DAY,
        max_trade_volume: Fix::from_int(1_000_000),
        default_threshold: DEFAULT_THRESHOLD,
        delay_until_default: ONE_DAY,
        revenue_hiding,
        target_per_ref: Fix::ONE,
        uoa_per_target: None,
    }
}

/// A Maple wETH pool share, priced through `WETH/ETH` then `ETH/USD`.
pub fn weth_pool_config(revenue_hiding: Fix) -> CollateralConfig {
    CollateralConfig {
        underlying: "MPL-mcWETH1".to_string(),
        target_name: "ETH".to_string(),
        price_timeout: ONE_WEEK,
        feed: FeedId::new(WETH_ETH),
        oracle_error: ETH_ORACLE_ERROR,
        oracle_timeout: ONE_DAY,
        max_trade_volume: Fix::from_int(1_000_000),
        default_threshold: DEFAULT_THRESHOLD,
        delay_until_default: ONE_DAY,
        revenue_hiding,
        target_per_ref: Fix::ONE,
        uoa_per_target: Some(FeedParams {
            feed: FeedId::new(ETH_USD),
            oracle_error: ETH_ORACLE_ERROR,
            oracle_timeout: ONE_DAY,
        }),
    }
}

/// A collateral wired to stubs the test can still reach.
pub struct Harness {
    pub feeds: Arc<StubFeeds>,
    pub pool: Arc<StubPool>,
    pub collateral: Collateral<Arc<StubFeeds>, Arc<StubPool>>,
}

impl Harness {
    /// Every feed in `config` answers 1 at `now`; the pool answers
    /// `pool_rate`.
    pub fn new(config: CollateralConfig, pool_rate: Fix, now: Timestamp) -> vigil_collateral::Result<Self> {
        let feeds = Arc::new(StubFeeds::new());
        for params in config.composition().feeds() {
            feeds.dev_set_rate(&params.feed, Fix::ONE, now);
        }
        let pool = Arc::new(StubPool::with_rate(pool_rate));
        let collateral = Collateral::new(config, Arc::clone(&feeds), Arc::clone(&pool))?;
        Ok(Self {
            feeds,
            pool,
            collateral,
        })
    }

    /// Set one feed's answer, published at `now`.
    pub fn set_feed(&self, feed: &str, rate: Fix, now: Timestamp) {
        self.feeds.dev_set_rate(&FeedId::new(feed), rate, now);
    }

    /// Republish every feed's current answer at `now`.
    pub fn touch_feeds(&self, now: Timestamp) {
        for params in self.collateral.composition().feeds() {
            self.feeds.dev_set_updated_at(&params.feed, now);
        }
    }
}
