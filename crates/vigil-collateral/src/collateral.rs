//! The collateral facade.
//!
//! [`Collateral`] owns the configuration, the external sources and the
//! [`EngineState`]. The state is only ever replaced whole: `refresh` builds
//! the next state off-lock and swaps it in with one write, so readers see
//! either the state before a refresh or the state after it.
//!
//! Uncertainty about the world (stale feeds, an unreachable pool, a price too
//! large to represent) never fails a refresh. It shows up in
//! [`Collateral::status`] instead. Only arithmetic failures reported by a
//! source are returned as errors, and they leave the state untouched.

use std::sync::{Mutex, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use vigil_fixed::Fix;
use vigil_oracle::composition::FeedComposition;
use vigil_oracle::decay::{PriceDecay, SavedPrice};
use vigil_oracle::source::{FeedSource, RateSource};
use vigil_oracle::OracleError;
use vigil_types::{CollateralStatus, PriceInterval, Timestamp};

use crate::config::CollateralConfig;
use crate::monitor::{DefaultState, Health, PegBounds};
use crate::price::{compose, is_usable};
use crate::refrate::{RefMove, RefRateTracker};
use crate::Result;

/// Everything `refresh` mutates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineState {
    /// State machine position.
    pub default_state: DefaultState,
    /// Exposed and raw reference rates.
    pub ref_rate: RefRateTracker,
    /// Last good feed interval.
    pub saved_price: Option<SavedPrice>,
    /// Last observed `{target/ref}`.
    pub peg_price: Option<Fix>,
    /// Price composed by the last refresh.
    pub price: PriceInterval,
    /// Time of the last refresh that ran.
    pub last_refresh: Option<Timestamp>,
}

impl EngineState {
    fn new(initial_ref_per_tok: Fix) -> Self {
        Self {
            default_state: DefaultState::Sound,
            ref_rate: RefRateTracker::new(initial_ref_per_tok),
            saved_price: None,
            peg_price: None,
            price: PriceInterval::UNPRICED,
            last_refresh: None,
        }
    }

    /// Public status.
    pub fn status(&self) -> CollateralStatus {
        self.default_state.status()
    }

    /// When the last successful feed read happened.
    pub fn last_price_update(&self) -> Option<Timestamp> {
        self.saved_price.map(|saved| saved.saved_at)
    }

    /// When the last successful pool read happened.
    pub fn last_ref_update(&self) -> Option<Timestamp> {
        self.ref_rate.last_update()
    }
}

/// A single collateral token under watch.
#[derive(Debug)]
pub struct Collateral<F, P> {
    config: CollateralConfig,
    composition: FeedComposition,
    decay: PriceDecay,
    peg_bounds: PegBounds,
    revenue_showing: Fix,
    feeds: F,
    pool: P,
    state: RwLock<EngineState>,
    writer: Mutex<()>,
}

impl<F: FeedSource, P: RateSource> Collateral<F, P> {
    /// Validate `config` and start tracking at the pool's current rate.
    ///
    /// The collateral starts SOUND with the exposed reference rate equal to
    /// the pool's rate at construction.
    ///
    /// # Arguments
    ///
    /// * `config` - Collateral parameters, validated here
    /// * `feeds` - Source of the `{target/ref}` (and `{UoA/target}`) feeds
    /// * `pool` - Source of the pool's `{ref/tok}` exchange rate
    ///
    /// # Errors
    ///
    /// - [`CollateralError::InvalidConfig`](crate::CollateralError::InvalidConfig) if `config` is invalid
    /// - [`CollateralError::Oracle`](crate::CollateralError::Oracle) if the pool cannot be read
    ///
    /// # Examples
    ///
    /// ```
    /// use vigil_collateral::{Collateral, CollateralConfig};
    /// use vigil_fixed::Fix;
    /// use vigil_oracle::stub::{StubFeeds, StubPool};
    /// use vigil_types::CollateralStatus;
    ///
    /// let config: CollateralConfig = serde_json::from_value(serde_json::json!({
    ///     "underlying": "MPL-mcUSDC2",
    ///     "target_name": "USD",
    ///     "feed": "USDC/USD",
    ///     "oracle_error": "0.0025",
    ///     "oracle_timeout": 86400,
    ///     "max_trade_volume": "1000000",
    ///     "default_threshold": "0.05",
    ///     "revenue_hiding": "0.01"
    /// }))
    /// .unwrap();
    ///
    /// let pool = StubPool::with_rate("1.5".parse().unwrap());
    /// let collateral = Collateral::new(config, StubFeeds::new(), pool).unwrap();
    /// assert_eq!(collateral.status(), CollateralStatus::Sound);
    /// assert_eq!(collateral.ref_per_tok(), "1.5".parse::<Fix>().unwrap());
    /// ```
    pub fn new(config: CollateralConfig, feeds: F, pool: P) -> Result<Self> {
        config.validate()?;
        let composition = config.composition();
        let peg_bounds = PegBounds::new(
            config.target_per_ref,
            config.default_threshold,
            config.oracle_error,
        )?;
        let revenue_showing = config.revenue_showing()?;

        let initial = pool.exchange_rate()?;
        if initial.is_zero() {
            return Err(OracleError::PoolRead("pool reported a zero exchange rate".to_string()).into());
        }

        tracing::info!(
            underlying = %config.underlying,
            target = %config.target_name,
            ref_per_tok = %initial,
            "collateral created"
        );

        Ok(Self {
            decay: PriceDecay::new(config.price_timeout),
            composition,
            peg_bounds,
            revenue_showing,
            config,
            feeds,
            pool,
            state: RwLock::new(EngineState::new(initial)),
            writer: Mutex::new(()),
        })
    }

    /// Read every source and advance the state machine.
    ///
    /// Returns the status after the refresh. Once DISABLED, refresh does
    /// nothing. A price too large to represent is UNPRICED, which counts as
    /// suspicious like any other unusable price.
    ///
    /// # Arguments
    ///
    /// * `now` - Current time in unix seconds
    ///
    /// # Errors
    ///
    /// - [`CollateralError::Arithmetic`](crate::CollateralError::Arithmetic) if a
    ///   source reports an arithmetic failure; state is unchanged
    ///
    /// # Examples
    ///
    /// ```
    /// use vigil_collateral::{Collateral, CollateralConfig};
    /// use vigil_fixed::Fix;
    /// use vigil_oracle::stub::{StubFeeds, StubPool};
    /// use vigil_types::{CollateralStatus, FeedId};
    ///
    /// let config: CollateralConfig = serde_json::from_value(serde_json::json!({
    ///     "underlying": "MPL-mcUSDC2",
    ///     "target_name": "USD",
    ///     "feed": "USDC/USD",
    ///     "oracle_error": "0.0025",
    ///     "oracle_timeout": 86400,
    ///     "max_trade_volume": "1000000",
    ///     "default_threshold": "0.05"
    /// }))
    /// .unwrap();
    ///
    /// let feeds = StubFeeds::new();
    /// feeds.dev_set_rate(&FeedId::new("USDC/USD"), Fix::ONE, 1_000);
    /// let collateral = Collateral::new(config, feeds, StubPool::new()).unwrap();
    ///
    /// assert_eq!(collateral.refresh(1_000).unwrap(), CollateralStatus::Sound);
    /// assert!(collateral.price(1_000).is_some());
    ///
    /// // The feed goes quiet past its timeout.
    /// assert_eq!(collateral.refresh(1_000 + 86_401).unwrap(), CollateralStatus::Iffy);
    /// assert_eq!(collateral.when_default(), Some(1_000 + 2 * 86_400 + 1));
    /// ```
    pub fn refresh(&self, now: Timestamp) -> Result<CollateralStatus> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.snapshot();
        if current.default_state.is_disabled() {
            return Ok(CollateralStatus::Disabled);
        }

        let mut next = current.clone();
        let mut health = Health::default();

        match self.composition.read(&self.feeds, now) {
            Ok(composed) => {
                health.feed_healthy = true;
                next.saved_price = Some(SavedPrice {
                    interval: composed.interval,
                    saved_at: now,
                });
                next.peg_price = Some(composed.peg_price);
                if self.peg_bounds.is_off_peg(composed.peg_price) {
                    tracing::warn!(
                        underlying = %self.config.underlying,
                        peg_price = %composed.peg_price,
                        bottom = %self.peg_bounds.bottom(),
                        top = %self.peg_bounds.top(),
                        "peg price out of bounds"
                    );
                    health.suspicious = true;
                }
            }
            Err(OracleError::Arithmetic(e)) => return Err(e.into()),
            Err(e) => {
                tracing::warn!(underlying = %self.config.underlying, error = %e, "feed read failed");
            }
        }

        match next.ref_rate.update(&self.pool, self.revenue_showing, now) {
            Ok(observation) => {
                health.ref_healthy = true;
                health.hard_default = matches!(observation.movement, RefMove::Fall(_));
            }
            Err(OracleError::Arithmetic(e)) => return Err(e.into()),
            Err(e) => {
                tracing::warn!(underlying = %self.config.underlying, error = %e, "pool read failed");
            }
        }

        let feed_interval = self.decay.decayed(next.saved_price.as_ref(), now);
        next.price = compose(&feed_interval, next.ref_rate.exposed());
        if !is_usable(&next.price) {
            health.suspicious = true;
        }

        next.default_state =
            current
                .default_state
                .transition(health.signal(), now, self.config.delay_until_default);
        next.last_refresh = Some(now);

        self.log_transition(&current.default_state, &next.default_state);
        let status = next.status();
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = next;
        Ok(status)
    }

    fn log_transition(&self, from: &DefaultState, to: &DefaultState) {
        if from.status() == to.status() {
            return;
        }
        match to {
            DefaultState::Sound => {
                tracing::info!(underlying = %self.config.underlying, "collateral recovered to SOUND");
            }
            DefaultState::Iffy { when_default } => {
                tracing::info!(
                    underlying = %self.config.underlying,
                    when_default,
                    "collateral IFFY"
                );
            }
            DefaultState::Disabled { since } => {
                tracing::warn!(
                    underlying = %self.config.underlying,
                    since,
                    "collateral DISABLED"
                );
            }
        }
    }
}

impl<F, P> Collateral<F, P> {
    /// A consistent copy of the whole engine state.
    pub fn snapshot(&self) -> EngineState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current status.
    pub fn status(&self) -> CollateralStatus {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .status()
    }

    /// Exposed `{ref/tok}`.
    pub fn ref_per_tok(&self) -> Fix {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .ref_rate
            .exposed()
    }

    /// Armed default deadline, if IFFY.
    pub fn when_default(&self) -> Option<Timestamp> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .default_state
            .when_default()
    }

    /// `{UoA/tok}` at `now`, or `None` if unusable.
    ///
    /// The last good feed interval is decayed to `now` and composed with the
    /// exposed reference rate. `None` when DISABLED, when the feed interval
    /// has fully decayed, or when no feed was ever read.
    pub fn price(&self, now: Timestamp) -> Option<PriceInterval> {
        let state = self.snapshot();
        if state.default_state.is_disabled() {
            return None;
        }
        let feed_interval = self.decay.decayed(state.saved_price.as_ref(), now);
        let price = compose(&feed_interval, state.ref_rate.exposed());
        if !is_usable(&price) {
            tracing::debug!(underlying = %self.config.underlying, "price unavailable");
            return None;
        }
        Some(price)
    }

    /// Configuration the collateral was built with.
    pub fn config(&self) -> &CollateralConfig {
        &self.config
    }

    /// The composition used to read feeds.
    pub fn composition(&self) -> &FeedComposition {
        &self.composition
    }

    /// Peg name.
    pub fn target_name(&self) -> &str {
        &self.config.target_name
    }

    /// Pass-through trade cap.
    pub fn max_trade_volume(&self) -> Fix {
        self.config.max_trade_volume
    }

    /// Acceptable `{target/ref}` band.
    pub fn peg_bounds(&self) -> PegBounds {
        self.peg_bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CollateralError;
    use vigil_fixed::FixedError;
    use vigil_oracle::stub::{StubFeeds, StubPool};
    use vigil_types::{FeedId, FeedReading, ONE_DAY, ONE_WEEK};

    const T0: Timestamp = 1_700_000_000;

    fn fix(s: &str) -> Fix {
        s.parse().expect("valid literal")
    }

    fn config() -> CollateralConfig {
        CollateralConfig {
            underlying: "MPL-mcUSDC2".to_string(),
            target_name: "USD".to_string(),
            price_timeout: ONE_WEEK,
            feed: FeedId::new("USDC/USD"),
            oracle_error: fix("0.0025"),
            oracle_timeout: ONE_DAY,
            max_trade_volume: Fix::from_int(1_000_000),
            default_threshold: fix("0.05"),
            delay_until_default: ONE_DAY,
            revenue_hiding: fix("0.01"),
            target_per_ref: Fix::ONE,
            uoa_per_target: None,
        }
    }

    fn setup() -> Collateral<StubFeeds, StubPool> {
        let feeds = StubFeeds::new();
        feeds.dev_set_rate(&"USDC/USD".into(), Fix::ONE, T0);
        Collateral::new(config(), feeds, StubPool::new()).expect("collateral")
    }

    #[test]
    fn test_starts_sound_at_pool_rate() {
        let collateral = setup();
        assert_eq!(collateral.status(), CollateralStatus::Sound);
        assert_eq!(collateral.ref_per_tok(), Fix::ONE);
        assert_eq!(collateral.when_default(), None);
        assert!(collateral.price(T0).is_none(), "no feed read yet");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut bad = config();
        bad.oracle_error = Fix::ONE;
        let err = Collateral::new(bad, StubFeeds::new(), StubPool::new()).expect_err("invalid");
        assert!(matches!(err, CollateralError::InvalidConfig(_)));
    }

    #[test]
    fn test_unreadable_pool_rejected_at_construction() {
        let pool = StubPool::new();
        pool.dev_fail("not deployed");
        let err = Collateral::new(config(), StubFeeds::new(), pool).expect_err("pool down");
        assert!(matches!(err, CollateralError::Oracle(OracleError::PoolRead(_))));
    }

    #[test]
    fn test_refresh_prices() {
        let collateral = setup();
        assert_eq!(collateral.refresh(T0).expect("refresh"), CollateralStatus::Sound);

        let price = collateral.price(T0).expect("priced");
        assert_eq!(price.low(), fix("0.9975"));
        assert_eq!(price.high(), fix("1.0025"));
        let state = collateral.snapshot();
        assert_eq!(state.last_price_update(), Some(T0));
        assert_eq!(state.last_ref_update(), Some(T0));
        assert_eq!(state.peg_price, Some(Fix::ONE));
    }

    #[test]
    fn test_stale_feed_goes_iffy() {
        let collateral = setup();
        collateral.refresh(T0).expect("refresh");

        let later = T0 + ONE_DAY + 1;
        assert_eq!(collateral.refresh(later).expect("refresh"), CollateralStatus::Iffy);
        assert_eq!(collateral.when_default(), Some(later + ONE_DAY));
        // Still priced from the decayed saved interval.
        assert!(collateral.price(later).is_some());
    }

    #[test]
    fn test_off_peg_goes_iffy() {
        let collateral = setup();
        collateral
            .feeds
            .dev_set_rate(&"USDC/USD".into(), fix("0.9"), T0);
        assert_eq!(collateral.refresh(T0).expect("refresh"), CollateralStatus::Iffy);
    }

    #[test]
    fn test_pool_failure_goes_iffy() {
        let collateral = setup();
        collateral.pool.dev_fail("paused");
        assert_eq!(collateral.refresh(T0).expect("refresh"), CollateralStatus::Iffy);
        assert_eq!(collateral.ref_per_tok(), Fix::ONE);
    }

    #[test]
    fn test_disabled_freezes_state() {
        let collateral = setup();
        collateral.pool.dev_set_rate(fix("0.5"));
        assert_eq!(collateral.refresh(T0).expect("refresh"), CollateralStatus::Disabled);
        let frozen = collateral.snapshot();

        collateral.pool.dev_set_rate(fix("5"));
        assert_eq!(collateral.refresh(T0 + 10).expect("refresh"), CollateralStatus::Disabled);
        assert_eq!(collateral.snapshot(), frozen);
        assert!(collateral.price(T0 + 10).is_none());
    }

    /// Answers every feed with an arithmetic failure.
    struct BrokenFeeds;

    impl FeedSource for BrokenFeeds {
        fn latest(&self, _feed: &FeedId) -> vigil_oracle::Result<FeedReading> {
            Err(OracleError::Arithmetic(FixedError::Overflow))
        }
    }

    #[test]
    fn test_arithmetic_error_leaves_state() {
        let collateral = Collateral::new(config(), BrokenFeeds, StubPool::new()).expect("collateral");
        let before = collateral.snapshot();

        let err = collateral.refresh(T0).expect_err("overflow");
        assert!(matches!(err, CollateralError::Arithmetic(FixedError::Overflow)));
        assert_eq!(collateral.snapshot(), before);
    }

    fn large_peg_config() -> CollateralConfig {
        CollateralConfig {
            target_per_ref: Fix::from_int(1_000_000_000_000),
            ..config()
        }
    }

    #[test]
    fn test_failed_feed_with_large_rates_reaches_disabled() {
        let feeds = StubFeeds::new();
        feeds.dev_set_rate(&"USDC/USD".into(), Fix::from_int(1_000_000_000_000), T0);
        let pool = StubPool::with_rate(Fix::from_int(1_000_000));
        let collateral = Collateral::new(large_peg_config(), feeds, pool).expect("collateral");
        assert_eq!(collateral.refresh(T0).expect("refresh"), CollateralStatus::Sound);

        collateral.feeds.dev_fail(&"USDC/USD".into(), "down");
        assert_eq!(collateral.refresh(T0 + 10).expect("refresh"), CollateralStatus::Iffy);
        assert_eq!(collateral.when_default(), Some(T0 + 10 + ONE_DAY));
        assert_eq!(
            collateral.refresh(T0 + ONE_WEEK - 1).expect("refresh"),
            CollateralStatus::Disabled
        );
    }

    #[test]
    fn test_unrepresentable_price_is_suspicious() {
        let feeds = StubFeeds::new();
        feeds.dev_set_rate(&"USDC/USD".into(), Fix::from_int(1_000_000_000_000), T0);
        // 1e12 * 1e17 is past the largest representable price.
        let pool = StubPool::with_rate(Fix::from_int(100_000_000_000_000_000));
        let collateral = Collateral::new(large_peg_config(), feeds, pool).expect("collateral");

        assert_eq!(collateral.refresh(T0).expect("refresh"), CollateralStatus::Iffy);
        assert!(collateral.snapshot().price.is_unpriced());
        assert!(collateral.price(T0).is_none());

        collateral
            .feeds
            .dev_set_rate(&"USDC/USD".into(), Fix::from_int(1_000_000_000_000), T0 + ONE_DAY);
        assert_eq!(
            collateral.refresh(T0 + ONE_DAY).expect("refresh"),
            CollateralStatus::Disabled
        );
    }

    #[test]
    fn test_pass_through_accessors() {
        let collateral = setup();
        assert_eq!(collateral.target_name(), "USD");
        assert_eq!(collateral.max_trade_volume(), Fix::from_int(1_000_000));
        assert_eq!(collateral.peg_bounds().bottom(), fix("0.9475"));
        assert!(matches!(collateral.composition(), FeedComposition::Direct(_)));
        assert_eq!(collateral.config().revenue_hiding, fix("0.01"));
    }
}
