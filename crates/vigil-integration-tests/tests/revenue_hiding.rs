//! Integration test: revenue hiding on the USDC and wETH pools.
//!
//! The pool rate is set to 2, so with 1% hidden the exposed rate is 1.98.
//! A dip that stays above 1.98 changes nothing; a dip below it is a hard
//! default and disables the collateral in the same refresh.

use vigil_fixed::Fix;
use vigil_integration_tests::{usdc_pool_config, weth_pool_config, Harness, ETH_USD, T0};
use vigil_types::CollateralStatus;

fn fix(s: &str) -> Fix {
    s.parse().expect("valid literal")
}

fn run_hiding_sequence(harness: &Harness) {
    // =========================================================
    // Step 1: Pool rate rises; exposed rate is 99% of it
    // =========================================================
    harness.pool.dev_set_rate(fix("2"));
    let status = harness.collateral.refresh(T0).expect("refresh");
    assert_eq!(status, CollateralStatus::Sound);
    assert_eq!(harness.collateral.ref_per_tok(), fix("1.98"));
    assert_eq!(harness.collateral.snapshot().ref_rate.raw(), fix("2"));

    // =========================================================
    // Step 2: Dip inside the hidden slack
    // =========================================================
    harness.pool.dev_set_rate(fix("1.98001"));
    harness.touch_feeds(T0 + 60);
    let status = harness.collateral.refresh(T0 + 60).expect("refresh");
    assert_eq!(status, CollateralStatus::Sound);
    assert_eq!(harness.collateral.ref_per_tok(), fix("1.98"));

    // =========================================================
    // Step 3: Dip below the exposed rate
    // =========================================================
    harness.pool.dev_set_rate(fix("1.97999"));
    harness.touch_feeds(T0 + 120);
    let status = harness.collateral.refresh(T0 + 120).expect("refresh");
    assert_eq!(status, CollateralStatus::Disabled);
    assert_eq!(harness.collateral.ref_per_tok(), fix("1.97999"));
    assert_eq!(harness.collateral.when_default(), None);
    assert!(harness.collateral.price(T0 + 120).is_none());
}

#[test]
fn usdc_pool_hides_revenue() {
    let harness = Harness::new(usdc_pool_config(fix("0.01")), Fix::ONE, T0).expect("harness");
    run_hiding_sequence(&harness);
}

#[test]
fn weth_pool_hides_revenue() {
    let harness = Harness::new(weth_pool_config(fix("0.01")), Fix::ONE, T0).expect("harness");
    harness.set_feed(ETH_USD, Fix::from_int(1500), T0);
    run_hiding_sequence(&harness);
}

#[test]
fn usdc_price_uses_exposed_rate() {
    let harness = Harness::new(usdc_pool_config(fix("0.01")), Fix::ONE, T0).expect("harness");
    harness.pool.dev_set_rate(fix("2"));
    harness.collateral.refresh(T0).expect("refresh");

    // [0.9975, 1.0025] * 1.98, not * 2.
    let price = harness.collateral.price(T0).expect("priced");
    assert_eq!(price.low(), fix("1.97505"));
    assert_eq!(price.high(), fix("1.98495"));
}

#[test]
fn weth_price_chains_both_feeds() {
    let harness = Harness::new(weth_pool_config(fix("0.01")), Fix::ONE, T0).expect("harness");
    harness.set_feed(ETH_USD, Fix::from_int(1500), T0);
    harness.pool.dev_set_rate(fix("2"));
    harness.collateral.refresh(T0).expect("refresh");

    let price = harness.collateral.price(T0).expect("priced");
    assert!(price.contains(fix("2970")), "1500 * 1.98 within {price:?}");
    assert!(!price.contains(fix("3000")), "1500 * 2 must not be priced");
}

#[test]
fn tiny_hiding_tracks_growth_closely() {
    let harness = Harness::new(usdc_pool_config(fix("0.000001")), fix("1.0412"), T0).expect("harness");
    assert_eq!(harness.collateral.ref_per_tok(), fix("1.0412"));

    let mut now = T0;
    for rate in ["1.0413", "1.0414", "1.0415"] {
        now += 3_600;
        harness.pool.dev_set_rate(fix(rate));
        harness.touch_feeds(now);
        assert_eq!(harness.collateral.refresh(now).expect("refresh"), CollateralStatus::Sound);
    }

    // 1.0415 * 0.999999
    assert_eq!(harness.collateral.ref_per_tok(), fix("1.0414989585"));
}

#[test]
fn exposed_rate_never_exceeds_raw() {
    let harness = Harness::new(usdc_pool_config(fix("0.01")), Fix::ONE, T0).expect("harness");
    let mut now = T0;
    for rate in ["1.5", "1.499", "1.52", "1.51", "1.6"] {
        now += 60;
        harness.pool.dev_set_rate(fix(rate));
        harness.touch_feeds(now);
        harness.collateral.refresh(now).expect("refresh");
        let state = harness.collateral.snapshot();
        assert!(state.ref_rate.exposed() <= state.ref_rate.raw());
        assert_eq!(state.status(), CollateralStatus::Sound);
    }
    assert_eq!(harness.collateral.ref_per_tok(), fix("1.584"));
}
