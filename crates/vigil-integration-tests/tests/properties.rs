//! Property tests over random refresh sequences.
//!
//! Each sequence moves the pool rate, perturbs the feed and advances time,
//! then checks the engine-wide invariants after every refresh.

use proptest::prelude::*;
use vigil_fixed::Fix;
use vigil_integration_tests::{usdc_pool_config, Harness, T0, USDC_USD};
use vigil_types::{CollateralStatus, FeedId};

#[derive(Clone, Copy, Debug)]
enum FeedAction {
    Fresh,
    Silent,
    OffPeg,
    Fail,
}

fn feed_action() -> impl Strategy<Value = FeedAction> {
    prop_oneof![
        4 => Just(FeedAction::Fresh),
        2 => Just(FeedAction::Silent),
        1 => Just(FeedAction::OffPeg),
        1 => Just(FeedAction::Fail),
    ]
}

/// (pool rate in millionths, feed action, seconds to advance)
fn steps() -> impl Strategy<Value = Vec<(u64, FeedAction, u64)>> {
    prop::collection::vec((900_000u64..1_200_000, feed_action(), 0u64..200_000), 1..40)
}

fn apply(harness: &Harness, action: FeedAction, now: u64) {
    match action {
        FeedAction::Fresh => harness.set_feed(USDC_USD, Fix::ONE, now),
        FeedAction::Silent => {}
        FeedAction::OffPeg => harness.set_feed(USDC_USD, Fix::from_int(2), now),
        FeedAction::Fail => harness.feeds.dev_fail(&FeedId::new(USDC_USD), "down"),
    }
}

proptest! {
    #[test]
    fn engine_invariants_hold(seq in steps(), hiding in 0u64..50_000) {
        let revenue_hiding = Fix::from_scaled(u128::from(hiding), 6).expect("hiding");
        let harness = Harness::new(usdc_pool_config(revenue_hiding), Fix::ONE, T0).expect("harness");

        let mut now = T0;
        let mut before = harness.collateral.snapshot();
        for (rate, action, advance) in seq {
            now += advance;
            let rate = Fix::from_scaled(u128::from(rate), 6).expect("rate");
            harness.pool.dev_set_rate(rate);
            apply(&harness, action, now);

            let status = harness.collateral.refresh(now).expect("refresh");
            let after = harness.collateral.snapshot();
            prop_assert_eq!(status, after.status());

            // DISABLED is terminal and freezes everything.
            if before.status() == CollateralStatus::Disabled {
                prop_assert_eq!(&after, &before);
            }

            // The exposed rate only falls on a hard default.
            if after.ref_rate.exposed() < before.ref_rate.exposed() {
                prop_assert_eq!(after.status(), CollateralStatus::Disabled);
                prop_assert_eq!(after.ref_rate.exposed(), rate);
            }
            if after.status() != CollateralStatus::Disabled {
                prop_assert!(after.ref_rate.exposed() <= after.ref_rate.raw());
            }

            // The deadline is armed once per IFFY spell.
            if let (Some(old), Some(new)) =
                (before.default_state.when_default(), after.default_state.when_default())
            {
                prop_assert_eq!(old, new);
            }

            if let Some(price) = harness.collateral.price(now) {
                prop_assert!(price.low() <= price.high());
                prop_assert!(!price.low().is_zero());
                prop_assert!(after.status() != CollateralStatus::Disabled);
            }

            before = after;
        }
    }
}
