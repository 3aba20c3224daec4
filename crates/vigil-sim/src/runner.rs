//! Scenario execution.

use std::sync::Arc;

use serde::Serialize;
use vigil_collateral::Collateral;
use vigil_fixed::Fix;
use vigil_oracle::stub::{StubFeeds, StubPool};
use vigil_types::{CollateralStatus, PriceInterval, Timestamp};

use crate::scenario::{FeedAnswer, Scenario, Step};

/// Outcome of one step, printed as a JSON line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub time: Timestamp,
    pub status: CollateralStatus,
    pub ref_per_tok: Fix,
    pub raw_ref_per_tok: Fix,
    pub when_default: Option<Timestamp>,
    pub price: Option<PriceInterval>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<CollateralStatus>,
}

impl StepReport {
    /// Whether the step met its expectation, if it had one.
    pub fn matches_expectation(&self) -> bool {
        self.expected.map_or(true, |expected| expected == self.status)
    }
}

fn apply_feed(feeds: &StubFeeds, answer: &FeedAnswer, default_time: Timestamp) -> anyhow::Result<()> {
    match (&answer.failure, answer.resolved_rate()?) {
        (Some(reason), _) => feeds.dev_fail(&answer.feed, reason.clone()),
        (None, Some(rate)) => {
            feeds.dev_set_rate(&answer.feed, rate, answer.updated_at.unwrap_or(default_time))
        }
        (None, None) => {}
    }
    Ok(())
}

fn apply_step(feeds: &StubFeeds, pool: &StubPool, step: &Step) -> anyhow::Result<()> {
    if let Some(reason) = &step.pool_failure {
        pool.dev_fail(reason.clone());
    } else if let Some(rate) = step.pool_rate {
        pool.dev_set_rate(rate);
    }
    for answer in &step.feeds {
        apply_feed(feeds, answer, step.time)?;
    }
    Ok(())
}

/// Build the collateral and run every step.
pub fn run(scenario: &Scenario) -> anyhow::Result<Vec<StepReport>> {
    let feeds = Arc::new(StubFeeds::new());
    let pool = Arc::new(StubPool::with_rate(scenario.initial.pool_rate));
    for answer in &scenario.initial.feeds {
        apply_feed(&feeds, answer, scenario.initial.time)?;
    }

    let collateral = Collateral::new(scenario.collateral.clone(), Arc::clone(&feeds), Arc::clone(&pool))?;

    let mut reports = Vec::with_capacity(scenario.steps.len());
    let mut last_time = scenario.initial.time;
    for (index, step) in scenario.steps.iter().enumerate() {
        if step.time < last_time {
            anyhow::bail!("step {index}: time {} goes backwards from {last_time}", step.time);
        }
        last_time = step.time;

        apply_step(&feeds, &pool, step)?;
        let status = collateral.refresh(step.time)?;
        let state = collateral.snapshot();

        let report = StepReport {
            time: step.time,
            status,
            ref_per_tok: state.ref_rate.exposed(),
            raw_ref_per_tok: state.ref_rate.raw(),
            when_default: state.default_state.when_default(),
            price: collateral.price(step.time),
            expected: step.expect_status,
        };
        if !report.matches_expectation() {
            tracing::error!(
                step = index,
                time = step.time,
                expected = ?step.expect_status,
                actual = %status,
                "status expectation failed"
            );
        }
        reports.push(report);
    }
    Ok(reports)
}
