//! vigil-sim: replay a collateral scenario against stub sources.
//!
//! Reads a TOML scenario (first argument or `VIGIL_SCENARIO`), refreshes the
//! collateral once per step and prints one JSON line per step on stdout.
//! Exits with an error if any step misses its expected status.

mod runner;
mod scenario;

use std::io::Write;

use tracing::{error, info};

use crate::scenario::{scenario_path, Scenario};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vigil=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let path = scenario_path()?;
    let scenario = Scenario::load(&path)?;
    info!(
        scenario = %path.display(),
        underlying = %scenario.collateral.underlying,
        steps = scenario.steps.len(),
        "running scenario"
    );

    let reports = runner::run(&scenario)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for report in &reports {
        serde_json::to_writer(&mut out, report)?;
        writeln!(out)?;
    }

    let failed = reports.iter().filter(|r| !r.matches_expectation()).count();
    if failed > 0 {
        error!(failed, "scenario expectations not met");
        anyhow::bail!("{failed} step(s) did not reach the expected status");
    }
    info!("scenario passed");
    Ok(())
}
