use std::process;

use anyhow::{Context as _, Result};
use tracing::{info, warn};
use workload_demos::{RoundBuilder, defaults, presets, read_env_any};

#[tokio::main]
async fn main() {
    defaults::init_tracing();

    let workers = read_env_any(&["WORKLOAD_DEMO_WORKERS"], defaults::DEFAULT_WORKERS);
    let assets = read_env_any(&["WORKLOAD_DEMO_ASSETS"], defaults::DEFAULT_ASSETS);
    let tx_number = read_env_any(&["WORKLOAD_DEMO_TX_NUMBER"], defaults::DEFAULT_TX_NUMBER);

    info!(workers, assets, tx_number, "starting car read demo");

    if let Err(err) = run_car_round(workers, assets, tx_number).await {
        warn!("car read demo failed: {err:#}");
        process::exit(1);
    }
}

async fn run_car_round(workers: usize, assets: u64, tx_number: u64) -> Result<()> {
    let mut round = RoundBuilder::new("car-read")
        .try_workers(workers)?
        .tx_number(tx_number)
        .workload(presets::car_round("carcc", assets)?);
    if let Some(seed) = workload_framework_env::workload_seed() {
        round = round.seed(seed);
    }
    let round = round.build()?;

    let ledger = defaults::ledger_for(&round.config);
    let report = round
        .run(ledger, 0)
        .await
        .context("running car read round failed")?;

    let steps = report.steps();
    info!(
        succeeded = steps.succeeded,
        failed = steps.failed,
        throughput = report.throughput(),
        "car read demo complete"
    );

    Ok(())
}
