use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use workload_framework_core::{
    adapter::memory::InMemoryLedger,
    config::{BenchmarkConfig, StepMode},
    scenario::runtime::RoundRunner,
};
use workload_framework_workflows::{driver_factory, presets};

fn sample(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos/rounds")
        .join(name)
}

#[test]
fn shipped_round_files_load_and_plan() -> Result<()> {
    for name in ["car.yaml", "automobile.yaml", "auction.yaml"] {
        let benchmark = BenchmarkConfig::load_from_file(&sample(name))?;
        assert!(!benchmark.rounds.is_empty(), "{name} has no rounds");
        for settings in &benchmark.rounds {
            settings.to_plan()?;
        }
    }
    Ok(())
}

#[test]
fn car_sample_matches_car_preset() -> Result<()> {
    let benchmark = BenchmarkConfig::load_from_file(&sample("car.yaml"))?;
    let car = presets::car()?;
    assert!(
        benchmark
            .rounds
            .iter()
            .all(|settings| settings.workload.operations == car)
    );

    let automobile = BenchmarkConfig::load_from_file(&sample("automobile.yaml"))?;
    assert_eq!(automobile.rounds[0].workload.operations, presets::automobile()?);
    Ok(())
}

#[tokio::test]
async fn auction_sample_runs_against_ledger() -> Result<()> {
    let benchmark = BenchmarkConfig::load_from_file(&sample("auction.yaml"))?;
    let workload = &benchmark.rounds[0].workload;
    assert_eq!(workload.step_mode, StepMode::Submit);

    let ledger = Arc::new(InMemoryLedger::new(
        workload.contract_id.clone(),
        &workload.operations,
    ));
    let mut factory = driver_factory(ledger.clone(), benchmark.seed);
    let reports = RoundRunner::run_benchmark(&benchmark, &mut factory).await?;

    assert_eq!(reports[0].steps().succeeded, 20);
    assert_eq!(reports[0].steps().failed, 0);
    assert_eq!(ledger.history().await.len(), 20);
    Ok(())
}
