use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use workload_framework_core::{
    AdapterError, InvocationRequest, SubmissionAdapter, SubmissionResponse,
    adapter::memory::InMemoryLedger,
    config::BenchmarkConfig,
    scenario::runtime::{RoundRunner, StepFailurePolicy},
};
use workload_framework_workflows::{RoundBuilder, driver_factory, presets};

const BENCHMARK: &str = r#"
seed: 5
rounds:
  - label: warmup
    workers: 2
    tx_number: 3
    workload:
      contract_id: carcc
      assets: 2
      operations:
        create:
          function: CreateCar
          args: ["{id}", "Toyota", "Corolla", "Blue", "ManufacturerCo", "2025-09-01"]
        read:
          function: ReadCar
        delete:
          function: DeleteCar
  - label: steady
    workers: 3
    tx_number: 10
    workload:
      contract_id: carcc
      assets: 5
      operations:
        create:
          function: CreateCar
          args: ["{id}", "SUV", "XUV 700", "Blue", "03/05/23", "Mahindra"]
        read:
          function: ReadCar
        delete:
          function: DeleteCar
"#;

fn worker_count() -> usize {
    if workload_framework_env::slow_test_env() {
        16
    } else {
        4
    }
}

/// Ledger whose reads always fail; writes go through untouched.
struct RejectingReads(InMemoryLedger);

#[async_trait]
impl SubmissionAdapter for RejectingReads {
    async fn submit(
        &self,
        request: InvocationRequest,
    ) -> Result<SubmissionResponse, AdapterError> {
        if request.read_only() {
            return Err(AdapterError::msg("endorsement timed out"));
        }
        self.0.submit(request).await
    }
}

#[tokio::test]
async fn benchmark_file_runs_every_round_and_cleans_up() -> Result<()> {
    let benchmark = BenchmarkConfig::from_yaml_str(BENCHMARK)?;
    let ledger = Arc::new(InMemoryLedger::new("carcc", &presets::car()?));
    let mut factory = driver_factory(ledger.clone(), benchmark.seed);

    let reports = RoundRunner::run_benchmark(&benchmark, &mut factory).await?;

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].round_index, 0);
    assert_eq!(reports[0].steps().succeeded, 6);
    assert_eq!(reports[1].round_index, 1);
    assert_eq!(reports[1].steps().succeeded, 30);
    assert!(reports.iter().all(|r| r.aborted_workers() == 0));
    assert!(reports.iter().all(|r| r.teardown_failures() == 0));
    assert!(ledger.is_empty().await);
    Ok(())
}

#[tokio::test]
async fn concurrent_workers_never_collide() -> Result<()> {
    let workers = worker_count();
    let ledger = Arc::new(InMemoryLedger::new("carcc", &presets::car()?));
    let round = RoundBuilder::new("collisions")
        .workers(workers)
        .tx_number(20)
        .workload(presets::car_round("carcc", 25)?)
        .build()?;

    let report = round.run(ledger.clone(), 0).await?;

    assert_eq!(report.aborted_workers(), 0);
    assert_eq!(report.steps().failed, 0);
    assert_eq!(report.steps().succeeded, 20 * workers as u64);
    assert!(ledger.is_empty().await);
    Ok(())
}

#[tokio::test]
async fn failed_steps_are_counted_and_teardown_still_runs() -> Result<()> {
    let operations = presets::car()?;
    let adapter = Arc::new(RejectingReads(InMemoryLedger::new("carcc", &operations)));

    let round = RoundBuilder::new("flaky")
        .workers(2)
        .tx_number(5)
        .workload(presets::car_round("carcc", 2)?)
        .build()?;
    let report = round.run(adapter.clone(), 0).await?;

    assert_eq!(report.steps().failed, 10);
    assert_eq!(report.steps().succeeded, 0);
    assert_eq!(report.teardown_failures(), 0);
    assert!(adapter.0.is_empty().await);
    Ok(())
}

#[tokio::test]
async fn abort_policy_stops_stepping_after_first_failure() -> Result<()> {
    let operations = presets::car()?;
    let adapter = Arc::new(RejectingReads(InMemoryLedger::new("carcc", &operations)));

    let round = RoundBuilder::new("fail-fast")
        .workers(2)
        .tx_number(5)
        .step_failures(StepFailurePolicy::Abort)
        .workload(presets::car_round("carcc", 2)?)
        .build()?;
    let report = round.run(adapter.clone(), 0).await?;

    assert!(report.workers.iter().all(|w| w.steps.total() == 1));
    assert!(adapter.0.is_empty().await);
    Ok(())
}

#[tokio::test]
async fn undeployed_functions_abort_every_worker() -> Result<()> {
    // Ledger only knows the generic asset functions, not the car ones.
    let ledger = Arc::new(InMemoryLedger::new("carcc", &Default::default()));
    let round = RoundBuilder::new("misrouted")
        .workers(3)
        .tx_number(2)
        .workload(presets::car_round("carcc", 1)?)
        .build()?;

    let report = round.run(ledger.clone(), 0).await?;

    assert_eq!(report.aborted_workers(), 3);
    assert_eq!(report.steps().total(), 0);
    assert!(report.workers.iter().all(|w| w.teardown.is_none()));
    assert!(ledger.is_empty().await);
    Ok(())
}
