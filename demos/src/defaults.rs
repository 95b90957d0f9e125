use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};
use workload_framework_core::{
    Workload,
    adapter::{SubmissionAdapter, memory::InMemoryLedger},
    config::{RoundConfig, WorkerContext},
    scenario::runtime::worker_rng,
};
use workload_framework_workflows::WorkloadDriver;

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_ASSETS: u64 = 100;
pub const DEFAULT_TX_NUMBER: u64 = 1_000;

pub fn init_tracing() {
    let filter = workload_framework_env::rust_log()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}

/// Fresh in-memory ledger serving the contract and functions `config` names.
#[must_use]
pub fn ledger_for(config: &RoundConfig) -> Arc<dyn SubmissionAdapter> {
    info!(
        contract = %config.contract_id,
        "using in-memory ledger"
    );
    Arc::new(InMemoryLedger::new(
        config.contract_id.clone(),
        &config.operations,
    ))
}

/// Workload factory giving each round its own [`ledger_for`] ledger, shared
/// by every worker of that round.
pub fn ledger_per_round_factory(
    seed: Option<u64>,
) -> impl FnMut(&RoundConfig, WorkerContext) -> Box<dyn Workload> {
    let mut current: Option<(u32, Arc<dyn SubmissionAdapter>)> = None;
    move |config: &RoundConfig, worker: WorkerContext| {
        let cached = current
            .as_ref()
            .filter(|(round, _)| *round == worker.round_index)
            .map(|(_, ledger)| Arc::clone(ledger));
        let ledger = match cached {
            Some(ledger) => ledger,
            None => {
                let ledger = ledger_for(config);
                current = Some((worker.round_index, Arc::clone(&ledger)));
                ledger
            }
        };
        let rng = worker_rng(seed, worker.worker_index);
        Box::new(WorkloadDriver::new(ledger, rng)) as Box<dyn Workload>
    }
}

#[cfg(test)]
mod tests {
    use workload_framework_core::{config::BenchmarkConfig, scenario::runtime::RoundRunner};

    use super::*;

    const TWO_CONTRACTS: &str = r#"
rounds:
  - label: first
    workers: 2
    tx_number: 2
    workload:
      contract_id: first
      assets: 2
  - label: second
    workers: 3
    tx_number: 2
    workload:
      contract_id: second
      assets: 1
"#;

    #[tokio::test]
    async fn each_round_gets_a_ledger_for_its_own_contract() {
        let benchmark = BenchmarkConfig::from_yaml_str(TWO_CONTRACTS).unwrap();
        let mut factory = ledger_per_round_factory(Some(1));

        let reports = RoundRunner::run_benchmark(&benchmark, &mut factory)
            .await
            .unwrap();

        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.aborted_workers() == 0));
        assert_eq!(reports[0].steps().succeeded, 4);
        assert_eq!(reports[1].steps().succeeded, 6);
    }
}
