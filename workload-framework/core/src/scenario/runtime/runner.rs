use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use futures::FutureExt as _;
use thiserror::Error;
use tokio::{
    task::{self, JoinSet},
    time::{Instant, MissedTickBehavior, interval},
};
use tracing::{debug, info, warn};

use super::{
    RoundPlan, RoundSchedule, StepFailurePolicy,
    report::{PhaseOutcome, RoundReport, StepStats, WorkerReport},
};
use crate::{
    config::{BenchmarkConfig, ConfigError, RoundConfig, WorkerContext},
    scenario::Workload,
};

/// Creates the workload a worker drives during a round.
pub type WorkloadFactory<'a> = dyn FnMut(&RoundConfig, WorkerContext) -> Box<dyn Workload> + 'a;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("round '{label}' is misconfigured")]
    Config { label: String, source: ConfigError },
    #[error("round '{label}' has more workers than u32 can index ({workers})")]
    TooManyWorkers { label: String, workers: usize },
    #[error("round '{label}' worker task failed: {message}")]
    WorkerTask { label: String, message: String },
}

/// Drives every worker of a round through setup, steps and teardown.
///
/// Workers run as independent tasks with nothing mutable shared between
/// them; each worker's own lifecycle calls are strictly sequential.
pub struct RoundRunner;

impl RoundRunner {
    /// Runs one round and reports per-worker outcomes.
    ///
    /// Setup failures abort only the affected worker. Step and teardown
    /// failures are counted in the report and never fail the round.
    pub async fn run(
        plan: &RoundPlan,
        config: Arc<RoundConfig>,
        round_index: u32,
        factory: &mut WorkloadFactory<'_>,
    ) -> Result<RoundReport, RunnerError> {
        config.validate().map_err(|source| RunnerError::Config {
            label: plan.label.clone(),
            source,
        })?;
        let total_workers =
            u32::try_from(plan.workers.get()).map_err(|_| RunnerError::TooManyWorkers {
                label: plan.label.clone(),
                workers: plan.workers.get(),
            })?;

        info!(
            round = round_index,
            label = %plan.label,
            workers = total_workers,
            schedule = ?plan.schedule,
            tps = plan.tps,
            contract = %config.contract_id,
            assets = config.asset_count,
            "starting round"
        );

        let started = Instant::now();
        let mut tasks = JoinSet::new();
        for worker_index in 0..total_workers {
            let worker = WorkerContext::new(worker_index, total_workers, round_index);
            let workload = factory(&config, worker);
            let config = Arc::clone(&config);
            let plan = plan.clone();

            tasks.spawn(async move {
                AssertUnwindSafe(drive_worker(workload, config, worker, plan))
                    .catch_unwind()
                    .await
                    .map_err(|panic| {
                        format!("worker {worker_index} panicked: {}", panic_message(panic))
                    })
            });
        }

        let mut workers = Vec::with_capacity(plan.workers.get());
        while let Some(joined) = tasks.join_next().await {
            let report = joined
                .map_err(|err| err.to_string())
                .and_then(|outcome| outcome)
                .map_err(|message| RunnerError::WorkerTask {
                    label: plan.label.clone(),
                    message,
                })?;
            workers.push(report);
        }
        workers.sort_by_key(|w| w.worker_index);

        let report = RoundReport {
            label: plan.label.clone(),
            round_index,
            elapsed: started.elapsed(),
            workers,
        };
        let steps = report.steps();
        info!(
            round = round_index,
            label = %report.label,
            succeeded = steps.succeeded,
            failed = steps.failed,
            aborted_workers = report.aborted_workers(),
            teardown_failures = report.teardown_failures(),
            throughput = report.throughput(),
            elapsed_ms = report.elapsed.as_millis(),
            "round finished"
        );

        Ok(report)
    }

    /// Runs every round of a benchmark in order, numbering them from zero.
    pub async fn run_benchmark(
        benchmark: &BenchmarkConfig,
        factory: &mut WorkloadFactory<'_>,
    ) -> Result<Vec<RoundReport>, RunnerError> {
        let mut reports = Vec::with_capacity(benchmark.rounds.len());
        for (round_index, settings) in (0u32..).zip(&benchmark.rounds) {
            let plan = settings.to_plan().map_err(|source| RunnerError::Config {
                label: settings.label.clone(),
                source,
            })?;
            let config = Arc::new(settings.workload.clone());
            reports.push(Self::run(&plan, config, round_index, factory).await?);
        }
        Ok(reports)
    }
}

async fn drive_worker(
    mut workload: Box<dyn Workload>,
    config: Arc<RoundConfig>,
    worker: WorkerContext,
    plan: RoundPlan,
) -> WorkerReport {
    let worker_index = worker.worker_index;

    let started = Instant::now();
    let setup_result = workload.setup(config, worker).await;
    let setup = PhaseOutcome {
        elapsed: started.elapsed(),
        error: setup_result.err().map(|err| err.to_string()),
    };
    if let Some(error) = &setup.error {
        warn!(
            worker = worker_index,
            workload = workload.name(),
            %error,
            "setup failed; worker aborted"
        );
        return WorkerReport {
            worker_index,
            setup,
            steps: StepStats::default(),
            teardown: None,
        };
    }

    let steps = run_steps(workload.as_mut(), worker_index, &plan).await;

    let started = Instant::now();
    let teardown_result = workload.teardown().await;
    let teardown = PhaseOutcome {
        elapsed: started.elapsed(),
        error: teardown_result.err().map(|err| err.to_string()),
    };
    if let Some(error) = &teardown.error {
        warn!(worker = worker_index, %error, "teardown failed");
    }

    WorkerReport {
        worker_index,
        setup,
        steps,
        teardown: Some(teardown),
    }
}

async fn run_steps(workload: &mut dyn Workload, worker_index: u32, plan: &RoundPlan) -> StepStats {
    let mut stats = StepStats::default();
    let mut ticker = plan.step_interval().map(|period| {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    });
    // A duration past the clock's range has no deadline.
    let deadline = match plan.schedule {
        RoundSchedule::Duration(duration) => Instant::now().checked_add(duration),
        RoundSchedule::TxNumber(_) => None,
    };

    loop {
        let more = match plan.schedule {
            RoundSchedule::TxNumber(count) => stats.total() < count,
            RoundSchedule::Duration(_) => deadline.is_none_or(|d| Instant::now() < d),
        };
        if !more {
            break;
        }
        match ticker.as_mut() {
            Some(ticker) => {
                ticker.tick().await;
            }
            None => task::yield_now().await,
        }

        let started = Instant::now();
        let result = workload.step().await;
        let latency = started.elapsed();
        stats.record(latency, result.is_ok());

        if let Err(error) = result {
            debug!(worker = worker_index, %error, "step failed");
            if plan.step_failures == StepFailurePolicy::Abort {
                warn!(
                    worker = worker_index,
                    %error,
                    "stopping steps after failure"
                );
                break;
            }
        }
    }

    debug!(
        worker = worker_index,
        succeeded = stats.succeeded,
        failed = stats.failed,
        avg_latency_us = stats.average_latency().map(|d| d.as_micros()),
        "worker steps finished"
    );
    stats
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    panic.downcast::<String>().map_or_else(
        |panic| {
            panic.downcast::<&'static str>().map_or_else(
                |_| "unknown panic".to_owned(),
                |message| (*message).to_owned(),
            )
        },
        |message| *message,
    )
}
