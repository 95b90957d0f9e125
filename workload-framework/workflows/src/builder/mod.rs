use std::{num::NonZeroUsize, sync::Arc, time::Duration};

use workload_framework_core::{
    adapter::SubmissionAdapter,
    config::{ConfigError, RoundConfig},
    scenario::runtime::{
        RoundPlan, RoundReport, RoundRunner, RoundSchedule, RunnerError, StepFailurePolicy,
        pacing_interval,
    },
};

use crate::workloads::driver::driver_factory;

#[derive(Debug, thiserror::Error)]
pub enum BuilderInputError {
    #[error("{field} must be non-zero")]
    ZeroValue { field: &'static str },
    #[error("tps {tps} is not a usable pacing rate")]
    InvalidTps { tps: f64 },
    #[error("round '{label}' has no workload attached")]
    MissingWorkload { label: String },
    #[error("round '{label}' workload is invalid: {source}")]
    InvalidWorkload { label: String, source: ConfigError },
}

/// Fluent construction of a single benchmark round.
///
/// Zero values passed to the plain setters are ignored with a warning; the
/// `try_` variants return an error instead.
pub struct RoundBuilder {
    label: String,
    workers: NonZeroUsize,
    schedule: RoundSchedule,
    tps: Option<f64>,
    step_failures: StepFailurePolicy,
    seed: Option<u64>,
    workload: Option<RoundConfig>,
}

impl RoundBuilder {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            workers: NonZeroUsize::MIN,
            schedule: RoundSchedule::TxNumber(1),
            tps: None,
            step_failures: StepFailurePolicy::default(),
            seed: None,
            workload: None,
        }
    }

    #[must_use]
    /// Number of concurrent workers (ignores zero).
    pub fn workers(mut self, workers: usize) -> Self {
        match NonZeroUsize::new(workers) {
            Some(value) => self.workers = value,
            None => tracing::warn!(
                workers,
                "worker count must be non-zero; keeping previous setting"
            ),
        }
        self
    }

    /// Like `workers`, but returns an error on zero.
    pub fn try_workers(mut self, workers: usize) -> Result<Self, BuilderInputError> {
        let Some(value) = NonZeroUsize::new(workers) else {
            return Err(BuilderInputError::ZeroValue { field: "workers" });
        };
        self.workers = value;
        Ok(self)
    }

    #[must_use]
    /// Run a fixed number of steps per worker (ignores zero).
    pub fn tx_number(mut self, count: u64) -> Self {
        if count == 0 {
            tracing::warn!("tx_number must be non-zero; keeping previous schedule");
        } else {
            self.schedule = RoundSchedule::TxNumber(count);
        }
        self
    }

    #[must_use]
    /// Keep stepping until `duration` has elapsed (ignores zero).
    pub fn duration(mut self, duration: Duration) -> Self {
        if duration.is_zero() {
            tracing::warn!("round duration must be non-zero; keeping previous schedule");
        } else {
            self.schedule = RoundSchedule::Duration(duration);
        }
        self
    }

    #[must_use]
    /// Pace each worker to `tps` steps per second (ignores rates with no
    /// representable step interval).
    pub fn tps(mut self, tps: f64) -> Self {
        if pacing_interval(tps).is_some() {
            self.tps = Some(tps);
        } else {
            tracing::warn!(tps, "tps is not a usable pacing rate; keeping previous pacing");
        }
        self
    }

    /// Like `tps`, but returns an error for an unusable rate.
    pub fn try_tps(mut self, tps: f64) -> Result<Self, BuilderInputError> {
        if pacing_interval(tps).is_none() {
            return Err(BuilderInputError::InvalidTps { tps });
        }
        self.tps = Some(tps);
        Ok(self)
    }

    #[must_use]
    pub const fn step_failures(mut self, policy: StepFailurePolicy) -> Self {
        self.step_failures = policy;
        self
    }

    #[must_use]
    /// Seed for reproducible read selection.
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn workload(mut self, config: RoundConfig) -> Self {
        self.workload = Some(config);
        self
    }

    /// Configure the workload via closure, starting from `contract_id` with no
    /// assets and the default asset operations.
    #[must_use]
    pub fn workload_with(
        self,
        contract_id: &str,
        f: impl FnOnce(RoundConfig) -> RoundConfig,
    ) -> Self {
        self.workload(f(RoundConfig::new(contract_id, 0)))
    }

    /// Validates the workload and freezes the round.
    pub fn build(self) -> Result<ScheduledRound, BuilderInputError> {
        let Some(config) = self.workload else {
            return Err(BuilderInputError::MissingWorkload { label: self.label });
        };
        if let Err(source) = config.validate() {
            return Err(BuilderInputError::InvalidWorkload {
                label: self.label,
                source,
            });
        }

        tracing::debug!(
            label = %self.label,
            workers = self.workers.get(),
            schedule = ?self.schedule,
            tps = self.tps,
            contract = %config.contract_id,
            "built round"
        );

        let plan = RoundPlan::new(self.label, self.workers)
            .with_schedule(self.schedule)
            .with_tps(self.tps)
            .with_step_failures(self.step_failures);

        Ok(ScheduledRound {
            plan,
            config: Arc::new(config),
            seed: self.seed,
        })
    }
}

/// A validated round ready to run against an adapter.
#[derive(Clone, Debug)]
pub struct ScheduledRound {
    pub plan: RoundPlan,
    pub config: Arc<RoundConfig>,
    pub seed: Option<u64>,
}

impl ScheduledRound {
    /// Drives the round with one [`WorkloadDriver`](crate::WorkloadDriver)
    /// per worker.
    pub async fn run(
        &self,
        adapter: Arc<dyn SubmissionAdapter>,
        round_index: u32,
    ) -> Result<RoundReport, RunnerError> {
        let mut factory = driver_factory(adapter, self.seed);
        RoundRunner::run(&self.plan, Arc::clone(&self.config), round_index, &mut factory).await
    }
}
