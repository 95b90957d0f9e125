mod report;
mod runner;

use std::{num::NonZeroUsize, time::Duration};

use rand::{SeedableRng as _, rngs::StdRng};
pub use report::{PhaseOutcome, RoundReport, StepStats, WorkerReport};
pub use runner::{RoundRunner, RunnerError, WorkloadFactory};
use serde::{Deserialize, Serialize};

/// How long each worker keeps stepping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundSchedule {
    /// Fixed number of steps per worker.
    TxNumber(u64),
    /// Keep stepping until the duration has elapsed.
    Duration(Duration),
}

/// What a worker does after a failed step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepFailurePolicy {
    #[default]
    Continue,
    /// Stop stepping and go straight to teardown.
    Abort,
}

/// Harness-side shape of one round.
#[derive(Clone, Debug)]
pub struct RoundPlan {
    pub label: String,
    pub workers: NonZeroUsize,
    pub schedule: RoundSchedule,
    /// Per-worker steps per second; unpaced when `None`.
    pub tps: Option<f64>,
    pub step_failures: StepFailurePolicy,
}

impl RoundPlan {
    #[must_use]
    pub fn new(label: impl Into<String>, workers: NonZeroUsize) -> Self {
        Self {
            label: label.into(),
            workers,
            schedule: RoundSchedule::TxNumber(1),
            tps: None,
            step_failures: StepFailurePolicy::default(),
        }
    }

    #[must_use]
    pub const fn with_schedule(mut self, schedule: RoundSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    #[must_use]
    pub const fn with_tps(mut self, tps: Option<f64>) -> Self {
        self.tps = tps;
        self
    }

    #[must_use]
    pub const fn with_step_failures(mut self, policy: StepFailurePolicy) -> Self {
        self.step_failures = policy;
        self
    }

    /// Interval between consecutive steps of one worker; `None` runs
    /// unpaced, including for rates [`pacing_interval`] rejects.
    #[must_use]
    pub fn step_interval(&self) -> Option<Duration> {
        self.tps.and_then(pacing_interval)
    }
}

/// Step interval for `tps` steps per second.
///
/// `None` unless the interval is positive and representable: rates above
/// one step per nanosecond, below one step per `u64::MAX` seconds, and
/// non-finite or non-positive rates are all rejected.
#[must_use]
pub fn pacing_interval(tps: f64) -> Option<Duration> {
    if !(tps > 0.0 && tps.is_finite()) {
        return None;
    }
    Duration::try_from_secs_f64(1.0 / tps)
        .ok()
        .filter(|interval| !interval.is_zero())
}

/// Generator for one worker's read selection.
///
/// With a seed the sequence is reproducible across runs and distinct per
/// worker; without one it is drawn from OS entropy.
#[must_use]
pub fn worker_rng(seed: Option<u64>, worker_index: u32) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(u64::from(worker_index))),
        None => StdRng::from_entropy(),
    }
}
