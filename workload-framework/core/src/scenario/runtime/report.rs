use std::time::Duration;

/// Result of a setup or teardown phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseOutcome {
    pub elapsed: Duration,
    pub error: Option<String>,
}

impl PhaseOutcome {
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepStats {
    pub succeeded: u64,
    pub failed: u64,
    pub total_latency: Duration,
    pub min_latency: Option<Duration>,
    pub max_latency: Option<Duration>,
}

impl StepStats {
    pub fn record(&mut self, latency: Duration, succeeded: bool) {
        if succeeded {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.total_latency += latency;
        self.min_latency = Some(self.min_latency.map_or(latency, |min| min.min(latency)));
        self.max_latency = Some(self.max_latency.map_or(latency, |max| max.max(latency)));
    }

    #[must_use]
    pub const fn total(&self) -> u64 {
        self.succeeded + self.failed
    }

    #[must_use]
    pub fn average_latency(&self) -> Option<Duration> {
        let total = u32::try_from(self.total()).ok().filter(|n| *n > 0)?;
        Some(self.total_latency / total)
    }

    fn merge(&mut self, other: &Self) {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.total_latency += other.total_latency;
        self.min_latency = match (self.min_latency, other.min_latency) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.max_latency = match (self.max_latency, other.max_latency) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerReport {
    pub worker_index: u32,
    pub setup: PhaseOutcome,
    pub steps: StepStats,
    /// `None` when setup failed and the worker never reached teardown.
    pub teardown: Option<PhaseOutcome>,
}

impl WorkerReport {
    #[must_use]
    pub const fn aborted(&self) -> bool {
        !self.setup.succeeded()
    }
}

#[derive(Clone, Debug)]
pub struct RoundReport {
    pub label: String,
    pub round_index: u32,
    pub elapsed: Duration,
    /// One entry per worker, ordered by worker index.
    pub workers: Vec<WorkerReport>,
}

impl RoundReport {
    #[must_use]
    pub fn steps(&self) -> StepStats {
        let mut total = StepStats::default();
        for worker in &self.workers {
            total.merge(&worker.steps);
        }
        total
    }

    #[must_use]
    pub fn aborted_workers(&self) -> usize {
        self.workers.iter().filter(|w| w.aborted()).count()
    }

    #[must_use]
    pub fn teardown_failures(&self) -> usize {
        self.workers
            .iter()
            .filter_map(|w| w.teardown.as_ref())
            .filter(|t| !t.succeeded())
            .count()
    }

    /// Successful steps per second over the whole round.
    #[must_use]
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.steps().succeeded as f64 / secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(error: Option<&str>) -> PhaseOutcome {
        PhaseOutcome {
            elapsed: Duration::ZERO,
            error: error.map(str::to_owned),
        }
    }

    #[test]
    fn step_stats_track_latency_bounds() {
        let mut stats = StepStats::default();
        stats.record(Duration::from_millis(30), true);
        stats.record(Duration::from_millis(10), false);
        stats.record(Duration::from_millis(20), true);

        assert_eq!(stats.succeeded, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.min_latency, Some(Duration::from_millis(10)));
        assert_eq!(stats.max_latency, Some(Duration::from_millis(30)));
        assert_eq!(stats.average_latency(), Some(Duration::from_millis(20)));
    }

    #[test]
    fn round_report_aggregates_workers() {
        let mut busy = StepStats::default();
        busy.record(Duration::from_millis(5), true);
        busy.record(Duration::from_millis(7), true);

        let report = RoundReport {
            label: "read".to_owned(),
            round_index: 0,
            elapsed: Duration::from_secs(2),
            workers: vec![
                WorkerReport {
                    worker_index: 0,
                    setup: outcome(None),
                    steps: busy,
                    teardown: Some(outcome(Some("asset 0_1 does not exist"))),
                },
                WorkerReport {
                    worker_index: 1,
                    setup: outcome(Some("connection refused")),
                    steps: StepStats::default(),
                    teardown: None,
                },
            ],
        };

        assert_eq!(report.steps().succeeded, 2);
        assert_eq!(report.aborted_workers(), 1);
        assert_eq!(report.teardown_failures(), 1);
        assert!((report.throughput() - 1.0).abs() < f64::EPSILON);
    }
}
