use std::sync::Arc;

use async_trait::async_trait;

use super::{DriverState, WorkloadError};
use crate::config::{RoundConfig, WorkerContext};

/// Lifecycle a worker drives during one round.
///
/// Calls on one instance are strictly sequential; `&mut self` receivers make
/// overlapping calls on the same workload impossible.
#[async_trait]
pub trait Workload: Send {
    fn name(&self) -> &str;

    fn state(&self) -> DriverState;

    /// Pre-creates this worker's assets. Runs once, before any step.
    async fn setup(
        &mut self,
        config: Arc<RoundConfig>,
        worker: WorkerContext,
    ) -> Result<(), WorkloadError>;

    /// Submits exactly one request.
    async fn step(&mut self) -> Result<(), WorkloadError>;

    /// Removes what setup created, using the configuration given to setup.
    async fn teardown(&mut self) -> Result<(), WorkloadError>;
}
