use std::sync::Arc;

use async_trait::async_trait;
use rand::{Rng, rngs::StdRng};
use workload_framework_core::{
    adapter::SubmissionAdapter,
    config::{RoundConfig, StepMode, WorkerContext},
    request::{InvocationRequest, RequestBuilder, RequestKind},
    scenario::{
        DriverState, Lifecycle, LifecycleOperation, Workload, WorkloadError, runtime::worker_rng,
    },
};

const ASSET_WORKLOAD: &str = "asset_lifecycle";
const SUBMISSION_WORKLOAD: &str = "submission";

/// Drives one worker's share of a round against a submission adapter.
///
/// Setup creates `asset_count` assets in ascending item order, each step
/// submits one request, and teardown deletes the assets setup created in
/// the same order. Every submission is awaited before the next one is
/// built. Adapter failures are returned unchanged: nothing is retried and
/// nothing is rolled back.
pub struct WorkloadDriver<R> {
    adapter: Arc<dyn SubmissionAdapter>,
    rng: R,
    lifecycle: Lifecycle,
    round: Option<(Arc<RoundConfig>, WorkerContext)>,
}

impl<R> WorkloadDriver<R>
where
    R: Rng + Send + Sync,
{
    /// `rng` picks the item each read step targets.
    #[must_use]
    pub fn new(adapter: Arc<dyn SubmissionAdapter>, rng: R) -> Self {
        Self {
            adapter,
            rng,
            lifecycle: Lifecycle::default(),
            round: None,
        }
    }

    fn round(
        &self,
        operation: LifecycleOperation,
    ) -> Result<(&RoundConfig, WorkerContext), WorkloadError> {
        self.round
            .as_ref()
            .map(|(config, worker)| (config.as_ref(), *worker))
            .ok_or(WorkloadError::InvalidState {
                operation,
                state: self.lifecycle.state(),
            })
    }

    async fn submit(&self, request: InvocationRequest) -> Result<(), WorkloadError> {
        tracing::debug!(
            function = request.function_name(),
            args = ?request.arguments(),
            read_only = request.read_only(),
            "submitting request"
        );
        self.adapter.submit(request).await?;
        Ok(())
    }

    /// Submits `kind` for every item in `0..asset_count`, one at a time.
    async fn submit_each_item(
        &self,
        operation: LifecycleOperation,
        kind: RequestKind,
    ) -> Result<(), WorkloadError> {
        let (config, worker) = self.round(operation)?;
        let builder = RequestBuilder::new(config, worker);

        for item_index in 0..config.asset_count {
            let request = builder.build(kind, item_index)?;
            tracing::debug!(
                worker = worker.worker_index,
                asset_id = %request.arguments().first().map_or("", String::as_str),
                %kind,
                "submitting asset request"
            );
            self.submit(request).await?;
        }
        Ok(())
    }

    fn next_step_request(&mut self) -> Result<InvocationRequest, WorkloadError> {
        let (config, worker) = self
            .round
            .as_ref()
            .map(|(config, worker)| (Arc::clone(config), *worker))
            .ok_or(WorkloadError::InvalidState {
                operation: LifecycleOperation::Step,
                state: self.lifecycle.state(),
            })?;
        let builder = RequestBuilder::new(&config, worker);

        let request = match config.step_mode {
            StepMode::RandomRead => builder.build_random_read(&mut self.rng)?,
            StepMode::Submit => builder.build_submission()?,
        };
        Ok(request)
    }
}

#[async_trait]
impl<R> Workload for WorkloadDriver<R>
where
    R: Rng + Send + Sync,
{
    fn name(&self) -> &str {
        match self.round.as_ref().map(|(config, _)| config.step_mode) {
            Some(StepMode::Submit) => SUBMISSION_WORKLOAD,
            _ => ASSET_WORKLOAD,
        }
    }

    fn state(&self) -> DriverState {
        self.lifecycle.state()
    }

    async fn setup(
        &mut self,
        config: Arc<RoundConfig>,
        worker: WorkerContext,
    ) -> Result<(), WorkloadError> {
        self.lifecycle.begin(LifecycleOperation::Setup)?;
        config.validate()?;
        worker.validate()?;

        tracing::info!(
            worker = worker.worker_index,
            round = worker.round_index,
            contract = %config.contract_id,
            assets = config.asset_count,
            function = %config.operations.create.function,
            "creating worker assets"
        );

        self.round = Some((config, worker));
        let result = self
            .submit_each_item(LifecycleOperation::Setup, RequestKind::Create)
            .await;
        self.lifecycle
            .finish(LifecycleOperation::Setup, result.is_ok());

        if let Err(error) = &result {
            tracing::warn!(worker = worker.worker_index, %error, "asset creation failed");
        }
        result
    }

    async fn step(&mut self) -> Result<(), WorkloadError> {
        self.lifecycle.begin(LifecycleOperation::Step)?;

        let result = match self.next_step_request() {
            Ok(request) => self.submit(request).await,
            Err(error) => Err(error),
        };
        self.lifecycle.finish(LifecycleOperation::Step, result.is_ok());
        result
    }

    async fn teardown(&mut self) -> Result<(), WorkloadError> {
        self.lifecycle.begin(LifecycleOperation::Teardown)?;
        let (config, worker) = self.round(LifecycleOperation::Teardown)?;

        tracing::info!(
            worker = worker.worker_index,
            round = worker.round_index,
            assets = config.asset_count,
            function = %config.operations.delete.function,
            "deleting worker assets"
        );

        let result = self
            .submit_each_item(LifecycleOperation::Teardown, RequestKind::Delete)
            .await;
        self.lifecycle
            .finish(LifecycleOperation::Teardown, result.is_ok());
        result
    }
}

/// Workload factory for [`RoundRunner`](workload_framework_core::scenario::runtime::RoundRunner)
/// that gives every worker a [`WorkloadDriver`] over the shared adapter.
///
/// With a seed each worker draws reads from `seed + worker_index`.
pub fn driver_factory(
    adapter: Arc<dyn SubmissionAdapter>,
    seed: Option<u64>,
) -> impl FnMut(&RoundConfig, WorkerContext) -> Box<dyn Workload> {
    move |_: &RoundConfig, worker: WorkerContext| {
        let rng: StdRng = worker_rng(seed, worker.worker_index);
        Box::new(WorkloadDriver::new(Arc::clone(&adapter), rng)) as Box<dyn Workload>
    }
}
