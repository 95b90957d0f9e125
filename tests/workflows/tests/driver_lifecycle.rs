use std::{collections::BTreeSet, sync::Arc};

use anyhow::Result;
use rand::{SeedableRng as _, rngs::StdRng};
use workload_framework_core::{
    DriverState, InvocationRequest, RequestBuilder, RequestKind, SubmissionAdapter as _,
    WorkerContext, Workload, WorkloadError, adapter::memory::InMemoryLedger,
};
use workload_framework_workflows::{WorkloadDriver, presets};

const CONTRACT: &str = "carcc";

fn car_ledger() -> Result<Arc<InMemoryLedger>> {
    Ok(Arc::new(InMemoryLedger::new(CONTRACT, &presets::car()?)))
}

fn driver(ledger: &Arc<InMemoryLedger>, seed: u64) -> WorkloadDriver<StdRng> {
    WorkloadDriver::new(ledger.clone(), StdRng::seed_from_u64(seed))
}

fn ids_for(history: &[InvocationRequest], function: &str) -> BTreeSet<String> {
    history
        .iter()
        .filter(|request| request.function_name() == function)
        .map(|request| request.arguments()[0].clone())
        .collect()
}

#[tokio::test]
async fn setup_then_teardown_leaves_ledger_as_it_was() -> Result<()> {
    let ledger = car_ledger()?;
    let config = Arc::new(presets::car_round(CONTRACT, 3)?);

    let mut workers = Vec::new();
    for worker_index in 0..2 {
        let mut workload = driver(&ledger, 1);
        workload
            .setup(Arc::clone(&config), WorkerContext::new(worker_index, 2, 0))
            .await?;
        assert_eq!(workload.state(), DriverState::Ready);
        workers.push(workload);
    }

    assert_eq!(
        ledger.asset_ids().await,
        ["0_0", "0_1", "0_2", "1_0", "1_1", "1_2"]
    );

    for workload in &mut workers {
        workload.teardown().await?;
        assert_eq!(workload.state(), DriverState::Completed);
    }
    assert!(ledger.is_empty().await);

    let history = ledger.history().await;
    assert_eq!(ids_for(&history, "CreateCar"), ids_for(&history, "DeleteCar"));
    Ok(())
}

#[tokio::test]
async fn reads_only_target_the_workers_own_assets() -> Result<()> {
    let ledger = car_ledger()?;
    let config = Arc::new(presets::car_round(CONTRACT, 4)?);
    let mut workload = driver(&ledger, 11);
    workload
        .setup(Arc::clone(&config), WorkerContext::new(1, 3, 0))
        .await?;

    for _ in 0..50 {
        workload.step().await?;
    }
    workload.teardown().await?;

    let history = ledger.history().await;
    let reads: Vec<_> = history
        .iter()
        .filter(|request| request.function_name() == "ReadCar")
        .collect();
    assert_eq!(reads.len(), 50);
    assert!(reads.iter().all(|request| request.read_only()));
    assert!(reads.iter().all(|request| request.invoker_identity() == "User1"));

    let created = ids_for(&history, "CreateCar");
    assert!(ids_for(&history, "ReadCar").is_subset(&created));
    Ok(())
}

#[tokio::test]
async fn occupied_identifier_aborts_setup() -> Result<()> {
    let ledger = car_ledger()?;
    let config = Arc::new(presets::car_round(CONTRACT, 3)?);

    let mut squatter = driver(&ledger, 0);
    squatter
        .setup(Arc::clone(&config), WorkerContext::new(0, 1, 0))
        .await?;

    let mut workload = driver(&ledger, 0);
    let err = workload
        .setup(Arc::clone(&config), WorkerContext::new(0, 1, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkloadError::Adapter(_)));
    assert!(err.to_string().contains("0_0 already exists"));
    assert_eq!(workload.state(), DriverState::Aborted);
    assert!(matches!(
        workload.teardown().await,
        Err(WorkloadError::InvalidState { .. })
    ));

    squatter.teardown().await?;
    assert!(ledger.is_empty().await);
    Ok(())
}

#[tokio::test]
async fn auction_steps_submit_url_pair() -> Result<()> {
    let ledger = Arc::new(InMemoryLedger::new("auction", &presets::auction()?));
    let config = Arc::new(presets::auction_round(
        "auction",
        "https://sellers.invalid",
        "https://buyers.invalid",
    )?);
    let mut workload = driver(&ledger, 0);
    workload.setup(config, WorkerContext::new(0, 1, 0)).await?;

    workload.step().await?;
    workload.step().await?;
    workload.teardown().await?;

    let history = ledger.history().await;
    assert_eq!(history.len(), 2);
    for request in &history {
        assert_eq!(request.function_name(), "MapBuyersToSellers");
        assert_eq!(
            request.arguments(),
            ["https://sellers.invalid", "https://buyers.invalid"]
        );
        assert!(!request.read_only());
    }
    Ok(())
}

#[tokio::test]
async fn deleting_a_missing_asset_is_reported_by_the_ledger() -> Result<()> {
    let ledger = car_ledger()?;
    let config = presets::car_round(CONTRACT, 1)?;
    let request =
        RequestBuilder::new(&config, WorkerContext::new(0, 1, 0)).build(RequestKind::Delete, 0)?;

    let err = ledger.submit(request).await.unwrap_err();
    assert_eq!(err.to_string(), "asset 0_0 does not exist");
    Ok(())
}
