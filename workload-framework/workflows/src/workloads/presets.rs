//! Operation sets for the contracts the benchmark workloads were first
//! written against.

use workload_framework_core::{
    config::{ConfigError, RoundConfig, StepMode},
    request::{OperationSet, OperationTemplate},
};

pub const SELLERS_URL_KEY: &str = "sellers_url";
pub const BUYERS_URL_KEY: &str = "buyers_url";

/// Car asset contract: `CreateCar(carID, make, model, color,
/// manufacturerName, dateOfManufacture)`, `ReadCar(carID)`,
/// `DeleteCar(carID)`.
pub fn car() -> Result<OperationSet, ConfigError> {
    car_with_attributes(["Toyota", "Corolla", "Blue", "ManufacturerCo", "2025-09-01"])
}

/// Same contract as [`car`], seeded with the automobile attribute tuple.
pub fn automobile() -> Result<OperationSet, ConfigError> {
    car_with_attributes(["SUV", "XUV 700", "Blue", "03/05/23", "Mahindra"])
}

/// Car contract whose created assets carry the given attribute values after
/// the identifier.
pub fn car_with_attributes<'a>(
    attributes: impl IntoIterator<Item = &'a str>,
) -> Result<OperationSet, ConfigError> {
    let args = std::iter::once("{id}").chain(attributes);
    Ok(OperationSet {
        create: OperationTemplate::new("CreateCar").with_args(args)?,
        read: OperationTemplate::new("ReadCar"),
        delete: OperationTemplate::new("DeleteCar"),
        submit: None,
    })
}

/// Auction matching contract: each step invokes
/// `MapBuyersToSellers(sellersURL, buyersURL)` with the URLs taken from the
/// round's extra arguments.
pub fn auction() -> Result<OperationSet, ConfigError> {
    Ok(OperationSet {
        submit: Some(
            OperationTemplate::new("MapBuyersToSellers")
                .with_args([format!("{{{SELLERS_URL_KEY}}}"), format!("{{{BUYERS_URL_KEY}}}")])?,
        ),
        ..OperationSet::default()
    })
}

/// Read-heavy car round with `asset_count` cars per worker.
pub fn car_round(contract_id: &str, asset_count: u64) -> Result<RoundConfig, ConfigError> {
    Ok(RoundConfig::new(contract_id, asset_count).with_operations(car()?))
}

/// Submission-only auction round; there is nothing to pre-create.
pub fn auction_round(
    contract_id: &str,
    sellers_url: &str,
    buyers_url: &str,
) -> Result<RoundConfig, ConfigError> {
    Ok(RoundConfig::new(contract_id, 0)
        .with_operations(auction()?)
        .with_extra_arg(SELLERS_URL_KEY, sellers_url)
        .with_extra_arg(BUYERS_URL_KEY, buyers_url)
        .with_step_mode(StepMode::Submit))
}
