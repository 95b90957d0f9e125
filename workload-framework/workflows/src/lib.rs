pub mod builder;
pub mod workloads;

pub use builder::{BuilderInputError, RoundBuilder, ScheduledRound};
pub use workloads::{
    driver::{WorkloadDriver, driver_factory},
    presets,
};
