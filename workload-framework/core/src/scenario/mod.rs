mod lifecycle;
pub mod runtime;
mod workload;

pub use lifecycle::{DriverState, Lifecycle, LifecycleOperation};
use thiserror::Error;
pub use workload::Workload;

use crate::{adapter::AdapterError, config::ConfigError};

pub type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),
    #[error("cannot {operation} while the workload is {state}")]
    InvalidState {
        operation: LifecycleOperation,
        state: DriverState,
    },
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}
