pub mod adapter;
pub mod config;
pub mod identifier;
pub mod request;
pub mod scenario;

pub use adapter::{AdapterError, SubmissionAdapter, SubmissionResponse};
pub use config::{ConfigError, RoundConfig, WorkerContext};
pub use identifier::{AssetId, identifier_for};
pub use request::{InvocationRequest, OperationSet, RequestBuilder, RequestKind};
pub use scenario::{DriverState, DynError, Workload, WorkloadError};
