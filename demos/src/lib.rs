pub mod defaults;
pub mod env;

pub use env::read_env_any;
pub use workload_framework_workflows::{RoundBuilder, presets};
