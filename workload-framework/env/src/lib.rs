use std::{env, path::PathBuf};

#[must_use]
pub fn slow_test_env() -> bool {
    env::var("SLOW_TEST_ENV").is_ok_and(|s| s == "true")
}

#[must_use]
pub fn rust_log() -> Option<String> {
    env::var("RUST_LOG").ok()
}

/// Benchmark file used by the runner binaries when no path is given.
#[must_use]
pub fn workload_round_config() -> Option<PathBuf> {
    env::var("WORKLOAD_ROUND_CONFIG").ok().map(PathBuf::from)
}

#[must_use]
pub fn workload_seed() -> Option<u64> {
    env::var("WORKLOAD_SEED")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
}

#[must_use]
pub fn workload_invoker_identity() -> Option<String> {
    env::var("WORKLOAD_INVOKER_IDENTITY").ok()
}
