use std::{
    collections::BTreeMap,
    fs, io,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    request::{ArgumentTemplate, OperationSet, RequestKind},
    scenario::runtime::{RoundPlan, RoundSchedule, StepFailurePolicy, pacing_interval},
};

pub const DEFAULT_INVOKER_IDENTITY: &str = "User1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("contract id must not be empty")]
    EmptyContractId,
    #[error("{kind} requests need at least one pre-created asset (asset count is 0)")]
    NoAssets { kind: RequestKind },
    #[error("item index {item} is outside the asset range 0..{asset_count}")]
    ItemOutOfRange { item: u64, asset_count: u64 },
    #[error("no {kind} operation configured for this workload")]
    MissingOperation { kind: RequestKind },
    #[error("{kind} requests take exactly one identifier argument")]
    FixedArguments { kind: RequestKind },
    #[error("template placeholder '{{{key}}}' has no value in the round arguments")]
    UnknownPlaceholder { key: String },
    #[error("malformed argument template '{template}': {reason}")]
    MalformedTemplate {
        template: String,
        reason: &'static str,
    },
    #[error("worker index {worker} is outside 0..{total}")]
    WorkerOutOfRange { worker: u32, total: u32 },
    #[error("{field} must be non-zero")]
    ZeroValue { field: &'static str },
    #[error("round '{label}' sets both tx_number and tx_duration_secs")]
    AmbiguousSchedule { label: String },
    #[error("tps {tps} is not a usable pacing rate (one step per nanosecond at most)")]
    InvalidTps { tps: f64 },
    #[error("round '{label}' duration of {secs}s is too long to schedule")]
    DurationOutOfRange { label: String, secs: u64 },
    #[error("failed to read benchmark config {}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse benchmark config {}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// What a single `step()` submits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepMode {
    /// Read one uniformly chosen pre-created asset.
    #[default]
    RandomRead,
    /// Submit the configured `submit` operation, which has no per-item
    /// identifier.
    Submit,
}

/// Per-round workload arguments, fixed for the lifetime of a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundConfig {
    pub contract_id: String,
    #[serde(alias = "assets")]
    pub asset_count: u64,
    #[serde(default = "default_invoker_identity")]
    pub invoker_identity: String,
    /// Values substituted into `{key}` placeholders of argument templates.
    #[serde(default)]
    pub extra_args: BTreeMap<String, String>,
    #[serde(default)]
    pub operations: OperationSet,
    #[serde(default)]
    pub step_mode: StepMode,
}

fn default_invoker_identity() -> String {
    workload_framework_env::workload_invoker_identity()
        .unwrap_or_else(|| DEFAULT_INVOKER_IDENTITY.to_owned())
}

impl RoundConfig {
    #[must_use]
    pub fn new(contract_id: impl Into<String>, asset_count: u64) -> Self {
        Self {
            contract_id: contract_id.into(),
            asset_count,
            invoker_identity: default_invoker_identity(),
            extra_args: BTreeMap::new(),
            operations: OperationSet::default(),
            step_mode: StepMode::default(),
        }
    }

    #[must_use]
    pub fn with_operations(mut self, operations: OperationSet) -> Self {
        self.operations = operations;
        self
    }

    #[must_use]
    pub fn with_extra_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_args.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_invoker_identity(mut self, identity: impl Into<String>) -> Self {
        self.invoker_identity = identity.into();
        self
    }

    #[must_use]
    pub const fn with_step_mode(mut self, step_mode: StepMode) -> Self {
        self.step_mode = step_mode;
        self
    }

    /// Checks the parts of the configuration every workload relies on.
    ///
    /// Read-specific requirements (a non-zero asset count) are checked when
    /// a read request is built, because setup and teardown are valid with
    /// zero assets. Every `{key}` a template names must be present in
    /// `extra_args`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.contract_id.trim().is_empty() {
            return Err(ConfigError::EmptyContractId);
        }
        if self.step_mode == StepMode::Submit && self.operations.submit.is_none() {
            return Err(ConfigError::MissingOperation {
                kind: RequestKind::Submit,
            });
        }
        self.operations.validate()?;

        let templated = std::iter::once(&self.operations.create).chain(&self.operations.submit);
        for key in templated
            .flat_map(|template| &template.args)
            .flat_map(ArgumentTemplate::extra_keys)
        {
            if !self.extra_args.contains_key(key) {
                return Err(ConfigError::UnknownPlaceholder {
                    key: key.to_owned(),
                });
            }
        }
        Ok(())
    }
}

/// Identity of one worker within a round, assigned once at initialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerContext {
    pub worker_index: u32,
    pub total_workers: u32,
    pub round_index: u32,
}

impl WorkerContext {
    #[must_use]
    pub const fn new(worker_index: u32, total_workers: u32, round_index: u32) -> Self {
        Self {
            worker_index,
            total_workers,
            round_index,
        }
    }

    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_index >= self.total_workers {
            return Err(ConfigError::WorkerOutOfRange {
                worker: self.worker_index,
                total: self.total_workers,
            });
        }
        Ok(())
    }
}

/// A benchmark file: an optional seed plus the rounds to run in order.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BenchmarkConfig {
    #[serde(default)]
    pub seed: Option<u64>,
    pub rounds: Vec<RoundSettings>,
}

/// Harness-side settings of one round together with its workload arguments.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RoundSettings {
    pub label: String,
    pub workers: usize,
    #[serde(default)]
    pub tx_number: Option<u64>,
    #[serde(default)]
    pub tx_duration_secs: Option<u64>,
    #[serde(default)]
    pub tps: Option<f64>,
    #[serde(default)]
    pub step_failures: StepFailurePolicy,
    pub workload: RoundConfig,
}

const DEFAULT_TX_NUMBER: u64 = 1;

impl BenchmarkConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }
}

impl RoundSettings {
    /// Converts the file representation into a runnable plan, validating the
    /// workload arguments along the way.
    pub fn to_plan(&self) -> Result<RoundPlan, ConfigError> {
        let workers = NonZeroUsize::new(self.workers).ok_or(ConfigError::ZeroValue {
            field: "workers",
        })?;

        let schedule = match (self.tx_number, self.tx_duration_secs) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::AmbiguousSchedule {
                    label: self.label.clone(),
                });
            }
            (Some(0), None) => return Err(ConfigError::ZeroValue { field: "tx_number" }),
            (Some(count), None) => RoundSchedule::TxNumber(count),
            (None, Some(0)) => {
                return Err(ConfigError::ZeroValue {
                    field: "tx_duration_secs",
                });
            }
            (None, Some(secs)) => {
                let duration = Duration::from_secs(secs);
                if Instant::now().checked_add(duration).is_none() {
                    return Err(ConfigError::DurationOutOfRange {
                        label: self.label.clone(),
                        secs,
                    });
                }
                RoundSchedule::Duration(duration)
            }
            (None, None) => RoundSchedule::TxNumber(DEFAULT_TX_NUMBER),
        };

        if let Some(tps) = self.tps {
            if pacing_interval(tps).is_none() {
                return Err(ConfigError::InvalidTps { tps });
            }
        }

        self.workload.validate()?;

        Ok(RoundPlan {
            label: self.label.clone(),
            workers,
            schedule,
            tps: self.tps,
            step_failures: self.step_failures,
        })
    }
}
