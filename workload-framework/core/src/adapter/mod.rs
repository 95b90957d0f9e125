pub mod memory;

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use crate::{request::InvocationRequest, scenario::DynError};

/// Opaque failure from the submission boundary.
///
/// Transport errors and remote execution errors are carried as-is; the
/// driver never inspects or retries them.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct AdapterError(DynError);

impl AdapterError {
    pub fn new(source: impl Into<DynError>) -> Self {
        Self(source.into())
    }

    pub fn msg(message: impl fmt::Display) -> Self {
        Self(message.to_string().into())
    }

    #[must_use]
    pub fn into_inner(self) -> DynError {
        self.0
    }
}

/// Whatever the system under test answered. Workloads do not interpret it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubmissionResponse {
    pub payload: Option<serde_json::Value>,
}

impl SubmissionResponse {
    #[must_use]
    pub const fn empty() -> Self {
        Self { payload: None }
    }

    #[must_use]
    pub const fn with_payload(payload: serde_json::Value) -> Self {
        Self {
            payload: Some(payload),
        }
    }
}

/// Performs the actual call against the system under test.
#[async_trait]
pub trait SubmissionAdapter: Send + Sync {
    async fn submit(&self, request: InvocationRequest)
    -> Result<SubmissionResponse, AdapterError>;
}

#[async_trait]
impl<T> SubmissionAdapter for Arc<T>
where
    T: SubmissionAdapter + ?Sized,
{
    async fn submit(
        &self,
        request: InvocationRequest,
    ) -> Result<SubmissionResponse, AdapterError> {
        (**self).submit(request).await
    }
}
