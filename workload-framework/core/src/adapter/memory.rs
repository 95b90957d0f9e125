use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::debug;

use super::{AdapterError, SubmissionAdapter, SubmissionResponse};
use crate::request::{InvocationRequest, OperationSet, RequestKind};

/// Keyed in-process ledger standing in for a deployed contract.
///
/// Function names are routed through an [`OperationSet`], so create and
/// delete act as inverse operations on the key in the first argument.
pub struct InMemoryLedger {
    contract_id: String,
    routes: Vec<(String, RequestKind)>,
    state: Mutex<LedgerState>,
}

#[derive(Default)]
struct LedgerState {
    assets: BTreeMap<String, Vec<String>>,
    history: Vec<InvocationRequest>,
}

impl InMemoryLedger {
    #[must_use]
    pub fn new(contract_id: impl Into<String>, operations: &OperationSet) -> Self {
        let mut routes = vec![
            (operations.create.function.clone(), RequestKind::Create),
            (operations.read.function.clone(), RequestKind::Read),
            (operations.delete.function.clone(), RequestKind::Delete),
        ];
        if let Some(submit) = &operations.submit {
            routes.push((submit.function.clone(), RequestKind::Submit));
        }

        Self {
            contract_id: contract_id.into(),
            routes,
            state: Mutex::new(LedgerState::default()),
        }
    }

    /// Keys currently stored, in sorted order.
    pub async fn asset_ids(&self) -> Vec<String> {
        self.state.lock().await.assets.keys().cloned().collect()
    }

    pub async fn asset(&self, id: &str) -> Option<Vec<String>> {
        self.state.lock().await.assets.get(id).cloned()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.assets.is_empty()
    }

    /// Every request accepted or rejected so far, in arrival order.
    ///
    /// The history is never pruned, so long duration rounds hold every
    /// request they submitted in memory.
    pub async fn history(&self) -> Vec<InvocationRequest> {
        self.state.lock().await.history.clone()
    }

    fn route(&self, function: &str) -> Option<RequestKind> {
        self.routes
            .iter()
            .find(|(name, _)| name == function)
            .map(|(_, kind)| *kind)
    }
}

#[async_trait]
impl SubmissionAdapter for InMemoryLedger {
    async fn submit(
        &self,
        request: InvocationRequest,
    ) -> Result<SubmissionResponse, AdapterError> {
        let mut state = self.state.lock().await;
        state.history.push(request.clone());

        if request.contract_id() != self.contract_id {
            return Err(AdapterError::msg(format!(
                "contract '{}' is not deployed",
                request.contract_id()
            )));
        }

        let kind = self.route(request.function_name()).ok_or_else(|| {
            AdapterError::msg(format!(
                "function '{}' not found in contract '{}'",
                request.function_name(),
                self.contract_id
            ))
        })?;

        debug!(
            function = request.function_name(),
            %kind,
            args = request.arguments().len(),
            "in-memory ledger handling request"
        );

        if kind == RequestKind::Submit {
            return Ok(SubmissionResponse::with_payload(json!({
                "function": request.function_name(),
                "arguments": request.arguments(),
            })));
        }

        let key = request
            .arguments()
            .first()
            .filter(|id| !id.is_empty())
            .cloned()
            .ok_or_else(|| AdapterError::msg("asset id must not be empty"))?;

        match kind {
            RequestKind::Create => {
                if state.assets.contains_key(&key) {
                    return Err(AdapterError::msg(format!("asset {key} already exists")));
                }
                state
                    .assets
                    .insert(key, request.arguments()[1..].to_vec());
                Ok(SubmissionResponse::empty())
            }
            RequestKind::Read => state
                .assets
                .get(&key)
                .map(|fields| SubmissionResponse::with_payload(json!({ "id": key, "fields": fields })))
                .ok_or_else(|| AdapterError::msg(format!("asset {key} does not exist"))),
            RequestKind::Delete => state
                .assets
                .remove(&key)
                .map(|_| SubmissionResponse::empty())
                .ok_or_else(|| AdapterError::msg(format!("asset {key} does not exist"))),
            RequestKind::Submit => Ok(SubmissionResponse::empty()),
        }
    }
}
