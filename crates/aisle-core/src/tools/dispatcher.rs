//! Concurrent tool execution
//!
//! Every request in a step is spawned at once; the dispatcher waits for all
//! of them and hands back one outcome per request, in request order. No
//! failure escapes: unknown tools, bad input, backend errors and panics all
//! become `{"error": ...}` payloads the model can read.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use super::{actions, PendingAction, ToolInvocation, ToolOutput};
use crate::backend::PlannerBackend;
use crate::error::ToolError;
use crate::provider::{ToolCallRequest, ToolResult};

/// Result of one request plus any UI action it produced
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub result: ToolResult,
    pub action: Option<PendingAction>,
}

impl ToolOutcome {
    fn failed(id: &str, message: impl Into<String>) -> Self {
        Self {
            result: ToolResult::error(id, message),
            action: None,
        }
    }
}

/// Executes tool requests against the planner backend
#[derive(Clone)]
pub struct ToolDispatcher {
    backend: Arc<dyn PlannerBackend>,
}

impl ToolDispatcher {
    pub fn new(backend: Arc<dyn PlannerBackend>) -> Self {
        Self { backend }
    }

    /// Run all requests concurrently and wait for every one of them
    ///
    /// The returned outcomes line up index-for-index with `requests`,
    /// whatever order the tasks finished in.
    pub async fn dispatch(&self, requests: &[ToolCallRequest]) -> Vec<ToolOutcome> {
        let mut join_set: JoinSet<(usize, ToolOutcome)> = JoinSet::new();

        for (index, request) in requests.iter().enumerate() {
            let backend = self.backend.clone();
            let request = request.clone();
            join_set.spawn(async move {
                let outcome = AssertUnwindSafe(execute_request(backend.as_ref(), &request))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| {
                        error!(tool = %request.name, id = %request.id, "Tool panicked");
                        ToolOutcome::failed(&request.id, format!("{} failed unexpectedly", request.name))
                    });
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<ToolOutcome>> = vec![None; requests.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => error!("Tool task failed: {:?}", e),
            }
        }

        slots
            .into_iter()
            .zip(requests)
            .map(|(slot, request)| {
                slot.unwrap_or_else(|| ToolOutcome::failed(&request.id, "tool task did not complete"))
            })
            .collect()
    }
}

/// Execute a single request, converting any failure into an error payload
async fn execute_request(backend: &dyn PlannerBackend, request: &ToolCallRequest) -> ToolOutcome {
    let result = match ToolInvocation::parse(&request.name, request.input.clone()) {
        Ok(invocation) => run(backend, invocation).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(output) => {
            debug!(tool = %request.name, id = %request.id, action = output.action.is_some(), "Tool succeeded");
            ToolOutcome {
                result: ToolResult::ok(&request.id, output.content),
                action: output.action,
            }
        }
        Err(e) => {
            warn!(tool = %request.name, id = %request.id, error = %e, "Tool failed");
            ToolOutcome::failed(&request.id, e.to_string())
        }
    }
}

async fn run(backend: &dyn PlannerBackend, invocation: ToolInvocation) -> Result<ToolOutput, ToolError> {
    match invocation {
        ToolInvocation::ListCouples => {
            let couples = backend.list_couples().await?;
            Ok(ToolOutput::data(to_content(&couples)?))
        }
        ToolInvocation::CoupleVendors { couple_id } => {
            let vendors = backend.couple_vendors(&couple_id).await?;
            Ok(ToolOutput::data(to_content(&vendors)?))
        }
        ToolInvocation::ParseCouple { description } => {
            let draft = backend.parse_couple(&description).await?;
            Ok(ToolOutput::data(to_content(&draft)?))
        }
        ToolInvocation::OpenCoupleModal { prefill } => Ok(actions::open_couple_modal(prefill)),
        ToolInvocation::Navigate { url } => actions::navigate(&url),
    }
}

fn to_content<T: Serialize>(value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|e| ToolError::ExecutionFailed(e.to_string()))
}
