//! message tool implementation.
//!
//! Posts a control message from the page to the worker. Only
//! `{"type": "SKIP_WAITING"}` is understood; anything else is ignored.

use ledcache_agent::{Event, Outcome, Worker};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::json_result;

/// Input parameters for the message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MessageParams {
    /// The posted message, e.g. {"type": "SKIP_WAITING"}.
    pub data: Value,
}

/// Output structure for the message tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct MessageOutput {
    /// Whether the message type was understood.
    pub recognised: bool,
    /// Whether the message activated the worker.
    pub activated: bool,
    /// Lifecycle state after handling.
    pub state: String,
}

/// Implementation of the message tool.
pub async fn message_impl(worker: &Worker, params: MessageParams) -> Result<CallToolResult, McpError> {
    let (recognised, activated) = match worker.handle(Event::Message(params.data)).await? {
        Outcome::Message { recognised, activated } => (recognised, activated),
        other => return Err(McpError::internal_error(format!("unexpected message outcome: {other:?}"), None)),
    };

    let state = worker.lifecycle().state().await.to_string();
    Ok(json_result(&MessageOutput { recognised, activated, state })?)
}
