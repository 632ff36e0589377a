//! clients_released and status tool implementations.

use ledcache_agent::{Event, Outcome, Worker};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::Serialize;

use super::json_result;

/// Output structure for the clients_released tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ClientsReleasedOutput {
    /// Whether the worker activated as a result.
    pub activated: bool,
    /// Lifecycle state after handling.
    pub state: String,
}

/// Implementation of the clients_released tool.
pub async fn clients_released_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let activated = match worker.handle(Event::ClientsReleased).await? {
        Outcome::ClientsReleased { activated } => activated,
        other => return Err(McpError::internal_error(format!("unexpected outcome: {other:?}"), None)),
    };

    let state = worker.lifecycle().state().await.to_string();
    Ok(json_result(&ClientsReleasedOutput { activated, state })?)
}

/// Implementation of the status tool.
pub async fn status_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let status = worker.status().await?;
    Ok(json_result(&status)?)
}
