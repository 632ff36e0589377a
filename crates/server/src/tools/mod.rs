//! MCP tool implementations.
//!
//! This module contains all tools exposed by the ledcache server. Each tool
//! turns its parameters into a worker event and reports the outcome as JSON.

pub mod cache;
pub mod fetch;
pub mod lifecycle;
pub mod message;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheGetParams, get_impl};
pub use fetch::{FetchParams, fetch_impl};
pub use lifecycle::{clients_released_impl, status_impl};
pub use message::{MessageParams, message_impl};

use rmcp::model::{CallToolResult, Content};
use serde::Serialize;

use crate::error::ToolError;

/// Wrap a serializable output as a pretty-printed JSON text result.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, ToolError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| ToolError::InvalidInput(format!("failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
