//! Structured errors for the ledcache server.
//!
//! Agent failures already carry their own codes via `ledcache_core::Error`;
//! these cover problems with the tool arguments themselves.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Structured errors for the ledcache server.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Invalid input parameters (e.g., empty URL, unknown method).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The named cache store does not exist.
    #[error("UNKNOWN_STORE: {0}")]
    UnknownStore(String),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let code = match &err {
            ToolError::InvalidInput(_) => -32602,
            ToolError::UnknownStore(_) => -32004,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
