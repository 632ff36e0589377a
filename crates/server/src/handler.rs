//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the worker.
use std::sync::Arc;

use crate::tools::{
    CacheGetParams, FetchParams, MessageParams, clients_released_impl, fetch_impl, get_impl, message_impl,
    status_impl,
};

use ledcache_agent::Worker;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use url::Url;

/// The main MCP server handler for ledcache.
#[derive(Clone)]
pub struct LedCacheServer {
    worker: Arc<Worker>,
    origin: Url,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl LedCacheServer {
    /// Create a new server handler around a started worker.
    pub fn new(worker: Arc<Worker>, origin: Url) -> Self {
        Self { worker, origin, tool_router: Self::tool_router() }
    }

    /// Answer a page request through the caching agent.
    #[tool(
        description = "Handle a request from the hosted page: device traffic goes straight to the network, static assets are served cache-first, CDN assets network-first."
    )]
    async fn fetch(&self, params: Parameters<FetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, &self.origin, params.0).await
    }

    /// Post a control message to the agent.
    #[tool(description = "Post a control message from the page. {\"type\": \"SKIP_WAITING\"} forces activation.")]
    async fn message(&self, params: Parameters<MessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.worker, params.0).await
    }

    /// Signal that every page of the previous instance has closed.
    #[tool(description = "Signal that all pages controlled by the previous version have closed. Activates a waiting agent.")]
    async fn clients_released(&self) -> Result<CallToolResult, McpError> {
        clients_released_impl(&self.worker).await
    }

    /// Report lifecycle state and store contents.
    #[tool(description = "Report the lifecycle state, whether pages are controlled, and entry counts per cache store.")]
    async fn status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.worker).await
    }

    /// Look up a URL in the cache stores.
    #[tool(description = "Look up a URL in the cache stores without touching the network.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.worker, &self.origin, params.0).await
    }
}

impl ServerHandler for LedCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "ledcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{origin, worker};
    use ledcache_core::MemoryStorage;

    #[test]
    fn test_tools_registered() {
        let server = LedCacheServer::new(Arc::new(worker(&MemoryStorage::new(), false, true)), origin());
        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(names, vec!["cache_get", "clients_released", "fetch", "message", "status"]);
    }
}
