//! cache_get tool implementation.
//!
//! Looks up a URL in a cache store without touching the network.

use ledcache_agent::Worker;
use ledcache_agent::fetch::canonicalize;
use ledcache_core::Request;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ToolError;
use crate::tools::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// The URL to look up. Relative URLs resolve against the app origin.
    pub url: String,

    /// Store to search. Defaults to both current stores, assets first.
    #[serde(default)]
    pub store: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    /// The canonical URL looked up.
    pub url: String,
    pub found: bool,
    pub status: Option<u16>,
    pub final_url: Option<String>,
    pub content_type: Option<String>,
    pub body_len: Option<usize>,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(worker: &Worker, origin: &Url, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let url = canonicalize(&params.url, origin).map_err(|e| ToolError::InvalidInput(e.to_string()))?;
    let request = Request::get(url.clone());
    let stores = worker.stores();

    let hit = match &params.store {
        Some(name) => {
            if !stores.storage().keys().await?.contains(name) {
                return Err(ToolError::UnknownStore(name.clone()).into());
            }
            stores.lookup(name, &request).await
        }
        None => stores.match_current(&request).await,
    };

    let output = CacheGetOutput {
        url: url.to_string(),
        found: hit.is_some(),
        status: hit.as_ref().map(|r| r.status),
        final_url: hit.as_ref().map(|r| r.url.clone()),
        content_type: hit.as_ref().and_then(|r| r.content_type().map(String::from)),
        body_len: hit.as_ref().map(|r| r.body.len()),
    };

    Ok(json_result(&output)?)
}
