//! fetch tool implementation.
//!
//! Delivers one page request to the worker, exactly as if the hosted page
//! had issued it, and reports the response the page would see.

use std::collections::BTreeMap;

use ledcache_agent::fetch::canonicalize;
use ledcache_agent::{Event, Outcome, Worker};
use ledcache_core::{Destination, Request, Response};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use super::json_result;
use crate::error::ToolError;

/// Input parameters for the fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FetchParams {
    /// The URL requested by the page. Relative URLs resolve against the app origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request destination; "document" marks a page navigation.
    #[serde(default)]
    pub destination: Destination,

    /// Request headers to forward.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Request body, sent unchanged (e.g. a form post to the display).
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for the fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FetchOutput {
    /// The canonical request URL.
    pub url: String,
    /// URL of the response, after redirects.
    pub final_url: String,
    pub status: u16,
    /// Content-Type header.
    pub content_type: Option<String>,
    /// Body as text; absent when the body is not UTF-8.
    pub body: Option<String>,
    /// Body size in bytes.
    pub body_len: usize,
}

impl FetchOutput {
    fn new(url: &Url, response: Response) -> Self {
        Self {
            url: url.to_string(),
            content_type: response.content_type().map(String::from),
            body: String::from_utf8(response.body.to_vec()).ok(),
            body_len: response.body.len(),
            final_url: response.url,
            status: response.status,
        }
    }
}

/// Implementation of the fetch tool.
pub async fn fetch_impl(worker: &Worker, origin: &Url, params: FetchParams) -> Result<CallToolResult, McpError> {
    if params.method.trim().is_empty() {
        return Err(ToolError::InvalidInput("method cannot be empty".into()).into());
    }

    let url = canonicalize(&params.url, origin).map_err(|e| ToolError::InvalidInput(e.to_string()))?;
    let mut request = Request::new(params.method.trim(), url.clone()).with_destination(params.destination);
    for (name, value) in &params.headers {
        request = request.with_header(name, value);
    }
    if let Some(body) = params.body {
        request = request.with_body(body);
    }

    match worker.handle(Event::Fetch(request)).await? {
        Outcome::Response(response) => Ok(json_result(&FetchOutput::new(&url, response))?),
        other => Err(McpError::internal_error(format!("unexpected fetch outcome: {other:?}"), None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{origin, output, worker};
    use ledcache_core::MemoryStorage;

    fn params(url: &str) -> FetchParams {
        FetchParams {
            url: url.into(),
            method: default_method(),
            destination: Destination::Empty,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    #[tokio::test]
    async fn test_fetch_empty_url() {
        let w = worker(&MemoryStorage::new(), false, true);
        let result = fetch_impl(&w, &origin(), params("  ")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_fetch_unsupported_scheme() {
        let w = worker(&MemoryStorage::new(), false, true);
        let result = fetch_impl(&w, &origin(), params("ftp://example.com/file")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_fetch_relative_url_resolves_against_origin() {
        let w = worker(&MemoryStorage::new(), false, true);
        w.start().await.unwrap();

        let result = fetch_impl(&w, &origin(), params("./app.js#top")).await.unwrap();
        let out = output(&result);
        assert_eq!(out["url"], "http://localhost:8080/app.js");
        assert_eq!(out["status"], 200);
        assert_eq!(out["content_type"], "text/plain");
        assert_eq!(out["body"], "http://localhost:8080/app.js");
    }

    #[tokio::test]
    async fn test_fetch_offline_navigation_gets_entry_page() {
        let storage = MemoryStorage::new();
        let online = worker(&storage, false, true);
        online.start().await.unwrap();

        let offline = worker(&storage, true, true);
        offline.start().await.unwrap();

        let mut p = params("/display");
        p.destination = Destination::Document;
        let out = output(&fetch_impl(&offline, &origin(), p).await.unwrap());
        assert_eq!(out["final_url"], "http://localhost:8080/index.html");
    }

    #[tokio::test]
    async fn test_fetch_offline_miss_is_error() {
        let w = worker(&MemoryStorage::new(), true, true);
        w.start().await.unwrap();

        let result = fetch_impl(&w, &origin(), params("/missing.css")).await;
        let err = result.unwrap_err();
        assert_eq!(err.code.0, -32008);
    }

    #[tokio::test]
    async fn test_fetch_body_reaches_device() {
        let w = worker(&MemoryStorage::new(), false, true);
        w.start().await.unwrap();

        let mut p = params("http://192.168.1.40/api/text");
        p.method = "POST".into();
        p.body = Some("TEXT=HELLO".into());
        let out = output(&fetch_impl(&w, &origin(), p).await.unwrap());
        assert_eq!(out["status"], 200);
        assert_eq!(out["body"], "TEXT=HELLO");
    }
}
