//! Worker fixtures for tool tests.

use std::sync::Arc;

use async_trait::async_trait;
use ledcache_agent::{Network, Worker};
use ledcache_core::{AppConfig, Error, MemoryStorage, Request, Response};
use rmcp::model::CallToolResult;

/// Answers every request with 200, echoing the request body or else the URL,
/// unless offline.
pub(crate) struct EchoNetwork {
    pub(crate) offline: bool,
}

#[async_trait]
impl Network for EchoNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        if self.offline {
            return Err(Error::NetworkFailure(format!("{}: unreachable", request.url)));
        }
        let body = request.body.clone().unwrap_or_else(|| request.url.to_string().into());
        let mut response = Response::new(request.url.as_str(), 200, body);
        response.headers.push(("content-type".into(), "text/plain".into()));
        Ok(response)
    }
}

pub(crate) fn worker(storage: &MemoryStorage, offline: bool, skip_waiting: bool) -> Worker {
    let config = AppConfig { skip_waiting_on_install: skip_waiting, ..Default::default() };
    Worker::new(&config, Arc::new(storage.clone()), Arc::new(EchoNetwork { offline })).unwrap()
}

pub(crate) fn origin() -> url::Url {
    url::Url::parse("http://localhost:8080/").unwrap()
}

/// Parse the JSON text content of a tool result.
pub(crate) fn output(result: &CallToolResult) -> serde_json::Value {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
