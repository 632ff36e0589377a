//! Retrieval strategies.
//!
//! A strategy turns one intercepted request into a response, consulting the
//! stores and the network in its own order. No retries, no backoff.

pub mod cache_first;
pub mod network_first;

use async_trait::async_trait;
use ledcache_core::{Error, Request, Response};

pub use cache_first::CacheFirst;
pub use network_first::NetworkFirst;

#[async_trait]
pub trait Strategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Produce a response, or the network failure left after every fallback.
    async fn respond(&self, request: &Request) -> Result<Response, Error>;
}
