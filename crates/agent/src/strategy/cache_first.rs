//! Cache-first: serve from the stores, fill them from the network on a miss.

use std::sync::Arc;

use async_trait::async_trait;
use ledcache_core::{Error, Request, Response};

use super::Strategy;
use crate::fetch::Network;
use crate::stores::StoreManager;

/// Used for static assets and uncategorised requests.
pub struct CacheFirst {
    stores: Arc<StoreManager>,
    network: Arc<dyn Network>,
    /// Entry page served when a navigation can't reach the network.
    fallback: Request,
}

impl CacheFirst {
    pub fn new(stores: Arc<StoreManager>, network: Arc<dyn Network>, fallback: Request) -> Self {
        Self { stores, network, fallback }
    }
}

#[async_trait]
impl Strategy for CacheFirst {
    fn name(&self) -> &'static str {
        "cache_first"
    }

    async fn respond(&self, request: &Request) -> Result<Response, Error> {
        if let Some(hit) = self.stores.match_current(request).await {
            return Ok(hit);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                self.stores.write_entry_detached(&self.stores.names().assets, request, &response);
                Ok(response)
            }
            Err(e) if e.is_network_failure() && request.is_navigation() => {
                match self.stores.match_current(&self.fallback).await {
                    Some(page) => {
                        tracing::warn!(url = %request.url, error = %e, fallback = %self.fallback.url, "serving cached entry page");
                        Ok(page)
                    }
                    None => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }
}
