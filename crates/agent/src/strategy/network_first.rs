//! Network-first: prefer fresh CDN content, fall back to the stores.

use std::sync::Arc;

use async_trait::async_trait;
use ledcache_core::{Error, Request, Response};

use super::Strategy;
use crate::fetch::Network;
use crate::stores::StoreManager;

/// Used for CDN requests.
pub struct NetworkFirst {
    stores: Arc<StoreManager>,
    network: Arc<dyn Network>,
}

impl NetworkFirst {
    pub fn new(stores: Arc<StoreManager>, network: Arc<dyn Network>) -> Self {
        Self { stores, network }
    }
}

#[async_trait]
impl Strategy for NetworkFirst {
    fn name(&self) -> &'static str {
        "network_first"
    }

    async fn respond(&self, request: &Request) -> Result<Response, Error> {
        match self.network.fetch(request).await {
            Ok(response) if response.is_ok() => {
                self.stores.write_entry_detached(&self.stores.names().cdn, request, &response);
                Ok(response)
            }
            // A real response that isn't 200: prefer a stored copy, otherwise pass it on.
            Ok(response) => match self.stores.match_current(request).await {
                Some(hit) => {
                    tracing::warn!(url = %request.url, status = response.status, "serving cached copy over bad status");
                    Ok(hit)
                }
                None => Ok(response),
            },
            Err(e) if e.is_network_failure() => match self.stores.match_current(request).await {
                Some(hit) => {
                    tracing::warn!(url = %request.url, error = %e, "network unavailable, serving cached copy");
                    Ok(hit)
                }
                None => Err(e),
            },
            Err(e) => Err(e),
        }
    }
}
