//! Per-request routing: classify, then hand off to the matching strategy.

use std::sync::Arc;

use ledcache_core::{AppConfig, Error, Request, Response};

use crate::classify::{Classifier, RoutingCategory};
use crate::fetch::Network;
use crate::stores::StoreManager;
use crate::strategy::{CacheFirst, NetworkFirst, Strategy};

pub struct Dispatcher {
    classifier: Classifier,
    network: Arc<dyn Network>,
    cache_first: CacheFirst,
    network_first: NetworkFirst,
}

impl Dispatcher {
    pub fn new(classifier: Classifier, stores: Arc<StoreManager>, network: Arc<dyn Network>, fallback: Request) -> Self {
        Self {
            classifier,
            cache_first: CacheFirst::new(Arc::clone(&stores), Arc::clone(&network), fallback),
            network_first: NetworkFirst::new(stores, Arc::clone(&network)),
            network,
        }
    }

    /// Build from configuration. The fallback document resolves against the origin.
    pub fn from_config(config: &AppConfig, stores: Arc<StoreManager>, network: Arc<dyn Network>) -> Result<Self, Error> {
        let fallback = config
            .resolve(&config.fallback_document)
            .map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self::new(Classifier::from_config(config), stores, network, Request::get(fallback)))
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// The strategy serving `category`. Bypass has none.
    pub fn strategy_for(&self, category: RoutingCategory) -> Option<&dyn Strategy> {
        match category {
            RoutingCategory::Bypass => None,
            RoutingCategory::StaticAsset | RoutingCategory::Default => Some(&self.cache_first),
            RoutingCategory::CdnAsset => Some(&self.network_first),
        }
    }

    /// Answer one intercepted request.
    pub async fn dispatch(&self, request: &Request) -> Result<Response, Error> {
        let category = self.classifier.classify(request);

        match self.strategy_for(category) {
            Some(strategy) => {
                tracing::debug!(method = %request.method, url = %request.url, %category, strategy = strategy.name(), "dispatching");
                strategy.respond(request).await
            }
            None => {
                tracing::debug!(method = %request.method, url = %request.url, "device request, bypassing cache");
                self.network.fetch(request).await
            }
        }
    }
}
