//! Cache store management: opening, precaching, pruning, gated writes.
//!
//! Partial failures never abort anything here. Population and pruning report
//! what went wrong and carry on; lookups treat storage errors as misses.

use std::sync::{Arc, Mutex};

use futures_util::future::join_all;
use ledcache_core::{AppConfig, CacheStorage, Error, Request, Response, StoreNames};
use tokio::task::JoinHandle;
use url::Url;

use crate::fetch::Network;

/// Outcome of populating one store from a URL list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulationReport {
    /// URLs written to their store.
    pub cached: Vec<String>,
    /// URLs that could not be cached, with the reason.
    pub failed: Vec<(String, String)>,
}

impl PopulationReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    fn merge(&mut self, other: PopulationReport) {
        self.cached.extend(other.cached);
        self.failed.extend(other.failed);
    }
}

/// Outcome of deleting stale stores.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub deleted: Vec<String>,
    pub kept: Vec<String>,
    pub failed: Vec<(String, String)>,
}

/// Owns the current-version stores and everything that touches them.
pub struct StoreManager {
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    names: StoreNames,
    precache: Vec<Url>,
    cdn_urls: Vec<Url>,
    /// Detached writes not yet known to be finished.
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl StoreManager {
    pub fn new(
        storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>, names: StoreNames, precache: Vec<Url>,
        cdn_urls: Vec<Url>,
    ) -> Self {
        Self { storage, network, names, precache, cdn_urls, pending: Mutex::new(Vec::new()) }
    }

    /// Build from configuration, resolving manifest paths against the origin.
    pub fn from_config(
        config: &AppConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>,
    ) -> Result<Self, Error> {
        let resolve = |paths: &[String]| -> Result<Vec<Url>, Error> {
            paths
                .iter()
                .map(|p| config.resolve(p).map_err(|e| Error::InvalidUrl(e.to_string())))
                .collect()
        };
        Ok(Self::new(
            storage,
            network,
            config.store_names(),
            resolve(&config.precache_paths)?,
            resolve(&config.cdn_urls)?,
        ))
    }

    pub fn names(&self) -> &StoreNames {
        &self.names
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    /// Open both current stores and precache the manifest and CDN lists.
    ///
    /// Both stores populate concurrently. Fails only if a store cannot be
    /// opened at all; individual URL failures land in the report.
    pub async fn ensure_stores(&self) -> Result<PopulationReport, Error> {
        self.storage.open(&self.names.assets).await?;
        self.storage.open(&self.names.cdn).await?;

        tracing::info!(store = %self.names.assets, count = self.precache.len(), "precaching local assets");
        tracing::info!(store = %self.names.cdn, count = self.cdn_urls.len(), "precaching CDN assets");

        let (mut report, cdn) = tokio::join!(
            self.populate(&self.names.assets, &self.precache),
            self.populate(&self.names.cdn, &self.cdn_urls)
        );
        report.merge(cdn);

        if !report.is_complete() {
            tracing::warn!(
                cached = report.cached.len(),
                failed = report.failed.len(),
                "some resources could not be precached"
            );
        }

        Ok(report)
    }

    async fn populate(&self, store: &str, urls: &[Url]) -> PopulationReport {
        let results = join_all(urls.iter().map(|url| self.precache_one(store, url))).await;

        let mut report = PopulationReport::default();
        for (url, result) in urls.iter().zip(results) {
            match result {
                Ok(()) => report.cached.push(url.to_string()),
                Err(reason) => {
                    tracing::warn!(%store, %url, %reason, "failed to precache");
                    report.failed.push((url.to_string(), reason));
                }
            }
        }
        report
    }

    async fn precache_one(&self, store: &str, url: &Url) -> Result<(), String> {
        let request = Request::get(url.clone());
        let response = self.network.fetch(&request).await.map_err(|e| e.to_string())?;
        if !response.is_ok() {
            return Err(format!("status {}", response.status));
        }
        self.storage
            .put(store, &request, &response)
            .await
            .map_err(|e| e.to_string())
    }

    /// Delete every store whose name is not in `whitelist`.
    ///
    /// Fails only if the store names cannot be listed.
    pub async fn prune_stores(&self, whitelist: &[String]) -> Result<PruneReport, Error> {
        let mut report = PruneReport::default();

        for name in self.storage.keys().await? {
            if whitelist.contains(&name) {
                report.kept.push(name);
                continue;
            }

            tracing::info!(store = %name, "deleting stale cache store");
            match self.storage.delete(&name).await {
                Ok(_) => report.deleted.push(name),
                Err(e) => {
                    tracing::warn!(store = %name, error = %e, "failed to delete cache store");
                    report.failed.push((name, e.to_string()));
                }
            }
        }

        Ok(report)
    }

    /// Write `response` for `request` if it is a 200 answer to a GET.
    ///
    /// Returns whether anything was written.
    pub async fn write_entry(&self, store: &str, request: &Request, response: &Response) -> Result<bool, Error> {
        if !request.is_get() || !response.is_ok() {
            tracing::debug!(%store, method = %request.method, status = response.status, url = %request.url, "not cacheable");
            return Ok(false);
        }
        self.storage.put(store, request, response).await?;
        Ok(true)
    }

    /// Schedule [`write_entry`](Self::write_entry) without waiting for it.
    ///
    /// The caller may receive the response before the write lands.
    pub fn write_entry_detached(self: &Arc<Self>, store: &str, request: &Request, response: &Response) {
        if !request.is_get() || !response.is_ok() {
            return;
        }
        let manager = Arc::clone(self);
        let store = store.to_string();
        let request = request.clone();
        let response = response.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = manager.write_entry(&store, &request, &response).await {
                tracing::warn!(%store, url = %request.url, error = %e, "cache write failed");
            }
        });

        let mut pending = self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// Wait for every detached write scheduled so far.
    pub async fn flush_writes(&self) {
        let handles: Vec<_> = {
            let mut pending = self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            pending.drain(..).collect()
        };
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "detached cache write did not complete");
            }
        }
    }

    /// First hit across the current stores, assets before CDN.
    pub async fn match_current(&self, request: &Request) -> Option<Response> {
        match self.lookup(&self.names.assets, request).await {
            Some(hit) => Some(hit),
            None => self.lookup(&self.names.cdn, request).await,
        }
    }

    /// Stored response for `request`, or None. Storage errors count as a miss.
    pub async fn lookup(&self, store: &str, request: &Request) -> Option<Response> {
        match self.storage.lookup(store, request).await {
            Ok(Some(hit)) => {
                tracing::debug!(%store, url = %request.url, "cache hit");
                Some(hit)
            }
            Ok(None) => {
                tracing::debug!(%store, url = %request.url, "cache miss");
                None
            }
            Err(e) => {
                tracing::warn!(%store, url = %request.url, error = %e, "cache lookup failed, treating as miss");
                None
            }
        }
    }
}
