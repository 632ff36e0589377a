//! Test doubles shared by the agent's unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ledcache_core::{AppConfig, CacheStorage, Error, MemoryStorage, Request, Response};

use crate::fetch::Network;
use crate::stores::StoreManager;

#[derive(Default)]
struct Script {
    offline: bool,
    failing: HashSet<String>,
    statuses: HashMap<String, u16>,
    received: Vec<Request>,
}

/// A [`Network`] that answers from a script and records every call.
///
/// By default every URL answers 200 with the URL as body. Clones share the
/// same script, so a test can keep a handle after giving one away.
#[derive(Clone, Default)]
pub(crate) struct ScriptedNetwork {
    script: Arc<Mutex<Script>>,
}

impl ScriptedNetwork {
    pub(crate) fn serving_everything() -> Self {
        Self::default()
    }

    pub(crate) fn offline() -> Self {
        let network = Self::default();
        network.set_offline(true);
        network
    }

    pub(crate) fn fail(self, url: &str) -> Self {
        self.script.lock().unwrap().failing.insert(url.to_string());
        self
    }

    pub(crate) fn status(self, url: &str, status: u16) -> Self {
        self.script.lock().unwrap().statuses.insert(url.to_string(), status);
        self
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.script.lock().unwrap().offline = offline;
    }

    /// `METHOD url` for every fetch so far.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.received().iter().map(|r| format!("{} {}", r.method, r.url)).collect()
    }

    /// Every request as the network saw it.
    pub(crate) fn received(&self) -> Vec<Request> {
        self.script.lock().unwrap().received.clone()
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let url = request.url.to_string();
        let mut script = self.script.lock().unwrap();
        script.received.push(request.clone());

        if script.offline || script.failing.contains(&url) {
            return Err(Error::NetworkFailure(format!("{url}: connection refused")));
        }
        let status = script.statuses.get(&url).copied().unwrap_or(200);
        Ok(Response::new(url.clone(), status, url))
    }
}

/// A store manager over the default configuration.
pub(crate) fn manager_with(storage: &MemoryStorage, network: &ScriptedNetwork) -> Arc<StoreManager> {
    manager_over(Arc::new(storage.clone()), network)
}

pub(crate) fn manager_over(storage: Arc<dyn CacheStorage>, network: &ScriptedNetwork) -> Arc<StoreManager> {
    let manager = StoreManager::from_config(&AppConfig::default(), storage, Arc::new(network.clone())).unwrap();
    Arc::new(manager)
}

/// [`MemoryStorage`] that errors on deleting chosen stores and on any lookup
/// in chosen stores.
#[derive(Clone, Default)]
pub(crate) struct FailingStorage {
    inner: MemoryStorage,
    failing_deletes: HashSet<String>,
    failing_lookups: HashSet<String>,
}

impl FailingStorage {
    pub(crate) fn new(inner: &MemoryStorage) -> Self {
        Self { inner: inner.clone(), ..Default::default() }
    }

    pub(crate) fn fail_delete(mut self, store: &str) -> Self {
        self.failing_deletes.insert(store.to_string());
        self
    }

    pub(crate) fn fail_lookup(mut self, store: &str) -> Self {
        self.failing_lookups.insert(store.to_string());
        self
    }
}

fn disk_error(op: &str, store: &str) -> Error {
    Error::Storage(format!("{op} {store}: disk I/O error"))
}

#[async_trait]
impl CacheStorage for FailingStorage {
    async fn open(&self, name: &str) -> Result<(), Error> {
        self.inner.open(name).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.inner.keys().await
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        if self.failing_deletes.contains(name) {
            return Err(disk_error("delete", name));
        }
        self.inner.delete(name).await
    }

    async fn put(&self, store: &str, request: &Request, response: &Response) -> Result<(), Error> {
        self.inner.put(store, request, response).await
    }

    async fn lookup(&self, store: &str, request: &Request) -> Result<Option<Response>, Error> {
        if self.failing_lookups.contains(store) {
            return Err(disk_error("lookup", store));
        }
        self.inner.lookup(store, request).await
    }

    async fn entry_urls(&self, store: &str) -> Result<Vec<String>, Error> {
        self.inner.entry_urls(store).await
    }
}
