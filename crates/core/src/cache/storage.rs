//! The store interface the agent is written against.
//!
//! Strategy and lifecycle code only ever see `dyn CacheStorage`; the durable
//! SQLite backend and the volatile in-memory backend both implement it.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use crate::Error;
use crate::request::{Request, Response};

/// Named key-value stores mapping request identity to response snapshots.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the named store if it doesn't exist.
    async fn open(&self, name: &str) -> Result<(), Error>;

    /// Names of all existing stores.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Delete a store. Returns false if it didn't exist.
    async fn delete(&self, name: &str) -> Result<bool, Error>;

    /// Write an entry, replacing any previous one for the same request.
    async fn put(&self, store: &str, request: &Request, response: &Response) -> Result<(), Error>;

    /// Find the entry for `request`. A miss is `Ok(None)`.
    async fn lookup(&self, store: &str, request: &Request) -> Result<Option<Response>, Error>;

    /// Request URLs held by a store.
    async fn entry_urls(&self, store: &str) -> Result<Vec<String>, Error>;
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, name: &str) -> Result<(), Error> {
        self.open_store(name).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.store_names().await
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        self.delete_store(name).await
    }

    async fn put(&self, store: &str, request: &Request, response: &Response) -> Result<(), Error> {
        self.put_entry(store, request, response).await
    }

    async fn lookup(&self, store: &str, request: &Request) -> Result<Option<Response>, Error> {
        self.get_entry(store, request).await
    }

    async fn entry_urls(&self, store: &str) -> Result<Vec<String>, Error> {
        CacheDb::entry_urls(self, store).await
    }
}

struct MemoryEntry {
    key: String,
    url: String,
    response: Response,
}

struct MemoryStore {
    name: String,
    entries: Vec<MemoryEntry>,
}

/// Volatile stores held in process memory.
///
/// Used for ephemeral runs and as the store fake in tests. Stores and entries
/// keep insertion order.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    stores: Arc<RwLock<Vec<MemoryStore>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn position(stores: &[MemoryStore], name: &str) -> Option<usize> {
    stores.iter().position(|s| s.name == name)
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> Result<(), Error> {
        let mut stores = self.stores.write().await;
        if position(&stores, name).is_none() {
            stores.push(MemoryStore { name: name.to_string(), entries: Vec::new() });
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        Ok(self.stores.read().await.iter().map(|s| s.name.clone()).collect())
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        let mut stores = self.stores.write().await;
        match position(&stores, name) {
            Some(idx) => {
                stores.remove(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn put(&self, store: &str, request: &Request, response: &Response) -> Result<(), Error> {
        let key = compute_cache_key(&request.method, request.url.as_str());
        let mut stores = self.stores.write().await;
        let idx = match position(&stores, store) {
            Some(idx) => idx,
            None => {
                stores.push(MemoryStore { name: store.to_string(), entries: Vec::new() });
                stores.len() - 1
            }
        };

        let entries = &mut stores[idx].entries;
        let entry = MemoryEntry { key, url: request.url.to_string(), response: response.clone() };
        match entries.iter_mut().find(|e| e.key == entry.key) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        Ok(())
    }

    async fn lookup(&self, store: &str, request: &Request) -> Result<Option<Response>, Error> {
        let key = compute_cache_key(&request.method, request.url.as_str());
        let stores = self.stores.read().await;
        Ok(stores
            .iter()
            .find(|s| s.name == store)
            .and_then(|s| s.entries.iter().find(|e| e.key == key))
            .map(|e| e.response.clone()))
    }

    async fn entry_urls(&self, store: &str) -> Result<Vec<String>, Error> {
        let stores = self.stores.read().await;
        Ok(stores
            .iter()
            .find(|s| s.name == store)
            .map(|s| s.entries.iter().map(|e| e.url.clone()).collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn get(url: &str) -> Request {
        Request::get(Url::parse(url).unwrap())
    }

    async fn exercise(storage: &dyn CacheStorage) {
        let req = get("http://localhost:8080/index.html");
        let resp = Response::new(req.url.as_str(), 200, "<html></html>");

        storage.open("A-v1").await.unwrap();
        storage.open("A-v1").await.unwrap();
        storage.put("A-v1", &req, &resp).await.unwrap();

        assert_eq!(storage.lookup("A-v1", &req).await.unwrap(), Some(resp));
        assert_eq!(storage.lookup("A-v1", &get("http://localhost:8080/other.js")).await.unwrap(), None);
        assert_eq!(storage.entry_urls("A-v1").await.unwrap(), vec![req.url.to_string()]);
        assert_eq!(storage.keys().await.unwrap(), vec!["A-v1".to_string()]);

        let post = Request::new("POST", req.url.clone());
        assert_eq!(storage.lookup("A-v1", &post).await.unwrap(), None);

        assert!(storage.delete("A-v1").await.unwrap());
        assert!(storage.keys().await.unwrap().is_empty());
        assert_eq!(storage.lookup("A-v1", &req).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_storage_contract() {
        exercise(&MemoryStorage::new()).await;
    }

    #[tokio::test]
    async fn test_sqlite_storage_contract() {
        exercise(&CacheDb::open_in_memory().await.unwrap()).await;
    }

    #[tokio::test]
    async fn test_memory_put_creates_store_and_overwrites() {
        let storage = MemoryStorage::new();
        let req = get("http://localhost:8080/app.css");
        storage.put("s", &req, &Response::new(req.url.as_str(), 200, "a")).await.unwrap();
        storage.put("s", &req, &Response::new(req.url.as_str(), 200, "b")).await.unwrap();

        let hit = storage.lookup("s", &req).await.unwrap().unwrap();
        assert_eq!(hit.body.as_ref(), b"b");
        assert_eq!(storage.entry_urls("s").await.unwrap().len(), 1);
    }
}
