//! ledcache server entry point.
//!
//! This is the main binary that installs the caching agent and boots the MCP
//! server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use ledcache_agent::{FetchClient, FetchConfig, Network, Worker};
use ledcache_core::{AppConfig, CacheDb, CacheStorage, MemoryStorage};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let names = config.store_names();
    tracing::info!(assets = %names.assets, cdn = %names.cdn, origin = %config.origin, "Starting ledcache on stdio transport");

    let storage: Arc<dyn CacheStorage> = if config.ephemeral {
        tracing::warn!("ephemeral mode, cache stores will not survive a restart");
        Arc::new(MemoryStorage::new())
    } else {
        Arc::new(CacheDb::open(&config.db_path).await?)
    };
    let network: Arc<dyn Network> = Arc::new(FetchClient::new(FetchConfig::from(&config))?);

    let worker = Arc::new(Worker::new(&config, storage, network)?);
    match worker.start().await {
        Ok(report) => tracing::info!(cached = report.cached.len(), failed = report.failed.len(), "install finished"),
        Err(e) => tracing::error!(error = %e, "install failed, requests will pass straight to the network"),
    }

    let handler = handler::LedCacheServer::new(Arc::clone(&worker), config.origin_url()?);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;
    worker.stores().flush_writes().await;

    Ok(())
}
