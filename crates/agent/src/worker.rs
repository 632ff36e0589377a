//! The event table binding lifecycle and fetch handling together.
//!
//! Outer layers (the MCP server, tests) feed [`Event`]s to
//! [`Worker::handle`]; classifier and strategies never see events.

use std::sync::Arc;

use ledcache_core::{AppConfig, CacheStorage, Error, Request, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dispatch::Dispatcher;
use crate::fetch::Network;
use crate::lifecycle::{LifecycleController, LifecycleState};
use crate::stores::{PopulationReport, PruneReport, StoreManager};

/// Messages a page can post to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ControlMessage {
    #[serde(rename = "SKIP_WAITING")]
    SkipWaiting,
}

impl ControlMessage {
    /// Recognise a posted message. Anything else, including non-objects and
    /// unknown `type` values, is None.
    pub fn parse(data: &Value) -> Option<Self> {
        Self::deserialize(data).ok()
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    Install,
    Activate,
    Fetch(Request),
    Message(Value),
    ClientsReleased,
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Activate => "activate",
            Self::Fetch(_) => "fetch",
            Self::Message(_) => "message",
            Self::ClientsReleased => "clients_released",
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    Installed(PopulationReport),
    Activated(PruneReport),
    Response(Response),
    /// `recognised` is false for ignored messages.
    Message { recognised: bool, activated: bool },
    ClientsReleased { activated: bool },
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreStatus {
    pub name: String,
    pub entries: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkerStatus {
    pub state: LifecycleState,
    /// Activation after install is automatic.
    pub skip_waiting_configured: bool,
    /// A `SKIP_WAITING` message has been received.
    pub skip_waiting_received: bool,
    pub clients_claimed: bool,
    pub stores: Vec<StoreStatus>,
}

pub struct Worker {
    stores: Arc<StoreManager>,
    lifecycle: LifecycleController,
    dispatcher: Dispatcher,
    network: Arc<dyn Network>,
}

impl Worker {
    pub fn new(config: &AppConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Result<Self, Error> {
        let stores = Arc::new(StoreManager::from_config(config, storage, Arc::clone(&network))?);
        let dispatcher = Dispatcher::from_config(config, Arc::clone(&stores), Arc::clone(&network))?;
        let lifecycle = LifecycleController::new(Arc::clone(&stores), config.skip_waiting_on_install);
        Ok(Self { stores, lifecycle, dispatcher, network })
    }

    pub fn lifecycle(&self) -> &LifecycleController {
        &self.lifecycle
    }

    pub fn stores(&self) -> &Arc<StoreManager> {
        &self.stores
    }

    /// Run the install event, activating too when skip-waiting is configured.
    pub async fn start(&self) -> Result<PopulationReport, Error> {
        match self.handle(Event::Install).await? {
            Outcome::Installed(report) => Ok(report),
            other => Err(Error::InvalidInput(format!("unexpected install outcome: {other:?}"))),
        }
    }

    pub async fn handle(&self, event: Event) -> Result<Outcome, Error> {
        tracing::debug!(kind = event.kind(), "handling event");

        match event {
            Event::Install => self.lifecycle.install().await.map(Outcome::Installed),
            Event::Activate => self.lifecycle.activate().await.map(Outcome::Activated),
            Event::Fetch(request) => self.fetch(&request).await.map(Outcome::Response),
            Event::Message(data) => match ControlMessage::parse(&data) {
                Some(ControlMessage::SkipWaiting) => {
                    tracing::info!("forced activation requested");
                    let activated = self.lifecycle.skip_waiting().await?;
                    Ok(Outcome::Message { recognised: true, activated })
                }
                None => {
                    tracing::debug!(%data, "ignoring unknown message");
                    Ok(Outcome::Message { recognised: false, activated: false })
                }
            },
            Event::ClientsReleased => {
                let activated = self.lifecycle.clients_released().await?;
                Ok(Outcome::ClientsReleased { activated })
            }
        }
    }

    /// Pages are only intercepted once claimed; before that they talk to the
    /// network directly.
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        if !self.lifecycle.clients_claimed() {
            tracing::debug!(url = %request.url, "page not controlled yet, passing through");
            return self.network.fetch(request).await;
        }
        self.dispatcher.dispatch(request).await
    }

    pub async fn status(&self) -> Result<WorkerStatus, Error> {
        let storage = self.stores.storage();
        let mut stores = Vec::new();
        for name in storage.keys().await? {
            let entries = storage.entry_urls(&name).await?.len();
            stores.push(StoreStatus { name, entries });
        }

        Ok(WorkerStatus {
            state: self.lifecycle.state().await,
            skip_waiting_configured: self.lifecycle.skip_waiting_configured(),
            skip_waiting_received: self.lifecycle.skip_waiting_received(),
            clients_claimed: self.lifecycle.clients_claimed(),
            stores,
        })
    }
}
