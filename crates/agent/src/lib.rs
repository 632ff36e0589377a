//! The offline-caching agent for the LED display web app.
//!
//! This crate provides request classification, the cache-first and
//! network-first strategies, store population and pruning, and the
//! install/activate lifecycle, all driven through [`Worker`].

pub mod classify;
pub mod dispatch;
pub mod fetch;
pub mod lifecycle;
pub mod stores;
pub mod strategy;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use classify::{Classifier, RoutingCategory};
pub use dispatch::Dispatcher;
pub use fetch::{FetchClient, FetchConfig, Network};
pub use lifecycle::{LifecycleController, LifecycleState};
pub use stores::{PopulationReport, PruneReport, StoreManager};
pub use worker::{ControlMessage, Event, Outcome, StoreStatus, Worker, WorkerStatus};
