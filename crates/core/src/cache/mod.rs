//! Named, versioned cache stores.
//!
//! This module provides the store abstraction the agent writes against and
//! its two backends:
//!
//! - SQLite via tokio-rusqlite, durable across restarts (WAL mode)
//! - In-memory, for ephemeral runs and tests
//!
//! Entries are keyed by a SHA-256 of request method and canonical URL.

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod storage;

pub use crate::Error;

pub use connection::CacheDb;
pub use storage::{CacheStorage, MemoryStorage};
