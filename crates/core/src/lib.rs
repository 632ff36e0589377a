//! Core types and shared functionality for ledcache.
//!
//! This crate provides:
//! - Cache store backends (SQLite and in-memory) behind one trait
//! - Request/response snapshot types
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod request;

pub use cache::{CacheDb, CacheStorage, MemoryStorage};
pub use config::{AppConfig, BypassMatching, ConfigError, StoreNames};
pub use error::Error;
pub use request::{Destination, Request, Response};
