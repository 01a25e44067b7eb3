//! # Community Infrastructure
//!
//! Concrete implementations of the ports defined in `community-core`.
//! This crate contains the backend clients and the state slots the session
//! store persists into.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory and file state only
//! - `rest` - Hosted REST backend client via reqwest
//! - `redis` - Redis state store

pub mod backend;
pub mod state;

#[cfg(feature = "rest")]
pub mod rest;

// Re-exports - In-Memory
pub use backend::InMemoryBackend;
pub use state::{FileStateStore, InMemoryStateStore};

// Re-exports - REST
#[cfg(feature = "rest")]
pub use rest::{RestBackend, RestConfig, RestConfigError};

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use state::{RedisConfig, RedisStateStore};
