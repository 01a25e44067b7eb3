//! State store implementations - local files, Redis and in-memory.

mod file;
mod memory;

pub use file::FileStateStore;
pub use memory::InMemoryStateStore;

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::{RedisConfig, RedisStateStore};
