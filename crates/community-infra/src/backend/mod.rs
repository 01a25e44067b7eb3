//! Backend implementations that live inside the process.

mod memory;

pub use memory::{DEMO_USER_ID, InMemoryBackend};
