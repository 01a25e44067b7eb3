//! In-memory state store - used by tests and when nothing should outlive the process.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use community_core::ports::{StateStore, StateStoreError};

/// In-memory state store using a HashMap behind an async RwLock.
///
/// Note: Data is lost on process restart.
pub struct InMemoryStateStore {
    slots: RwLock<HashMap<String, String>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StateStoreError> {
        let slots = self.slots.read().await;
        Ok(slots.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StateStoreError> {
        let mut slots = self.slots.write().await;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StateStoreError> {
        let mut slots = self.slots.write().await;
        slots.remove(key);
        Ok(())
    }
}
