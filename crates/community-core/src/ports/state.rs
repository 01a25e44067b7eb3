use async_trait::async_trait;

/// Persistent key-value slots for client state (local files, Redis, in-memory).
///
/// Values are JSON documents owned by the caller; the store does not inspect them.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read a slot. `Ok(None)` if it was never written or has been deleted.
    async fn get(&self, key: &str) -> Result<Option<String>, StateStoreError>;

    /// Overwrite a slot.
    async fn set(&self, key: &str, value: &str) -> Result<(), StateStoreError>;

    /// Remove a slot. Removing a missing slot is not an error.
    async fn delete(&self, key: &str) -> Result<(), StateStoreError>;
}

/// State store errors.
#[derive(Debug, thiserror::Error)]
pub enum StateStoreError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("I/O failed: {0}")]
    Io(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}
