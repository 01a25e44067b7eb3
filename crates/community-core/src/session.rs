//! Session store - the signed-in user, shared by every view.
//!
//! One store exists per process. It is restored from a persisted slot at
//! startup and rewrites that slot after every mutation. Reads are
//! synchronous; writers are serialized so the persisted slot always holds
//! the latest state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, watch};

use crate::domain::{SessionUser, UserPatch};
use crate::error::SessionError;
use crate::ports::StateStore;

/// Slot the session is persisted under.
pub const SESSION_STORAGE_KEY: &str = "fast-community-user";

const SNAPSHOT_VERSION: u32 = 0;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedEnvelope {
    state: PersistedSession,
    #[serde(default)]
    version: u32,
}

/// Only the user is persisted.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedSession {
    user: Option<SessionUser>,
}

pub struct SessionStore {
    storage: Arc<dyn StateStore>,
    key: String,
    user: watch::Sender<Option<SessionUser>>,
    write_lock: Mutex<()>,
}

impl SessionStore {
    /// Create an empty store without reading the persisted slot.
    pub fn new(storage: Arc<dyn StateStore>) -> Self {
        Self::with_key(storage, SESSION_STORAGE_KEY, None)
    }

    /// Restore the store from [`SESSION_STORAGE_KEY`].
    pub async fn load(storage: Arc<dyn StateStore>) -> Self {
        Self::load_with_key(storage, SESSION_STORAGE_KEY).await
    }

    /// Restore the store from a custom slot.
    ///
    /// A missing slot yields an empty session. An unreadable or corrupt slot is
    /// logged and ignored; the next mutation overwrites it.
    pub async fn load_with_key(storage: Arc<dyn StateStore>, key: impl Into<String>) -> Self {
        let key = key.into();

        let user = match storage.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<PersistedEnvelope>(&raw) {
                Ok(envelope) => {
                    if envelope.version != SNAPSHOT_VERSION {
                        tracing::warn!(
                            key = %key,
                            version = envelope.version,
                            "Persisted session has an unknown version"
                        );
                    }
                    envelope.state.user
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Discarding corrupt persisted session");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to read persisted session");
                None
            }
        };

        if let Some(user) = &user {
            tracing::debug!(user_id = %user.id, "Session restored");
        }

        Self::with_key(storage, key, user)
    }

    fn with_key(
        storage: Arc<dyn StateStore>,
        key: impl Into<String>,
        user: Option<SessionUser>,
    ) -> Self {
        let (user, _) = watch::channel(user);
        Self {
            storage,
            key: key.into(),
            user,
            write_lock: Mutex::new(()),
        }
    }

    /// Snapshot of the signed-in user.
    pub fn current(&self) -> Option<SessionUser> {
        self.user.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.borrow().is_some()
    }

    /// Receive every future change of the session.
    pub fn subscribe(&self) -> watch::Receiver<Option<SessionUser>> {
        self.user.subscribe()
    }

    /// Replace the session with `user`.
    pub async fn set_user(&self, user: SessionUser) {
        let _guard = self.write_lock.lock().await;

        tracing::debug!(user_id = %user.id, "Session user set");
        self.user.send_replace(Some(user.clone()));
        self.persist(Some(&user)).await;
    }

    /// Shallow-merge `patch` into the signed-in user.
    ///
    /// Without a signed-in user the update is rejected and nothing changes.
    pub async fn update_user(&self, patch: UserPatch) -> Result<SessionUser, SessionError> {
        let _guard = self.write_lock.lock().await;

        let current = self.user.borrow().clone();
        let Some(current) = current else {
            tracing::warn!("Rejected session update without a signed-in user");
            return Err(SessionError::NoActiveSession);
        };

        let merged = current
            .merged(&patch)
            .map_err(|e| SessionError::InvalidPatch(e.to_string()))?;

        tracing::debug!(user_id = %merged.id, "Session user updated");
        self.user.send_replace(Some(merged.clone()));
        self.persist(Some(&merged)).await;

        Ok(merged)
    }

    /// Sign the user out locally. Calling it again has no further effect.
    pub async fn clear_user(&self) {
        let _guard = self.write_lock.lock().await;

        if self.user.send_if_modified(|user| user.take().is_some()) {
            tracing::debug!("Session cleared");
        }
        self.persist(None).await;
    }

    async fn persist(&self, user: Option<&SessionUser>) {
        let envelope = PersistedEnvelope {
            state: PersistedSession {
                user: user.cloned(),
            },
            version: SNAPSHOT_VERSION,
        };

        let raw = match serde_json::to_string(&envelope) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Failed to serialize session");
                return;
            }
        };

        if let Err(e) = self.storage.set(&self.key, &raw).await {
            tracing::warn!(key = %self.key, error = %e, "Failed to persist session");
        }
    }
}
