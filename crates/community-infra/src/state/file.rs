//! File-backed state store - one JSON file per slot, the local-storage of a CLI.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use community_core::ports::{StateStore, StateStoreError};

/// Stores each slot as `<dir>/<key>.json`.
///
/// Writes go to a temporary file first and are renamed into place, so a
/// crash never leaves a half-written slot behind.
pub struct FileStateStore {
    dir: PathBuf,
}

impl FileStateStore {
    /// Use `dir`, creating it if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StateStoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StateStoreError::Io(format!("{}: {e}", dir.display())))?;

        tracing::debug!(dir = %dir.display(), "Opened state directory");
        Ok(Self { dir })
    }

    /// Load the directory from `COMMUNITY_STATE_DIR`, defaulting to `.community`.
    pub async fn from_env() -> Result<Self, StateStoreError> {
        let dir = std::env::var("COMMUNITY_STATE_DIR").unwrap_or_else(|_| ".community".to_string());
        Self::open(dir).await
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Bytes outside `[A-Za-z0-9._-]` are percent-encoded, so distinct keys
    /// never share a file.
    fn slot_path(&self, key: &str) -> PathBuf {
        let mut name = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.') {
                name.push(char::from(byte));
            } else {
                name.push_str(&format!("%{byte:02X}"));
            }
        }
        self.dir.join(format!("{name}.json"))
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StateStoreError> {
        let path = self.slot_path(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StateStoreError::Io(format!("{}: {e}", path.display()))),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StateStoreError> {
        let path = self.slot_path(key);
        let tmp = path.with_extension("json.tmp");

        tokio::fs::write(&tmp, value)
            .await
            .map_err(|e| StateStoreError::Io(format!("{}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StateStoreError::Io(format!("{}: {e}", path.display())))?;

        tracing::trace!(key = %key, "State slot written");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StateStoreError> {
        let path = self.slot_path(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StateStoreError::Io(format!("{}: {e}", path.display()))),
        }
    }
}
