//! Durable session cache.
//!
//! One JSON file per installation, kept in the data directory. Reads
//! distinguish the retryable case (storage misbehaved) from the terminal one
//! (the file exists but is not a session), because the manager reacts
//! differently: storage failures propagate, corruption discards the cache
//! and re-authenticates.

use crate::error::{AuthError, Result};
use crate::types::Session;
use bridge_traits::storage::FileStore;
use bytes::Bytes;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// File name of the session cache inside the data directory.
pub const SESSION_FILE_NAME: &str = "session.json";

/// Reads and writes the cached [`Session`].
#[derive(Clone)]
pub struct SessionStore {
    files: Arc<dyn FileStore>,
    path: PathBuf,
}

impl SessionStore {
    pub fn new(files: Arc<dyn FileStore>, data_dir: PathBuf) -> Self {
        let path = data_dir.join(SESSION_FILE_NAME);
        Self { files, path }
    }

    /// Whether a session cache file exists, without reading it.
    pub async fn exists(&self) -> Result<bool> {
        self.files
            .exists(&self.path)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))
    }

    /// Read the cached session, if any.
    ///
    /// Returns `Ok(None)` when no cache exists. Storage failures map to
    /// [`AuthError::Storage`]; an existing file that fails to deserialize
    /// maps to [`AuthError::CorruptSession`].
    #[instrument(skip(self))]
    pub async fn read(&self) -> Result<Option<Session>> {
        let exists = self
            .files
            .exists(&self.path)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        if !exists {
            debug!("No cached session");
            return Ok(None);
        }

        // Hosts that keep files off-device need a chance to fetch the bytes
        // before the read.
        self.files
            .materialize(&self.path)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        let bytes = self
            .files
            .read(&self.path)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        let session: Session = serde_json::from_slice(&bytes)
            .map_err(|e| AuthError::CorruptSession(e.to_string()))?;
        debug!(expires_at = %session.expires_at, "Loaded cached session");
        Ok(Some(session))
    }

    /// Persist `session`, replacing any previous cache wholesale.
    #[instrument(skip(self, session))]
    pub async fn write(&self, session: &Session) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(session)
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        self.files
            .replace(&self.path, Bytes::from(bytes))
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        debug!(expires_at = %session.expires_at, "Persisted session");
        Ok(())
    }

    /// Delete the cache. A missing file is not an error.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<()> {
        match self.files.exists(&self.path).await {
            Ok(true) => self
                .files
                .delete(&self.path)
                .await
                .map_err(|e| AuthError::Storage(e.to_string())),
            Ok(false) => Ok(()),
            Err(e) => {
                warn!(error = %e, "Could not check session cache before delete");
                Err(AuthError::Storage(e.to_string()))
            }
        }
    }
}
