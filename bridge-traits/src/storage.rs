//! Durable File Storage Abstraction
//!
//! The widget's session cache and debug snapshots live in a host-provided
//! storage location. On some hosts that location is cloud-synced storage that
//! offloads file content and versions files on naive overwrite, which is why
//! the trait exposes an explicit [`FileStore::materialize`] step and a
//! delete-then-write [`FileStore::replace`].

use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;

use crate::error::Result;

/// Durable file storage trait
///
/// Abstracts the storage backend used for the session cache:
/// - Desktop: a plain data directory on local disk
/// - Mobile widget runtimes: app documents, possibly cloud-synced
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::FileStore;
///
/// async fn load(store: &dyn FileStore, path: &Path) -> Result<Option<Bytes>> {
///     if !store.exists(path).await? {
///         return Ok(None);
///     }
///     store.materialize(path).await?;
///     Ok(Some(store.read(path).await?))
/// }
/// ```
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Check if a file exists
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Ensure the file content is present locally.
    ///
    /// Cloud-synced backends may keep only a placeholder on device; callers
    /// must materialize before [`FileStore::read`]. A failure here is an I/O
    /// condition worth retrying on a later invocation, not corrupt data.
    /// Backends with purely local storage implement this as a no-op.
    async fn materialize(&self, path: &Path) -> Result<()>;

    /// Read entire file contents into memory
    async fn read(&self, path: &Path) -> Result<Bytes>;

    /// Write data to a file, creating it and parent directories as needed
    async fn write(&self, path: &Path, data: Bytes) -> Result<()>;

    /// Delete a file
    async fn delete(&self, path: &Path) -> Result<()>;

    /// Replace a file so that no stale copy remains readable afterward.
    ///
    /// Some backends silently version or rename on naive overwrite, so the
    /// prior file is removed before the new content is written.
    async fn replace(&self, path: &Path, data: Bytes) -> Result<()> {
        if self.exists(path).await? {
            self.delete(path).await?;
        }
        self.write(path, data).await
    }
}
