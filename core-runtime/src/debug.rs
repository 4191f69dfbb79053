//! # Diagnostic Snapshots
//!
//! Records the last request/response pair of every network operation to a
//! well-known file, so a failed widget refresh can be diagnosed after the
//! fact without re-running it.
//!
//! Each operation kind writes to its own file (`last-<kind>.json`) inside the
//! data directory. Recording is best-effort: a snapshot that cannot be
//! written is logged and the operation proceeds, since diagnostics must never
//! break the thing they diagnose. Password values are masked before anything
//! touches disk.

use crate::error::{Error, Result};
use bridge_traits::storage::FileStore;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// The request half of a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestSnapshot {
    pub method: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// One recorded operation: the request plus whichever of response body or
/// transport error it produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugRecord {
    pub request: RequestSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Writes [`DebugRecord`]s to per-operation snapshot files.
#[derive(Clone)]
pub struct DebugRecorder {
    files: Arc<dyn FileStore>,
    data_dir: PathBuf,
}

impl DebugRecorder {
    pub fn new(files: Arc<dyn FileStore>, data_dir: PathBuf) -> Self {
        Self { files, data_dir }
    }

    /// Record a snapshot under `last-<kind>.json`, replacing any previous one.
    ///
    /// Failures are logged at warn level and swallowed.
    pub async fn record(&self, kind: &str, record: &DebugRecord) {
        if let Err(err) = self.try_record(kind, record).await {
            warn!(kind, error = %err, "Failed to write diagnostic snapshot");
        }
    }

    async fn try_record(&self, kind: &str, record: &DebugRecord) -> Result<()> {
        let text = serde_json::to_string_pretty(record)
            .map_err(|e| Error::Internal(format!("Snapshot serialization failed: {}", e)))?;
        let masked = mask_passwords(&text);
        let path = self.data_dir.join(format!("last-{}.json", kind));
        self.files
            .replace(&path, Bytes::from(masked))
            .await
            .map_err(|e| Error::Internal(format!("Snapshot write failed: {}", e)))?;
        Ok(())
    }
}

/// Mask every `password=` value in `text` with `*****`.
///
/// Values end at the next `&`, double quote, or whitespace, covering both
/// form-encoded bodies and values embedded in JSON strings.
pub fn mask_passwords(text: &str) -> String {
    const NEEDLE: &str = "password=";

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find(NEEDLE) {
        let value_start = pos + NEEDLE.len();
        out.push_str(&rest[..value_start]);
        out.push_str("*****");

        let value = &rest[value_start..];
        let value_end = value
            .find(|c: char| c == '&' || c == '"' || c.is_whitespace())
            .unwrap_or(value.len());
        rest = &value[value_end..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        files: Mutex<HashMap<PathBuf, Bytes>>,
    }

    #[async_trait]
    impl FileStore for MemoryStore {
        async fn exists(&self, path: &Path) -> BridgeResult<bool> {
            Ok(self.files.lock().unwrap().contains_key(path))
        }
        async fn materialize(&self, _path: &Path) -> BridgeResult<()> {
            Ok(())
        }
        async fn read(&self, path: &Path) -> BridgeResult<Bytes> {
            self.files
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| bridge_traits::BridgeError::OperationFailed("not found".into()))
        }
        async fn write(&self, path: &Path, data: Bytes) -> BridgeResult<()> {
            self.files.lock().unwrap().insert(path.to_path_buf(), data);
            Ok(())
        }
        async fn delete(&self, path: &Path) -> BridgeResult<()> {
            self.files.lock().unwrap().remove(path);
            Ok(())
        }
    }

    #[test]
    fn test_mask_form_encoded_password() {
        let masked = mask_passwords("grant_type=password&username=alice&password=hunter2&client_id=x");
        assert!(!masked.contains("hunter2"));
        assert!(masked.contains("password=*****&client_id=x"));
    }

    #[test]
    fn test_mask_password_inside_json_string() {
        let masked = mask_passwords("\"body\": \"username=alice&password=hunter2\"");
        assert!(!masked.contains("hunter2"));
        assert!(masked.ends_with("password=*****\""));
    }

    #[test]
    fn test_mask_password_at_end_of_text() {
        assert_eq!(mask_passwords("password=secret"), "password=*****");
    }

    #[test]
    fn test_mask_leaves_other_text_alone() {
        let text = "grant_type=refresh_token&refresh_token=abc";
        assert_eq!(mask_passwords(text), text);
    }

    #[tokio::test]
    async fn test_record_writes_masked_snapshot() {
        let store = Arc::new(MemoryStore::default());
        let recorder = DebugRecorder::new(store.clone(), PathBuf::from("/data"));

        let record = DebugRecord {
            request: RequestSnapshot {
                method: "POST".to_string(),
                url: "https://example.com/token".to_string(),
                body: Some("username=alice&password=hunter2".to_string()),
            },
            response: Some(serde_json::json!({ "access_token": "tok" })),
            error: None,
        };
        recorder.record("authentication", &record).await;

        let written = store
            .read(Path::new("/data/last-authentication.json"))
            .await
            .unwrap();
        let text = String::from_utf8(written.to_vec()).unwrap();
        assert!(!text.contains("hunter2"));
        assert!(text.contains("password=*****"));
        assert!(text.contains("access_token"));
    }

    #[tokio::test]
    async fn test_record_replaces_previous_snapshot() {
        let store = Arc::new(MemoryStore::default());
        let recorder = DebugRecorder::new(store.clone(), PathBuf::from("/data"));

        let make = |url: &str| DebugRecord {
            request: RequestSnapshot {
                method: "POST".to_string(),
                url: url.to_string(),
                body: None,
            },
            response: None,
            error: Some("timed out".to_string()),
        };

        recorder.record("usage-query", &make("https://one.example")).await;
        recorder.record("usage-query", &make("https://two.example")).await;

        let written = store
            .read(Path::new("/data/last-usage-query.json"))
            .await
            .unwrap();
        let text = String::from_utf8(written.to_vec()).unwrap();
        assert!(text.contains("two.example"));
        assert!(!text.contains("one.example"));
    }
}
