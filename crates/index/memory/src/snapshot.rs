use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use marti_core::{FeedConnection, Resource};
use marti_index::IndexError;

/// On-disk image of an index.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct Snapshot {
    pub next_id: u64,
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub feeds: Vec<FeedConnection>,
}

/// Serializes snapshot writes to a single JSON file.
///
/// Each write goes to a sibling temporary file first and is renamed over the
/// target, so readers of the file only ever see a complete snapshot.
#[derive(Debug)]
pub(crate) struct SnapshotFile {
    path: PathBuf,
    lock: Mutex<()>,
}

fn backend(e: std::io::Error) -> IndexError {
    IndexError::Backend(e.to_string())
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot, or `None` when the file does not exist yet.
    pub async fn load(&self) -> Result<Option<Snapshot>, IndexError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(backend(e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| IndexError::Serialization(e.to_string()))
    }

    /// Write the snapshot produced by `capture`.
    ///
    /// `capture` runs while the write lock is held so the last writer always
    /// persists the most recent state.
    pub async fn write(&self, capture: impl FnOnce() -> Snapshot) -> Result<(), IndexError> {
        let _guard = self.lock.lock().await;
        let snapshot = capture();
        let json = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| IndexError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(backend)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await.map_err(backend)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(backend)?;
        debug!(
            path = %self.path.display(),
            resources = snapshot.resources.len(),
            feeds = snapshot.feeds.len(),
            "index snapshot written"
        );
        Ok(())
    }
}
