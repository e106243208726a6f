use std::sync::Arc;

use tracing::info;

use marti_blob::{BlobStore, RecordingArea};
use marti_blob_fs::{FsBlobStore, FsRecordingArea};
use marti_blob_memory::{MemoryBlobStore, MemoryRecordingArea};
use marti_index_memory::MemoryIndex;

use crate::config::StorageConfig;
use crate::error::ServerError;

/// Storage backends selected by `[storage]`.
pub struct Backends {
    pub blobs: Arc<dyn BlobStore>,
    pub recordings: Arc<dyn RecordingArea>,
    /// Serves as both the resource index and the feed store.
    pub index: Arc<MemoryIndex>,
}

/// Create the storage backends from the given configuration.
pub async fn create_backends(config: &StorageConfig) -> Result<Backends, ServerError> {
    let (blobs, recordings): (Arc<dyn BlobStore>, Arc<dyn RecordingArea>) =
        match config.backend.as_str() {
            "memory" => (
                Arc::new(MemoryBlobStore::new()),
                Arc::new(MemoryRecordingArea::new()),
            ),
            "fs" => (
                Arc::new(FsBlobStore::new(config.blobs_dir())),
                Arc::new(FsRecordingArea::new(config.videos_dir())),
            ),
            other => {
                return Err(ServerError::Config(format!(
                    "unknown storage backend: {other}"
                )));
            }
        };

    let index = if config.persists_index() {
        let path = config.index_path();
        let index = MemoryIndex::open(&path)
            .await
            .map_err(|e| ServerError::Config(format!("index snapshot {}: {e}", path.display())))?;
        info!(path = %path.display(), resources = index.len(), "index snapshot loaded");
        index
    } else {
        MemoryIndex::new()
    };

    info!(backend = %config.backend, data_dir = %config.data_dir.display(), "storage ready");
    Ok(Backends {
        blobs,
        recordings,
        index: Arc::new(index),
    })
}
