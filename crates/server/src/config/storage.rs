use std::path::PathBuf;

use serde::Deserialize;

/// Configuration for the blob store, recording area, and resource index.
#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    /// Which backend to use: `"fs"` or `"memory"`.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Root directory for everything the server writes.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Keep a JSON snapshot of the index under `data_dir`.
    ///
    /// Defaults to `true` for the `fs` backend and `false` otherwise.
    pub persist_index: Option<bool>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            data_dir: default_data_dir(),
            persist_index: None,
        }
    }
}

impl StorageConfig {
    pub fn blobs_dir(&self) -> PathBuf {
        self.data_dir.join("blobs")
    }

    pub fn videos_dir(&self) -> PathBuf {
        self.data_dir.join("videos")
    }

    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join("index.json")
    }

    pub fn persists_index(&self) -> bool {
        self.persist_index.unwrap_or(self.backend == "fs")
    }
}

fn default_backend() -> String {
    "fs".to_owned()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
