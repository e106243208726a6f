use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncRead;
use tracing::{debug, info};

use marti_blob::{
    BlobError, BlobReader, RecordingArea, sanitize_file_name, validate_key_component,
};
use marti_core::Scope;

use crate::store::{discard, temp_path, write_temp};

/// Filesystem [`RecordingArea`] laid out as `<dir>/<scope>/<file name>`.
///
/// A payload is streamed into a temporary file and then hard-linked to its
/// final name. Linking never replaces an existing file, so the first writer
/// of a key keeps its bytes.
#[derive(Debug, Clone)]
pub struct FsRecordingArea {
    dir: PathBuf,
}

impl FsRecordingArea {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn scope_dir(&self, scope: &Scope) -> Result<PathBuf, BlobError> {
        validate_key_component(scope)?;
        Ok(self.dir.join(scope.as_str()))
    }

    fn path_for(&self, scope: &Scope, file_name: &str) -> Result<PathBuf, BlobError> {
        let name =
            sanitize_file_name(file_name).ok_or_else(|| BlobError::InvalidKey(file_name.to_owned()))?;
        Ok(self.scope_dir(scope)?.join(name))
    }
}

#[async_trait]
impl RecordingArea for FsRecordingArea {
    async fn put(
        &self,
        scope: &Scope,
        file_name: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<u64, BlobError> {
        let target = self.path_for(scope, file_name)?;
        let dir = self.scope_dir(scope)?;
        fs::create_dir_all(&dir).await?;

        let tmp = temp_path(&dir);
        let stored = match write_temp(&tmp, reader).await {
            Ok(stored) => stored,
            Err(e) => {
                discard(&tmp).await;
                return Err(e);
            }
        };

        let linked = fs::hard_link(&tmp, &target).await;
        discard(&tmp).await;
        match linked {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(path = %target.display(), "recording name already taken");
                return Err(BlobError::AlreadyExists {
                    scope: scope.to_string(),
                    name: file_name.to_owned(),
                });
            }
            Err(e) => return Err(e.into()),
        }

        info!(path = %target.display(), bytes = stored.size, "recording saved");
        Ok(stored.size)
    }

    async fn get(&self, scope: &Scope, file_name: &str) -> Result<BlobReader, BlobError> {
        let path = self.path_for(scope, file_name)?;
        match fs::File::open(&path).await {
            Ok(file) => Ok(Box::pin(file)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(BlobError::NotFound {
                scope: scope.to_string(),
                hash: file_name.to_owned(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, scope: &Scope, file_name: &str) -> Result<(), BlobError> {
        let path = self.path_for(scope, file_name)?;
        match fs::remove_file(&path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
