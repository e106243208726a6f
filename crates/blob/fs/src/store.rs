use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncRead;
use tracing::{debug, warn};

use marti_blob::{BlobError, BlobReader, BlobStore, StoredBlob, copy_hashed, validate_key_component};
use marti_core::{ContentHash, Scope};

/// Filesystem [`BlobStore`] laid out as `<root>/<scope>/<hash>`.
///
/// Payloads are streamed into a uniquely named temporary file in the scope
/// directory and renamed into place only after the hash has been verified,
/// so a blob path always names a complete file. Concurrent writers of the
/// same key rename identical content over each other.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create a store rooted at `root`. Directories are created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scope_dir(&self, scope: &Scope) -> Result<PathBuf, BlobError> {
        validate_key_component(scope)?;
        Ok(self.root.join(scope.as_str()))
    }

    fn blob_path(&self, scope: &Scope, hash: &ContentHash) -> Result<PathBuf, BlobError> {
        validate_key_component(hash)?;
        Ok(self.scope_dir(scope)?.join(hash.as_str()))
    }
}

/// Best-effort removal of a temporary file.
pub(crate) async fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path).await
        && e.kind() != ErrorKind::NotFound
    {
        warn!(path = %path.display(), error = %e, "failed to remove temporary file");
    }
}

pub(crate) fn temp_path(dir: &Path) -> PathBuf {
    dir.join(format!(".tmp-{}", uuid::Uuid::new_v4()))
}

pub(crate) async fn write_temp(
    tmp: &Path,
    reader: &mut (dyn AsyncRead + Send + Unpin),
) -> Result<StoredBlob, BlobError> {
    let mut file = fs::File::create(tmp).await?;
    let stored = copy_hashed(reader, &mut file).await?;
    file.sync_all().await?;
    Ok(stored)
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(
        &self,
        scope: &Scope,
        expected: Option<&ContentHash>,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<StoredBlob, BlobError> {
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

        if let Some(expected) = expected
            && *expected != stored.hash
        {
            discard(&tmp).await;
            return Err(BlobError::HashMismatch {
                expected: expected.to_string(),
                actual: stored.hash.to_string(),
            });
        }

        let target = dir.join(stored.hash.as_str());
        if fs::try_exists(&target).await? {
            debug!(scope = %scope, hash = %stored.hash, "blob already stored");
            discard(&tmp).await;
            return Ok(stored);
        }

        if let Err(e) = fs::rename(&tmp, &target).await {
            discard(&tmp).await;
            return Err(e.into());
        }
        debug!(scope = %scope, hash = %stored.hash, size = stored.size, "blob stored");
        Ok(stored)
    }

    async fn get(&self, scope: &Scope, hash: &ContentHash) -> Result<BlobReader, BlobError> {
        let path = self.blob_path(scope, hash)?;
        match fs::File::open(&path).await {
            Ok(file) => Ok(Box::pin(file)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(BlobError::NotFound {
                scope: scope.to_string(),
                hash: hash.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, scope: &Scope, hash: &ContentHash) -> Result<bool, BlobError> {
        let path = self.blob_path(scope, hash)?;
        Ok(fs::try_exists(&path).await?)
    }
}
