use std::io::Cursor;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::io::AsyncRead;

use marti_blob::{
    BlobError, BlobReader, BlobStore, RecordingArea, StoredBlob, copy_hashed,
    sanitize_file_name, validate_key_component,
};
use marti_core::{ContentHash, Scope};

/// In-memory [`BlobStore`] backed by a [`DashMap`].
///
/// The payload is hashed while it is buffered; the entry is only inserted
/// once the full payload has been read and verified.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    data: DashMap<(Scope, ContentHash), Bytes>,
}

impl MemoryBlobStore {
    /// Create a new, empty in-memory blob store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs across all scopes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        scope: &Scope,
        expected: Option<&ContentHash>,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<StoredBlob, BlobError> {
        validate_key_component(scope)?;

        let mut buf = Vec::new();
        let stored = copy_hashed(reader, &mut buf).await?;

        if let Some(expected) = expected
            && *expected != stored.hash
        {
            return Err(BlobError::HashMismatch {
                expected: expected.to_string(),
                actual: stored.hash.to_string(),
            });
        }

        // First writer wins; an existing entry already holds identical bytes.
        self.data
            .entry((scope.clone(), stored.hash.clone()))
            .or_insert_with(|| Bytes::from(buf));

        Ok(stored)
    }

    async fn get(&self, scope: &Scope, hash: &ContentHash) -> Result<BlobReader, BlobError> {
        let bytes = self
            .data
            .get(&(scope.clone(), hash.clone()))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| BlobError::NotFound {
                scope: scope.to_string(),
                hash: hash.to_string(),
            })?;
        Ok(Box::pin(Cursor::new(bytes)))
    }

    async fn exists(&self, scope: &Scope, hash: &ContentHash) -> Result<bool, BlobError> {
        Ok(self.data.contains_key(&(scope.clone(), hash.clone())))
    }
}

/// In-memory [`RecordingArea`] keyed by `(scope, file name)`.
#[derive(Debug, Default)]
pub struct MemoryRecordingArea {
    files: DashMap<(Scope, String), Bytes>,
}

impl MemoryRecordingArea {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(scope: &Scope, file_name: &str) -> Result<(Scope, String), BlobError> {
        validate_key_component(scope)?;
        let name =
            sanitize_file_name(file_name).ok_or_else(|| BlobError::InvalidKey(file_name.to_owned()))?;
        Ok((scope.clone(), name))
    }
}

#[async_trait]
impl RecordingArea for MemoryRecordingArea {
    async fn put(
        &self,
        scope: &Scope,
        file_name: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<u64, BlobError> {
        let key = Self::key(scope, file_name)?;
        let mut buf = Vec::new();
        let stored = copy_hashed(reader, &mut buf).await?;
        match self.files.entry(key) {
            Entry::Occupied(_) => Err(BlobError::AlreadyExists {
                scope: scope.to_string(),
                name: file_name.to_owned(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(Bytes::from(buf));
                Ok(stored.size)
            }
        }
    }

    async fn get(&self, scope: &Scope, file_name: &str) -> Result<BlobReader, BlobError> {
        let key = Self::key(scope, file_name)?;
        let bytes = self
            .files
            .get(&key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| BlobError::NotFound {
                scope: scope.to_string(),
                hash: key.1.clone(),
            })?;
        Ok(Box::pin(Cursor::new(bytes)))
    }

    async fn remove(&self, scope: &Scope, file_name: &str) -> Result<(), BlobError> {
        let key = Self::key(scope, file_name)?;
        self.files.remove(&key);
        Ok(())
    }
}
