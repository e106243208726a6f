use std::pin::Pin;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use marti_core::{ContentHash, Scope};

use crate::error::BlobError;

/// A readable blob handed back by a store.
pub type BlobReader = Pin<Box<dyn AsyncRead + Send>>;

/// Outcome of a successful `put`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// Hash computed from the streamed content.
    pub hash: ContentHash,
    /// Exact number of bytes read from the input.
    pub size: u64,
}

/// Durable blob storage keyed by `(scope, hash)`.
///
/// Two blobs with equal keys have identical content: the first writer wins
/// and later writers of the same key are no-ops. Implementations must be
/// safe for concurrent `put` and `get` from many requests; a reader never
/// observes a partially written blob.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stream `reader` into the store under `scope`, hashing as it goes.
    ///
    /// When `expected` is given and differs from the computed hash the call
    /// fails with [`BlobError::HashMismatch`] and nothing is committed.
    async fn put(
        &self,
        scope: &Scope,
        expected: Option<&ContentHash>,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<StoredBlob, BlobError>;

    /// Open the blob stored under `(scope, hash)`.
    async fn get(&self, scope: &Scope, hash: &ContentHash) -> Result<BlobReader, BlobError>;

    /// Whether a blob exists under `(scope, hash)`.
    async fn exists(&self, scope: &Scope, hash: &ContentHash) -> Result<bool, BlobError>;
}

/// Name-addressed storage for recordings from a known producer.
///
/// Files are keyed by `(scope, sanitized file name)` rather than by content.
/// The first writer of a key wins: a later `put` of the same key fails with
/// [`BlobError::AlreadyExists`] and leaves the stored file untouched.
#[async_trait]
pub trait RecordingArea: Send + Sync {
    /// Stream `reader` into the area under `(scope, file_name)`. Returns the
    /// byte count.
    async fn put(
        &self,
        scope: &Scope,
        file_name: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<u64, BlobError>;

    /// Open the recording stored under `(scope, file_name)`.
    async fn get(&self, scope: &Scope, file_name: &str) -> Result<BlobReader, BlobError>;

    /// Delete the recording under `(scope, file_name)`. Missing keys are not an error.
    async fn remove(&self, scope: &Scope, file_name: &str) -> Result<(), BlobError>;
}
