use thiserror::Error;

use marti_blob::BlobError;
use marti_core::XmlError;
use marti_index::IndexError;
use marti_package::PackageError;

/// Errors surfaced by ingestion and the synchronization facade.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A required request parameter was missing or empty.
    #[error("no {0}")]
    MissingParameter(&'static str),

    /// A parameter was present but unusable.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// No visible resource, blob, or event matched.
    #[error("not found")]
    NotFound,

    /// The declared content hash disagrees with the computed one.
    #[error("hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    /// The caller failed an identity or ownership check.
    #[error("forbidden")]
    Forbidden,

    /// A resource with the same hash already exists in the caller's scope.
    #[error("resource {0} already exists")]
    Duplicate(String),

    #[error("store error: {0}")]
    StoreIo(BlobError),

    #[error("index error: {0}")]
    IndexIo(IndexError),

    #[error("package error: {0}")]
    Package(PackageError),

    #[error("render error: {0}")]
    Render(#[from] XmlError),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<BlobError> for SyncError {
    fn from(e: BlobError) -> Self {
        match e {
            BlobError::NotFound { .. } => Self::NotFound,
            BlobError::HashMismatch { expected, actual } => Self::HashMismatch { expected, actual },
            BlobError::AlreadyExists { name, .. } => Self::Duplicate(name),
            other => Self::StoreIo(other),
        }
    }
}

impl From<IndexError> for SyncError {
    fn from(e: IndexError) -> Self {
        match e {
            IndexError::Duplicate { hash, .. } => Self::Duplicate(hash.to_string()),
            other => Self::IndexIo(other),
        }
    }
}

impl From<PackageError> for SyncError {
    fn from(e: PackageError) -> Self {
        match e {
            PackageError::Blob(blob) => blob.into(),
            other => Self::Package(other),
        }
    }
}
