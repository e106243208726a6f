use thiserror::Error;

/// Errors that can occur during blob storage operations.
#[derive(Debug, Error)]
pub enum BlobError {
    /// No blob exists under the requested key.
    #[error("blob not found: {scope}/{hash}")]
    NotFound {
        /// Scope that was searched.
        scope: String,
        /// Hash that was searched.
        hash: String,
    },

    /// The caller-declared hash disagrees with the hash of the streamed content.
    #[error("hash mismatch: declared {expected}, computed {actual}")]
    HashMismatch {
        /// Hash declared by the caller.
        expected: String,
        /// Hash computed from the content.
        actual: String,
    },

    /// A name-addressed key is already taken.
    #[error("already stored: {scope}/{name}")]
    AlreadyExists {
        /// Scope of the key.
        scope: String,
        /// File name of the key.
        name: String,
    },

    /// A scope, hash or file name cannot be used as a storage key.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    /// An I/O error from the underlying storage.
    #[error("blob storage io error: {0}")]
    Io(#[from] std::io::Error),
}
