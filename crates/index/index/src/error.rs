use marti_core::{ContentHash, Scope};

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("resource {hash} already exists in scope {scope}")]
    Duplicate { hash: ContentHash, scope: Scope },

    #[error("resource not found: {0}")]
    NotFound(u64),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("backend error: {0}")]
    Backend(String),
}
