use thiserror::Error;

/// Errors talking to a remote server.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The client could not be configured.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request never produced a response.
    #[error("connection error: {0}")]
    Connection(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl ClientError {
    /// Whether repeating the request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Http { status, .. } => *status >= 500,
            Self::Configuration(_) | Self::Decode(_) => false,
        }
    }
}
