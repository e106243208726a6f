use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use marti_sync::SyncError;

/// Errors that can occur when running the Marti server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A synchronization error surfaced through the API.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// The request was malformed before reaching the service.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// No caller could be resolved for the request.
    #[error("unauthorized")]
    Unauthorized,
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Sync(e) => match e {
                SyncError::MissingParameter(_) | SyncError::HashMismatch { .. } => {
                    StatusCode::NOT_ACCEPTABLE
                }
                SyncError::NotFound => StatusCode::NOT_FOUND,
                SyncError::Forbidden => StatusCode::FORBIDDEN,
                SyncError::Duplicate(_) => StatusCode::CONFLICT,
                SyncError::BadRequest(_) => StatusCode::BAD_REQUEST,
                SyncError::StoreIo(_)
                | SyncError::IndexIo(_)
                | SyncError::Package(_)
                | SyncError::Render(_)
                | SyncError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Config(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, self.to_string()).into_response()
    }
}
