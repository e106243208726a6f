use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use crate::api::AppState;
use crate::error::ServerError;

/// Resolve the request's caller and attach it as an extension.
///
/// The login is read from the configured identity header, which the
/// authenticating front end sets. Requests the directory refuses get a 401.
pub async fn resolve_caller(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let login = request
        .headers()
        .get(state.identity_header.as_str())
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let caller = state.directory.resolve(login).ok_or_else(|| {
        debug!(login = ?login, "caller refused");
        ServerError::Unauthorized
    })?;

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}
