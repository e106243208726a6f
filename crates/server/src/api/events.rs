use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;

use super::AppState;
use crate::error::ServerError;

/// `GET /api/cot/xml/{uid}`
pub async fn event_xml(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let xml = state.sync.event_xml(&uid).await?;
    Ok(([(CONTENT_TYPE, "application/xml")], xml))
}
