use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use tracing::info;

use marti_core::{Caller, LegacyFeed, VideoConnectionList, VideoConnections};
use marti_sync::SyncError;

use super::AppState;
use crate::error::ServerError;

/// `GET /vcm` -- every visible feed in one legacy XML document.
pub async fn legacy_feeds(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<impl IntoResponse, ServerError> {
    let feeds = state.sync.feeds(&caller).await?;
    let xml = VideoConnections::from_feeds(&feeds)
        .to_xml()
        .map_err(SyncError::from)?;
    Ok(([(CONTENT_TYPE, "application/xml")], xml))
}

/// `POST /vcm` -- register feeds from a JSON array or a legacy XML document.
pub async fn register_feeds(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    headers: HeaderMap,
    body: String,
) -> Result<StatusCode, ServerError> {
    let is_xml = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("xml"));

    let feeds: Vec<LegacyFeed> = if is_xml {
        VideoConnections::from_xml(&body)
            .map_err(|e| ServerError::BadRequest(e.to_string()))?
            .feeds
    } else {
        serde_json::from_str(&body).map_err(|e| ServerError::BadRequest(e.to_string()))?
    };

    let submitted = feeds.len();
    let saved = state.sync.save_feeds(&caller, feeds).await;
    info!(login = %caller.login, submitted, saved, "feeds registered");
    Ok(StatusCode::OK)
}

/// `GET /api/video` -- one single-feed group per visible feed.
pub async fn feeds(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<VideoConnectionList>, ServerError> {
    let feeds = state.sync.feeds(&caller).await?;
    Ok(Json(VideoConnectionList::from_feeds(&feeds)))
}
