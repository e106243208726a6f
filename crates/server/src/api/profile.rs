use std::collections::HashMap;

use axum::Extension;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};

use marti_core::Caller;

use super::{AppState, param};
use crate::error::ServerError;

/// `GET /api/device/profile/connection?clientUid=`
///
/// Responds 204 when the device has nothing to receive.
pub async fn connection(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ServerError> {
    let client_uid = param(&params, "clientUid");
    let Some(package) = state.sync.profile_connection(&caller, client_uid).await? else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };
    Ok((
        [
            (CONTENT_TYPE, "application/zip"),
            (CONTENT_DISPOSITION, "attachment; filename=profile.zip"),
        ],
        package.bytes,
    )
        .into_response())
}

/// `GET /api/device/profile/tool/{name}?clientUid=`
#[allow(clippy::unused_async)]
pub async fn tool(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<StatusCode, ServerError> {
    state
        .sync
        .profile_tool(&caller, param(&params, "clientUid"), &name)?;
    Ok(StatusCode::NO_CONTENT)
}
