use std::collections::HashMap;
use std::io;
use std::pin::pin;

use axum::body::Body;
use axum::extract::{FromRequest, Multipart, Path, Query, Request, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE, ETAG, LAST_MODIFIED};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use futures::TryStreamExt;
use tokio_util::io::{ReaderStream, StreamReader};

use marti_core::{Caller, ContentHash, Resource};
use marti_sync::{SearchResults, Staged, SyncError, UploadIntent, UploadRequest, resource_url};

use super::{AppState, param};
use crate::error::ServerError;

const ASSET_FIELD: &str = "assetfile";
const KEYWORDS_FIELD: &str = "keywords";

fn required<'a>(params: &'a HashMap<String, String>, name: &'static str) -> Result<&'a str, ServerError> {
    let value = param(params, name);
    if value.trim().is_empty() {
        return Err(SyncError::MissingParameter(name).into());
    }
    Ok(value)
}

/// `GET /sync/missionquery?hash=` -- URL of the visible resource with `hash`.
pub async fn mission_query(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<String, ServerError> {
    let hash = required(&params, "hash")?;
    let resource = state.sync.mission_query(&caller, hash).await?;
    Ok(resource_url(&state.base_url(&headers), &resource))
}

/// `POST /sync/missionupload?hash=&filename=` -- multipart package upload.
pub async fn mission_upload(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<HashMap<String, String>>,
    request: Request,
) -> Result<String, ServerError> {
    let hash = required(&params, "hash")?;
    let name = required(&params, "filename")?;

    let mut upload = UploadRequest::new(name);
    upload.expected_hash = Some(ContentHash::new(hash));
    upload.creator_uid = param(&params, "creatorUid").to_owned();

    let base = state.base_url(request.headers());
    let multipart = Multipart::from_request(request, &state)
        .await
        .map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let resource = ingest_multipart(&state, &caller, upload, multipart, true).await?;
    Ok(resource_url(&base, &resource))
}

/// `POST /upload?name=&uid=` -- multipart or raw-body upload.
pub async fn upload(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<HashMap<String, String>>,
    request: Request,
) -> Result<String, ServerError> {
    let name = required(&params, "name")?;

    let mut upload = UploadRequest::new(name);
    upload.uid = param(&params, "uid").to_owned();
    upload.creator_uid = param(&params, "creatorUid").to_owned();
    upload.keywords = param(&params, "keywords").to_owned();

    let base = state.base_url(request.headers());
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();

    let resource = if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| ServerError::BadRequest(e.body_text()))?;
        ingest_multipart(&state, &caller, upload, multipart, false).await?
    } else {
        upload.mime_type = content_type;
        let body = request.into_body().into_data_stream().map_err(io::Error::other);
        let mut reader = pin!(StreamReader::new(body));
        state
            .sync
            .pipeline()
            .ingest(&caller, UploadIntent::raw(), &upload, &mut reader)
            .await?
    };
    Ok(resource_url(&base, &resource))
}

/// Stream the asset part of a multipart upload into storage, then commit it
/// once the remaining fields have been read.
async fn ingest_multipart(
    state: &AppState,
    caller: &Caller,
    mut upload: UploadRequest,
    mut multipart: Multipart,
    package: bool,
) -> Result<Resource, ServerError> {
    let pipeline = state.sync.pipeline();
    let mut staged = None;

    if let Err(e) = read_fields(state, caller, &mut upload, &mut multipart, package, &mut staged).await {
        if let Some(staged) = &staged {
            pipeline.abandon(caller, staged).await;
        }
        return Err(e);
    }

    let staged = staged.ok_or(SyncError::MissingParameter(ASSET_FIELD))?;
    Ok(pipeline.commit(caller, staged, &upload).await?)
}

async fn read_fields(
    state: &AppState,
    caller: &Caller,
    upload: &mut UploadRequest,
    multipart: &mut Multipart,
    package: bool,
    staged: &mut Option<Staged>,
) -> Result<(), ServerError> {
    let pipeline = state.sync.pipeline();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(e.body_text()))?
    {
        let field_name = field.name().map(str::to_owned);
        match field_name.as_deref() {
            Some(ASSET_FIELD) if staged.is_none() => {
                if let Some(file_name) = field.file_name() {
                    upload.file_name = file_name.to_owned();
                }
                if let Some(mime_type) = field.content_type() {
                    upload.mime_type = mime_type.to_owned();
                }
                let intent =
                    UploadIntent::for_multipart(&upload.name, state.sync.recording_marker(), package);
                let mut reader = pin!(StreamReader::new(field.map_err(io::Error::other)));
                *staged = Some(pipeline.stage(caller, intent, upload, &mut reader).await?);
            }
            Some(KEYWORDS_FIELD) => {
                upload.keywords = field
                    .text()
                    .await
                    .map_err(|e| ServerError::BadRequest(e.body_text()))?;
            }
            _ => {}
        }
    }
    Ok(())
}

/// `GET /sync/content?hash=|uid=` -- stream a visible resource.
pub async fn content(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ServerError> {
    let (resource, reader) = state
        .sync
        .content(&caller, param(&params, "hash"), param(&params, "uid"))
        .await?;

    let mime_type = if resource.mime_type.is_empty() {
        "application/octet-stream".to_owned()
    } else {
        resource.mime_type
    };
    let headers = [
        (CONTENT_TYPE, mime_type),
        (
            LAST_MODIFIED,
            resource
                .created_at
                .format("%a, %d %b %Y %H:%M:%S GMT")
                .to_string(),
        ),
        (CONTENT_LENGTH, resource.size.to_string()),
        (ETAG, resource.hash.to_string()),
    ];
    Ok((headers, Body::from_stream(ReaderStream::new(reader))).into_response())
}

/// `GET /sync/search?keywords=&tool=`
pub async fn search(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<SearchResults>, ServerError> {
    let results = state
        .sync
        .search(&caller, param(&params, "keywords"), param(&params, "tool"))
        .await?;
    Ok(Json(results))
}

/// `GET /sync/metadata/{hash}/{name}`
pub async fn metadata(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path((hash, name)): Path<(String, String)>,
) -> Result<String, ServerError> {
    Ok(state.sync.metadata(&caller, &hash, &name).await?)
}

/// `PUT /sync/metadata/{hash}/{name}` -- body is the new value.
pub async fn set_metadata(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path((hash, name)): Path<(String, String)>,
    body: String,
) -> Result<StatusCode, ServerError> {
    state
        .sync
        .set_metadata(&caller, &hash, &name, &body)
        .await?;
    Ok(StatusCode::OK)
}
