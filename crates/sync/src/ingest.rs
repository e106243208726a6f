use std::sync::Arc;

use chrono::Utc;
use tokio::io::AsyncRead;
use tracing::{info, warn};

use marti_blob::{BlobError, BlobStore, RecordingArea, sanitize_file_name};
use marti_core::{
    Addressing, Caller, ContentHash, Keywords, MISSION_PACKAGE_KEYWORD, NEVER_EXPIRES, PUBLIC_TOOL,
    Resource,
};
use marti_index::{ResourceIndex, ResourceQuery};

use crate::error::SyncError;

const RECORDING_MIME_TYPE: &str = "video/webm";
const RECORDING_TOOL: &str = "webcam-recorder";
const RECORDING_KEYWORDS: [&str; 2] = ["video", "webcam-recording"];

/// How an upload is stored, decided before any bytes are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadIntent {
    /// Stored in the blob store under its computed hash. Packages are
    /// additionally tagged as public mission packages.
    ContentAddressed { package: bool },
    /// A recording from a known producer, written to the recording area by
    /// file name. The record's hash is derived from the name, not the bytes.
    NameAddressed,
}

impl UploadIntent {
    /// Intent for a multipart upload named `name`.
    ///
    /// Names containing `recording_marker` come from the webcam recorder and
    /// are stored by name; everything else is content-addressed.
    pub fn for_multipart(name: &str, recording_marker: &str, package: bool) -> Self {
        if !package && !recording_marker.is_empty() && name.contains(recording_marker) {
            Self::NameAddressed
        } else {
            Self::ContentAddressed { package }
        }
    }

    /// Intent for a raw request body.
    pub fn raw() -> Self {
        Self::ContentAddressed { package: false }
    }
}

/// Client-supplied description of an upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadRequest {
    /// Logical name; required.
    pub name: String,
    pub uid: String,
    /// File name as sent by the client; defaults to `name` when empty.
    pub file_name: String,
    pub mime_type: String,
    pub creator_uid: String,
    /// Raw comma-joined keyword list.
    pub keywords: String,
    /// Hash declared by the client, checked against the content.
    pub expected_hash: Option<ContentHash>,
}

impl UploadRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn file_name(&self) -> &str {
        if self.file_name.is_empty() { &self.name } else { &self.file_name }
    }
}

/// Bytes that have been durably written but not yet recorded in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Staged {
    intent: UploadIntent,
    hash: ContentHash,
    size: u64,
    file_name: String,
}

impl Staged {
    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Writes uploads through to storage and the index.
///
/// Ingestion happens in two steps so a transport can stream the payload
/// first and collect trailing form fields (such as keywords) before the
/// record is committed. Nothing here retries.
#[derive(Clone)]
pub struct IngestionPipeline {
    blobs: Arc<dyn BlobStore>,
    recordings: Arc<dyn RecordingArea>,
    index: Arc<dyn ResourceIndex>,
}

impl IngestionPipeline {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        recordings: Arc<dyn RecordingArea>,
        index: Arc<dyn ResourceIndex>,
    ) -> Self {
        Self {
            blobs,
            recordings,
            index,
        }
    }

    /// Stream `reader` into storage according to `intent`.
    pub async fn stage(
        &self,
        caller: &Caller,
        intent: UploadIntent,
        request: &UploadRequest,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<Staged, SyncError> {
        if request.name.trim().is_empty() {
            return Err(SyncError::MissingParameter("name"));
        }

        match intent {
            UploadIntent::ContentAddressed { .. } => {
                let stored = self
                    .blobs
                    .put(&caller.scope, request.expected_hash.as_ref(), reader)
                    .await?;
                Ok(Staged {
                    intent,
                    hash: stored.hash,
                    size: stored.size,
                    file_name: request.file_name().to_owned(),
                })
            }
            UploadIntent::NameAddressed => {
                let file_name = sanitize_file_name(&request.name)
                    .ok_or_else(|| SyncError::BadRequest(format!("unusable file name {:?}", request.name)))?;
                let hash = ContentHash::new(format!("video-{file_name}"));

                let existing = ResourceQuery::default()
                    .with_hash(hash.as_str())
                    .with_scope(caller.scope.as_str());
                if self.index.query_one(&existing).await?.is_some() {
                    return Err(SyncError::Duplicate(hash.to_string()));
                }

                let size = match self.recordings.put(&caller.scope, &file_name, reader).await {
                    Ok(size) => size,
                    Err(BlobError::AlreadyExists { .. }) => {
                        return Err(SyncError::Duplicate(hash.to_string()));
                    }
                    Err(e) => return Err(e.into()),
                };
                Ok(Staged {
                    intent,
                    hash,
                    size,
                    file_name,
                })
            }
        }
    }

    /// Build the resource record for `staged` and create it in the index.
    pub async fn commit(
        &self,
        caller: &Caller,
        staged: Staged,
        request: &UploadRequest,
    ) -> Result<Resource, SyncError> {
        let pending = staged.clone();
        let mut keywords = Keywords::parse(request.keywords.as_str());
        let mut tool = String::new();
        let mut mime_type = request.mime_type.clone();
        let addressing = match staged.intent {
            UploadIntent::ContentAddressed { package } => {
                if package {
                    keywords.insert(MISSION_PACKAGE_KEYWORD);
                    PUBLIC_TOOL.clone_into(&mut tool);
                }
                Addressing::ContentAddressed
            }
            UploadIntent::NameAddressed => {
                for keyword in RECORDING_KEYWORDS {
                    keywords.insert(keyword);
                }
                RECORDING_TOOL.clone_into(&mut tool);
                RECORDING_MIME_TYPE.clone_into(&mut mime_type);
                Addressing::NameAddressed
            }
        };

        let record = Resource {
            id: 0,
            hash: staged.hash,
            scope: caller.scope.clone(),
            uid: request.uid.clone(),
            name: request.name.clone(),
            file_name: staged.file_name,
            mime_type,
            size: staged.size,
            created_at: Utc::now(),
            submission_user: caller.login.clone(),
            creator_uid: request.creator_uid.clone(),
            tool,
            keywords,
            expiration: NEVER_EXPIRES,
            addressing,
        };

        let created = match self.index.create(record).await {
            Ok(created) => created,
            Err(e) => {
                self.abandon(caller, &pending).await;
                return Err(e.into());
            }
        };
        info!(
            id = created.id,
            hash = %created.hash,
            scope = %created.scope,
            name = %created.name,
            size = created.size,
            "resource created"
        );
        Ok(created)
    }

    /// Release storage held by `staged` when it will not be committed.
    ///
    /// Name-addressed files are removed so the name can be used again.
    /// Content-addressed blobs may be shared by other records and stay.
    pub async fn abandon(&self, caller: &Caller, staged: &Staged) {
        if staged.intent != UploadIntent::NameAddressed {
            return;
        }
        if let Err(e) = self.recordings.remove(&caller.scope, &staged.file_name).await {
            warn!(
                scope = %caller.scope,
                file_name = %staged.file_name,
                error = %e,
                "failed to remove abandoned recording"
            );
        }
    }

    /// Stage and commit in one step.
    pub async fn ingest(
        &self,
        caller: &Caller,
        intent: UploadIntent,
        request: &UploadRequest,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<Resource, SyncError> {
        let staged = self.stage(caller, intent, request, reader).await?;
        self.commit(caller, staged, request).await
    }
}
