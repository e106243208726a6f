use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use marti_blob::{BlobError, BlobReader, BlobStore, RecordingArea};
use marti_core::{
    Addressing, Caller, ClientEndpoint, Contact, FeedConnection, LegacyFeed, Resource, ResourceDto,
};
use marti_index::{FeedQuery, FeedStore, ResourceIndex, ResourcePatch, ResourceQuery};
use marti_package::{EntrySource, MissionPackage, package_uid_for};

use crate::error::SyncError;
use crate::ingest::IngestionPipeline;
use crate::tracker::{ItemTracker, PointStore};

const CONNECTION_PACKAGE_NAME: &str = "Connection";
const TOOL_FIELD: &str = "tool";

/// Externally visible URL of a resource's content.
pub fn resource_url(base: &str, resource: &Resource) -> String {
    format!("{}/sync/content?hash={}", base.trim_end_matches('/'), resource.hash)
}

/// Body of a search response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub result_count: usize,
    pub results: Vec<ResourceDto>,
}

/// A bundled device profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePackage {
    pub uid: String,
    pub entries: usize,
    pub bytes: Vec<u8>,
}

/// Opens resource content from whichever area its addressing names.
struct Contents<'a> {
    blobs: &'a dyn BlobStore,
    recordings: &'a dyn RecordingArea,
}

#[async_trait]
impl EntrySource for Contents<'_> {
    async fn open(&self, resource: &Resource) -> Result<BlobReader, BlobError> {
        match resource.addressing {
            Addressing::ContentAddressed => self.blobs.get(&resource.scope, &resource.hash).await,
            Addressing::NameAddressed => {
                self.recordings.get(&resource.scope, &resource.file_name).await
            }
        }
    }
}

/// The request-facing synchronization surface.
///
/// Holds no per-request state. Every operation takes the already resolved
/// [`Caller`] and applies its visibility to every lookup.
#[derive(Clone)]
pub struct SyncService {
    pub(crate) blobs: Arc<dyn BlobStore>,
    pub(crate) recordings: Arc<dyn RecordingArea>,
    pub(crate) index: Arc<dyn ResourceIndex>,
    pub(crate) feeds: Arc<dyn FeedStore>,
    pub(crate) tracker: Arc<dyn ItemTracker>,
    pub(crate) points: Arc<dyn PointStore>,
    pub(crate) pipeline: IngestionPipeline,
    pub(crate) recording_marker: String,
    pub(crate) blocked_uids: BTreeSet<String>,
}

fn required<'a>(value: &'a str, name: &'static str) -> Result<&'a str, SyncError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SyncError::MissingParameter(name));
    }
    Ok(value)
}

impl SyncService {
    pub fn pipeline(&self) -> &IngestionPipeline {
        &self.pipeline
    }

    pub fn recording_marker(&self) -> &str {
        &self.recording_marker
    }

    async fn visible_by_hash(&self, caller: &Caller, hash: &str) -> Result<Resource, SyncError> {
        let hash = required(hash, "hash")?;
        self.index
            .query_one(&ResourceQuery::visible_to(caller).with_hash(hash))
            .await?
            .ok_or(SyncError::NotFound)
    }

    /// The visible resource with `hash`.
    pub async fn mission_query(&self, caller: &Caller, hash: &str) -> Result<Resource, SyncError> {
        self.visible_by_hash(caller, hash).await
    }

    /// The visible resource matching `hash` and/or `uid`, with its content.
    pub async fn content(
        &self,
        caller: &Caller,
        hash: &str,
        uid: &str,
    ) -> Result<(Resource, BlobReader), SyncError> {
        if hash.trim().is_empty() && uid.trim().is_empty() {
            return Err(SyncError::MissingParameter("hash or uid"));
        }
        let query = ResourceQuery::visible_to(caller).with_hash(hash).with_uid(uid);
        let resource = self.index.query_one(&query).await?.ok_or(SyncError::NotFound)?;

        let contents = Contents {
            blobs: self.blobs.as_ref(),
            recordings: self.recordings.as_ref(),
        };
        match contents.open(&resource).await {
            Ok(reader) => Ok((resource, reader)),
            Err(BlobError::NotFound { .. }) => {
                info!(hash = %resource.hash, scope = %resource.scope, "indexed resource has no content");
                Err(SyncError::NotFound)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Visible resources filtered by keyword and tool.
    ///
    /// Results from scopes other than the caller's own are marked by a
    /// `" [scope]"` suffix on their name.
    pub async fn search(
        &self,
        caller: &Caller,
        keyword: &str,
        tool: &str,
    ) -> Result<SearchResults, SyncError> {
        let query = ResourceQuery::visible_to(caller)
            .with_keyword(keyword)
            .with_tool(tool);
        let results: Vec<ResourceDto> = self
            .index
            .query(&query)
            .await?
            .iter()
            .map(|r| {
                let mut dto = ResourceDto::from(r);
                if r.scope != caller.scope {
                    dto.name = format!("{} [{}]", dto.name, r.scope);
                }
                dto
            })
            .collect();
        Ok(SearchResults {
            result_count: results.len(),
            results,
        })
    }

    /// Value of the metadata field `name`. Only `tool` is defined.
    pub async fn metadata(&self, caller: &Caller, hash: &str, name: &str) -> Result<String, SyncError> {
        let resource = self.visible_by_hash(caller, hash).await?;
        Ok(if name == TOOL_FIELD { resource.tool } else { String::new() })
    }

    /// Set the metadata field `name`. Fields other than `tool` are ignored.
    pub async fn set_metadata(
        &self,
        caller: &Caller,
        hash: &str,
        name: &str,
        value: &str,
    ) -> Result<(), SyncError> {
        let resource = self.visible_by_hash(caller, hash).await?;
        if name != TOOL_FIELD {
            return Ok(());
        }
        self.index
            .update(resource.id, &ResourcePatch::tool(value))
            .await?;
        info!(hash = %resource.hash, scope = %resource.scope, tool = value, "resource tool updated");
        Ok(())
    }

    /// Feeds visible to `caller`.
    pub async fn feeds(&self, caller: &Caller) -> Result<Vec<FeedConnection>, SyncError> {
        Ok(self.feeds.list(&FeedQuery::visible_to(caller)).await?)
    }

    /// Register feeds as active, owned by `caller` in its own scope.
    ///
    /// Feeds without a uid, and feeds that fail to save, are logged and
    /// skipped. Returns the number saved.
    pub async fn save_feeds(&self, caller: &Caller, feeds: Vec<LegacyFeed>) -> usize {
        let mut saved = 0;
        for feed in feeds {
            if feed.uid.trim().is_empty() {
                warn!(alias = %feed.alias, user = %caller.login, "skipping feed without uid");
                continue;
            }
            let connection = feed.into_connection(caller.login.as_str(), caller.scope.clone());
            let uid = connection.uid.clone();
            match self.feeds.save(connection).await {
                Ok(()) => saved += 1,
                Err(e) => warn!(uid = %uid, error = %e, "failed to save feed"),
            }
        }
        saved
    }

    /// Live contacts visible to `caller`.
    pub fn contacts(&self, caller: &Caller) -> Vec<Contact> {
        self.tracker
            .items()
            .iter()
            .filter(|i| i.is_contact && caller.can_see(i.scope.as_str()))
            .map(marti_core::TrackedItem::to_contact)
            .collect()
    }

    /// Connection status of the live contacts visible to `caller`.
    pub fn endpoints(&self, caller: &Caller) -> Vec<ClientEndpoint> {
        self.tracker
            .items()
            .iter()
            .filter(|i| i.is_contact && caller.can_see(i.scope.as_str()))
            .map(marti_core::TrackedItem::to_endpoint)
            .collect()
    }

    /// Event for `uid` rendered as XML, live items first, then stored points.
    pub async fn event_xml(&self, uid: &str) -> Result<String, SyncError> {
        if uid.trim().is_empty() {
            return Err(SyncError::BadRequest("no uid".into()));
        }
        let event = match self.tracker.get(uid) {
            Some(item) => item.event,
            None => self.points.latest(uid).await.ok_or(SyncError::NotFound)?,
        };
        Ok(event.to_xml()?)
    }

    /// Whether `caller` may pull profile content for `client_uid`.
    fn check_client_uid(&self, caller: &Caller, client_uid: &str) -> Result<(), SyncError> {
        if client_uid.trim().is_empty() || self.blocked_uids.contains(client_uid) {
            return Err(SyncError::Forbidden);
        }
        if let Some(item) = self.tracker.get(client_uid)
            && !caller.can_see(item.scope.as_str())
        {
            return Err(SyncError::Forbidden);
        }
        Ok(())
    }

    /// Connection profile package for device `client_uid`.
    ///
    /// `Ok(None)` means there is nothing to deliver.
    pub async fn profile_connection(
        &self,
        caller: &Caller,
        client_uid: &str,
    ) -> Result<Option<ProfilePackage>, SyncError> {
        self.check_client_uid(caller, client_uid)?;

        let files = self
            .index
            .query(&ResourceQuery::visible_to(caller).with_uid(client_uid))
            .await?;
        if files.is_empty() {
            return Ok(None);
        }

        let mut package = MissionPackage::new(package_uid_for(client_uid), CONNECTION_PACKAGE_NAME);
        package
            .param("onReceiveImport", "true")
            .param("onReceiveDelete", "true")
            .add_files(files.iter().cloned());

        let contents = Contents {
            blobs: self.blobs.as_ref(),
            recordings: self.recordings.as_ref(),
        };
        let bytes = package.bundle(&contents).await?;
        info!(uid = client_uid, files = files.len(), "connection profile prepared");
        Ok(Some(ProfilePackage {
            uid: package.uid().to_owned(),
            entries: files.len(),
            bytes,
        }))
    }

    /// Tool profile for device `client_uid`. No tool profiles are published.
    pub fn profile_tool(&self, caller: &Caller, client_uid: &str, _tool: &str) -> Result<(), SyncError> {
        self.check_client_uid(caller, client_uid)
    }
}
