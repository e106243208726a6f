use std::collections::BTreeSet;
use std::sync::Arc;

use marti_blob::{BlobStore, RecordingArea};
use marti_blob_memory::MemoryRecordingArea;
use marti_index::{FeedStore, ResourceIndex};

use crate::error::SyncError;
use crate::ingest::IngestionPipeline;
use crate::service::SyncService;
use crate::tracker::{ItemTracker, MemoryItemTracker, MemoryPointStore, PointStore};

const DEFAULT_RECORDING_MARKER: &str = "webcam-recording";

/// Fluent builder for a [`SyncService`].
///
/// A blob store, a resource index, and a feed store are required. The
/// recording area and the tracker collaborators default to empty in-memory
/// implementations.
pub struct SyncServiceBuilder {
    blobs: Option<Arc<dyn BlobStore>>,
    recordings: Option<Arc<dyn RecordingArea>>,
    index: Option<Arc<dyn ResourceIndex>>,
    feeds: Option<Arc<dyn FeedStore>>,
    tracker: Option<Arc<dyn ItemTracker>>,
    points: Option<Arc<dyn PointStore>>,
    recording_marker: String,
    blocked_uids: BTreeSet<String>,
}

impl Default for SyncServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncServiceBuilder {
    pub fn new() -> Self {
        Self {
            blobs: None,
            recordings: None,
            index: None,
            feeds: None,
            tracker: None,
            points: None,
            recording_marker: DEFAULT_RECORDING_MARKER.to_owned(),
            blocked_uids: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn blobs(mut self, blobs: Arc<dyn BlobStore>) -> Self {
        self.blobs = Some(blobs);
        self
    }

    #[must_use]
    pub fn recordings(mut self, recordings: Arc<dyn RecordingArea>) -> Self {
        self.recordings = Some(recordings);
        self
    }

    #[must_use]
    pub fn index(mut self, index: Arc<dyn ResourceIndex>) -> Self {
        self.index = Some(index);
        self
    }

    #[must_use]
    pub fn feeds(mut self, feeds: Arc<dyn FeedStore>) -> Self {
        self.feeds = Some(feeds);
        self
    }

    #[must_use]
    pub fn tracker(mut self, tracker: Arc<dyn ItemTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    #[must_use]
    pub fn points(mut self, points: Arc<dyn PointStore>) -> Self {
        self.points = Some(points);
        self
    }

    /// File-name marker that routes multipart uploads to the recording area.
    #[must_use]
    pub fn recording_marker(mut self, marker: impl Into<String>) -> Self {
        self.recording_marker = marker.into();
        self
    }

    /// Device uids that may never pull profiles.
    #[must_use]
    pub fn blocked_uids(mut self, uids: impl IntoIterator<Item = String>) -> Self {
        self.blocked_uids = uids.into_iter().collect();
        self
    }

    pub fn build(self) -> Result<SyncService, SyncError> {
        let blobs = self
            .blobs
            .ok_or_else(|| SyncError::Configuration("blob store is required".into()))?;
        let index = self
            .index
            .ok_or_else(|| SyncError::Configuration("resource index is required".into()))?;
        let feeds = self
            .feeds
            .ok_or_else(|| SyncError::Configuration("feed store is required".into()))?;
        let recordings = self
            .recordings
            .unwrap_or_else(|| Arc::new(MemoryRecordingArea::new()));
        let tracker = self
            .tracker
            .unwrap_or_else(|| Arc::new(MemoryItemTracker::new()));
        let points = self
            .points
            .unwrap_or_else(|| Arc::new(MemoryPointStore::new()));

        let pipeline = IngestionPipeline::new(
            Arc::clone(&blobs),
            Arc::clone(&recordings),
            Arc::clone(&index),
        );

        Ok(SyncService {
            blobs,
            recordings,
            index,
            feeds,
            tracker,
            points,
            pipeline,
            recording_marker: self.recording_marker,
            blocked_uids: self.blocked_uids,
        })
    }
}
