use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{info, warn};

use marti_core::{ContentHash, FeedConnection, Resource, Scope};
use marti_index::{FeedQuery, FeedStore, IndexError, ResourceIndex, ResourcePatch, ResourceQuery};

use crate::snapshot::{Snapshot, SnapshotFile};

/// In-memory [`ResourceIndex`] and [`FeedStore`] backed by `DashMap`.
///
/// Suitable for development, testing, and single-node deployments. When
/// opened with a snapshot path every create, update, and feed save rewrites
/// the snapshot so the catalog survives restarts.
#[derive(Debug)]
pub struct MemoryIndex {
    records: DashMap<u64, Resource>,
    keys: DashMap<(Scope, ContentHash), u64>,
    feeds: DashMap<(Scope, String), FeedConnection>,
    next_id: AtomicU64,
    snapshot: Option<SnapshotFile>,
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIndex {
    /// Create an empty, purely in-memory index.
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            keys: DashMap::new(),
            feeds: DashMap::new(),
            next_id: AtomicU64::new(1),
            snapshot: None,
        }
    }

    /// Open an index persisted at `path`, loading the snapshot if present.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, IndexError> {
        let file = SnapshotFile::new(path);
        let mut index = Self::new();
        if let Some(snapshot) = file.load().await? {
            let mut max_id = 0;
            for resource in snapshot.resources {
                max_id = max_id.max(resource.id);
                index
                    .keys
                    .insert((resource.scope.clone(), resource.hash.clone()), resource.id);
                index.records.insert(resource.id, resource);
            }
            for feed in snapshot.feeds {
                index.feeds.insert((feed.scope.clone(), feed.uid.clone()), feed);
            }
            index
                .next_id
                .store(snapshot.next_id.max(max_id + 1), Ordering::SeqCst);
            info!(
                path = %file.path().display(),
                resources = index.records.len(),
                feeds = index.feeds.len(),
                "index snapshot loaded"
            );
        }
        index.snapshot = Some(file);
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn capture(&self) -> Snapshot {
        let mut resources: Vec<Resource> = self.records.iter().map(|r| r.value().clone()).collect();
        resources.sort_by_key(|r| r.id);
        let mut feeds: Vec<FeedConnection> = self.feeds.iter().map(|f| f.value().clone()).collect();
        feeds.sort_by(|a, b| (&a.scope, &a.uid).cmp(&(&b.scope, &b.uid)));
        Snapshot {
            next_id: self.next_id.load(Ordering::SeqCst),
            resources,
            feeds,
        }
    }

    async fn persist(&self) -> Result<(), IndexError> {
        match &self.snapshot {
            Some(file) => file.write(|| self.capture()).await,
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ResourceIndex for MemoryIndex {
    async fn create(&self, mut resource: Resource) -> Result<Resource, IndexError> {
        let key = (resource.scope.clone(), resource.hash.clone());
        match self.keys.entry(key.clone()) {
            Entry::Occupied(_) => {
                return Err(IndexError::Duplicate {
                    hash: resource.hash,
                    scope: resource.scope,
                });
            }
            Entry::Vacant(slot) => {
                resource.id = self.next_id.fetch_add(1, Ordering::SeqCst);
                self.records.insert(resource.id, resource.clone());
                slot.insert(resource.id);
            }
        }
        if let Err(e) = self.persist().await {
            self.records.remove(&resource.id);
            self.keys.remove_if(&key, |_, id| *id == resource.id);
            warn!(hash = %resource.hash, scope = %resource.scope, error = %e, "create rolled back");
            return Err(e);
        }
        Ok(resource)
    }

    async fn query(&self, query: &ResourceQuery) -> Result<Vec<Resource>, IndexError> {
        let mut found: Vec<Resource> = self
            .records
            .iter()
            .filter(|r| query.matches(r.value()))
            .map(|r| r.value().clone())
            .collect();
        found.sort_by_key(|r| r.id);
        Ok(found)
    }

    async fn update(&self, id: u64, patch: &ResourcePatch) -> Result<Resource, IndexError> {
        let (previous, updated) = {
            let mut entry = self.records.get_mut(&id).ok_or(IndexError::NotFound(id))?;
            let previous = entry.value().clone();
            patch.apply(entry.value_mut());
            (previous, entry.value().clone())
        };
        if let Err(e) = self.persist().await {
            self.records.insert(id, previous);
            warn!(id, error = %e, "update rolled back");
            return Err(e);
        }
        Ok(updated)
    }
}

#[async_trait]
impl FeedStore for MemoryIndex {
    async fn save(&self, feed: FeedConnection) -> Result<(), IndexError> {
        let key = (feed.scope.clone(), feed.uid.clone());
        let previous = self.feeds.insert(key.clone(), feed);
        if let Err(e) = self.persist().await {
            warn!(scope = %key.0, uid = %key.1, error = %e, "feed save rolled back");
            match previous {
                Some(previous) => {
                    self.feeds.insert(key, previous);
                }
                None => {
                    self.feeds.remove(&key);
                }
            }
            return Err(e);
        }
        Ok(())
    }

    async fn list(&self, query: &FeedQuery) -> Result<Vec<FeedConnection>, IndexError> {
        let mut feeds: Vec<FeedConnection> = self
            .feeds
            .iter()
            .filter(|f| query.matches(f.value()))
            .map(|f| f.value().clone())
            .collect();
        feeds.sort_by(|a, b| (&a.scope, &a.uid).cmp(&(&b.scope, &b.uid)));
        Ok(feeds)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use marti_core::{Addressing, Keywords, NEVER_EXPIRES};
    use marti_index::testing::{run_feed_conformance_tests, run_index_conformance_tests};

    use super::*;

    fn record(hash: &str, scope: &str) -> Resource {
        Resource {
            id: 0,
            hash: hash.into(),
            scope: scope.into(),
            uid: String::new(),
            name: "file.bin".into(),
            file_name: "file.bin".into(),
            mime_type: String::new(),
            size: 1,
            created_at: Utc::now(),
            submission_user: "alice".into(),
            creator_uid: String::new(),
            tool: String::new(),
            keywords: Keywords::parse("alpha"),
            expiration: NEVER_EXPIRES,
            addressing: Addressing::ContentAddressed,
        }
    }

    #[tokio::test]
    async fn conformance() {
        let index = MemoryIndex::new();
        run_index_conformance_tests(&index)
            .await
            .expect("index conformance tests should pass");
    }

    #[tokio::test]
    async fn feed_conformance() {
        let index = MemoryIndex::new();
        run_feed_conformance_tests(&index)
            .await
            .expect("feed conformance tests should pass");
    }

    #[tokio::test]
    async fn snapshot_round_trips_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        let first = MemoryIndex::open(&path).await.unwrap();
        let created = first.create(record("aa", "blue")).await.unwrap();
        first.update(created.id, &ResourcePatch::tool("X")).await.unwrap();
        drop(first);

        let reopened = MemoryIndex::open(&path).await.unwrap();
        assert_eq!(reopened.len(), 1);
        let found = reopened
            .query_one(&ResourceQuery::default().with_hash("aa"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.tool, "X");
        assert!(found.keywords.contains("alpha"));

        assert!(matches!(
            reopened.create(record("aa", "blue")).await,
            Err(IndexError::Duplicate { .. })
        ));
        let next = reopened.create(record("bb", "blue")).await.unwrap();
        assert!(next.id > created.id, "ids keep increasing after reload");
    }

    #[tokio::test]
    async fn failed_snapshot_write_leaves_no_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        let index = MemoryIndex::open(&path).await.unwrap();
        std::fs::create_dir(&path).unwrap();

        let err = index.create(record("aa", "blue")).await.unwrap_err();
        assert!(matches!(err, IndexError::Backend(_)), "got {err:?}");
        assert!(index.is_empty());
        assert!(
            index
                .query_one(&ResourceQuery::default().with_hash("aa"))
                .await
                .unwrap()
                .is_none()
        );

        std::fs::remove_dir(&path).unwrap();
        let created = index.create(record("aa", "blue")).await.unwrap();
        assert_eq!(index.len(), 1);

        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        assert!(index.update(created.id, &ResourcePatch::tool("X")).await.is_err());
        let found = index
            .query_one(&ResourceQuery::default().with_hash("aa"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.tool, "", "failed update is reverted");
    }

    #[tokio::test]
    async fn concurrent_creates_of_distinct_records_all_land() {
        let index = Arc::new(MemoryIndex::new());
        let mut handles = Vec::new();
        for i in 0..32 {
            let index = Arc::clone(&index);
            handles.push(tokio::spawn(async move {
                index.create(record(&format!("h{i}"), "blue")).await.unwrap()
            }));
        }
        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap().id);
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 32);
        assert_eq!(index.len(), 32);
    }

    #[tokio::test]
    async fn concurrent_creates_of_same_key_admit_one() {
        let index = Arc::new(MemoryIndex::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let index = Arc::clone(&index);
            handles.push(tokio::spawn(async move {
                index.create(record("same", "blue")).await.is_ok()
            }));
        }
        let mut created = 0;
        for h in handles {
            if h.await.unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(index.len(), 1);
    }
}
