use async_trait::async_trait;
use dashmap::DashMap;

use marti_core::{CotEvent, TrackedItem};

/// Read access to the live item tracker fed by the event stream.
pub trait ItemTracker: Send + Sync {
    fn get(&self, uid: &str) -> Option<TrackedItem>;

    fn items(&self) -> Vec<TrackedItem>;
}

/// Read access to persisted map points.
#[async_trait]
pub trait PointStore: Send + Sync {
    /// Latest stored event for `uid`.
    async fn latest(&self, uid: &str) -> Option<CotEvent>;
}

#[derive(Debug, Default)]
pub struct MemoryItemTracker {
    items: DashMap<String, TrackedItem>,
}

impl MemoryItemTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, item: TrackedItem) {
        self.items.insert(item.uid.clone(), item);
    }

    pub fn remove(&self, uid: &str) -> Option<TrackedItem> {
        self.items.remove(uid).map(|(_, item)| item)
    }
}

impl ItemTracker for MemoryItemTracker {
    fn get(&self, uid: &str) -> Option<TrackedItem> {
        self.items.get(uid).map(|i| i.value().clone())
    }

    fn items(&self) -> Vec<TrackedItem> {
        let mut items: Vec<TrackedItem> = self.items.iter().map(|i| i.value().clone()).collect();
        items.sort_by(|a, b| a.uid.cmp(&b.uid));
        items
    }
}

#[derive(Debug, Default)]
pub struct MemoryPointStore {
    points: DashMap<String, CotEvent>,
}

impl MemoryPointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: CotEvent) {
        self.points.insert(event.uid.clone(), event);
    }
}

#[async_trait]
impl PointStore for MemoryPointStore {
    async fn latest(&self, uid: &str) -> Option<CotEvent> {
        self.points.get(uid).map(|p| p.value().clone())
    }
}
