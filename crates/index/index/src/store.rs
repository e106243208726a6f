use async_trait::async_trait;

use marti_core::{FeedConnection, Resource};

use crate::error::IndexError;
use crate::query::{FeedQuery, ResourcePatch, ResourceQuery};

/// Queryable catalog of resource records.
///
/// Implementations must be `Send + Sync`; a single `create` or `update` is
/// atomic with respect to concurrent queries.
#[async_trait]
pub trait ResourceIndex: Send + Sync {
    /// Insert a new record and return it with its assigned id.
    ///
    /// Fails with [`IndexError::Duplicate`] when a record with the same
    /// `(hash, scope)` already exists. The incoming `id` is ignored.
    async fn create(&self, resource: Resource) -> Result<Resource, IndexError>;

    /// All records matching `query`, ordered by id.
    async fn query(&self, query: &ResourceQuery) -> Result<Vec<Resource>, IndexError>;

    /// The earliest-created record matching `query`.
    async fn query_one(&self, query: &ResourceQuery) -> Result<Option<Resource>, IndexError> {
        Ok(self.query(query).await?.into_iter().next())
    }

    /// Apply `patch` to the record with `id` and return the updated record.
    async fn update(&self, id: u64, patch: &ResourcePatch) -> Result<Resource, IndexError>;
}

/// Registry of video feed connections keyed by `(scope, uid)`.
#[async_trait]
pub trait FeedStore: Send + Sync {
    /// Create or wholesale replace the feed with the same `(scope, uid)`.
    async fn save(&self, feed: FeedConnection) -> Result<(), IndexError>;

    /// Feeds matching `query`, ordered by `(scope, uid)`.
    async fn list(&self, query: &FeedQuery) -> Result<Vec<FeedConnection>, IndexError>;
}
