pub mod builder;
pub mod error;
pub mod identity;
pub mod ingest;
pub mod service;
pub mod tracker;

pub use builder::SyncServiceBuilder;
pub use error::SyncError;
pub use identity::{StaticUserDirectory, UserDirectory};
pub use ingest::{IngestionPipeline, Staged, UploadIntent, UploadRequest};
pub use service::{ProfilePackage, SearchResults, SyncService, resource_url};
pub use tracker::{ItemTracker, MemoryItemTracker, MemoryPointStore, PointStore};
