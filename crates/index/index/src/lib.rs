pub mod error;
pub mod query;
pub mod store;
pub mod testing;

pub use error::IndexError;
pub use query::{FeedQuery, ResourcePatch, ResourceQuery};
pub use store::{FeedStore, ResourceIndex};
