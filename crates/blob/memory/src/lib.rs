mod store;

pub use store::{MemoryBlobStore, MemoryRecordingArea};
