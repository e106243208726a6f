mod recording;
mod store;

pub use recording::FsRecordingArea;
pub use store::FsBlobStore;
