mod snapshot;
mod store;

pub use store::MemoryIndex;
