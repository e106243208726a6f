pub mod error;
pub mod hashing;
pub mod key;
pub mod store;
pub mod testing;

pub use error::BlobError;
pub use hashing::copy_hashed;
pub use key::{sanitize_file_name, validate_key_component};
pub use store::{BlobReader, BlobStore, RecordingArea, StoredBlob};
