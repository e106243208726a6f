mod identity;
mod server;
mod storage;
mod sync;
mod upstream;


use serde::Deserialize;

pub use identity::{IdentityConfig, UserConfig};
pub use server::ServerConfig;
pub use storage::StorageConfig;
pub use sync::{ProfileConfig, UploadConfig};
pub use upstream::UpstreamConfig;

/// Top-level configuration loaded from `marti.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct MartiConfig {
    /// HTTP listener and routing.
    #[serde(default)]
    pub server: ServerConfig,
    /// Blob, recording, and index backends.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Login to scope mapping.
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Device profile delivery.
    #[serde(default)]
    pub profile: ProfileConfig,
    /// Upload classification.
    #[serde(default)]
    pub upload: UploadConfig,
    /// Optional remote server polled for contacts.
    #[serde(default)]
    pub upstream: UpstreamConfig,
}
