use serde::Deserialize;

/// HTTP server bind configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Prefix every route is mounted under. Empty mounts at the root.
    #[serde(default = "default_path_prefix")]
    pub path_prefix: String,
    /// Base URL used when building resource URLs.
    ///
    /// If not set, the URL is derived from the request's `Host` header.
    pub external_url: Option<String>,
    /// Maximum time to wait for in-flight requests during shutdown.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,
    /// Largest request body accepted by buffered extractors and multipart uploads.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            path_prefix: default_path_prefix(),
            external_url: None,
            shutdown_timeout_seconds: default_shutdown_timeout(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl ServerConfig {
    /// `path_prefix` with a single leading slash and no trailing slash.
    /// Empty when routes are mounted at the root.
    pub fn route_prefix(&self) -> String {
        let trimmed = self.path_prefix.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    8080
}

fn default_path_prefix() -> String {
    "/Marti".to_owned()
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_body_limit() -> usize {
    64 * 1024 * 1024
}
