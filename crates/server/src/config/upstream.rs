use std::time::Duration;

use serde::Deserialize;

/// Remote server whose contact list is mirrored in the background.
///
/// Refresh is disabled unless `url` is set.
#[derive(Debug, Deserialize)]
pub struct UpstreamConfig {
    /// Host, `host:port`, or full base URL of the remote server.
    pub url: Option<String>,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_seconds: u64,
    /// Maximum number of cached contacts.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
    /// Per-request timeout.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Retries after a failed request.
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Fixed wait between retries.
    #[serde(default = "default_retry_wait")]
    pub retry_wait_millis: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: None,
            refresh_interval_seconds: default_refresh_interval(),
            cache_capacity: default_cache_capacity(),
            timeout_seconds: default_timeout(),
            retries: default_retries(),
            retry_wait_millis: default_retry_wait(),
        }
    }
}

impl UpstreamConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn retry_wait(&self) -> Duration {
        Duration::from_millis(self.retry_wait_millis)
    }
}

fn default_refresh_interval() -> u64 {
    120
}

fn default_cache_capacity() -> u64 {
    10_000
}

fn default_timeout() -> u64 {
    30
}

fn default_retries() -> u32 {
    3
}

fn default_retry_wait() -> u64 {
    1000
}
