use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use marti_core::Contact;

use crate::error::ClientError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_RETRIES: u32 = 3;
const DEFAULT_RETRY_WAIT: Duration = Duration::from_secs(1);
const DEFAULT_PORT: &str = "8080";
const CONTACTS_PATH: &str = "/Marti/api/contacts/all";

/// Anything that can produce the current contact list.
#[async_trait]
pub trait ContactSource: Send + Sync {
    async fn fetch_contacts(&self) -> Result<Vec<Contact>, ClientError>;
}

/// Turn a bare host into a base URL.
///
/// Without a scheme the host is assumed to be plain HTTP, and a host without
/// a port gets the default Marti port.
pub fn normalize_base_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        return host.to_owned();
    }
    if host.contains(':') {
        format!("http://{host}")
    } else {
        format!("http://{host}:{DEFAULT_PORT}")
    }
}

/// Builder for a [`RemoteApi`].
#[derive(Debug)]
pub struct RemoteApiBuilder {
    base_url: String,
    timeout: Duration,
    retries: u32,
    retry_wait: Duration,
    client: Option<Client>,
}

impl RemoteApiBuilder {
    pub fn new(host: &str) -> Self {
        Self {
            base_url: normalize_base_url(host),
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
            retry_wait: DEFAULT_RETRY_WAIT,
            client: None,
        }
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Extra attempts after the first failed one.
    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Fixed pause between attempts.
    #[must_use]
    pub fn retry_wait(mut self, wait: Duration) -> Self {
        self.retry_wait = wait;
        self
    }

    /// Use a custom reqwest client, e.g. one configured for mutual TLS.
    #[must_use]
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> Result<RemoteApi, ClientError> {
        let client = match self.client {
            Some(c) => c,
            None => Client::builder()
                .timeout(self.timeout)
                .build()
                .map_err(|e| ClientError::Configuration(e.to_string()))?,
        };
        Ok(RemoteApi {
            client,
            base_url: self.base_url,
            retries: self.retries,
            retry_wait: self.retry_wait,
        })
    }
}

/// HTTP client for another Marti server.
#[derive(Debug, Clone)]
pub struct RemoteApi {
    client: Client,
    base_url: String,
    retries: u32,
    retry_wait: Duration,
}

impl RemoteApi {
    pub fn builder(host: &str) -> RemoteApiBuilder {
        RemoteApiBuilder::new(host)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    async fn get_once(&self, url: &str) -> Result<reqwest::Response, ClientError> {
        let response = self
            .client
            .get(url)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Http {
            status: status.as_u16(),
            body,
        })
    }

    /// GET `path`, retrying transient failures a bounded number of times.
    async fn get(&self, path: &str) -> Result<reqwest::Response, ClientError> {
        let url = self.url(path);
        let mut attempt = 0;
        loop {
            debug!(url = %url, attempt, "remote request");
            match self.get_once(&url).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.retries => {
                    attempt += 1;
                    warn!(url = %url, attempt, error = %e, "remote request failed, retrying");
                    tokio::time::sleep(self.retry_wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Contacts known to the remote server.
    pub async fn contacts(&self) -> Result<Vec<Contact>, ClientError> {
        self.get(CONTACTS_PATH)
            .await?
            .json::<Vec<Contact>>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ContactSource for RemoteApi {
    async fn fetch_contacts(&self) -> Result<Vec<Contact>, ClientError> {
        self.contacts().await
    }
}
