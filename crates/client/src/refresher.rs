use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use marti_core::Contact;

use crate::api::ContactSource;
use crate::error::ClientError;

/// Periodically copies a remote contact list into a bounded local cache.
///
/// The first fetch happens as soon as the task starts, then once per
/// interval. A failed fetch is logged and the cache keeps its previous
/// contents until the next tick.
pub struct ContactRefresher {
    source: Arc<dyn ContactSource>,
    cache: Cache<String, Contact>,
    interval: Duration,
}

/// Handle to a running refresher task.
pub struct RefresherHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RefresherHandle {
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Signal the task and wait for it to finish.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "contact refresher task ended abnormally");
        }
    }
}

impl ContactRefresher {
    pub fn new(source: Arc<dyn ContactSource>, capacity: u64, interval: Duration) -> Self {
        Self {
            source,
            cache: Cache::builder().max_capacity(capacity).build(),
            interval,
        }
    }

    /// Cached contacts, ordered by uid.
    pub fn contacts(&self) -> Vec<Contact> {
        let mut contacts: Vec<Contact> = self.cache.iter().map(|(_, c)| c).collect();
        contacts.sort_by(|a, b| a.uid.cmp(&b.uid));
        contacts
    }

    pub async fn get(&self, uid: &str) -> Option<Contact> {
        self.cache.get(uid).await
    }

    /// Fetch once and merge the result into the cache.
    pub async fn refresh_once(&self) -> Result<usize, ClientError> {
        let contacts = self.source.fetch_contacts().await?;
        let n = contacts.len();
        for contact in contacts {
            debug!(uid = %contact.uid, callsign = %contact.callsign, "contact");
            self.cache.insert(contact.uid.clone(), contact).await;
        }
        Ok(n)
    }

    /// Run on a new task until `cancel` fires.
    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> RefresherHandle {
        let task = tokio::spawn(self.run(cancel.clone()));
        RefresherHandle { cancel, task }
    }

    /// The refresh loop. Cancellation is observed while waiting for a tick,
    /// before each fetch, and during an in-flight fetch.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        info!(interval_secs = self.interval.as_secs(), "contact refresher starting");
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            if cancel.is_cancelled() {
                break;
            }
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                result = self.refresh_once() => match result {
                    Ok(n) => debug!(contacts = n, "contacts refreshed"),
                    Err(e) => warn!(error = %e, "error getting contacts"),
                },
            }
        }
        info!("contact refresher stopped");
    }
}
