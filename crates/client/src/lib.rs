//! Outbound client for a remote Marti server and the background contact
//! refresher built on it.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use marti_client::{ContactRefresher, RemoteApi};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), marti_client::ClientError> {
//! let api = RemoteApi::builder("upstream.example").retries(3).build()?;
//! let refresher = Arc::new(ContactRefresher::new(Arc::new(api), 10_000, Duration::from_secs(120)));
//! let handle = refresher.clone().spawn(CancellationToken::new());
//!
//! let contacts = refresher.contacts();
//! # let _ = contacts;
//! handle.stop().await;
//! # Ok(())
//! # }
//! ```

mod api;
mod error;
mod refresher;

pub use api::{ContactSource, RemoteApi, RemoteApiBuilder, normalize_base_url};
pub use error::ClientError;
pub use refresher::{ContactRefresher, RefresherHandle};
