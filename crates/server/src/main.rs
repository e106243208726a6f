use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use marti_client::{ContactRefresher, RefresherHandle, RemoteApi};
use marti_index::{FeedStore, ResourceIndex};
use marti_server::api::AppState;
use marti_server::backend_factory::create_backends;
use marti_server::config::{MartiConfig, UpstreamConfig};
use marti_sync::SyncServiceBuilder;

/// Marti resource synchronization HTTP server.
#[derive(Parser, Debug)]
#[command(name = "marti-server", about = "Standalone HTTP server for Marti resource sync")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "marti.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load configuration from TOML file, or use defaults if the file does not exist.
    let config: MartiConfig = if Path::new(&cli.config).exists() {
        let contents = std::fs::read_to_string(&cli.config)?;
        toml::from_str(&contents)?
    } else {
        info!(path = %cli.config, "config file not found, using defaults");
        toml::from_str("")?
    };

    let backends = create_backends(&config.storage).await?;
    let sync = SyncServiceBuilder::new()
        .blobs(backends.blobs)
        .recordings(backends.recordings)
        .index(Arc::clone(&backends.index) as Arc<dyn ResourceIndex>)
        .feeds(backends.index as Arc<dyn FeedStore>)
        .recording_marker(config.upload.recording_marker.as_str())
        .blocked_uids(config.profile.blocked_uids.iter().cloned())
        .build()?;

    let directory = config.identity.directory();
    info!(
        users = directory.len(),
        allow_anonymous = config.identity.allow_anonymous,
        "identity directory loaded"
    );

    let (upstream_contacts, refresher) = match start_refresher(&config.upstream)? {
        Some((contacts, handle)) => (Some(contacts), Some(handle)),
        None => (None, None),
    };

    let prefix = config.server.route_prefix();
    let state = AppState {
        sync: Arc::new(sync),
        directory: Arc::new(directory),
        identity_header: config.identity.header.clone(),
        upstream_contacts,
        external_url: config.server.external_url.clone(),
        path_prefix: prefix.clone(),
        body_limit: config.server.body_limit_bytes,
    };
    let app = marti_server::api::router(state);

    // Resolve the bind address (CLI overrides take precedence).
    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, prefix = %prefix, "marti-server listening");

    // Serve with graceful shutdown on SIGINT / SIGTERM.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = refresher {
        let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
        if tokio::time::timeout(shutdown_timeout, handle.stop())
            .await
            .is_err()
        {
            warn!(
                timeout_secs = config.server.shutdown_timeout_seconds,
                "contact refresh did not stop before the shutdown timeout"
            );
        }
    }

    info!("marti-server stopped");
    Ok(())
}

/// Start mirroring upstream contacts when `[upstream] url` is set.
fn start_refresher(
    config: &UpstreamConfig,
) -> Result<Option<(Arc<ContactRefresher>, RefresherHandle)>, Box<dyn std::error::Error>> {
    let Some(url) = config.url.as_deref() else {
        return Ok(None);
    };

    let api = RemoteApi::builder(url)
        .timeout(config.timeout())
        .retries(config.retries)
        .retry_wait(config.retry_wait())
        .build()?;
    info!(
        upstream = api.base_url(),
        interval_secs = config.refresh_interval_seconds,
        "upstream contact refresh enabled"
    );

    let refresher = Arc::new(ContactRefresher::new(
        Arc::new(api),
        config.cache_capacity,
        config.refresh_interval(),
    ));
    let handle = Arc::clone(&refresher).spawn(CancellationToken::new());
    Ok(Some((refresher, handle)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
