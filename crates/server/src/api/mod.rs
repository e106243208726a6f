pub mod contacts;
pub mod events;
pub mod info;
pub mod profile;
pub mod sync;
pub mod video;

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderMap;
use axum::http::header::HOST;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use marti_client::ContactRefresher;
use marti_sync::{SyncService, UserDirectory};

use crate::auth;

/// Shared application state for all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub sync: Arc<SyncService>,
    pub directory: Arc<dyn UserDirectory>,
    /// Header carrying the authenticated login.
    pub identity_header: String,
    /// Contacts mirrored from an upstream server, when configured.
    pub upstream_contacts: Option<Arc<ContactRefresher>>,
    /// Public origin of the server. The route prefix is appended to it.
    pub external_url: Option<String>,
    pub path_prefix: String,
    pub body_limit: usize,
}

impl AppState {
    /// Route prefix without a trailing slash; empty when mounted at the root.
    pub fn prefix(&self) -> &str {
        self.path_prefix.trim_end_matches('/')
    }

    /// Base URL under which this server's routes are reachable.
    pub fn base_url(&self, headers: &HeaderMap) -> String {
        if let Some(url) = &self.external_url {
            return format!("{}{}", url.trim_end_matches('/'), self.prefix());
        }
        let host = header_str(headers, HOST.as_str()).unwrap_or("localhost");
        let scheme = header_str(headers, "x-forwarded-proto").unwrap_or("http");
        format!("{scheme}://{host}{}", self.prefix())
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

/// Look up a query parameter by name, ignoring ASCII case.
///
/// Missing parameters read as the empty string.
pub(crate) fn param<'a>(params: &'a HashMap<String, String>, name: &str) -> &'a str {
    params
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map_or("", |(_, v)| v.as_str())
}

/// Build the full router with all API routes.
pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/sync/missionquery", get(sync::mission_query))
        .route("/sync/missionupload", post(sync::mission_upload))
        .route("/sync/content", get(sync::content))
        .route("/sync/upload", post(sync::upload))
        .route("/upload", post(sync::upload))
        .route("/sync/search", get(sync::search))
        .route(
            "/sync/metadata/{hash}/{name}",
            get(sync::metadata).put(sync::set_metadata),
        )
        .route(
            "/api/sync/metadata/{hash}/{name}",
            get(sync::metadata).put(sync::set_metadata),
        )
        .route(
            "/vcm",
            get(video::legacy_feeds).post(video::register_feeds),
        )
        .route("/api/video", get(video::feeds))
        .route("/api/cot/xml/{uid}", get(events::event_xml))
        .route("/api/version", get(info::version))
        .route("/api/version/config", get(info::config))
        .route("/api/util/user/roles", get(info::user_roles))
        .route("/api/groups/all", get(info::groups))
        .route("/api/groups/groupCacheEnabled", get(info::group_cache_enabled))
        .route("/api/cops/hierarchy", get(info::cop_hierarchy))
        .route("/api/contacts/all", get(contacts::contacts))
        .route("/api/clientEndPoints", get(contacts::endpoints))
        .route("/api/device/profile/connection", get(profile::connection))
        .route("/api/device/profile/tool/{name}", get(profile::tool))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::resolve_caller,
        ));

    let app = if state.prefix().is_empty() {
        routes
    } else {
        Router::new().nest(state.prefix(), routes)
    };

    let body_limit = state.body_limit;
    app.with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
