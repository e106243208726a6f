use axum::Json;
use serde::Serialize;

use marti_core::{API_VERSION, Envelope};

const SERVER_NAME: &str = "Marti sync server";

/// Payload of `GET /api/version/config`.
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub api: String,
    pub version: String,
    pub hostname: String,
}

/// `GET /api/version`
#[allow(clippy::unused_async)]
pub async fn version() -> String {
    format!("{SERVER_NAME} {}", env!("CARGO_PKG_VERSION"))
}

/// `GET /api/version/config`
#[allow(clippy::unused_async)]
pub async fn config() -> Json<Envelope<ServerInfo>> {
    Json(Envelope::new(
        "ServerConfig",
        ServerInfo {
            api: API_VERSION.to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            hostname: "0.0.0.0".to_owned(),
        },
    ))
}

/// A group as listed by `GET /api/groups/all`.
#[derive(Debug, Serialize)]
pub struct Group {
    pub name: String,
    pub direction: String,
    pub created: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub bitpos: u32,
    pub active: bool,
}

impl Group {
    /// The single group every caller belongs to.
    fn anonymous() -> Self {
        Self {
            name: "__ANON__".to_owned(),
            direction: "OUT".to_owned(),
            created: "2023-01-01".to_owned(),
            kind: "SYSTEM".to_owned(),
            bitpos: 2,
            active: true,
        }
    }
}

/// `GET /api/util/user/roles`
#[allow(clippy::unused_async)]
pub async fn user_roles() -> Json<[&'static str; 2]> {
    Json(["user", "webuser"])
}

/// `GET /api/groups/all`
#[allow(clippy::unused_async)]
pub async fn groups() -> Json<Envelope<Vec<Group>>> {
    Json(Envelope::new(
        "com.bbn.marti.remote.groups.Group",
        vec![Group::anonymous()],
    ))
}

/// `GET /api/groups/groupCacheEnabled`
#[allow(clippy::unused_async)]
pub async fn group_cache_enabled() -> Json<Envelope<bool>> {
    Json(Envelope::new("java.lang.Boolean", true))
}

/// `GET /api/cops/hierarchy`
#[allow(clippy::unused_async)]
pub async fn cop_hierarchy() -> Json<Envelope<Vec<String>>> {
    Json(Envelope::new("CopHierarchyNode", Vec::new()))
}
