use serde::{Deserialize, Serialize};

/// Marti API version reported in every envelope.
pub const API_VERSION: &str = "3";

/// Fixed node identifier reported in every envelope.
pub const NODE_ID: &str = "main";

/// Response wrapper used by list and lookup endpoints.
///
/// Serializes as `{"version": "3", "type": ..., "nodeId": "main", "data": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub version: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "nodeId")]
    pub node_id: String,
    pub data: T,
}

impl<T> Envelope<T> {
    /// Wrap `data` under the logical type name `kind`.
    pub fn new(kind: impl Into<String>, data: T) -> Self {
        Self {
            version: API_VERSION.to_owned(),
            kind: kind.into(),
            node_id: NODE_ID.to_owned(),
            data,
        }
    }
}
