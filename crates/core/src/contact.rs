use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::CotEvent;
use crate::types::Scope;

/// Contact summary exchanged between servers and clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub uid: String,
    pub callsign: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub role: String,
}

/// A live item held by the external item tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedItem {
    pub uid: String,
    pub scope: Scope,
    pub callsign: String,
    pub team: String,
    pub role: String,
    /// Whether the item is a client contact rather than a plain map item.
    pub is_contact: bool,
    pub online: bool,
    pub last_seen: DateTime<Utc>,
    pub event: CotEvent,
}

impl TrackedItem {
    pub fn to_contact(&self) -> Contact {
        Contact {
            uid: self.uid.clone(),
            callsign: self.callsign.clone(),
            team: self.team.clone(),
            role: self.role.clone(),
        }
    }

    pub fn to_endpoint(&self) -> ClientEndpoint {
        ClientEndpoint {
            uid: self.uid.clone(),
            callsign: self.callsign.clone(),
            last_event_time: self.last_seen,
            last_status: if self.online {
                "Connected".to_owned()
            } else {
                "Disconnected".to_owned()
            },
        }
    }
}

/// Entry of the `clientEndPoints` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientEndpoint {
    pub uid: String,
    pub callsign: String,
    pub last_event_time: DateTime<Utc>,
    pub last_status: String,
}
