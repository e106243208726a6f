use serde::{Deserialize, Serialize};

use crate::error::XmlError;
use crate::types::Scope;

/// Transport and address fields of a video source. Opaque to the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedTransport {
    pub protocol: String,
    pub address: String,
    pub port: i32,
    pub path: String,
    pub rover_port: i32,
    pub ignore_embedded_klv: bool,
    pub preferred_mac_address: String,
    pub preferred_interface_address: String,
    pub buffer: i32,
    pub timeout: i32,
    pub rtsp_reliable: i32,
}

impl FeedTransport {
    /// Render the connection address as a single URL.
    pub fn url(&self) -> String {
        let mut url = if self.protocol.is_empty() {
            self.address.clone()
        } else {
            format!("{}://{}", self.protocol, self.address)
        };
        if self.port > 0 {
            url.push_str(&format!(":{}", self.port));
        }
        if !self.path.is_empty() {
            if !self.path.starts_with('/') {
                url.push('/');
            }
            url.push_str(&self.path);
        }
        url
    }
}

/// A stored video-feed connection descriptor.
///
/// Saved wholesale by its `(scope, uid)` key; there is no partial update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConnection {
    pub uid: String,
    pub scope: Scope,
    pub owner_user: String,
    pub active: bool,
    pub alias: String,
    pub transport: FeedTransport,
}

impl FeedConnection {
    /// The legacy single-feed shape.
    pub fn to_legacy(&self) -> LegacyFeed {
        let t = &self.transport;
        LegacyFeed {
            protocol: t.protocol.clone(),
            alias: self.alias.clone(),
            uid: self.uid.clone(),
            address: t.address.clone(),
            port: t.port,
            rover_port: t.rover_port,
            ignore_embedded_klv: t.ignore_embedded_klv,
            preferred_mac_address: t.preferred_mac_address.clone(),
            preferred_interface_address: t.preferred_interface_address.clone(),
            path: t.path.clone(),
            buffer: t.buffer,
            timeout: t.timeout,
            rtsp_reliable: t.rtsp_reliable,
            active: self.active,
        }
    }

    /// The current single-feed shape.
    pub fn to_dto(&self) -> FeedDto {
        FeedDto {
            uid: self.uid.clone(),
            active: self.active,
            alias: self.alias.clone(),
            url: self.transport.url(),
            ignore_embedded_klv: self.transport.ignore_embedded_klv,
            network_timeout: self.transport.timeout,
            buffer_time: self.transport.buffer,
            rtsp_reliable: self.transport.rtsp_reliable,
        }
    }
}

/// Feed descriptor as exchanged by older clients, in both XML and JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegacyFeed {
    pub protocol: String,
    pub alias: String,
    pub uid: String,
    pub address: String,
    pub port: i32,
    pub rover_port: i32,
    #[serde(rename = "ignoreEmbeddedKLV")]
    pub ignore_embedded_klv: bool,
    pub preferred_mac_address: String,
    pub preferred_interface_address: String,
    pub path: String,
    pub buffer: i32,
    pub timeout: i32,
    pub rtsp_reliable: i32,
    pub active: bool,
}

impl LegacyFeed {
    /// Convert into a stored connection owned by `owner` in `scope`.
    ///
    /// Registered feeds are always stored as active.
    pub fn into_connection(self, owner: impl Into<String>, scope: Scope) -> FeedConnection {
        FeedConnection {
            uid: self.uid,
            scope,
            owner_user: owner.into(),
            active: true,
            alias: self.alias,
            transport: FeedTransport {
                protocol: self.protocol,
                address: self.address,
                port: self.port,
                path: self.path,
                rover_port: self.rover_port,
                ignore_embedded_klv: self.ignore_embedded_klv,
                preferred_mac_address: self.preferred_mac_address,
                preferred_interface_address: self.preferred_interface_address,
                buffer: self.buffer,
                timeout: self.timeout,
                rtsp_reliable: self.rtsp_reliable,
            },
        }
    }
}

/// Legacy aggregate document: one `<videoConnections>` holding every feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "videoConnections")]
pub struct VideoConnections {
    #[serde(rename = "feed", default)]
    pub feeds: Vec<LegacyFeed>,
}

impl VideoConnections {
    /// Build the aggregate document from stored feeds.
    pub fn from_feeds<'a>(feeds: impl IntoIterator<Item = &'a FeedConnection>) -> Self {
        Self {
            feeds: feeds.into_iter().map(FeedConnection::to_legacy).collect(),
        }
    }

    pub fn to_xml(&self) -> Result<String, XmlError> {
        Ok(quick_xml::se::to_string(self)?)
    }

    pub fn from_xml(xml: &str) -> Result<Self, XmlError> {
        Ok(quick_xml::de::from_str(xml)?)
    }
}

/// Feed descriptor in the current JSON shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedDto {
    pub uid: String,
    pub active: bool,
    pub alias: String,
    pub url: String,
    #[serde(rename = "ignoreEmbeddedKLV")]
    pub ignore_embedded_klv: bool,
    pub network_timeout: i32,
    pub buffer_time: i32,
    pub rtsp_reliable: i32,
}

/// One entry of the current list-of-singletons shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedGroup {
    pub feeds: Vec<FeedDto>,
}

/// Current shape: `{"videoConnections": [{"feeds": [feed]}, ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoConnectionList {
    pub video_connections: Vec<FeedGroup>,
}

impl VideoConnectionList {
    /// Wrap every stored feed in its own single-element group.
    pub fn from_feeds<'a>(feeds: impl IntoIterator<Item = &'a FeedConnection>) -> Self {
        Self {
            video_connections: feeds
                .into_iter()
                .map(|f| FeedGroup {
                    feeds: vec![f.to_dto()],
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(uid: &str) -> FeedConnection {
        LegacyFeed {
            protocol: "rtsp".into(),
            alias: format!("cam {uid}"),
            uid: uid.into(),
            address: "10.0.0.5".into(),
            port: 554,
            path: "live".into(),
            ..LegacyFeed::default()
        }
        .into_connection("alice", Scope::from("blue"))
    }

    #[test]
    fn registered_feed_is_active_and_owned() {
        let f = feed("f1");
        assert!(f.active);
        assert_eq!(f.owner_user, "alice");
        assert_eq!(f.scope.as_str(), "blue");
    }

    #[test]
    fn url_joins_transport_fields() {
        assert_eq!(feed("f1").transport.url(), "rtsp://10.0.0.5:554/live");
        let bare = FeedTransport {
            address: "udp://239.0.0.1".into(),
            ..FeedTransport::default()
        };
        assert_eq!(bare.url(), "udp://239.0.0.1");
    }

    #[test]
    fn both_views_describe_the_same_feeds() {
        let feeds = vec![feed("f1"), feed("f2")];
        let legacy = VideoConnections::from_feeds(&feeds);
        let current = VideoConnectionList::from_feeds(&feeds);
        assert_eq!(legacy.feeds.len(), 2);
        assert_eq!(current.video_connections.len(), 2);
        assert!(current.video_connections.iter().all(|g| g.feeds.len() == 1));
        assert_eq!(current.video_connections[1].feeds[0].uid, legacy.feeds[1].uid);
    }

    #[test]
    fn legacy_xml_has_one_feed_element_per_feed() {
        let xml = VideoConnections::from_feeds(&[feed("f1"), feed("f2")])
            .to_xml()
            .unwrap();
        assert!(xml.starts_with("<videoConnections>"));
        assert_eq!(xml.matches("<feed>").count(), 2);
        assert!(xml.contains("<uid>f2</uid>"));

        let back = VideoConnections::from_xml(&xml).unwrap();
        assert_eq!(back.feeds[0].port, 554);
    }

    #[test]
    fn legacy_json_uses_klv_spelling() {
        let json = serde_json::to_value(feed("f1").to_legacy()).unwrap();
        assert_eq!(json["ignoreEmbeddedKLV"], false);
        assert_eq!(json["roverPort"], 0);
    }
}
