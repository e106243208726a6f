pub mod caller;
pub mod contact;
pub mod envelope;
pub mod error;
pub mod event;
pub mod feed;
pub mod resource;
pub mod types;

pub use caller::{Caller, Visibility};
pub use contact::{ClientEndpoint, Contact, TrackedItem};
pub use envelope::{API_VERSION, Envelope, NODE_ID};
pub use error::XmlError;
pub use event::{CotEvent, Point};
pub use feed::{
    FeedConnection, FeedDto, FeedGroup, FeedTransport, LegacyFeed, VideoConnectionList,
    VideoConnections,
};
pub use resource::{
    Addressing, Keywords, MISSION_PACKAGE_KEYWORD, NEVER_EXPIRES, PUBLIC_TOOL, Resource,
    ResourceDto,
};
pub use types::{ContentHash, Scope};
