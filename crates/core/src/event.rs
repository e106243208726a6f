use chrono::{DateTime, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use serde::{Deserialize, Serialize};

use crate::error::XmlError;

const COT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Position of an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
    pub hae: f64,
    pub ce: f64,
    pub le: f64,
}

/// A situational-awareness event as held by the live tracker or the point
/// store. Produced by the event-stream codec, which lives outside this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CotEvent {
    pub uid: String,
    pub event_type: String,
    pub how: String,
    pub time: DateTime<Utc>,
    pub start: DateTime<Utc>,
    pub stale: DateTime<Utc>,
    pub point: Point,
    /// Inner XML of the `<detail>` element, already serialized.
    #[serde(default)]
    pub detail: Option<String>,
}

impl CotEvent {
    /// Render the event as a standalone XML document.
    pub fn to_xml(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

        let time = self.time.format(COT_TIME_FORMAT).to_string();
        let start = self.start.format(COT_TIME_FORMAT).to_string();
        let stale = self.stale.format(COT_TIME_FORMAT).to_string();

        let mut event = BytesStart::new("event");
        event.push_attribute(("version", "2.0"));
        event.push_attribute(("uid", self.uid.as_str()));
        event.push_attribute(("type", self.event_type.as_str()));
        event.push_attribute(("how", self.how.as_str()));
        event.push_attribute(("time", time.as_str()));
        event.push_attribute(("start", start.as_str()));
        event.push_attribute(("stale", stale.as_str()));
        writer.write_event(Event::Start(event))?;

        let (lat, lon) = (self.point.lat.to_string(), self.point.lon.to_string());
        let (hae, ce, le) = (
            self.point.hae.to_string(),
            self.point.ce.to_string(),
            self.point.le.to_string(),
        );
        let mut point = BytesStart::new("point");
        point.push_attribute(("lat", lat.as_str()));
        point.push_attribute(("lon", lon.as_str()));
        point.push_attribute(("hae", hae.as_str()));
        point.push_attribute(("ce", ce.as_str()));
        point.push_attribute(("le", le.as_str()));
        writer.write_event(Event::Empty(point))?;

        match self.detail.as_deref() {
            Some(inner) if !inner.is_empty() => {
                writer.write_event(Event::Start(BytesStart::new("detail")))?;
                writer.get_mut().extend_from_slice(inner.as_bytes());
                writer.write_event(Event::End(BytesEnd::new("detail")))?;
            }
            _ => writer.write_event(Event::Empty(BytesStart::new("detail")))?,
        }

        writer.write_event(Event::End(BytesEnd::new("event")))?;
        Ok(String::from_utf8(writer.into_inner())?)
    }
}
