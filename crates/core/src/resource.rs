use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ContentHash, Scope};

/// `expiration` marker for resources that never expire.
pub const NEVER_EXPIRES: i64 = -1;

/// Keyword attached to every mission-package upload.
pub const MISSION_PACKAGE_KEYWORD: &str = "missionpackage";

/// Producer tag for mission-package uploads.
pub const PUBLIC_TOOL: &str = "public";

/// Ordered, comma-joined keyword list together with its derived token set.
///
/// The set is always exactly the non-empty, trimmed tokens of the raw
/// string; the only way to change either is through this type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Keywords {
    raw: String,
    set: BTreeSet<String>,
}

impl Keywords {
    /// Parse a raw comma-separated keyword string.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let set = tokens(&raw).map(str::to_owned).collect();
        Self { raw, set }
    }

    /// The raw keyword string as supplied.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Set-membership test against the derived token set.
    pub fn contains(&self, keyword: &str) -> bool {
        self.set.contains(keyword)
    }

    /// The derived unique token set.
    pub fn set(&self) -> &BTreeSet<String> {
        &self.set
    }

    /// Unique tokens in first-appearance order.
    pub fn ordered(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        tokens(&self.raw).filter(|t| seen.insert(*t)).collect()
    }

    /// Append a keyword unless it is already present.
    pub fn insert(&mut self, keyword: &str) {
        let keyword = keyword.trim();
        if keyword.is_empty() || self.set.contains(keyword) {
            return;
        }
        if !self.raw.trim().is_empty() {
            self.raw.push(',');
        }
        self.raw.push_str(keyword);
        self.set.insert(keyword.to_owned());
    }

    /// Whether there are no tokens at all.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

fn tokens(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|t| !t.is_empty())
}

impl From<String> for Keywords {
    fn from(raw: String) -> Self {
        Self::parse(raw)
    }
}

impl From<Keywords> for String {
    fn from(keywords: Keywords) -> Self {
        keywords.raw
    }
}

/// How the bytes behind a resource record are located.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Addressing {
    /// Stored in the blob store under `(scope, hash)`.
    #[default]
    ContentAddressed,
    /// Stored in the recording area under the record's sanitized file name.
    NameAddressed,
}

/// A synchronized artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Index-assigned primary key; `0` until the record is created.
    #[serde(default)]
    pub id: u64,
    /// Identity key within `scope`.
    pub hash: ContentHash,
    /// Owning visibility scope.
    pub scope: Scope,
    /// Optional client-chosen logical identifier.
    #[serde(default)]
    pub uid: String,
    /// Display name.
    pub name: String,
    /// Original file name.
    pub file_name: String,
    /// Declared MIME type.
    #[serde(default)]
    pub mime_type: String,
    /// Size in bytes.
    pub size: u64,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// Login of the uploading caller.
    #[serde(default)]
    pub submission_user: String,
    /// Device uid that created the artifact.
    #[serde(default)]
    pub creator_uid: String,
    /// Producer tag: empty, `"public"`, or a named producer.
    #[serde(default)]
    pub tool: String,
    /// Keyword list and derived set.
    #[serde(default)]
    pub keywords: Keywords,
    /// Retention marker; [`NEVER_EXPIRES`] means never.
    pub expiration: i64,
    /// Where the payload lives.
    #[serde(default)]
    pub addressing: Addressing,
}

/// Search-result shape expected by Marti clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDto {
    #[serde(rename = "UID")]
    pub uid: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Hash")]
    pub hash: String,
    #[serde(rename = "PrimaryKey")]
    pub primary_key: String,
    #[serde(rename = "MIMEType")]
    pub mime_type: String,
    #[serde(rename = "SubmissionDateTime")]
    pub submission_date_time: DateTime<Utc>,
    #[serde(rename = "SubmissionUser")]
    pub submission_user: String,
    #[serde(rename = "CreatorUid")]
    pub creator_uid: String,
    #[serde(rename = "Keywords")]
    pub keywords: Vec<String>,
    #[serde(rename = "Size")]
    pub size: u64,
    #[serde(rename = "Expiration")]
    pub expiration: i64,
    #[serde(rename = "Tool")]
    pub tool: String,
}

impl From<&Resource> for ResourceDto {
    fn from(r: &Resource) -> Self {
        Self {
            uid: r.uid.clone(),
            name: r.name.clone(),
            hash: r.hash.to_string(),
            primary_key: r.id.to_string(),
            mime_type: r.mime_type.clone(),
            submission_date_time: r.created_at,
            submission_user: r.submission_user.clone(),
            creator_uid: r.creator_uid.clone(),
            keywords: r.keywords.ordered().into_iter().map(str::to_owned).collect(),
            size: r.size,
            expiration: r.expiration,
            tool: r.tool.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_set_is_trimmed_tokens() {
        let kw = Keywords::parse(" alpha, beta ,,alpha, ");
        assert_eq!(kw.as_str(), " alpha, beta ,,alpha, ");
        assert_eq!(kw.set().len(), 2);
        assert!(kw.contains("alpha"));
        assert!(kw.contains("beta"));
        assert!(!kw.contains(""));
        assert_eq!(kw.ordered(), vec!["alpha", "beta"]);
    }

    #[test]
    fn keyword_membership_is_not_substring() {
        let kw = Keywords::parse("alphabet");
        assert!(!kw.contains("alpha"));
    }

    #[test]
    fn insert_keeps_raw_and_set_in_step() {
        let mut kw = Keywords::parse("");
        kw.insert("video");
        kw.insert("webcam-recording");
        kw.insert("video");
        assert_eq!(kw.as_str(), "video,webcam-recording");
        assert_eq!(Keywords::parse(kw.as_str()), kw);
    }

    #[test]
    fn keywords_serialize_as_raw_string() {
        let kw = Keywords::parse("a,b");
        assert_eq!(serde_json::to_string(&kw).unwrap(), "\"a,b\"");
        let back: Keywords = serde_json::from_str("\"b, c\"").unwrap();
        assert!(back.contains("c"));
    }

    #[test]
    fn dto_uses_marti_field_names() {
        let resource = Resource {
            id: 7,
            hash: "abc".into(),
            scope: "blue".into(),
            uid: "u-1".into(),
            name: "map.zip".into(),
            file_name: "map.zip".into(),
            mime_type: "application/zip".into(),
            size: 3,
            created_at: Utc::now(),
            submission_user: "alice".into(),
            creator_uid: "ANDROID-1".into(),
            tool: PUBLIC_TOOL.into(),
            keywords: Keywords::parse("missionpackage"),
            expiration: NEVER_EXPIRES,
            addressing: Addressing::ContentAddressed,
        };
        let json = serde_json::to_value(ResourceDto::from(&resource)).unwrap();
        assert_eq!(json["Hash"], "abc");
        assert_eq!(json["PrimaryKey"], "7");
        assert_eq!(json["Keywords"][0], "missionpackage");
        assert_eq!(json["Expiration"], -1);
    }
}
