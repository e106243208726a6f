use serde::Deserialize;

/// Device profile delivery.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileConfig {
    /// Client uids that are never served a profile.
    #[serde(default)]
    pub blocked_uids: Vec<String>,
}

/// Upload classification.
#[derive(Debug, Deserialize)]
pub struct UploadConfig {
    /// Multipart uploads whose name contains this marker are stored by name
    /// in the recording area.
    #[serde(default = "default_recording_marker")]
    pub recording_marker: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            recording_marker: default_recording_marker(),
        }
    }
}

fn default_recording_marker() -> String {
    "webcam-recording".to_owned()
}
