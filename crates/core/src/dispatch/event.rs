use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Outbound notification payload.
///
/// Serialized field names are the backend wire contract; do not rename.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Event {
    pub name: String,
    pub mood: String,
    #[serde(rename = "detectedAt")]
    pub detected_at: String,
    #[serde(rename = "cameraId")]
    pub camera_id: String,
}

impl Event {
    pub fn new(name: &str, mood: &str, camera_id: &str, detected_at: DateTime<Utc>) -> Self {
        Self {
            name: name.to_string(),
            mood: mood.to_string(),
            detected_at: detected_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            camera_id: camera_id.to_string(),
        }
    }

    /// Event stamped with the current wall clock.
    pub fn now(name: &str, mood: &str, camera_id: &str) -> Self {
        Self::new(name, mood, camera_id, Utc::now())
    }
}
