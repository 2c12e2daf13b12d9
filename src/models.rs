//! Data models for the fall detection dashboard.
//!
//! Records arrive from the realtime database in heterogeneous shapes:
//! timestamps may be space-separated or ISO strings (or numbers),
//! confidence is a categorical label, and video metadata is a nested
//! object that may be missing entirely. Normalization maps all of that
//! onto the fixed [`FallEvent`] schema with deterministic defaults, so a
//! single odd record can never fail a whole request.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---

/// Default response time in seconds when the source record carries no
/// alert timing data.
const DEFAULT_RESPONSE_TIME_SECS: f64 = 45.0;

/// Default video clip duration in seconds.
const DEFAULT_DURATION_SECS: f64 = 5.0;

/// Coarse severity bucket derived from the record's confidence label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        }
    }
}

/// Raw fall record as stored in the realtime database.
///
/// Every field is optional; `timestamp` and `confidence` accept arbitrary
/// JSON values since devices have written both strings and numbers here.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawFallRecord {
    // ---
    pub timestamp: Option<Value>,
    pub location: Option<String>,
    pub confidence: Option<Value>,
    pub device_type: Option<String>,
    pub detection_method: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<String>,
    pub video: Option<RawVideoInfo>,
}

/// Nested video metadata on a raw record.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawVideoInfo {
    // ---
    pub cloudinary_url: Option<String>,
    pub local_filename: Option<String>,
    pub duration_seconds: Option<f64>,
}

/// Normalized fall event in the dashboard schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallEvent {
    // ---
    pub id: String,
    /// ISO-8601 timestamp string.
    pub timestamp: String,
    pub location: String,
    pub severity: Severity,
    /// Confidence as a percentage.
    pub confidence: f64,
    pub person_id: String,
    pub video_url: String,
    /// Video clip length in seconds.
    pub duration: f64,
    /// Time until an alert went out, in seconds.
    pub response_time: f64,
    pub detection_method: String,
    pub status: String,
    pub created_at: String,
    pub device_type: String,
}

// ---

impl RawFallRecord {
    /// Normalize this record into a [`FallEvent`] under the given database key.
    ///
    /// Never fails: every missing or unrecognized field gets a deterministic
    /// default.
    pub fn into_event(self, id: &str) -> FallEvent {
        // ---
        let video_url = self.video_url();
        let duration = self.video_duration();
        let timestamp = normalize_timestamp(self.timestamp.as_ref());
        let (severity, confidence) = classify_confidence(self.confidence.as_ref());
        let device_type = self.device_type.unwrap_or_else(|| "Unknown".to_string());

        FallEvent {
            id: id.to_string(),
            timestamp,
            location: self.location.unwrap_or_else(|| "Unknown".to_string()),
            severity,
            confidence,
            person_id: device_type.clone(),
            video_url,
            duration,
            response_time: DEFAULT_RESPONSE_TIME_SECS,
            detection_method: self
                .detection_method
                .unwrap_or_else(|| "Unknown".to_string()),
            status: self.status.unwrap_or_else(|| "detected".to_string()),
            created_at: self.created_at.unwrap_or_default(),
            device_type,
        }
    }

    /// Pick the best available video URL: a hosted URL wins, then a local
    /// filename, then a name synthesized from the raw timestamp.
    fn video_url(&self) -> String {
        // ---
        if let Some(video) = &self.video {
            if let Some(url) = &video.cloudinary_url {
                return url.clone();
            }
            if let Some(name) = &video.local_filename {
                return format!("videos/{name}");
            }
        }

        if let Some(Value::String(ts)) = &self.timestamp {
            if !ts.is_empty() {
                let clean: String = ts
                    .chars()
                    .filter(|c| *c != ':' && *c != '-')
                    .map(|c| if c == ' ' { '_' } else { c })
                    .collect();
                return format!("videos/fall_{clean}.mp4");
            }
        }

        "videos/no_video.mp4".to_string()
    }

    fn video_duration(&self) -> f64 {
        // ---
        self.video
            .as_ref()
            .and_then(|v| v.duration_seconds)
            .filter(|d| *d > 0.0)
            .map(round1)
            .unwrap_or(DEFAULT_DURATION_SECS)
    }
}

/// Coerce a raw timestamp value into an ISO-8601 string.
///
/// Devices write either `"YYYY-MM-DD HH:MM:SS"` or an ISO string; some older
/// firmware wrote epoch numbers, which are passed through as their string
/// form. Missing or unparseable values fall back to the current time.
fn normalize_timestamp(raw: Option<&Value>) -> String {
    // ---
    let Some(value) = raw else {
        return now_iso();
    };

    match value {
        Value::String(s) => {
            if s.contains(' ') && s.contains(':') {
                match NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                    Ok(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
                    Err(e) => {
                        tracing::warn!("Could not convert timestamp {:?}: {}", s, e);
                        now_iso()
                    }
                }
            } else {
                s.clone()
            }
        }
        other => other.to_string(),
    }
}

/// Map a confidence label onto a severity bucket and a percentage.
fn classify_confidence(raw: Option<&Value>) -> (Severity, f64) {
    // ---
    if let Some(Value::String(label)) = raw {
        match label.to_lowercase().as_str() {
            "high" => return (Severity::High, 95.0),
            "medium" => return (Severity::Medium, 75.0),
            "low" => return (Severity::Low, 55.0),
            _ => {}
        }
    }
    (Severity::Medium, 75.0)
}

fn now_iso() -> String {
    Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;

    fn record_from(value: Value) -> RawFallRecord {
        // ---
        serde_json::from_value(value).expect("record should deserialize")
    }

    #[test]
    fn test_space_timestamp_becomes_iso() {
        // ---
        let raw = record_from(json!({"timestamp": "2025-08-28 13:01:54"}));
        let event = raw.into_event("fall_a");

        assert_eq!(event.timestamp, "2025-08-28T13:01:54");
    }

    #[test]
    fn test_iso_timestamp_passes_through() {
        // ---
        let raw = record_from(json!({"timestamp": "2025-08-28T13:01:54"}));
        let event = raw.into_event("fall_a");

        assert_eq!(event.timestamp, "2025-08-28T13:01:54");
    }

    #[test]
    fn test_numeric_timestamp_is_stringified() {
        // ---
        let raw = record_from(json!({"timestamp": 1724850114}));
        let event = raw.into_event("fall_a");

        assert_eq!(event.timestamp, "1724850114");
    }

    #[test]
    fn test_missing_timestamp_defaults_to_now() {
        // ---
        let raw = record_from(json!({}));
        let event = raw.into_event("fall_a");

        // Current-time fallback, so just check the shape
        assert!(event.timestamp.contains('T'));
    }

    #[test]
    fn test_confidence_mapping() {
        // ---
        let cases = [
            (json!("high"), Severity::High, 95.0),
            (json!("HIGH"), Severity::High, 95.0),
            (json!("medium"), Severity::Medium, 75.0),
            (json!("low"), Severity::Low, 55.0),
            (json!("bogus"), Severity::Medium, 75.0),
            (json!(0.97), Severity::Medium, 75.0),
        ];

        for (label, severity, pct) in cases {
            let event = record_from(json!({ "confidence": label })).into_event("f");
            assert_eq!(event.severity, severity);
            assert_eq!(event.confidence, pct);
        }

        // Missing entirely
        let event = record_from(json!({})).into_event("f");
        assert_eq!(event.severity, Severity::Medium);
        assert_eq!(event.confidence, 75.0);
    }

    #[test]
    fn test_video_url_prefers_hosted_url() {
        // ---
        let raw = record_from(json!({
            "video": {
                "cloudinary_url": "https://res.cloudinary.com/demo/fall.mp4",
                "local_filename": "fall_local.mp4"
            }
        }));

        assert_eq!(
            raw.into_event("f").video_url,
            "https://res.cloudinary.com/demo/fall.mp4"
        );
    }

    #[test]
    fn test_video_url_local_filename() {
        // ---
        let raw = record_from(json!({"video": {"local_filename": "clip.mp4"}}));

        assert_eq!(raw.into_event("f").video_url, "videos/clip.mp4");
    }

    #[test]
    fn test_video_url_synthesized_from_timestamp() {
        // ---
        let raw = record_from(json!({"timestamp": "2025-08-28 13:01:54"}));

        assert_eq!(
            raw.into_event("f").video_url,
            "videos/fall_20250828_130154.mp4"
        );
    }

    #[test]
    fn test_video_url_fallback() {
        // ---
        let raw = record_from(json!({}));

        assert_eq!(raw.into_event("f").video_url, "videos/no_video.mp4");
    }

    #[test]
    fn test_duration_defaults() {
        // ---
        let with = record_from(json!({"video": {"duration_seconds": 7.84}}));
        assert_eq!(with.into_event("f").duration, 7.8);

        let zero = record_from(json!({"video": {"duration_seconds": 0.0}}));
        assert_eq!(zero.into_event("f").duration, 5.0);

        let missing = record_from(json!({}));
        assert_eq!(missing.into_event("f").duration, 5.0);
    }

    #[test]
    fn test_field_defaults() {
        // ---
        let event = record_from(json!({})).into_event("fall_1");

        assert_eq!(event.id, "fall_1");
        assert_eq!(event.location, "Unknown");
        assert_eq!(event.person_id, "Unknown");
        assert_eq!(event.device_type, "Unknown");
        assert_eq!(event.detection_method, "Unknown");
        assert_eq!(event.status, "detected");
        assert_eq!(event.created_at, "");
        assert_eq!(event.response_time, 45.0);
    }

    #[test]
    fn test_device_type_feeds_person_id() {
        // ---
        let event = record_from(json!({"device_type": "raspberry_pi"})).into_event("f");

        assert_eq!(event.person_id, "raspberry_pi");
        assert_eq!(event.device_type, "raspberry_pi");
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        // ---
        let raw = record_from(json!({
            "timestamp": "2025-08-28T13:01:54",
            "firmware_rev": "v2.1",
            "battery": 81
        }));

        assert_eq!(raw.into_event("f").timestamp, "2025-08-28T13:01:54");
    }
}
