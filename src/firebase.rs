//! Client for the hosted realtime database and video storage.
//!
//! Fall records live under a single database path and are read over the
//! Firebase REST API (`GET {database_url}/{path}.json`). The database and
//! the storage bucket are black-box external services; when no database URL
//! is configured, or a fetch fails, the store serves a deterministic mock
//! data set so the dashboard stays demoable.

use anyhow::{anyhow, Result};
use chrono::{Duration, Local, NaiveDateTime};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{Config, FallEvent, RawFallRecord, Severity};

// ---

/// Number of synthetic records produced in mock mode.
const MOCK_RECORD_COUNT: usize = 20;

/// Storage object names ride in a single URL path segment, so everything
/// outside the unreserved set must be escaped, `/` included.
const OBJECT_PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Access to fall records and video URLs, with a mock fallback.
#[derive(Debug, Clone)]
pub struct FallStore {
    // ---
    client: reqwest::Client,
    database_url: Option<String>,
    database_secret: Option<String>,
    storage_bucket: Option<String>,
    falls_path: String,
}

impl FallStore {
    pub fn new(cfg: &Config) -> Self {
        // ---
        FallStore {
            client: reqwest::Client::new(),
            database_url: cfg.database_url.clone(),
            database_secret: cfg.database_secret.clone(),
            storage_bucket: cfg.storage_bucket.clone(),
            falls_path: cfg.falls_path.clone(),
        }
    }

    /// True when no database URL is configured and only mock data is served.
    pub fn mock_mode(&self) -> bool {
        self.database_url.is_none()
    }

    /// Fetch all fall events, normalized and sorted newest-first.
    ///
    /// Any failure to reach the database, and an empty result, fall back to
    /// the mock data set; this method never errors out a request.
    pub async fn get_all_falls(&self) -> Vec<FallEvent> {
        // ---
        if self.mock_mode() {
            debug!("Database not configured, serving mock data");
            return self.mock_falls();
        }

        match self.fetch_falls().await {
            Ok(falls) if !falls.is_empty() => falls,
            Ok(_) => {
                warn!(
                    "No records found at '{}', serving mock data",
                    self.falls_path
                );
                self.mock_falls()
            }
            Err(e) => {
                warn!("Error fetching fall records: {e}, serving mock data");
                self.mock_falls()
            }
        }
    }

    async fn fetch_falls(&self) -> Result<Vec<FallEvent>> {
        // ---
        let base = self
            .database_url
            .as_deref()
            .ok_or_else(|| anyhow!("database URL not configured"))?;
        let url = format!("{}/{}.json", base.trim_end_matches('/'), self.falls_path);

        debug!("Fetching fall records from: {}", url);

        let mut request = self.client.get(&url);
        if let Some(secret) = &self.database_secret {
            request = request.query(&[("auth", secret)]);
        }

        let payload: Value = request.send().await?.error_for_status()?.json().await?;

        // An empty database path comes back as JSON null
        let Value::Object(records) = payload else {
            if payload.is_null() {
                return Ok(Vec::new());
            }
            return Err(anyhow!(
                "unexpected payload shape at '{}': expected an object",
                self.falls_path
            ));
        };

        info!(
            "Fetched {} records from '{}'",
            records.len(),
            self.falls_path
        );

        let mut falls = Vec::with_capacity(records.len());
        for (key, value) in records {
            match serde_json::from_value::<RawFallRecord>(value) {
                Ok(raw) => falls.push(raw.into_event(&key)),
                Err(e) => warn!("Skipping malformed record '{key}': {e}"),
            }
        }

        // Newest first; normalized timestamps compare lexicographically
        falls.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(falls)
    }

    /// Deterministic synthetic data set anchored at the current time.
    pub fn mock_falls(&self) -> Vec<FallEvent> {
        mock_falls_at(Local::now().naive_local())
    }

    /// Resolve a stored video path to a playable URL.
    ///
    /// Absolute URLs (already-hosted clips) pass through untouched. Relative
    /// paths resolve to the storage bucket's media endpoint, or to `None`
    /// when the store runs in mock mode or no bucket is configured.
    pub fn resolve_video_url(&self, video_path: &str) -> Option<String> {
        // ---
        if video_path.starts_with("http://") || video_path.starts_with("https://") {
            return Some(video_path.to_string());
        }

        if self.mock_mode() {
            return None;
        }

        let bucket = self.storage_bucket.as_deref()?;
        Some(format!(
            "https://firebasestorage.googleapis.com/v0/b/{}/o/{}?alt=media",
            bucket,
            encode_object_path(video_path)
        ))
    }
}

/// Generate the mock data set relative to an explicit base time.
fn mock_falls_at(base_time: NaiveDateTime) -> Vec<FallEvent> {
    // ---
    let severities = [Severity::Low, Severity::Medium, Severity::High];

    (0..MOCK_RECORD_COUNT)
        .map(|i| {
            let fall_time = base_time
                - Duration::days(i as i64 * 2)
                - Duration::hours(i as i64)
                - Duration::minutes(i as i64 * 30);
            let timestamp = fall_time.format("%Y-%m-%dT%H:%M:%S%.6f").to_string();

            FallEvent {
                id: format!("fall_{}", i + 1),
                timestamp: timestamp.clone(),
                location: "raspberry_pi_camera".to_string(),
                severity: severities[i % 3],
                confidence: 85.0 + (i % 15) as f64,
                person_id: "raspberry_pi".to_string(),
                video_url: format!("videos/fall_{}.mp4", i + 1),
                duration: 2.5 + (i % 5) as f64,
                response_time: 30.0 + (i % 120) as f64,
                detection_method: "pose_analysis".to_string(),
                status: "detected".to_string(),
                created_at: timestamp,
                device_type: "raspberry_pi".to_string(),
            }
        })
        .collect()
}

/// Percent-encode a storage object name for the media URL path.
fn encode_object_path(path: &str) -> String {
    utf8_percent_encode(path, OBJECT_PATH).to_string()
}
