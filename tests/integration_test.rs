use std::collections::BTreeMap;

use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct FallEvent {
    id: String,
    timestamp: String,
    location: String,
    severity: String,
    confidence: f64,
    video_url: String,
    device_type: String,
}

#[derive(Debug, Deserialize)]
struct FallsPage {
    falls: Vec<FallEvent>,
    total: usize,
    page: u32,
    per_page: u32,
    has_next: bool,
}

#[derive(Debug, Deserialize)]
struct Stats {
    today: u64,
    this_week: u64,
    this_month: u64,
    total: u64,
    by_severity: BTreeMap<String, u64>,
    by_location: BTreeMap<String, u64>,
    timeline: BTreeMap<String, u64>,
}

fn base_url() -> String {
    std::env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:5000".into())
}

#[tokio::test]
async fn falls_endpoint_paginates_ok() -> Result<()> {
    // ---
    let client = Client::new();
    let url = format!("{}/api/falls?page=1&per_page=5", base_url());

    let page: FallsPage = client.get(&url).send().await?.json().await?;

    assert!(!page.falls.is_empty(), "No falls returned from {}", url);
    assert!(page.falls.len() <= 5, "per_page limit not applied");
    assert_eq!(page.page, 1);
    assert_eq!(page.per_page, 5);
    assert_eq!(page.has_next, page.total > 5);

    for fall in &page.falls {
        // ---

        // Basic field validation on the normalized schema
        assert!(!fall.id.is_empty(), "id should not be empty");
        assert!(!fall.location.is_empty(), "location should not be empty");
        assert!(!fall.device_type.is_empty(), "device_type should not be empty");
        assert!(
            ["Low", "Medium", "High"].contains(&fall.severity.as_str()),
            "Unexpected severity {:?}",
            fall.severity
        );
        assert!(
            (0.0..=100.0).contains(&fall.confidence),
            "Confidence {} out of range",
            fall.confidence
        );
        assert!(!fall.video_url.is_empty(), "video_url should not be empty");
    }

    // Newest-first ordering within the page
    for pair in page.falls.windows(2) {
        assert!(
            pair[0].timestamp >= pair[1].timestamp,
            "Falls not sorted newest-first"
        );
    }

    Ok(())
}

#[tokio::test]
async fn stats_endpoint_is_consistent() -> Result<()> {
    // ---
    let client = Client::new();
    let url = format!("{}/api/stats", base_url());

    let stats: Stats = client.get(&url).send().await?.json().await?;

    // Time buckets nest: today ⊆ week, and total bounds everything
    assert!(stats.today <= stats.this_week);
    assert!(stats.this_week <= stats.total);
    assert!(stats.this_month <= stats.total);

    // Severity map always carries the three fixed keys
    for key in ["Low", "Medium", "High"] {
        assert!(stats.by_severity.contains_key(key), "Missing {} bucket", key);
    }

    let severity_sum: u64 = stats.by_severity.values().sum();
    assert!(severity_sum <= stats.total);

    let location_sum: u64 = stats.by_location.values().sum();
    assert!(location_sum <= stats.total);

    let timeline_sum: u64 = stats.timeline.values().sum();
    assert!(timeline_sum <= stats.total);

    Ok(())
}

#[tokio::test]
async fn video_endpoint_passes_through_absolute_urls() -> Result<()> {
    // ---
    let client = Client::new();
    let hosted = "https://res.cloudinary.com/demo/fall.mp4";
    let url = format!("{}/api/video/{}", base_url(), hosted);

    let response: serde_json::Value = client.get(&url).send().await?.json().await?;

    assert_eq!(response["url"], hosted);

    Ok(())
}

#[tokio::test]
async fn dashboard_page_renders() -> Result<()> {
    // ---
    let client = Client::new();
    let url = format!("{}/dashboard", base_url());

    let response = client.get(&url).send().await?;
    assert!(response.status().is_success());

    let body = response.text().await?;
    assert!(body.contains("Fall Detection Dashboard"));

    Ok(())
}
