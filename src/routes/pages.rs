//! Server-rendered HTML views.
//!
//! Templates are compiled into the binary with `include_str!` and parsed
//! once on first use. Two filters mirror what the frontend expects:
//! `format_datetime` renders ISO timestamps for display and `add_seconds`
//! offsets a timestamp by a clip's duration.

use std::collections::HashMap;
use std::sync::OnceLock;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Duration, NaiveDateTime};
use tera::{Context as TeraContext, Tera, Value};
use tracing::error;

use crate::{calculate_stats, Config, FallStore};

// ---

/// Number of most-recent events shown on the dashboard page.
const DASHBOARD_EVENT_LIMIT: usize = 10;

fn templates() -> &'static Tera {
    // ---
    static TERA: OnceLock<Tera> = OnceLock::new();
    TERA.get_or_init(|| {
        let mut tera = Tera::default();
        tera.add_raw_templates([
            ("base.html", include_str!("../../templates/base.html")),
            ("index.html", include_str!("../../templates/index.html")),
            (
                "dashboard.html",
                include_str!("../../templates/dashboard.html"),
            ),
            (
                "fall_detail.html",
                include_str!("../../templates/fall_detail.html"),
            ),
        ])
        .expect("Failed to parse embedded templates");
        tera.register_filter("format_datetime", format_datetime);
        tera.register_filter("add_seconds", add_seconds);
        tera
    })
}

pub fn router() -> Router<(FallStore, Config)> {
    // ---
    Router::new()
        .route("/", get(index))
        .route("/dashboard", get(dashboard))
        .route("/fall/{fall_id}", get(fall_detail))
}

async fn index() -> Response {
    // ---
    render("index.html", &TeraContext::new())
}

async fn dashboard(State((store, _config)): State<(FallStore, Config)>) -> Response {
    // ---
    let falls = store.get_all_falls().await;
    let stats = calculate_stats(&falls);

    let mut ctx = TeraContext::new();
    ctx.insert("falls", &falls[..falls.len().min(DASHBOARD_EVENT_LIMIT)]);
    ctx.insert("stats", &stats);
    ctx.insert("mock_mode", &store.mock_mode());

    render("dashboard.html", &ctx)
}

async fn fall_detail(
    Path(fall_id): Path<String>,
    State((store, _config)): State<(FallStore, Config)>,
) -> Response {
    // ---
    let falls = store.get_all_falls().await;
    let Some(fall) = falls.into_iter().find(|f| f.id == fall_id) else {
        return (StatusCode::NOT_FOUND, "Fall not found").into_response();
    };

    let mut ctx = TeraContext::new();
    ctx.insert("fall", &fall);

    render("fall_detail.html", &ctx)
}

fn render(name: &str, ctx: &TeraContext) -> Response {
    // ---
    match templates().render(name, ctx) {
        Ok(body) => Html(body).into_response(),
        Err(e) => {
            error!("Failed to render {}: {}", name, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}

// ---

/// Render an ISO timestamp as `YYYY-MM-DD HH:MM:SS` for display.
///
/// Non-string and unparseable values pass through unchanged, matching the
/// forgiving behavior the rest of the normalization pipeline has.
fn format_datetime(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    // ---
    let Some(raw) = value.as_str() else {
        return Ok(value.clone());
    };
    match parse_datetime(raw) {
        Some(dt) => Ok(Value::String(dt.format("%Y-%m-%d %H:%M:%S").to_string())),
        None => Ok(value.clone()),
    }
}

/// Offset an ISO timestamp by `seconds`, e.g. to show a clip's end time.
fn add_seconds(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    // ---
    let seconds = args.get("seconds").and_then(Value::as_f64).unwrap_or(0.0);
    let Some(raw) = value.as_str() else {
        return Ok(value.clone());
    };
    // Millisecond precision keeps fractional clip durations from being
    // truncated away
    let offset = Duration::milliseconds((seconds * 1000.0).round() as i64);
    match parse_datetime(raw) {
        Some(dt) => Ok(Value::String(
            (dt + offset).format("%Y-%m-%dT%H:%M:%S").to_string(),
        )),
        None => Ok(value.clone()),
    }
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    // ---
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    raw.parse::<NaiveDateTime>().ok()
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_datetime_filter() {
        // ---
        let args = HashMap::new();

        let formatted = format_datetime(&json!("2025-08-20T09:05:30"), &args).unwrap();
        assert_eq!(formatted, json!("2025-08-20 09:05:30"));

        let zoned = format_datetime(&json!("2025-08-20T09:05:30Z"), &args).unwrap();
        assert_eq!(zoned, json!("2025-08-20 09:05:30"));

        // Unparseable input passes through
        let raw = format_datetime(&json!("1724850114"), &args).unwrap();
        assert_eq!(raw, json!("1724850114"));
    }

    #[test]
    fn test_add_seconds_filter() {
        // ---
        let mut args = HashMap::new();
        args.insert("seconds".to_string(), json!(90));

        let shifted = add_seconds(&json!("2025-08-20T09:05:30"), &args).unwrap();
        assert_eq!(shifted, json!("2025-08-20T09:07:00"));
    }

    #[test]
    fn test_add_seconds_keeps_fractional_durations() {
        // ---
        let mut args = HashMap::new();
        args.insert("seconds".to_string(), json!(2.5));

        // 30.8s + 2.5s crosses into second 33; whole-second arithmetic
        // would land on 32
        let shifted = add_seconds(&json!("2025-08-20T09:05:30.8"), &args).unwrap();
        assert_eq!(shifted, json!("2025-08-20T09:05:33"));
    }

    #[test]
    fn test_templates_parse() {
        // ---
        // Forces the embedded templates through the Tera parser
        let tera = templates();
        assert!(tera.get_template_names().any(|n| n == "dashboard.html"));
    }
}
