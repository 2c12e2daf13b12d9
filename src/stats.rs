//! Aggregate statistics over normalized fall events.
//!
//! Stats are recomputed from the live event list on every request; nothing
//! here is cached or persisted. Bucketing follows calendar conventions:
//! weeks start on Monday, months on the 1st, and the timeline covers the
//! trailing 30 days.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::{FallEvent, Severity};

// ---

/// Aggregate counters derived from the full event list.
#[derive(Debug, Serialize)]
pub struct Stats {
    // ---
    pub today: u64,
    pub this_week: u64,
    pub this_month: u64,
    /// Length of the source list, including events whose timestamps could
    /// not be parsed into any bucket.
    pub total: u64,
    /// Counts per severity; always carries the Low/Medium/High keys.
    pub by_severity: BTreeMap<String, u64>,
    pub by_location: BTreeMap<String, u64>,
    /// Events per `YYYY-MM-DD` day over the trailing 30 days.
    pub timeline: BTreeMap<String, u64>,
}

/// Compute statistics relative to the current local date.
pub fn calculate_stats(falls: &[FallEvent]) -> Stats {
    calculate_stats_at(falls, Local::now().date_naive())
}

/// Compute statistics relative to an explicit reference date.
///
/// An event with an unparseable timestamp is skipped with a warning; it
/// still counts toward `total` but lands in no bucket.
pub fn calculate_stats_at(falls: &[FallEvent], today: NaiveDate) -> Stats {
    // ---
    let week_start = today - Duration::days(today.weekday().num_days_from_monday() as i64);
    let month_start = today.with_day(1).unwrap_or(today);

    let by_severity: BTreeMap<String, u64> = [Severity::Low, Severity::Medium, Severity::High]
        .iter()
        .map(|s| (s.as_str().to_string(), 0))
        .collect();

    let mut stats = Stats {
        today: 0,
        this_week: 0,
        this_month: 0,
        total: falls.len() as u64,
        by_severity,
        by_location: BTreeMap::new(),
        timeline: BTreeMap::new(),
    };

    for fall in falls {
        let Some(fall_date) = parse_event_date(&fall.timestamp) else {
            tracing::warn!(
                "Skipping event {} with unparseable timestamp {:?}",
                fall.id,
                fall.timestamp
            );
            continue;
        };

        if fall_date == today {
            stats.today += 1;
        }
        if fall_date >= week_start {
            stats.this_week += 1;
        }
        if fall_date >= month_start {
            stats.this_month += 1;
        }

        *stats
            .by_severity
            .entry(fall.severity.as_str().to_string())
            .or_insert(0) += 1;

        *stats.by_location.entry(fall.location.clone()).or_insert(0) += 1;

        let age_days = (today - fall_date).num_days();
        if (0..=30).contains(&age_days) {
            *stats
                .timeline
                .entry(fall_date.format("%Y-%m-%d").to_string())
                .or_insert(0) += 1;
        }
    }

    stats
}

/// Extract the calendar date from a normalized ISO timestamp string.
fn parse_event_date(timestamp: &str) -> Option<NaiveDate> {
    // ---
    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(dt.date_naive());
    }
    timestamp.parse::<NaiveDateTime>().ok().map(|dt| dt.date())
}
