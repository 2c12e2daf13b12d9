//! Aggregate statistics endpoint.

use axum::{extract::State, routing::get, Json, Router};
use tracing::info;

use crate::{calculate_stats, Config, FallStore, Stats};

// ---

pub fn router() -> Router<(FallStore, Config)> {
    // ---
    Router::new().route("/api/stats", get(handler))
}

async fn handler(State((store, _config)): State<(FallStore, Config)>) -> Json<Stats> {
    // ---
    let falls = store.get_all_falls().await;
    let stats = calculate_stats(&falls);

    info!("GET /api/stats - {} events aggregated", stats.total);
    Json(stats)
}
