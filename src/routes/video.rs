//! Video URL resolution endpoint.
//!
//! Stored events reference clips either by absolute URL (already hosted)
//! or by a relative storage path. This endpoint turns either form into a
//! playable URL for the frontend player.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tracing::debug;

use crate::{Config, FallStore};

// ---

pub fn router() -> Router<(FallStore, Config)> {
    // ---
    Router::new().route("/api/video/{*video_path}", get(handler))
}

async fn handler(
    Path(video_path): Path<String>,
    State((store, _config)): State<(FallStore, Config)>,
) -> impl IntoResponse {
    // ---
    debug!("GET /api/video/{}", video_path);

    match store.resolve_video_url(&video_path) {
        Some(url) => (StatusCode::OK, Json(json!({ "url": url }))).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Video not found" })),
        )
            .into_response(),
    }
}
