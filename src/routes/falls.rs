//! Paginated JSON listing of fall events.

use axum::{
    extract::Query, extract::State, http::StatusCode, response::IntoResponse, routing::get, Json,
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Config, FallEvent, FallStore};

// ---

pub fn router() -> Router<(FallStore, Config)> {
    // ---
    Router::new().route("/api/falls", get(handler))
}

/// Query parameters for the falls listing.
#[derive(Debug, Deserialize)]
struct FallsQuery {
    page: Option<u32>,
    per_page: Option<u32>,
}

/// One page of fall events with the pagination envelope.
#[derive(Debug, Serialize)]
struct FallsPage {
    falls: Vec<FallEvent>,
    total: usize,
    page: u32,
    per_page: u32,
    has_next: bool,
}

async fn handler(
    Query(params): Query<FallsQuery>,
    State((store, config)): State<(FallStore, Config)>,
) -> impl IntoResponse {
    // ---
    debug!("GET /api/falls - {:?}", params);

    let falls = store.get_all_falls().await;

    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(config.default_per_page).max(1);
    let body = paginate(falls, page, per_page);

    info!(
        "GET /api/falls - page {} of {} total events",
        body.page, body.total
    );
    (StatusCode::OK, Json(body)).into_response()
}

/// Offset-based slice over the full sorted event list.
///
/// Out-of-range pages come back empty rather than erroring.
fn paginate(falls: Vec<FallEvent>, page: u32, per_page: u32) -> FallsPage {
    // ---
    let total = falls.len();
    let start = (page as usize - 1).saturating_mul(per_page as usize);
    let end = start.saturating_add(per_page as usize);

    let falls: Vec<FallEvent> = falls
        .into_iter()
        .skip(start)
        .take(per_page as usize)
        .collect();

    FallsPage {
        falls,
        total,
        page,
        per_page,
        has_next: end < total,
    }
}
