use axum::Router;

use crate::{Config, FallStore};

mod falls;
mod health;
mod pages;
mod stats;
mod video;

// ---

pub fn router(store: FallStore, config: Config) -> Router {
    // ---
    Router::new()
        .merge(falls::router())
        .merge(stats::router())
        .merge(video::router())
        .merge(pages::router())
        .merge(health::router())
        .with_state((store, config))
}
