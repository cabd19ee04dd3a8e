//! Router configuration.
//!
//! Builds the complete Axum router with all endpoints.

use crate::handlers::{health, matches};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// Configures:
/// - Health check and Prometheus metrics
/// - Match commands and reads under `/matches`
pub fn build_router(state: AppState) -> Router {
    let match_routes = Router::new()
        .route("/start", post(matches::start_match))
        .route("/:id", get(matches::get_match))
        .route("/:id/point", post(matches::add_point))
        .route("/:id/undo", post(matches::undo))
        .route("/:id/highlight", post(matches::add_highlight))
        .route("/:id/side-change", post(matches::side_change))
        .route("/:id/end", post(matches::end_match))
        .route("/:id/events", get(matches::list_events))
        .route("/:id/highlights", get(matches::list_highlights));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        .nest("/matches", match_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
