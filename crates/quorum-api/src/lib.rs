pub mod error;
pub mod render;
pub mod routes;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use quorum_core::AppState;
use tower_http::trace::TraceLayer;

/// Slash-command bodies are a few hundred bytes; anything near this is abuse.
const MAX_BODY_BYTES: usize = 64 * 1024;

pub fn build_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(routes::system::health))
        .route("/api/v1/metrics", get(routes::system::metrics))
        .route("/api/v1/commands", post(routes::commands::handle_command))
        .route("/api/v1/polls/{id}", get(routes::polls::get_poll))
        .route("/api/v1/polls/{id}/results", get(routes::polls::get_results))
        .route(
            "/api/v1/channels/{channel_id}/polls",
            get(routes::polls::list_channel_polls),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
}
