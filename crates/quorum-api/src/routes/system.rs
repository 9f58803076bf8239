use axum::{extract::State, Json};
use chrono::Utc;
use quorum_core::AppState;
use serde_json::{json, Value};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// GET /api/v1/metrics
pub async fn metrics(State(state): State<AppState>) -> Json<Value> {
    let uptime_seconds = (Utc::now() - state.config.started_at).num_seconds().max(0);
    Json(json!({
        "storage_backend": state.storage_backend(),
        "started_at": state.config.started_at.to_rfc3339(),
        "uptime_seconds": uptime_seconds,
        "event_subscribers": state.event_bus.subscriber_count(),
        "max_write_attempts": state.config.poll_service.max_write_attempts,
        "polls": state.metrics.snapshot(),
    }))
}
