use axum::{
    extract::{Path, State},
    Json,
};
use quorum_core::AppState;
use quorum_models::poll::Poll;
use quorum_models::results::PollResults;
use serde_json::{json, Value};

use crate::error::ApiError;

/// GET /api/v1/polls/{id}
pub async fn get_poll(
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
) -> Result<Json<Poll>, ApiError> {
    let poll = state.polls.get(&poll_id).await?;
    Ok(Json(poll))
}

/// GET /api/v1/polls/{id}/results
pub async fn get_results(
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
) -> Result<Json<PollResults>, ApiError> {
    let results = state.polls.results(&poll_id).await?;
    Ok(Json(results))
}

/// GET /api/v1/channels/{channel_id}/polls
pub async fn list_channel_polls(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let polls = state.polls.list_channel(&channel_id).await?;
    Ok(Json(json!({
        "channel_id": channel_id,
        "count": polls.len(),
        "polls": polls,
    })))
}
