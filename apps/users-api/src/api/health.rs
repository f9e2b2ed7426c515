//! Health check endpoints

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct ReadinessResponse {
    status: String,
    mongodb: bool,
    response_time_ms: u64,
}

/// Create a health check router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(readiness_check))
        .with_state(state)
}

/// Readiness check - verifies MongoDB connection
async fn readiness_check(State(state): State<AppState>) -> Json<ReadinessResponse> {
    let health = database::mongodb::check_health_detailed(&state.mongo_client).await;

    if let Some(message) = &health.message {
        tracing::warn!("MongoDB readiness check failed: {}", message);
    }

    Json(ReadinessResponse {
        status: if health.healthy { "ready" } else { "unhealthy" }.to_string(),
        mongodb: health.healthy,
        response_time_ms: health.response_time_ms,
    })
}
