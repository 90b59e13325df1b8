use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::app::AppState;

/// GET /health
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.health.check_health().await;
    let code = if status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

/// GET /health/ready
pub async fn readiness(state: State<AppState>) -> impl IntoResponse {
    health(state).await
}

/// GET /health/live
pub async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
