//! Health check

use crate::app::AppState;
use crate::error::ApiError;
use axum::{extract::State, http::StatusCode, Json};
use todo_types::HealthResponse;

pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    match state.todos.health().await {
        Ok(()) => Ok(Json(HealthResponse::ok())),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            Err(ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "Store unavailable",
            ))
        }
    }
}
