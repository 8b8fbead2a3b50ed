//! Todo handlers

use crate::app::AppState;
use crate::error::ApiError;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use todo_types::{parse_todo_id, CreateTodoRequest, Todo};

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Todo>>, ApiError> {
    match state.todos.list().await {
        Ok(todos) => Ok(Json(todos)),
        Err(e) => {
            tracing::error!("Failed to fetch todos: {}", e);
            Err(ApiError::internal("Failed to fetch todos"))
        }
    }
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<Json<Todo>, ApiError> {
    let Json(req_body) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let text = req_body.validate()?;

    match state.todos.create(&text).await {
        Ok(todo) => Ok(Json(todo)),
        Err(e) => {
            tracing::error!("Failed to add todo: {}", e);
            Err(ApiError::internal("Failed to add todo"))
        }
    }
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_todo_id(&id)?;

    match state.todos.delete(id).await {
        Ok(()) => Ok(StatusCode::OK),
        Err(e) => {
            tracing::error!(id = id, "Failed to delete todo: {}", e);
            Err(ApiError::internal("Failed to delete todo"))
        }
    }
}
