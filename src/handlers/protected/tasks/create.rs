use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    Json,
};
use serde::Serialize;

use crate::database::models::TaskId;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::validation::{validate_create, CreateTaskInput};

use super::store_failure;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Created {
    pub message: &'static str,
    pub task_id: TaskId,
}

/// POST /api/tasks - Create a pending task owned by the caller
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CreateTaskInput>, JsonRejection>,
) -> ApiResult<Created> {
    let Json(input) = payload.map_err(|e| {
        tracing::debug!("Rejected create body: {}", e);
        ApiError::invalid_request_data()
    })?;
    let task = validate_create(input)?;

    let task_id = state
        .tasks
        .create(user.user_id, task)
        .await
        .map_err(store_failure("Error creating task", "Failed to create task"))?;

    tracing::info!("Task created successfully with ID {}", task_id);
    Ok(ApiResponse::created(Created {
        message: "Task created",
        task_id,
    }))
}
