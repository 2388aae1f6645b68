use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    Json,
};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Message};
use crate::state::AppState;
use crate::validation::{validate_update, UpdateTaskInput};

use super::{store_failure, TaskPath};

/// PUT /api/tasks/:id - Rewrite title/description, and priority/status when given
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    TaskPath(task_id): TaskPath,
    payload: Result<Json<UpdateTaskInput>, JsonRejection>,
) -> ApiResult<Message> {
    let Json(input) = payload.map_err(|e| {
        tracing::debug!("Rejected update body: {}", e);
        ApiError::invalid_request_data()
    })?;
    let changes = validate_update(input)?;

    let matched = state
        .tasks
        .update(user.user_id, task_id, changes)
        .await
        .map_err(store_failure("Error updating task", "Failed to update task"))?;

    if !matched {
        return Err(ApiError::task_not_found());
    }

    tracing::info!("Task {} updated successfully", task_id);
    Ok(ApiResponse::success(Message::new("Task updated")))
}
