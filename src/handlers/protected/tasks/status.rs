use axum::extract::{Extension, State};
use serde::Serialize;

use crate::database::models::Status;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

use super::{store_failure, TaskPath};

#[derive(Debug, Serialize)]
pub struct StatusChanged {
    pub message: &'static str,
    pub status: Status,
}

/// PATCH /api/tasks/:id/status - Flip pending <-> completed
pub async fn toggle_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    TaskPath(task_id): TaskPath,
) -> ApiResult<StatusChanged> {
    let status = state
        .tasks
        .toggle_status(user.user_id, task_id)
        .await
        .map_err(store_failure("Error toggling status", "Failed to update status"))?
        .ok_or_else(ApiError::task_not_found)?;

    tracing::info!("Task {} status toggled to {}", task_id, status);
    Ok(ApiResponse::success(StatusChanged {
        message: "Status updated",
        status,
    }))
}
