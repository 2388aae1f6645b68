use axum::extract::{Extension, State};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Message};
use crate::state::AppState;

use super::{store_failure, TaskPath};

/// DELETE /api/tasks/:id - Permanently remove one of the caller's tasks
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    TaskPath(task_id): TaskPath,
) -> ApiResult<Message> {
    let removed = state
        .tasks
        .delete(user.user_id, task_id)
        .await
        .map_err(store_failure("Error deleting task", "Failed to delete task"))?;

    if !removed {
        return Err(ApiError::task_not_found());
    }

    tracing::info!("Task {} deleted", task_id);
    Ok(ApiResponse::success(Message::new("Task deleted")))
}
