use axum::extract::{Extension, State};

use crate::database::models::Task;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

use super::store_failure;

/// GET /api/tasks - All of the caller's tasks, newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<Task>> {
    let tasks = state
        .tasks
        .list(user.user_id)
        .await
        .map_err(store_failure("Error fetching tasks", "Failed to fetch tasks"))?;

    Ok(ApiResponse::success(tasks))
}
