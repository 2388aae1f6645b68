pub mod create;
pub mod delete;
pub mod list;
pub mod status;
pub mod update;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use crate::database::models::TaskId;
use crate::database::DatabaseError;
use crate::error::ApiError;

// Re-export handler functions for use in routing
pub use create::create;
pub use delete::delete;
pub use list::list;
pub use status::toggle_status;
pub use update::update;

/// `:id` path segment. Anything that is not an integer is answered like a
/// task that does not exist.
#[derive(Debug, Clone, Copy)]
pub struct TaskPath(pub TaskId);

#[async_trait]
impl<S> FromRequestParts<S> for TaskPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::task_not_found())?;

        raw.parse().map(TaskPath).map_err(|_| ApiError::task_not_found())
    }
}

/// Log a store failure with its context and replace it with a generic 500
fn store_failure(
    context: &'static str,
    message: &'static str,
) -> impl FnOnce(DatabaseError) -> ApiError {
    move |err| {
        tracing::error!("{}: {}", context, err);
        ApiError::internal_server_error(message)
    }
}
