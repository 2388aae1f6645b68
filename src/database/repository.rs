use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Connection, MySql, QueryBuilder};

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{NewTask, Status, Task, TaskChanges, TaskId, TaskRow, UserId};

/// Store operations on the `tasks` table. Every method takes the caller's
/// identity and applies it as a predicate of the statement it issues, so a
/// row owned by someone else behaves exactly like a missing row.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// All tasks owned by `owner`, newest first
    async fn list(&self, owner: UserId) -> Result<Vec<Task>, DatabaseError>;

    /// Insert a pending task owned by `owner` and return its id
    async fn create(&self, owner: UserId, task: NewTask) -> Result<TaskId, DatabaseError>;

    /// Returns `false` when no row matched `id` and `owner`
    async fn update(
        &self,
        owner: UserId,
        id: TaskId,
        changes: TaskChanges,
    ) -> Result<bool, DatabaseError>;

    /// Returns `false` when no row matched `id` and `owner`
    async fn delete(&self, owner: UserId, id: TaskId) -> Result<bool, DatabaseError>;

    /// Flip pending/completed and return the new status, or `None` when no
    /// row matched `id` and `owner`
    async fn toggle_status(&self, owner: UserId, id: TaskId)
        -> Result<Option<Status>, DatabaseError>;
}

const LIST_SQL: &str = "SELECT id, user_id, title, description, priority, status, created_at \
     FROM tasks WHERE user_id = ? ORDER BY created_at DESC, id DESC";

const INSERT_SQL: &str =
    "INSERT INTO tasks (user_id, title, description, priority) VALUES (?, ?, ?, ?)";

const DELETE_SQL: &str = "DELETE FROM tasks WHERE id = ? AND user_id = ?";

// FOR UPDATE holds the row until commit, so concurrent toggles alternate
const LOCK_STATUS_SQL: &str = "SELECT status FROM tasks WHERE id = ? AND user_id = ? FOR UPDATE";

const SET_STATUS_SQL: &str = "UPDATE tasks SET status = ? WHERE id = ? AND user_id = ?";

pub struct MySqlTaskRepository {
    db: Arc<DatabaseManager>,
}

impl MySqlTaskRepository {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskRepository for MySqlTaskRepository {
    async fn list(&self, owner: UserId) -> Result<Vec<Task>, DatabaseError> {
        let mut conn = self.db.acquire().await?;

        let rows = sqlx::query_as::<_, TaskRow>(LIST_SQL)
            .bind(owner)
            .fetch_all(&mut *conn)
            .await?;

        rows.into_iter()
            .map(|row| Task::try_from(row).map_err(DatabaseError::from))
            .collect()
    }

    async fn create(&self, owner: UserId, task: NewTask) -> Result<TaskId, DatabaseError> {
        let mut conn = self.db.acquire().await?;

        let result = sqlx::query(INSERT_SQL)
            .bind(owner)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.priority.as_str())
            .execute(&mut *conn)
            .await?;

        TaskId::try_from(result.last_insert_id())
            .map_err(|_| DatabaseError::QueryError("insert id out of range".to_string()))
    }

    async fn update(
        &self,
        owner: UserId,
        id: TaskId,
        changes: TaskChanges,
    ) -> Result<bool, DatabaseError> {
        let mut query = build_update(owner, id, &changes);

        let mut conn = self.db.acquire().await?;
        let result = query.build().execute(&mut *conn).await?;

        // sqlx negotiates CLIENT_FOUND_ROWS, so this counts matched rows and an
        // update that rewrites identical values still reports 1
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, owner: UserId, id: TaskId) -> Result<bool, DatabaseError> {
        let mut conn = self.db.acquire().await?;

        let result = sqlx::query(DELETE_SQL)
            .bind(id)
            .bind(owner)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn toggle_status(
        &self,
        owner: UserId,
        id: TaskId,
    ) -> Result<Option<Status>, DatabaseError> {
        let mut conn = self.db.acquire().await?;
        let mut tx = conn.begin().await?;

        let current: Option<String> = sqlx::query_scalar(LOCK_STATUS_SQL)
            .bind(id)
            .bind(owner)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(current) = current else {
            // Dropping the transaction rolls it back
            return Ok(None);
        };

        let next = current.parse::<Status>()?.toggled();

        sqlx::query(SET_STATUS_SQL)
            .bind(next.as_str())
            .bind(id)
            .bind(owner)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(next))
    }
}

/// UPDATE that always sets title/description and only the optional columns
/// that were supplied, scoped by the row-ownership predicate
fn build_update<'a>(owner: UserId, id: TaskId, changes: &'a TaskChanges) -> QueryBuilder<'a, MySql> {
    let mut query = QueryBuilder::<MySql>::new("UPDATE tasks SET title = ");
    query.push_bind(changes.title.as_str());
    query.push(", description = ");
    query.push_bind(changes.description.as_str());

    if let Some(priority) = changes.priority {
        query.push(", priority = ");
        query.push_bind(priority.as_str());
    }
    if let Some(status) = changes.status {
        query.push(", status = ");
        query.push_bind(status.as_str());
    }

    query.push(" WHERE id = ");
    query.push_bind(id);
    query.push(" AND user_id = ");
    query.push_bind(owner);
    query
}
