use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::models::{NewTask, Status, Task, TaskChanges, TaskId, UserId};
use crate::database::repository::TaskRepository;

/// In-process task store with the same matching rules as `MySqlTaskRepository`.
/// Used by the test suite and for running the service without MySQL.
#[derive(Default)]
pub struct MemoryTaskRepository {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    next_id: TaskId,
    tasks: Vec<Task>,
}

impl MemoryState {
    fn owned_mut(&mut self, owner: UserId, id: TaskId) -> Option<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id && t.user_id == owner)
    }
}

impl MemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for MemoryTaskRepository {
    async fn list(&self, owner: UserId) -> Result<Vec<Task>, DatabaseError> {
        let state = self.state.read().await;
        let mut tasks: Vec<Task> = state
            .tasks
            .iter()
            .filter(|t| t.user_id == owner)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(tasks)
    }

    async fn create(&self, owner: UserId, task: NewTask) -> Result<TaskId, DatabaseError> {
        let mut state = self.state.write().await;
        state.next_id += 1;
        let id = state.next_id;
        state.tasks.push(Task {
            id,
            user_id: owner,
            title: task.title,
            description: task.description,
            priority: task.priority,
            status: Status::Pending,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn update(
        &self,
        owner: UserId,
        id: TaskId,
        changes: TaskChanges,
    ) -> Result<bool, DatabaseError> {
        let mut state = self.state.write().await;
        let Some(task) = state.owned_mut(owner, id) else {
            return Ok(false);
        };

        task.title = changes.title;
        task.description = changes.description;
        if let Some(priority) = changes.priority {
            task.priority = priority;
        }
        if let Some(status) = changes.status {
            task.status = status;
        }
        Ok(true)
    }

    async fn delete(&self, owner: UserId, id: TaskId) -> Result<bool, DatabaseError> {
        let mut state = self.state.write().await;
        let before = state.tasks.len();
        state.tasks.retain(|t| !(t.id == id && t.user_id == owner));
        Ok(state.tasks.len() != before)
    }

    async fn toggle_status(
        &self,
        owner: UserId,
        id: TaskId,
    ) -> Result<Option<Status>, DatabaseError> {
        let mut state = self.state.write().await;
        Ok(state.owned_mut(owner, id).map(|task| {
            task.status = task.status.toggled();
            task.status
        }))
    }
}
