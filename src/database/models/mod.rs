pub mod task;

pub use task::{NewTask, Priority, Status, Task, TaskChanges, TaskId, TaskRow, UnknownVariant, UserId};
