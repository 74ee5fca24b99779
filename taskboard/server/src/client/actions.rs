use async_trait::async_trait;
use std::sync::Arc;

use crate::store::DataStore;
use crate::task::{ActionResponse, NewTask, Task, TaskError, TaskPatch, TaskService};

/// Operations the task board needs from the server side.
///
/// Mutations report the uniform [`ActionResponse`]; only the listing can fail
/// with an error, which the board turns into a notification.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskActions {
    /// Fetches every task, newest first.
    async fn list_tasks(&self) -> Result<Vec<Task>, TaskError>;

    async fn create_task(&self, input: NewTask) -> ActionResponse;

    async fn update_task(&self, id: String, patch: TaskPatch) -> ActionResponse;

    async fn delete_task(&self, id: String) -> ActionResponse;
}

/// Runs the repository operations in-process against a shared store.
#[derive(Clone, Debug)]
pub struct LocalTaskActions {
    store: Arc<DataStore>,
}

impl LocalTaskActions {
    pub fn new(store: Arc<DataStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TaskActions for LocalTaskActions {
    async fn list_tasks(&self) -> Result<Vec<Task>, TaskError> {
        TaskService::new(&self.store).list_tasks().await
    }

    async fn create_task(&self, input: NewTask) -> ActionResponse {
        TaskService::new(&self.store).create(input).await
    }

    async fn update_task(&self, id: String, patch: TaskPatch) -> ActionResponse {
        TaskService::new(&self.store).update(&id, patch).await
    }

    async fn delete_task(&self, id: String) -> ActionResponse {
        TaskService::new(&self.store).delete(&id).await
    }
}
