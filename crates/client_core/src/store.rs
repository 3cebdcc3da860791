use std::sync::Arc;

use async_trait::async_trait;
use shared::{
    domain::TaskId,
    protocol::{NewTask, Task, TaskPatch},
};

use crate::error::StoreError;

/// The authoritative task collection the controller mirrors.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Task>, StoreError>;
    async fn create(&self, task: &NewTask) -> Result<Task, StoreError>;
    async fn update(&self, task_id: TaskId, patch: &TaskPatch) -> Result<Task, StoreError>;
    async fn delete(&self, task_id: TaskId) -> Result<(), StoreError>;
}

#[async_trait]
impl<T> TaskStore for Arc<T>
where
    T: TaskStore + ?Sized,
{
    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        (**self).list().await
    }

    async fn create(&self, task: &NewTask) -> Result<Task, StoreError> {
        (**self).create(task).await
    }

    async fn update(&self, task_id: TaskId, patch: &TaskPatch) -> Result<Task, StoreError> {
        (**self).update(task_id, patch).await
    }

    async fn delete(&self, task_id: TaskId) -> Result<(), StoreError> {
        (**self).delete(task_id).await
    }
}
