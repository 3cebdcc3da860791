use shared::{
    domain::{normalize_task_name, TaskId},
    error::{ApiError, ErrorCode},
    protocol::{NewTask, Task, TaskPatch},
};
use storage::Storage;
use tracing::info;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

pub async fn list_tasks(ctx: &ApiContext) -> Result<Vec<Task>, ApiError> {
    ctx.storage.list_tasks().await.map_err(internal)
}

pub async fn create_task(ctx: &ApiContext, mut task: NewTask) -> Result<Task, ApiError> {
    task.name = normalize_task_name(&task.name).map_err(validation)?;
    let created = ctx.storage.create_task(&task).await.map_err(internal)?;
    info!(task_id = %created.id, "task created");
    Ok(created)
}

pub async fn update_task(
    ctx: &ApiContext,
    task_id: TaskId,
    mut patch: TaskPatch,
) -> Result<Task, ApiError> {
    if let Some(name) = patch.name.as_deref() {
        patch.name = Some(normalize_task_name(name).map_err(validation)?);
    }
    ctx.storage
        .update_task(task_id, &patch)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(task_id))
}

pub async fn delete_task(ctx: &ApiContext, task_id: TaskId) -> Result<(), ApiError> {
    let removed = ctx.storage.delete_task(task_id).await.map_err(internal)?;
    if !removed {
        return Err(not_found(task_id));
    }
    info!(%task_id, "task deleted");
    Ok(())
}

fn not_found(task_id: TaskId) -> ApiError {
    ApiError::new(ErrorCode::NotFound, format!("task {task_id} not found"))
}

fn validation(err: impl std::fmt::Display) -> ApiError {
    ApiError::new(ErrorCode::Validation, err.to_string())
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use shared::domain::Priority;

    use super::*;

    async fn setup() -> ApiContext {
        let storage = Storage::new("sqlite::memory:").await.expect("db");
        ApiContext { storage }
    }

    fn new_task(name: &str) -> NewTask {
        NewTask {
            name: name.to_string(),
            priority: Priority::Low,
            due_date: None,
            completed: false,
        }
    }

    #[tokio::test]
    async fn create_trims_name_and_assigns_identifier() {
        let ctx = setup().await;
        let task = create_task(&ctx, new_task("  Buy milk  "))
            .await
            .expect("create");
        assert_eq!(task.name, "Buy milk");
        assert!(task.id.0 > 0);

        let tasks = list_tasks(&ctx).await.expect("list");
        assert_eq!(tasks, vec![task]);
    }

    #[tokio::test]
    async fn create_rejects_blank_name() {
        let ctx = setup().await;
        let err = create_task(&ctx, new_task("   "))
            .await
            .expect_err("should fail");
        assert_eq!(err.code, ErrorCode::Validation);
        assert!(list_tasks(&ctx).await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn update_rejects_blank_name_but_allows_other_fields() {
        let ctx = setup().await;
        let task = create_task(&ctx, new_task("read")).await.expect("create");

        let err = update_task(
            &ctx,
            task.id,
            TaskPatch {
                name: Some(" ".into()),
                ..TaskPatch::default()
            },
        )
        .await
        .expect_err("should fail");
        assert_eq!(err.code, ErrorCode::Validation);

        let updated = update_task(
            &ctx,
            task.id,
            TaskPatch {
                priority: Some(Priority::High),
                due_date: Some(NaiveDate::from_ymd_opt(2024, 12, 24)),
                ..TaskPatch::default()
            },
        )
        .await
        .expect("update");
        assert_eq!(updated.name, "read");
        assert_eq!(updated.priority, Priority::High);
        assert_eq!(updated.due_date, NaiveDate::from_ymd_opt(2024, 12, 24));
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_tasks() {
        let ctx = setup().await;
        let err = update_task(&ctx, TaskId(9), TaskPatch::default())
            .await
            .expect_err("should fail");
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = delete_task(&ctx, TaskId(9)).await.expect_err("should fail");
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
