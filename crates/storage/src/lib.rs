use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

use shared::{
    domain::{Priority, TaskId},
    protocol::{NewTask, Task, TaskPatch},
};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn list_tasks(&self) -> Result<Vec<Task>> {
        let rows = sqlx::query(
            "SELECT id, name, priority, due_date, completed FROM tasks ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to list tasks")?;

        rows.iter().map(task_from_row).collect()
    }

    pub async fn load_task(&self, task_id: TaskId) -> Result<Option<Task>> {
        let row = sqlx::query(
            "SELECT id, name, priority, due_date, completed FROM tasks WHERE id = ?",
        )
        .bind(task_id.0)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to load task {task_id}"))?;

        row.as_ref().map(task_from_row).transpose()
    }

    pub async fn create_task(&self, task: &NewTask) -> Result<Task> {
        let rec = sqlx::query(
            "INSERT INTO tasks (name, priority, due_date, completed) VALUES (?, ?, ?, ?)
             RETURNING id",
        )
        .bind(&task.name)
        .bind(task.priority.as_str())
        .bind(task.due_date)
        .bind(task.completed)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert task")?;

        let task_id = TaskId(rec.get::<i64, _>(0));
        debug!(%task_id, "task inserted");
        Ok(Task {
            id: task_id,
            name: task.name.clone(),
            priority: task.priority,
            due_date: task.due_date,
            completed: task.completed,
        })
    }

    /// Merges `patch` into the stored task. Returns `None` when no task has
    /// that identifier.
    pub async fn update_task(&self, task_id: TaskId, patch: &TaskPatch) -> Result<Option<Task>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT id, name, priority, due_date, completed FROM tasks WHERE id = ?",
        )
        .bind(task_id.0)
        .fetch_optional(&mut *tx)
        .await
        .with_context(|| format!("failed to load task {task_id} for update"))?;
        let Some(row) = row else {
            return Ok(None);
        };

        let mut task = task_from_row(&row)?;
        patch.apply_to(&mut task);

        sqlx::query(
            "UPDATE tasks SET name = ?, priority = ?, due_date = ?, completed = ? WHERE id = ?",
        )
        .bind(&task.name)
        .bind(task.priority.as_str())
        .bind(task.due_date)
        .bind(task.completed)
        .bind(task_id.0)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to update task {task_id}"))?;

        tx.commit().await?;
        Ok(Some(task))
    }

    /// Returns `false` when no task has that identifier.
    pub async fn delete_task(&self, task_id: TaskId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(task_id.0)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete task {task_id}"))?;
        Ok(result.rows_affected() > 0)
    }
}

fn task_from_row(row: &SqliteRow) -> Result<Task> {
    let raw_priority: String = row.try_get("priority")?;
    let priority = raw_priority
        .parse::<Priority>()
        .with_context(|| format!("invalid priority '{raw_priority}' in tasks table"))?;
    Ok(Task {
        id: TaskId(row.try_get::<i64, _>("id")?),
        name: row.try_get("name")?,
        priority,
        due_date: row.try_get::<Option<NaiveDate>, _>("due_date")?,
        completed: row.try_get("completed")?,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
