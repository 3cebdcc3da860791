use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use server_api::{create_task, delete_task, list_tasks, update_task};
use shared::{
    domain::TaskId,
    error::{ApiError, ErrorCode},
    protocol::{MessageResponse, NewTask, Task, TaskPatch},
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};
use tracing::{error, warn};

mod app_state;
pub mod config;

pub use app_state::AppState;

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

pub fn build_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/tasks", get(http_list_tasks).post(http_create_task))
        .route(
            "/tasks/:task_id",
            put(http_update_task).delete(http_delete_task),
        )
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!(message = %err.message, "request failed");
    } else {
        warn!(code = ?err.code, message = %err.message, "request rejected");
    }
    (status, Json(err))
}

// Malformed bodies and ids keep axum's status but answer with an `ApiError`.
fn reject_malformed(status: StatusCode, message: String) -> (StatusCode, Json<ApiError>) {
    warn!(%status, %message, "malformed request");
    (status, Json(ApiError::new(ErrorCode::Validation, message)))
}

fn reject_json(rejection: JsonRejection) -> (StatusCode, Json<ApiError>) {
    reject_malformed(rejection.status(), rejection.body_text())
}

fn reject_path(rejection: PathRejection) -> (StatusCode, Json<ApiError>) {
    reject_malformed(rejection.status(), rejection.body_text())
}

async fn healthz(State(state): State<Arc<AppState>>) -> ApiResult<&'static str> {
    state.api.storage.health_check().await.map_err(|e| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiError::new(ErrorCode::Internal, e.to_string())),
        )
    })?;
    Ok("ok")
}

async fn http_list_tasks(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Task>>> {
    let tasks = list_tasks(&state.api).await.map_err(reject)?;
    Ok(Json(tasks))
}

async fn http_create_task(
    State(state): State<Arc<AppState>>,
    req: Result<Json<NewTask>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let Json(req) = req.map_err(reject_json)?;
    let task = create_task(&state.api, req).await.map_err(reject)?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn http_update_task(
    State(state): State<Arc<AppState>>,
    task_id: Result<Path<i64>, PathRejection>,
    patch: Result<Json<TaskPatch>, JsonRejection>,
) -> ApiResult<Json<Task>> {
    let Path(task_id) = task_id.map_err(reject_path)?;
    let Json(patch) = patch.map_err(reject_json)?;
    let task = update_task(&state.api, TaskId(task_id), patch)
        .await
        .map_err(reject)?;
    Ok(Json(task))
}

async fn http_delete_task(
    State(state): State<Arc<AppState>>,
    task_id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Path(task_id) = task_id.map_err(reject_path)?;
    delete_task(&state.api, TaskId(task_id))
        .await
        .map_err(reject)?;
    Ok(Json(MessageResponse::new("Task deleted successfully!")))
}

#[cfg(test)]
#[path = "tests/router_tests.rs"]
mod tests;
