use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use shared::{
    domain::TaskId,
    error::ApiError,
    protocol::{NewTask, Task, TaskPatch},
};
use tracing::debug;
use url::{Host, Url};

use crate::{
    error::{ClientConfigError, StoreError},
    store::TaskStore,
};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// [`TaskStore`] backed by the task server's REST routes.
pub struct HttpTaskStore {
    http: Client,
    tasks_url: String,
}

impl HttpTaskStore {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientConfigError> {
        let tasks_url = tasks_url(&config.server_url)?;
        let mut builder = Client::builder().timeout(config.request_timeout);
        // A proxy from the environment cannot reach a server on this host.
        if is_loopback(&tasks_url) {
            builder = builder.no_proxy();
        }
        let http = builder.build()?;
        Ok(Self {
            http,
            tasks_url: tasks_url.to_string(),
        })
    }

    pub fn tasks_url(&self) -> &str {
        &self.tasks_url
    }

    fn task_url(&self, task_id: TaskId) -> String {
        format!("{}/{task_id}", self.tasks_url)
    }
}

fn tasks_url(server_url: &str) -> Result<Url, ClientConfigError> {
    let mut base = Url::parse(server_url.trim()).map_err(|source| ClientConfigError::InvalidUrl {
        url: server_url.to_string(),
        source,
    })?;
    if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
        return Err(ClientConfigError::UnsupportedUrl(server_url.to_string()));
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("tasks")
        .map_err(|source| ClientConfigError::InvalidUrl {
            url: server_url.to_string(),
            source,
        })
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(addr)) => addr.is_loopback(),
        Some(Host::Ipv6(addr)) => addr.is_loopback(),
        None => false,
    }
}

/// Maps non-success statuses to [`StoreError`], preferring the server's
/// `ApiError` message over the raw body.
async fn check_status(response: Response, task_id: Option<TaskId>) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if let (StatusCode::NOT_FOUND, Some(task_id)) = (status, task_id) {
        return Err(StoreError::NotFound(task_id));
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiError>(&body)
        .map(|err| err.message)
        .unwrap_or(body);
    Err(StoreError::Rejected {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl TaskStore for HttpTaskStore {
    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        let response = self.http.get(&self.tasks_url).send().await?;
        let tasks: Vec<Task> = check_status(response, None).await?.json().await?;
        debug!(count = tasks.len(), "fetched task snapshot");
        Ok(tasks)
    }

    async fn create(&self, task: &NewTask) -> Result<Task, StoreError> {
        let response = self.http.post(&self.tasks_url).json(task).send().await?;
        let created: Task = check_status(response, None).await?.json().await?;
        Ok(created)
    }

    async fn update(&self, task_id: TaskId, patch: &TaskPatch) -> Result<Task, StoreError> {
        let response = self
            .http
            .put(self.task_url(task_id))
            .json(patch)
            .send()
            .await?;
        let updated: Task = check_status(response, Some(task_id)).await?.json().await?;
        Ok(updated)
    }

    async fn delete(&self, task_id: TaskId) -> Result<(), StoreError> {
        let response = self.http.delete(self.task_url(task_id)).send().await?;
        check_status(response, Some(task_id)).await?;
        Ok(())
    }
}
