use shared::domain::TaskId;
use thiserror::Error;

/// Failure of a single remote task store call.
///
/// The controller treats every variant the same way (log, record, keep local
/// state); the split exists for callers that want to tell them apart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("task store unreachable: {0}")]
    Transport(String),
    #[error("task {0} not found in store")]
    NotFound(TaskId),
    #[error("task store rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected task store response: {0}")]
    Decode(String),
    #[error(transparent)]
    Duplicate(#[from] DuplicateTaskId),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("task {0} is already present in the local collection")]
pub struct DuplicateTaskId(pub TaskId);

#[derive(Debug, Error)]
pub enum ClientConfigError {
    #[error("invalid server url '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("server url '{0}' cannot serve http requests")]
    UnsupportedUrl(String),
    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),
}
