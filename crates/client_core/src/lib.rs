//! Client side of the task list: the [`TaskStore`] seam, its HTTP
//! implementation and the [`TaskListController`] that mirrors the store.

pub mod collection;
pub mod controller;
pub mod error;
pub mod store;
pub mod transport;

pub use collection::TaskCollection;
pub use controller::{
    is_overdue, today, ControllerEvent, EditSession, Operation, OperationFailure, TaskForm,
    TaskListController, TaskRow,
};
pub use error::{ClientConfigError, DuplicateTaskId, StoreError};
pub use store::TaskStore;
pub use transport::{ClientConfig, HttpTaskStore, DEFAULT_SERVER_URL};
