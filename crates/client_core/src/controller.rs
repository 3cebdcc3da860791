//! Task list controller: the local task collection, the edit session and the
//! derived views, kept in step with a [`TaskStore`].
//!
//! Every mutating operation makes its remote call first and touches local
//! state only once the outcome is known. Failures never reach the caller; they
//! are logged, stored in [`TaskListController::last_error`] and broadcast as
//! [`ControllerEvent::OperationFailed`].

use std::fmt;

use chrono::{NaiveDate, Utc};
use shared::{
    domain::{normalize_task_name, Priority, TaskId},
    protocol::{NewTask, Task, TaskPatch},
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{collection::TaskCollection, error::StoreError, store::TaskStore};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditSession {
    #[default]
    Idle,
    Editing(TaskId),
}

impl EditSession {
    pub fn is_editing(&self) -> bool {
        matches!(self, EditSession::Editing(_))
    }

    pub fn target(&self) -> Option<TaskId> {
        match self {
            EditSession::Idle => None,
            EditSession::Editing(task_id) => Some(*task_id),
        }
    }
}

/// Working values of the add/edit form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskForm {
    pub name: String,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Initialize,
    Create,
    Edit,
    Toggle,
    Remove,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Initialize => "initialize",
            Operation::Create => "create",
            Operation::Edit => "edit",
            Operation::Toggle => "toggle",
            Operation::Remove => "remove",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationFailure {
    pub operation: Operation,
    pub task_id: Option<TaskId>,
    pub error: StoreError,
}

impl fmt::Display for OperationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.task_id {
            Some(task_id) => write!(f, "{} of task {task_id} failed: {}", self.operation, self.error),
            None => write!(f, "{} failed: {}", self.operation, self.error),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ControllerEvent {
    Loaded { count: usize },
    TaskAdded(Task),
    TaskUpdated(Task),
    TaskRemoved(TaskId),
    OperationFailed(OperationFailure),
}

/// A task as rendered: the record plus its overdue flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskRow<'a> {
    pub task: &'a Task,
    pub overdue: bool,
}

/// True when the task has a due date strictly before `today` and is not
/// completed.
pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    !task.completed && task.due_date.is_some_and(|due| due < today)
}

/// Current calendar date in UTC.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub struct TaskListController<S: TaskStore> {
    store: S,
    tasks: TaskCollection,
    session: EditSession,
    form: TaskForm,
    last_error: Option<OperationFailure>,
    events: broadcast::Sender<ControllerEvent>,
}

impl<S: TaskStore> TaskListController<S> {
    pub fn new(store: S) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            tasks: TaskCollection::new(),
            session: EditSession::Idle,
            form: TaskForm::default(),
            last_error: None,
            events,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn tasks(&self) -> &[Task] {
        self.tasks.as_slice()
    }

    pub fn session(&self) -> EditSession {
        self.session
    }

    pub fn form(&self) -> &TaskForm {
        &self.form
    }

    /// Binding point for the presentation layer's form inputs.
    pub fn form_mut(&mut self) -> &mut TaskForm {
        &mut self.form
    }

    /// Failure of the most recent remote call, cleared when the next remote
    /// call starts.
    pub fn last_error(&self) -> Option<&OperationFailure> {
        self.last_error.as_ref()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    /// Replaces the local collection with the store's snapshot, or with an
    /// empty collection when the store cannot be read.
    pub async fn initialize(&mut self) {
        self.last_error = None;
        match self.store.list().await {
            Ok(snapshot) => {
                self.tasks = TaskCollection::from_snapshot(snapshot);
                info!(count = self.tasks.len(), "task list loaded");
            }
            Err(err) => {
                self.tasks = TaskCollection::new();
                self.record_failure(Operation::Initialize, None, err);
            }
        }
        let _ = self.events.send(ControllerEvent::Loaded {
            count: self.tasks.len(),
        });
    }

    /// Creates or edits a task from the working form. A blank name is ignored
    /// entirely; otherwise the form is reset whatever the outcome.
    pub async fn submit_form(&mut self) {
        let name = match normalize_task_name(&self.form.name) {
            Ok(name) => name,
            Err(_) => {
                debug!("ignoring submit with blank task name");
                return;
            }
        };

        match self.session {
            EditSession::Idle => self.create_from_form(name).await,
            EditSession::Editing(task_id) => self.edit_from_form(task_id, name).await,
        }

        self.form = TaskForm::default();
    }

    async fn create_from_form(&mut self, name: String) {
        let new_task = NewTask {
            name,
            priority: self.form.priority,
            due_date: self.form.due_date,
            completed: false,
        };

        self.last_error = None;
        let created = match self.store.create(&new_task).await {
            Ok(created) => created,
            Err(err) => {
                self.record_failure(Operation::Create, None, err);
                return;
            }
        };

        let task_id = created.id;
        match self.tasks.push(created.clone()) {
            Ok(()) => {
                info!(%task_id, "task added");
                let _ = self.events.send(ControllerEvent::TaskAdded(created));
            }
            Err(duplicate) => {
                self.record_failure(Operation::Create, Some(task_id), duplicate.into());
            }
        }
    }

    // A failed edit leaves the session in Editing; only the form is reset.
    async fn edit_from_form(&mut self, task_id: TaskId, name: String) {
        let patch = TaskPatch {
            name: Some(name),
            priority: Some(self.form.priority),
            due_date: Some(self.form.due_date),
            completed: None,
        };

        self.last_error = None;
        if let Err(err) = self.store.update(task_id, &patch).await {
            self.record_failure(Operation::Edit, Some(task_id), err);
            return;
        }

        match self.tasks.modify(task_id, |task| patch.apply_to(task)) {
            Some(updated) => {
                info!(%task_id, "task edited");
                let _ = self.events.send(ControllerEvent::TaskUpdated(updated.clone()));
            }
            None => warn!(%task_id, "edited task is no longer in the local collection"),
        }
        self.session = EditSession::Idle;
    }

    /// Deletes a task that is present locally. Unknown identifiers are
    /// rejected without calling the store.
    pub async fn remove_task(&mut self, task_id: TaskId) {
        if !self.tasks.contains(task_id) {
            debug!(%task_id, "ignoring removal of unknown task");
            return;
        }

        self.last_error = None;
        if let Err(err) = self.store.delete(task_id).await {
            self.record_failure(Operation::Remove, Some(task_id), err);
            return;
        }

        if self.tasks.remove(task_id).is_some() {
            info!(%task_id, "task removed");
            let _ = self.events.send(ControllerEvent::TaskRemoved(task_id));
        }
        if self.session == EditSession::Editing(task_id) {
            self.cancel_edit();
        }
    }

    pub async fn toggle_complete(&mut self, task_id: TaskId) {
        let Some(task) = self.tasks.get(task_id) else {
            debug!(%task_id, "ignoring toggle of unknown task");
            return;
        };

        // Computed once: the same value goes to the store and to local state.
        let completed = !task.completed;
        let mut flipped = task.clone();
        flipped.completed = completed;

        self.last_error = None;
        if let Err(err) = self.store.update(task_id, &TaskPatch::full(&flipped)).await {
            self.record_failure(Operation::Toggle, Some(task_id), err);
            return;
        }

        if let Some(updated) = self.tasks.modify(task_id, |task| task.completed = completed) {
            debug!(%task_id, completed, "task completion toggled");
            let _ = self.events.send(ControllerEvent::TaskUpdated(updated.clone()));
        }
    }

    /// Loads a task into the form and enters the editing state. No remote call.
    pub fn begin_edit(&mut self, task_id: TaskId) {
        let Some(task) = self.tasks.get(task_id) else {
            debug!(%task_id, "ignoring edit of unknown task");
            return;
        };

        self.form = TaskForm {
            name: task.name.clone(),
            priority: task.priority,
            due_date: task.due_date,
        };
        self.session = EditSession::Editing(task_id);
    }

    /// Leaves the editing state and clears the form. No remote call.
    pub fn cancel_edit(&mut self) {
        if let EditSession::Editing(task_id) = self.session {
            debug!(%task_id, "edit cancelled");
        }
        self.session = EditSession::Idle;
        self.form = TaskForm::default();
    }

    /// Tasks whose name contains `query`, ignoring case, in collection order.
    pub fn filtered_view(&self, query: &str) -> Vec<&Task> {
        if query.is_empty() {
            return self.tasks.iter().collect();
        }
        let needle = query.to_lowercase();
        self.tasks
            .iter()
            .filter(|task| task.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Filtered view with each row's overdue flag computed against `today`.
    pub fn visible_rows(&self, query: &str, today: NaiveDate) -> Vec<TaskRow<'_>> {
        self.filtered_view(query)
            .into_iter()
            .map(|task| TaskRow {
                task,
                overdue: is_overdue(task, today),
            })
            .collect()
    }

    fn record_failure(&mut self, operation: Operation, task_id: Option<TaskId>, error: StoreError) {
        warn!(
            %operation,
            task_id = ?task_id.map(|id| id.0),
            %error,
            "task store call failed; local state unchanged"
        );
        let failure = OperationFailure {
            operation,
            task_id,
            error,
        };
        self.last_error = Some(failure.clone());
        let _ = self.events.send(ControllerEvent::OperationFailed(failure));
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
