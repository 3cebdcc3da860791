use std::collections::HashSet;

use shared::{domain::TaskId, protocol::Task};
use tracing::warn;

use crate::error::DuplicateTaskId;

/// Ordered task list keyed by identifier: insertion order is kept for
/// rendering and no identifier appears twice.
#[derive(Debug, Clone, Default)]
pub struct TaskCollection {
    tasks: Vec<Task>,
    ids: HashSet<TaskId>,
}

impl TaskCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopts a full store snapshot. Later duplicates of an identifier are
    /// dropped.
    pub fn from_snapshot(snapshot: Vec<Task>) -> Self {
        let mut collection = Self::default();
        for task in snapshot {
            if let Err(DuplicateTaskId(task_id)) = collection.push(task) {
                warn!(%task_id, "dropping duplicate task from store snapshot");
            }
        }
        collection
    }

    pub fn push(&mut self, task: Task) -> Result<(), DuplicateTaskId> {
        if !self.ids.insert(task.id) {
            return Err(DuplicateTaskId(task.id));
        }
        self.tasks.push(task);
        Ok(())
    }

    pub fn contains(&self, task_id: TaskId) -> bool {
        self.ids.contains(&task_id)
    }

    pub fn get(&self, task_id: TaskId) -> Option<&Task> {
        self.position(task_id).map(|index| &self.tasks[index])
    }

    /// Mutates the task in place. The identifier cannot be changed through
    /// this; any write to `id` is reverted.
    pub fn modify(&mut self, task_id: TaskId, f: impl FnOnce(&mut Task)) -> Option<&Task> {
        let index = self.position(task_id)?;
        let task = &mut self.tasks[index];
        f(task);
        task.id = task_id;
        Some(task)
    }

    pub fn remove(&mut self, task_id: TaskId) -> Option<Task> {
        let index = self.position(task_id)?;
        self.ids.remove(&task_id);
        Some(self.tasks.remove(index))
    }

    pub fn as_slice(&self) -> &[Task] {
        &self.tasks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn position(&self, task_id: TaskId) -> Option<usize> {
        if !self.ids.contains(&task_id) {
            return None;
        }
        self.tasks.iter().position(|task| task.id == task_id)
    }
}

impl<'a> IntoIterator for &'a TaskCollection {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use shared::domain::Priority;

    use super::*;

    fn task(id: i64, name: &str) -> Task {
        Task {
            id: TaskId(id),
            name: name.to_string(),
            priority: Priority::Low,
            due_date: None,
            completed: false,
        }
    }

    #[test]
    fn snapshot_keeps_order_and_drops_duplicates() {
        let collection =
            TaskCollection::from_snapshot(vec![task(2, "b"), task(1, "a"), task(2, "again")]);
        let names: Vec<&str> = collection.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn push_rejects_present_identifier() {
        let mut collection = TaskCollection::new();
        collection.push(task(1, "a")).expect("first push");
        assert_eq!(
            collection.push(task(1, "other")),
            Err(DuplicateTaskId(TaskId(1)))
        );
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.get(TaskId(1)).map(|t| t.name.as_str()), Some("a"));
    }

    #[test]
    fn modify_keeps_position_and_identifier() {
        let mut collection =
            TaskCollection::from_snapshot(vec![task(1, "a"), task(2, "b"), task(3, "c")]);
        let updated = collection
            .modify(TaskId(2), |t| {
                t.name = "renamed".into();
                t.id = TaskId(99);
            })
            .cloned()
            .expect("task exists");
        assert_eq!(updated.id, TaskId(2));
        assert_eq!(collection.as_slice()[1].name, "renamed");
        assert!(collection.get(TaskId(99)).is_none());
    }

    #[test]
    fn remove_frees_identifier() {
        let mut collection = TaskCollection::from_snapshot(vec![task(1, "a"), task(2, "b")]);
        assert_eq!(collection.remove(TaskId(1)).map(|t| t.name), Some("a".into()));
        assert!(collection.remove(TaskId(1)).is_none());
        assert!(!collection.contains(TaskId(1)));
        assert_eq!(collection.len(), 1);
    }
}
