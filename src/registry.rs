//! Task registry: the authoritative in-memory task list.
//!
//! Every mutation follows the same order: change the list in memory, write
//! the whole list through the [`TaskStore`], then notify observers. A failed
//! write leaves the in-memory change in place and marks the registry dirty;
//! [`TaskRegistry::persist`] retries it.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::kv::KeyValueStore;
use crate::notify::{ChangeNotifier, Subscription};
use crate::storage::TaskStore;
use crate::task::{self, NewTask, Task, TaskPatch, TaskPriority, TaskStatus};
use crate::view::{self, GroupBy, TaskGroup};

/// Counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
}

/// Counts per priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Aggregate counts over the current list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatistics {
    pub total: usize,
    pub by_status: StatusCounts,
    pub by_priority: PriorityCounts,
}

#[derive(Debug)]
pub struct TaskRegistry<S> {
    store: TaskStore<S>,
    tasks: Vec<Task>,
    notifier: ChangeNotifier,
    dirty: bool,
}

impl<S: KeyValueStore> TaskRegistry<S> {
    /// Load the collection from `store`. The registry only exists once this
    /// has completed.
    pub fn initialize(store: TaskStore<S>) -> Self {
        let collection = store.initialize();
        info!(tasks = collection.items.len(), "task registry initialized");
        Self {
            store,
            tasks: collection.items,
            notifier: ChangeNotifier::new(),
            dirty: false,
        }
    }

    /// Drop all observers and hand back the store.
    pub fn shutdown(mut self) -> TaskStore<S> {
        if self.dirty {
            warn!("shutting down with unsaved task changes");
        }
        self.notifier.clear();
        debug!("task registry shut down");
        self.store
    }

    pub fn store(&self) -> &TaskStore<S> {
        &self.store
    }

    pub fn subscribe<F>(&mut self, listener: F) -> Subscription
    where
        F: FnMut() + 'static,
    {
        self.notifier.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.notifier.unsubscribe(subscription)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Copy of the list in stored order.
    pub fn list(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn filter_by_status(&self, status: TaskStatus) -> Vec<Task> {
        self.filtered(|task| task.status == status)
    }

    pub fn filter_by_priority(&self, priority: TaskPriority) -> Vec<Task> {
        self.filtered(|task| task.priority == priority)
    }

    pub fn filter_by_tag(&self, tag: &str) -> Vec<Task> {
        self.filtered(|task| task.has_tag(tag))
    }

    /// Every tag in use, sorted and de-duplicated.
    pub fn list_all_tags(&self) -> Vec<String> {
        self.tasks
            .iter()
            .filter_map(|task| task.tags.as_ref())
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Case-insensitive substring search; an empty query matches everything.
    pub fn search(&self, query: &str) -> Vec<Task> {
        let needle = query.to_lowercase();
        self.filtered(|task| task.matches_query(&needle))
    }

    pub fn statistics(&self) -> TaskStatistics {
        let mut stats = TaskStatistics {
            total: self.tasks.len(),
            ..TaskStatistics::default()
        };
        for task in &self.tasks {
            match task.status {
                TaskStatus::Pending => stats.by_status.pending += 1,
                TaskStatus::InProgress => stats.by_status.in_progress += 1,
                TaskStatus::Completed => stats.by_status.completed += 1,
            }
            match task.priority {
                TaskPriority::High => stats.by_priority.high += 1,
                TaskPriority::Medium => stats.by_priority.medium += 1,
                TaskPriority::Low => stats.by_priority.low += 1,
            }
        }
        stats
    }

    /// Tasks to display, optionally without completed ones.
    pub fn visible(&self, show_completed: bool) -> Vec<Task> {
        view::visible(&self.tasks, show_completed)
    }

    pub fn grouped(&self, group_by: GroupBy, show_completed: bool) -> Vec<TaskGroup> {
        view::grouped(&self.tasks, group_by, show_completed)
    }

    fn filtered<P>(&self, predicate: P) -> Vec<Task>
    where
        P: Fn(&Task) -> bool,
    {
        self.tasks
            .iter()
            .filter(|task| predicate(task))
            .cloned()
            .collect()
    }

    // =========================================================================
    // Writes
    // =========================================================================

    pub fn create(&mut self, new: NewTask) -> Result<Task> {
        let created = Task::create(self.fresh_id(), new, task::now())?;
        self.tasks.push(created.clone());
        debug!(id = %created.id, "task created");
        self.commit()?;
        Ok(created)
    }

    /// Apply `patch` to the task with `id`. Unknown ids yield `Ok(None)`.
    pub fn update(&mut self, id: &str, patch: TaskPatch) -> Result<Option<Task>> {
        let Some(entry) = self.tasks.iter_mut().find(|task| task.id == id) else {
            return Ok(None);
        };
        entry.apply(patch, task::now())?;
        let updated = entry.clone();
        debug!(id = %updated.id, "task updated");
        self.commit()?;
        Ok(Some(updated))
    }

    pub fn update_status(&mut self, id: &str, status: TaskStatus) -> Result<Option<Task>> {
        self.update(id, TaskPatch::default().with_status(status))
    }

    /// Completed goes back to Pending; Pending and InProgress become Completed.
    pub fn toggle_status(&mut self, id: &str) -> Result<Option<Task>> {
        let Some(current) = self.get_by_id(id).map(|task| task.status) else {
            return Ok(None);
        };
        self.update_status(id, current.toggled())
    }

    pub fn delete(&mut self, id: &str) -> Result<bool> {
        let Some(index) = self.tasks.iter().position(|task| task.id == id) else {
            return Ok(false);
        };
        self.tasks.remove(index);
        debug!(%id, "task deleted");
        self.commit()?;
        Ok(true)
    }

    /// Remove every completed task in one write.
    pub fn clear_completed(&mut self) -> Result<usize> {
        let before = self.tasks.len();
        self.tasks.retain(|task| !task.is_completed());
        let removed = before - self.tasks.len();
        if removed > 0 {
            debug!(removed, "cleared completed tasks");
            self.commit()?;
        }
        Ok(removed)
    }

    /// Retry writing the current list, e.g. after a failed mutation.
    pub fn persist(&mut self) -> Result<()> {
        self.commit()
    }

    /// True when the last write failed and memory is ahead of storage.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Re-read the collection from storage, discarding unsaved changes.
    pub fn reload(&mut self) {
        self.tasks = self.store.initialize().items;
        self.dirty = false;
        self.notifier.notify();
    }

    /// Snapshot of the list held in memory, unsaved changes included.
    pub fn export_snapshot(&self) -> Result<String> {
        self.store.export_snapshot(&self.tasks)
    }

    /// Replace the whole list with a validated snapshot. Returns the number
    /// of imported tasks.
    pub fn import_snapshot(&mut self, text: &str) -> Result<usize> {
        let collection = self.store.import_snapshot(text)?;
        self.tasks = collection.items;
        self.dirty = false;
        self.notifier.notify();
        Ok(self.tasks.len())
    }

    /// Forget every task and empty both storage slots.
    pub fn clear_all(&mut self) -> Result<()> {
        self.tasks.clear();
        match self.store.clear_all() {
            Ok(()) => {
                self.dirty = false;
                self.notifier.notify();
                Ok(())
            }
            Err(err) => {
                self.dirty = true;
                Err(err)
            }
        }
    }

    fn commit(&mut self) -> Result<()> {
        match self.store.save(&self.tasks) {
            Ok(()) => {
                self.dirty = false;
                self.notifier.notify();
                Ok(())
            }
            Err(err) => {
                self.dirty = true;
                warn!(error = %err, "task change kept in memory but not persisted");
                Err(err)
            }
        }
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if self.get_by_id(&id).is_none() {
                return id;
            }
        }
    }
}
