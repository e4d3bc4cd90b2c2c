//! Display-side queries: which tasks to show and how to group them.
//!
//! Callers pass their settings in; nothing here reads configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::task::{Task, TaskPriority, TaskStatus};

/// Grouping key for list views
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    Status,
    Priority,
    None,
}

impl GroupBy {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupBy::Status => "status",
            GroupBy::Priority => "priority",
            GroupBy::None => "none",
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupBy {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "status" => Ok(GroupBy::Status),
            "priority" => Ok(GroupBy::Priority),
            "none" => Ok(GroupBy::None),
            other => Err(Error::InvalidArgument(format!(
                "unknown grouping '{other}' (expected status, priority, none)"
            ))),
        }
    }
}

/// One section of a grouped list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskGroup {
    pub label: &'static str,
    pub tasks: Vec<Task>,
}

pub fn visible(tasks: &[Task], show_completed: bool) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| show_completed || !task.is_completed())
        .cloned()
        .collect()
}

/// Status groups run In Progress, Pending, Completed; priority groups run
/// High, Medium, Low. Groups are returned even when empty.
pub fn grouped(tasks: &[Task], group_by: GroupBy, show_completed: bool) -> Vec<TaskGroup> {
    let shown = visible(tasks, show_completed);
    match group_by {
        GroupBy::None => vec![TaskGroup {
            label: "All",
            tasks: shown,
        }],
        GroupBy::Status => [
            TaskStatus::InProgress,
            TaskStatus::Pending,
            TaskStatus::Completed,
        ]
        .into_iter()
        .map(|status| TaskGroup {
            label: status_label(status),
            tasks: shown
                .iter()
                .filter(|task| task.status == status)
                .cloned()
                .collect(),
        })
        .collect(),
        GroupBy::Priority => [TaskPriority::High, TaskPriority::Medium, TaskPriority::Low]
            .into_iter()
            .map(|priority| TaskGroup {
                label: priority_label(priority),
                tasks: shown
                    .iter()
                    .filter(|task| task.priority == priority)
                    .cloned()
                    .collect(),
            })
            .collect(),
    }
}

pub fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "Pending",
        TaskStatus::InProgress => "In Progress",
        TaskStatus::Completed => "Completed",
    }
}

pub fn priority_label(priority: TaskPriority) -> &'static str {
    match priority {
        TaskPriority::High => "High Priority",
        TaskPriority::Medium => "Medium Priority",
        TaskPriority::Low => "Low Priority",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{self, NewTask, TaskPatch};

    fn tasks() -> Vec<Task> {
        let at = task::now();
        let mut list = Vec::new();
        for (id, priority, status) in [
            ("a", TaskPriority::Low, TaskStatus::Pending),
            ("b", TaskPriority::High, TaskStatus::Completed),
            ("c", TaskPriority::High, TaskStatus::InProgress),
        ] {
            let mut item =
                Task::create(id.to_string(), NewTask::new(id).with_priority(priority), at).unwrap();
            item.apply(TaskPatch::default().with_status(status), at).unwrap();
            list.push(item);
        }
        list
    }

    fn ids(group: &TaskGroup) -> Vec<&str> {
        group.tasks.iter().map(|task| task.id.as_str()).collect()
    }

    #[test]
    fn status_groups_in_display_order() {
        let groups = grouped(&tasks(), GroupBy::Status, true);
        let labels: Vec<_> = groups.iter().map(|group| group.label).collect();
        assert_eq!(labels, vec!["In Progress", "Pending", "Completed"]);
        assert_eq!(ids(&groups[0]), vec!["c"]);
        assert_eq!(ids(&groups[2]), vec!["b"]);
    }

    #[test]
    fn hidden_completed_tasks_leave_empty_group() {
        let groups = grouped(&tasks(), GroupBy::Status, false);
        assert!(groups[2].tasks.is_empty());

        let groups = grouped(&tasks(), GroupBy::Priority, false);
        assert_eq!(ids(&groups[0]), vec!["c"]);
        assert_eq!(ids(&groups[2]), vec!["a"]);
    }

    #[test]
    fn no_grouping_keeps_stored_order() {
        let groups = grouped(&tasks(), GroupBy::None, true);
        assert_eq!(groups.len(), 1);
        assert_eq!(ids(&groups[0]), vec!["a", "b", "c"]);
        assert_eq!(visible(&tasks(), false).len(), 2);
    }

    #[test]
    fn group_by_parses() {
        assert_eq!("Priority".parse::<GroupBy>().unwrap(), GroupBy::Priority);
        assert!("tag".parse::<GroupBy>().is_err());
    }
}
