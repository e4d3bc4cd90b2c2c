//! Task entity for todo-list.
//!
//! A task is a plain record; the registry validates input through the
//! helpers here before constructing or mutating one. Timestamps are kept at
//! millisecond precision so that a task survives a JSON round trip unchanged.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Maximum title length, in characters, after trimming.
pub const MAX_TITLE_LEN: usize = 100;

/// Maximum description length, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// Schema version written into every persisted collection.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Current time truncated to the precision used on disk.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }

    /// Completed flips back to Pending; anything else becomes Completed.
    pub fn toggled(self) -> Self {
        match self {
            TaskStatus::Completed => TaskStatus::Pending,
            TaskStatus::Pending | TaskStatus::InProgress => TaskStatus::Completed,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "pending" | "todo" => Ok(TaskStatus::Pending),
            "in-progress" | "inprogress" | "doing" => Ok(TaskStatus::InProgress),
            "completed" | "done" => Ok(TaskStatus::Completed),
            other => Err(Error::InvalidArgument(format!(
                "unknown status '{other}' (expected pending, in-progress, completed)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(TaskPriority::Low),
            "medium" | "med" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            other => Err(Error::InvalidArgument(format!(
                "unknown priority '{other}' (expected low, medium, high)"
            ))),
        }
    }
}

/// A single to-do item as stored and displayed.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.title == other.title
            && self.description == other.description
            && self.status == other.status
            && self.priority == other.priority
            && self.created_at == other.created_at
            && self.updated_at == other.updated_at
            && self.due_date == other.due_date
            && same_tags(self.tags.as_deref(), other.tags.as_deref())
    }
}

// Tags compare as sets.
fn same_tags(left: Option<&[String]>, right: Option<&[String]>) -> bool {
    let left = left.unwrap_or_default();
    let right = right.unwrap_or_default();
    left.len() == right.len() && left.iter().all(|tag| right.contains(tag))
}

impl Task {
    /// Build a fresh task from validated creation input.
    pub fn create(id: String, new: NewTask, at: DateTime<Utc>) -> Result<Self> {
        let title = normalize_title(&new.title)?;
        let description = normalize_description(new.description)?;

        Ok(Self {
            id,
            title,
            description,
            status: TaskStatus::Pending,
            priority: new.priority,
            created_at: at,
            updated_at: at,
            due_date: new.due_date.map(|due| due.trunc_subsecs(3)),
            tags: normalize_tags(new.tags),
        })
    }

    /// Apply a partial update. Every field is validated before any is written,
    /// so a rejected patch leaves the task untouched.
    pub fn apply(&mut self, patch: TaskPatch, at: DateTime<Utc>) -> Result<()> {
        let title = patch.title.as_deref().map(normalize_title).transpose()?;
        let description = match patch.description {
            Some(value) => Some(normalize_description(value)?),
            None => None,
        };

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date.map(|due| due.trunc_subsecs(3));
        }
        if let Some(tags) = patch.tags {
            self.tags = tags.and_then(normalize_tags);
        }

        self.updated_at = at.max(self.created_at);
        Ok(())
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags
            .as_ref()
            .is_some_and(|tags| tags.iter().any(|entry| entry == tag))
    }

    /// Case-insensitive substring match on title, description or any tag.
    /// `needle` must already be lowercased.
    pub fn matches_query(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self
                .description
                .as_ref()
                .is_some_and(|text| text.to_lowercase().contains(needle))
            || self
                .tags
                .as_ref()
                .is_some_and(|tags| tags.iter().any(|tag| tag.to_lowercase().contains(needle)))
    }
}

/// Creation input for [`Task::create`].
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub priority: TaskPriority,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Partial update for a task.
///
/// Outer `None` leaves a field alone. For the optional fields an inner `None`
/// clears the value. `id`, `createdAt` and `updatedAt` have no slot here, so
/// a JSON patch carrying them deserializes with those keys ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default, deserialize_with = "present_millis")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "present")]
    pub tags: Option<Option<Vec<String>>>,
}

impl TaskPatch {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_due_date(mut self, due_date: Option<DateTime<Utc>>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_tags(mut self, tags: Option<Vec<String>>) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// A key that is present (even as `null`) becomes `Some(..)`; a missing key
// falls back to the field default of `None`.
fn present<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn present_millis<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Option<DateTime<Utc>>>, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = Option::<i64>::deserialize(deserializer)?;
    match millis {
        None => Ok(Some(None)),
        Some(value) => DateTime::from_timestamp_millis(value)
            .map(|due| Some(Some(due)))
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {value}"))),
    }
}

/// Persisted envelope: the whole list plus a schema marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCollection {
    pub items: Vec<Task>,
    pub version: u32,
    #[serde(
        rename = "lastSync",
        default = "now",
        with = "chrono::serde::ts_milliseconds"
    )]
    pub last_synced_at: DateTime<Utc>,
}

impl TaskCollection {
    pub fn empty() -> Self {
        Self::with_items(Vec::new())
    }

    pub fn with_items(items: Vec<Task>) -> Self {
        Self {
            items,
            version: CURRENT_SCHEMA_VERSION,
            last_synced_at: now(),
        }
    }
}

/// Trim and bound a title.
pub fn normalize_title(raw: &str) -> Result<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(Error::Validation("title cannot be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(Error::Validation(format!(
            "title cannot exceed {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(title.to_string())
}

/// Trim and bound a description; blank input becomes `None`.
pub fn normalize_description(raw: Option<String>) -> Result<Option<String>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let description = raw.trim();
    if description.is_empty() {
        return Ok(None);
    }
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(Error::Validation(format!(
            "description cannot exceed {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(Some(description.to_string()))
}

/// Trim tags, drop blanks and repeats (first occurrence wins), and map an
/// empty result to `None`.
pub fn normalize_tags(raw: Vec<String>) -> Option<Vec<String>> {
    let mut tags: Vec<String> = Vec::with_capacity(raw.len());
    for tag in raw {
        let tag = tag.trim();
        if tag.is_empty() || tags.iter().any(|existing| existing == tag) {
            continue;
        }
        tags.push(tag.to_string());
    }
    if tags.is_empty() {
        None
    } else {
        Some(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(at: DateTime<Utc>) -> Task {
        Task::create(
            "task-1".to_string(),
            NewTask::new("  Write docs  ").with_tags(["docs", "", " docs ", "rust"]),
            at,
        )
        .expect("valid task")
    }

    #[test]
    fn create_normalizes_fields() {
        let at = now();
        let task = sample(at);

        assert_eq!(task.title, "Write docs");
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert_eq!(task.created_at, task.updated_at);
        assert_eq!(task.tags, Some(vec!["docs".to_string(), "rust".to_string()]));
        assert!(task.description.is_none());
    }

    #[test]
    fn title_bounds_are_enforced() {
        assert!(normalize_title("   ").is_err());
        assert!(normalize_title(&"x".repeat(MAX_TITLE_LEN)).is_ok());
        assert!(normalize_title(&format!("  {}  ", "x".repeat(MAX_TITLE_LEN))).is_ok());
        let err = normalize_title(&"x".repeat(MAX_TITLE_LEN + 1)).expect_err("too long");
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn title_length_counts_characters() {
        let title = "é".repeat(MAX_TITLE_LEN);
        assert!(normalize_title(&title).is_ok());
    }

    #[test]
    fn description_blank_becomes_none() {
        assert_eq!(normalize_description(Some("   ".to_string())).unwrap(), None);
        assert!(normalize_description(Some("y".repeat(MAX_DESCRIPTION_LEN + 1))).is_err());
    }

    #[test]
    fn empty_tags_become_none() {
        assert_eq!(normalize_tags(vec![" ".to_string()]), None);
        assert_eq!(normalize_tags(Vec::new()), None);
    }

    #[test]
    fn rejected_patch_leaves_task_untouched() {
        let at = now();
        let mut task = sample(at);
        let before = task.clone();

        let patch = TaskPatch::default()
            .with_status(TaskStatus::Completed)
            .with_title("   ");
        assert!(task.apply(patch, at + Duration::seconds(5)).is_err());
        assert_eq!(task, before);
    }

    #[test]
    fn apply_never_moves_updated_before_created() {
        let at = now();
        let mut task = sample(at);
        task.apply(
            TaskPatch::default().with_priority(TaskPriority::High),
            at - Duration::hours(1),
        )
        .unwrap();
        assert_eq!(task.updated_at, task.created_at);
        assert_eq!(task.priority, TaskPriority::High);
    }

    #[test]
    fn toggle_targets() {
        assert_eq!(TaskStatus::Completed.toggled(), TaskStatus::Pending);
        assert_eq!(TaskStatus::Pending.toggled(), TaskStatus::Completed);
        assert_eq!(TaskStatus::InProgress.toggled(), TaskStatus::Completed);
    }

    #[test]
    fn status_wire_names() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        assert_eq!("in_progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert!("blocked".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn task_json_uses_camel_case_and_millis() {
        let at = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        let task = Task::create("t".to_string(), NewTask::new("Ship"), at).unwrap();
        let value = serde_json::to_value(&task).unwrap();

        assert_eq!(value["createdAt"], 1_700_000_000_123i64);
        assert_eq!(value["updatedAt"], 1_700_000_000_123i64);
        assert_eq!(value["status"], "pending");
        assert_eq!(value["priority"], "medium");
        assert!(value.get("description").is_none());
        assert!(value.get("tags").is_none());
        assert!(value.get("dueDate").is_none());
    }

    #[test]
    fn tags_compare_as_sets() {
        let at = now();
        let mut left = sample(at);
        let mut right = left.clone();
        left.tags = Some(vec!["a".to_string(), "b".to_string()]);
        right.tags = Some(vec!["b".to_string(), "a".to_string()]);
        assert_eq!(left, right);
    }

    #[test]
    fn patch_ignores_identity_fields() {
        let patch: TaskPatch = serde_json::from_str(
            r#"{"id":"other","createdAt":1,"title":"Renamed","description":null,"dueDate":1700000000000}"#,
        )
        .unwrap();

        assert_eq!(patch.title.as_deref(), Some("Renamed"));
        assert_eq!(patch.description, Some(None));
        assert_eq!(
            patch.due_date,
            Some(DateTime::from_timestamp_millis(1_700_000_000_000))
        );
        assert_eq!(patch.tags, None);
        assert!(!patch.is_empty());
        assert!(TaskPatch::default().is_empty());
    }

    #[test]
    fn collection_defaults_last_sync() {
        let collection: TaskCollection =
            serde_json::from_str(r#"{"items":[],"version":1}"#).unwrap();
        assert!(collection.items.is_empty());
        assert_eq!(collection.version, CURRENT_SCHEMA_VERSION);
    }
}
