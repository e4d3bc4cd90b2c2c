//! todo task command implementations.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::cli::CommonOptions;
use crate::error::{Error, Result};
use crate::kv::FileStore;
use crate::output::{emit_success, HumanOutput};
use crate::registry::TaskRegistry;
use crate::task::{NewTask, Task, TaskPatch, TaskPriority, TaskStatus};
use crate::view::{GroupBy, TaskGroup};

pub struct AddOptions {
    pub title: String,
    pub priority: Option<String>,
    pub description: Option<String>,
    pub due: Option<String>,
    pub tags: Vec<String>,
    pub common: CommonOptions,
}

pub struct EditOptions {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub clear_description: bool,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub due: Option<String>,
    pub clear_due: bool,
    pub tags: Vec<String>,
    pub clear_tags: bool,
    pub common: CommonOptions,
}

pub struct StatusOptions {
    pub id: String,
    pub status: String,
    pub common: CommonOptions,
}

pub struct IdOptions {
    pub id: String,
    pub common: CommonOptions,
}

pub struct RmOptions {
    pub id: String,
    pub yes: bool,
    pub common: CommonOptions,
}

pub struct ListOptions {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub tag: Option<String>,
    pub all: bool,
    pub group_by: Option<String>,
    pub common: CommonOptions,
}

pub struct SearchOptions {
    pub query: String,
    pub common: CommonOptions,
}

#[derive(Serialize)]
struct TaskListOutput {
    total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    groups: Option<Vec<TaskGroup>>,
    tasks: Vec<Task>,
}

#[derive(Serialize)]
struct TaskDeleteOutput {
    id: String,
}

#[derive(Serialize)]
struct TagsOutput {
    tags: Vec<String>,
}

#[derive(Serialize)]
struct ClearedOutput {
    removed: usize,
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let config = options.common.load_config()?;
    let mut registry = options.common.open_registry();

    let priority: TaskPriority = match options.priority.as_deref() {
        Some(value) => value.parse()?,
        None => config.tasks.default_priority,
    };
    let mut new = NewTask::new(options.title)
        .with_priority(priority)
        .with_tags(options.tags);
    if let Some(description) = options.description {
        new = new.with_description(description);
    }
    if let Some(due) = parse_due("due", options.due.as_deref())? {
        new = new.with_due_date(due);
    }

    let created = registry.create(new)?;

    let mut human = HumanOutput::new("Task created");
    push_task_summary(&mut human, &created);

    emit_success(options.common.output(), "add", &created, Some(&human))
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let mut registry = options.common.open_registry();
    let resolved = resolve_task_id(&registry, &options.id)?;

    let mut patch = TaskPatch::default();
    if let Some(title) = options.title {
        patch = patch.with_title(title);
    }
    if options.clear_description {
        patch = patch.with_description(None);
    } else if let Some(description) = options.description {
        patch = patch.with_description(Some(description));
    }
    if let Some(priority) = options.priority.as_deref() {
        patch = patch.with_priority(priority.parse()?);
    }
    if let Some(status) = options.status.as_deref() {
        patch = patch.with_status(status.parse()?);
    }
    if options.clear_due {
        patch = patch.with_due_date(None);
    } else if let Some(due) = parse_due("due", options.due.as_deref())? {
        patch = patch.with_due_date(Some(due));
    }
    if options.clear_tags {
        patch = patch.with_tags(None);
    } else if !options.tags.is_empty() {
        patch = patch.with_tags(Some(options.tags));
    }

    if patch.is_empty() {
        return Err(Error::InvalidArgument(
            "nothing to change; pass at least one field flag".to_string(),
        ));
    }

    let updated = registry
        .update(&resolved, patch)?
        .ok_or_else(|| Error::TaskNotFound(resolved.clone()))?;

    let mut human = HumanOutput::new("Task updated");
    push_task_summary(&mut human, &updated);

    emit_success(options.common.output(), "edit", &updated, Some(&human))
}

pub fn run_status(options: StatusOptions) -> Result<()> {
    let status: TaskStatus = options.status.parse()?;
    let mut registry = options.common.open_registry();
    let resolved = resolve_task_id(&registry, &options.id)?;

    let updated = registry
        .update_status(&resolved, status)?
        .ok_or_else(|| Error::TaskNotFound(resolved.clone()))?;

    let mut human = HumanOutput::new("Task status updated");
    human.push_summary("ID", updated.id.clone());
    human.push_summary("Status", updated.status.to_string());

    emit_success(options.common.output(), "status", &updated, Some(&human))
}

pub fn run_toggle(options: IdOptions) -> Result<()> {
    let mut registry = options.common.open_registry();
    let resolved = resolve_task_id(&registry, &options.id)?;

    let updated = registry
        .toggle_status(&resolved)?
        .ok_or_else(|| Error::TaskNotFound(resolved.clone()))?;

    let header = if updated.is_completed() {
        "Task completed"
    } else {
        "Task reopened"
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("ID", updated.id.clone());
    human.push_summary("Status", updated.status.to_string());

    emit_success(options.common.output(), "toggle", &updated, Some(&human))
}

pub fn run_rm(options: RmOptions) -> Result<()> {
    let config = options.common.load_config()?;
    let mut registry = options.common.open_registry();
    let resolved = resolve_task_id(&registry, &options.id)?;

    if config.tasks.confirm_delete && !options.yes {
        return Err(Error::ConfirmationRequired(format!(
            "deleting task {resolved} needs --yes"
        )));
    }

    if !registry.delete(&resolved)? {
        return Err(Error::TaskNotFound(resolved));
    }

    let mut human = HumanOutput::new("Task deleted");
    human.push_summary("ID", resolved.clone());

    emit_success(
        options.common.output(),
        "rm",
        &TaskDeleteOutput { id: resolved },
        Some(&human),
    )
}

pub fn run_show(options: IdOptions) -> Result<()> {
    let registry = options.common.open_registry();
    let resolved = resolve_task_id(&registry, &options.id)?;
    let task = registry
        .get_by_id(&resolved)
        .ok_or_else(|| Error::TaskNotFound(resolved.clone()))?;

    let mut human = HumanOutput::new(format!("Task {}", task.id));
    push_task_summary(&mut human, task);
    human.push_summary("Created", task.created_at.to_rfc3339());
    human.push_summary("Updated", task.updated_at.to_rfc3339());

    emit_success(options.common.output(), "show", task, Some(&human))
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let config = options.common.load_config()?;
    let registry = options.common.open_registry();

    let status: Option<TaskStatus> = options.status.as_deref().map(str::parse).transpose()?;
    let priority: Option<TaskPriority> =
        options.priority.as_deref().map(str::parse).transpose()?;
    let group_by: GroupBy = match options.group_by.as_deref() {
        Some(value) => value.parse()?,
        None => config.tasks.group_by,
    };
    // An explicit status filter always shows what it names.
    let show_completed = options.all || config.tasks.show_completed || status.is_some();

    let filtered = status.is_some() || priority.is_some() || options.tag.is_some();
    let output = if filtered {
        let mut tasks = match status {
            Some(status) => registry.filter_by_status(status),
            None => registry.visible(show_completed),
        };
        if let Some(priority) = priority {
            tasks.retain(|task| task.priority == priority);
        }
        if let Some(tag) = options.tag.as_deref() {
            tasks.retain(|task| task.has_tag(tag));
        }
        TaskListOutput {
            total: tasks.len(),
            groups: None,
            tasks,
        }
    } else {
        let groups = registry.grouped(group_by, show_completed);
        let tasks: Vec<Task> = groups
            .iter()
            .flat_map(|group| group.tasks.iter().cloned())
            .collect();
        TaskListOutput {
            total: tasks.len(),
            groups: (group_by != GroupBy::None).then_some(groups),
            tasks,
        }
    };

    let mut human = HumanOutput::new("Tasks");
    human.push_summary("Total", output.total.to_string());
    match output.groups.as_ref() {
        Some(groups) => {
            for group in groups {
                human.push_group(group.label, group.tasks.iter().map(task_line).collect());
            }
        }
        None => {
            for task in &output.tasks {
                human.push_detail(task_line(task));
            }
        }
    }
    let hidden = if filtered || show_completed {
        0
    } else {
        registry.len() - output.total
    };
    if hidden > 0 {
        human.push_warning(format!("{hidden} completed task(s) hidden; use --all"));
    }
    if registry.is_empty() {
        human.push_next_step("todo add \"<title>\"");
    }

    emit_success(options.common.output(), "list", &output, Some(&human))
}

pub fn run_search(options: SearchOptions) -> Result<()> {
    let registry = options.common.open_registry();
    let tasks = registry.search(&options.query);

    let mut human = HumanOutput::new(format!("Search: {}", options.query.trim()));
    human.push_summary("Matches", tasks.len().to_string());
    for task in &tasks {
        human.push_detail(task_line(task));
    }

    let output = TaskListOutput {
        total: tasks.len(),
        groups: None,
        tasks,
    };
    emit_success(options.common.output(), "search", &output, Some(&human))
}

pub fn run_tags(common: CommonOptions) -> Result<()> {
    let registry = common.open_registry();
    let tags = registry.list_all_tags();

    let mut human = HumanOutput::new("Tags");
    human.push_summary("Total", tags.len().to_string());
    for tag in &tags {
        human.push_detail(tag.clone());
    }

    emit_success(common.output(), "tags", &TagsOutput { tags }, Some(&human))
}

pub fn run_stats(common: CommonOptions) -> Result<()> {
    let registry = common.open_registry();
    let stats = registry.statistics();

    let mut human = HumanOutput::new("Task statistics");
    human.push_summary("Total", stats.total.to_string());
    human.push_summary("Pending", stats.by_status.pending.to_string());
    human.push_summary("In progress", stats.by_status.in_progress.to_string());
    human.push_summary("Completed", stats.by_status.completed.to_string());
    human.push_summary("High priority", stats.by_priority.high.to_string());
    human.push_summary("Medium priority", stats.by_priority.medium.to_string());
    human.push_summary("Low priority", stats.by_priority.low.to_string());

    emit_success(common.output(), "stats", &stats, Some(&human))
}

pub fn run_clear_completed(common: CommonOptions) -> Result<()> {
    let mut registry = common.open_registry();
    let removed = registry.clear_completed()?;

    let mut human = HumanOutput::new("Completed tasks cleared");
    human.push_summary("Removed", removed.to_string());

    emit_success(
        common.output(),
        "clear-completed",
        &ClearedOutput { removed },
        Some(&human),
    )
}

/// Resolve a full id or a unique prefix of one.
fn resolve_task_id(registry: &TaskRegistry<FileStore>, raw: &str) -> Result<String> {
    let needle = raw.trim();
    if needle.is_empty() {
        return Err(Error::InvalidArgument("task id cannot be empty".to_string()));
    }
    if registry.get_by_id(needle).is_some() {
        return Ok(needle.to_string());
    }

    let matches: Vec<String> = registry
        .list()
        .into_iter()
        .filter(|task| task.id.starts_with(needle))
        .map(|task| task.id)
        .collect();

    match matches.as_slice() {
        [] => Err(Error::TaskNotFound(needle.to_string())),
        [only] => Ok(only.clone()),
        _ => Err(Error::InvalidArgument(format!(
            "task id prefix '{needle}' is ambiguous: {}",
            matches.join(", ")
        ))),
    }
}

/// RFC3339, or a bare date taken as midnight UTC.
fn parse_due(label: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    let Some(value) = value.map(str::trim) else {
        return Ok(None);
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|err| {
        Error::InvalidArgument(format!(
            "invalid {label} date '{value}' (expected RFC3339 or YYYY-MM-DD): {err}"
        ))
    })?;
    Ok(date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc()))
}

fn push_task_summary(human: &mut HumanOutput, task: &Task) {
    human.push_summary("ID", task.id.clone());
    human.push_summary("Title", task.title.clone());
    human.push_summary("Status", task.status.to_string());
    human.push_summary("Priority", task.priority.to_string());
    if let Some(description) = task.description.as_ref() {
        human.push_summary("Description", description.clone());
    }
    if let Some(due) = task.due_date {
        human.push_summary("Due", due.format("%Y-%m-%d").to_string());
    }
    if let Some(tags) = task.tags.as_ref() {
        human.push_summary("Tags", tags.join(", "));
    }
}

fn task_line(task: &Task) -> String {
    let short_id: String = task.id.chars().take(8).collect();
    let mut line = format!(
        "[{}][{}] {} {}",
        task.status, task.priority, short_id, task.title
    );
    if let Some(due) = task.due_date {
        line.push_str(&format!(" (due: {})", due.format("%Y-%m-%d")));
    }
    if let Some(tags) = task.tags.as_ref() {
        for tag in tags {
            line.push_str(&format!(" #{tag}"));
        }
    }
    line
}
