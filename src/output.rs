//! Human and JSON output for todo commands.
//!
//! With `--json` every command prints one envelope on stdout:
//! `{schema_version, command, status, data | error, warnings?, next_steps?}`.
//! Otherwise a short report is printed, or nothing with `--quiet`.

use serde::Serialize;

use crate::error::{Error, Result};

pub const SCHEMA_VERSION: &str = "todo.v1";

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

/// Plain-text report for one command run.
#[derive(Debug, Clone, Default)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    groups: Vec<(String, Vec<String>)>,
    details: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            ..Self::default()
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    /// A titled block of lines, e.g. one status group of a task list.
    pub fn push_group(&mut self, label: impl Into<String>, lines: Vec<String>) {
        self.groups.push((label.into(), lines));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.details.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }
}

#[derive(Serialize)]
struct SuccessEnvelope<'a, T: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: &'static str,
    data: &'a T,
    #[serde(skip_serializing_if = "no_items")]
    warnings: &'a [String],
    #[serde(skip_serializing_if = "no_items")]
    next_steps: &'a [String],
}

fn no_items(items: &&[String]) -> bool {
    items.is_empty()
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    schema_version: &'static str,
    command: &'a str,
    status: &'static str,
    error: ErrorBody,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    next_steps: Vec<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    code: i32,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        let (warnings, next_steps) = match human {
            Some(human) => (human.warnings.as_slice(), human.next_steps.as_slice()),
            None => (&[][..], &[][..]),
        };
        let payload = SuccessEnvelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "success",
            data,
            warnings,
            next_steps,
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if let (false, Some(human)) = (options.quiet, human) {
        println!("{}", format_human(human));
    }
    Ok(())
}

/// Report a failed command. JSON goes to stdout so scripts read one stream;
/// the plain form goes to stderr with at most one hint.
pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps = error_next_steps(err);

    if json {
        let payload = ErrorEnvelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "error",
            error: ErrorBody {
                message: err.to_string(),
                code: err.exit_code(),
                kind: error_kind(err),
                details: err.details(),
            },
            next_steps,
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    eprintln!("error: {err}");
    if let Some(hint) = next_steps.first() {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

pub fn format_human(output: &HumanOutput) -> String {
    let mut lines = vec![output.header.clone()];

    if !output.summary.is_empty() {
        let width = output
            .summary
            .iter()
            .map(|(key, _)| key.chars().count())
            .max()
            .unwrap_or(0);
        lines.push(String::new());
        for (key, value) in &output.summary {
            lines.push(format!("  {key:<width$}  {value}"));
        }
    }

    for (label, items) in &output.groups {
        lines.push(String::new());
        lines.push(format!("{label} ({})", items.len()));
        if items.is_empty() {
            lines.push("  (none)".to_string());
        }
        for item in items {
            lines.push(format!("  {item}"));
        }
    }

    push_section(&mut lines, None, &output.details);
    push_section(&mut lines, Some("Warnings"), &output.warnings);
    push_section(&mut lines, Some("Next steps"), &output.next_steps);

    lines.join("\n")
}

/// Command name for error envelopes, read before clap parses so that
/// parse failures are still labelled.
pub fn infer_command_name_from_args() -> String {
    command_name(std::env::args().skip(1))
}

fn command_name(args: impl Iterator<Item = String>) -> String {
    let mut positional = args.filter(|arg| !arg.starts_with('-'));

    match positional.next() {
        None => "todo".to_string(),
        Some(command) if command == "config" => match positional.next() {
            Some(sub) => format!("config {sub}"),
            None => command,
        },
        Some(command) => command,
    }
}

fn error_kind(err: &Error) -> &'static str {
    match err.exit_code() {
        2 => "user_error",
        3 => "policy_blocked",
        _ => "operation_failed",
    }
}

fn error_next_steps(err: &Error) -> Vec<String> {
    let step = match err {
        Error::TaskNotFound(_) => "todo list --all",
        Error::ConfirmationRequired(_) => "re-run with --yes",
        Error::InvalidConfig(_) | Error::TomlParse(_) => {
            "fix config.toml or run `todo config init --force`"
        }
        Error::StorageWrite(_) | Error::LockFailed(_) => {
            "check that the data directory is writable, then retry"
        }
        Error::ImportValidation(_) => "`todo export` shows the expected file shape",
        _ => return Vec::new(),
    };
    vec![step.to_string()]
}

fn push_section(lines: &mut Vec<String>, title: Option<&str>, items: &[String]) {
    if items.is_empty() {
        return;
    }

    lines.push(String::new());
    if let Some(title) = title {
        lines.push(format!("{title}:"));
        lines.extend(items.iter().map(|item| format!("- {item}")));
    } else {
        lines.extend(items.iter().cloned());
    }
}
