//! Whole-collection commands: export, import and reset.

use std::fs;
use std::path::PathBuf;

use serde::Serialize;

use crate::cli::CommonOptions;
use crate::error::{Error, Result};
use crate::lock;
use crate::output::{emit_success, HumanOutput};

pub struct ExportOptions {
    pub out: Option<PathBuf>,
    pub common: CommonOptions,
}

pub struct ImportOptions {
    pub file: PathBuf,
    pub common: CommonOptions,
}

pub struct ResetOptions {
    pub yes: bool,
    pub common: CommonOptions,
}

#[derive(Serialize)]
struct ExportOutput {
    path: PathBuf,
    tasks: usize,
}

#[derive(Serialize)]
struct ImportOutput {
    file: PathBuf,
    imported: usize,
}

#[derive(Serialize)]
struct ResetOutput {
    removed: usize,
}

/// Without `--out` the snapshot itself is the output, so it goes to stdout
/// unwrapped and can be redirected into a file for `todo import`.
pub fn run_export(options: ExportOptions) -> Result<()> {
    let registry = options.common.open_registry();
    let snapshot = registry.export_snapshot()?;

    let Some(path) = options.out else {
        println!("{snapshot}");
        return Ok(());
    };

    lock::write_atomic(&path, snapshot.as_bytes())?;

    let mut human = HumanOutput::new("Tasks exported");
    human.push_summary("File", path.display().to_string());
    human.push_summary("Tasks", registry.len().to_string());

    emit_success(
        options.common.output(),
        "export",
        &ExportOutput {
            path,
            tasks: registry.len(),
        },
        Some(&human),
    )
}

pub fn run_import(options: ImportOptions) -> Result<()> {
    let text = fs::read_to_string(&options.file).map_err(|err| {
        Error::ImportValidation(format!("cannot read {}: {err}", options.file.display()))
    })?;

    let mut registry = options.common.open_registry();
    let replaced = registry.len();
    let imported = registry.import_snapshot(&text)?;

    let mut human = HumanOutput::new("Tasks imported");
    human.push_summary("File", options.file.display().to_string());
    human.push_summary("Imported", imported.to_string());
    if replaced > 0 {
        human.push_warning(format!("replaced {replaced} existing task(s)"));
    }

    emit_success(
        options.common.output(),
        "import",
        &ImportOutput {
            file: options.file,
            imported,
        },
        Some(&human),
    )
}

pub fn run_reset(options: ResetOptions) -> Result<()> {
    if !options.yes {
        return Err(Error::ConfirmationRequired(
            "reset deletes every task and the backup; pass --yes".to_string(),
        ));
    }

    let mut registry = options.common.open_registry();
    let removed = registry.len();
    registry.clear_all()?;

    let mut human = HumanOutput::new("All tasks deleted");
    human.push_summary("Removed", removed.to_string());

    emit_success(
        options.common.output(),
        "reset",
        &ResetOutput { removed },
        Some(&human),
    )
}
