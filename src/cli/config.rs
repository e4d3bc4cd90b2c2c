//! todo config command implementations.

use std::path::PathBuf;

use serde::Serialize;

use crate::cli::CommonOptions;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};

#[derive(Serialize)]
struct ConfigShowOutput {
    path: PathBuf,
    exists: bool,
    config: Config,
}

#[derive(Serialize)]
struct ConfigInitOutput {
    path: PathBuf,
    overwritten: bool,
}

pub fn run_show(common: CommonOptions) -> Result<()> {
    let path = common.config_path();
    let config = common.load_config()?;
    let exists = path.exists();

    let mut human = HumanOutput::new("Configuration");
    human.push_summary("File", path.display().to_string());
    human.push_summary("Default priority", config.tasks.default_priority.to_string());
    human.push_summary("Show completed", config.tasks.show_completed.to_string());
    human.push_summary("Group by", config.tasks.group_by.to_string());
    human.push_summary("Confirm delete", config.tasks.confirm_delete.to_string());
    if !exists {
        human.push_next_step("todo config init");
    }

    emit_success(
        common.output(),
        "config show",
        &ConfigShowOutput {
            path,
            exists,
            config,
        },
        Some(&human),
    )
}

pub fn run_init(common: CommonOptions, force: bool) -> Result<()> {
    let path = common.config_path();
    let overwritten = path.exists();
    if overwritten && !force {
        return Err(Error::InvalidArgument(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    Config::default().save(&path)?;

    let mut human = HumanOutput::new("Configuration written");
    human.push_summary("File", path.display().to_string());

    emit_success(
        common.output(),
        "config init",
        &ConfigInitOutput { path, overwritten },
        Some(&human),
    )
}
