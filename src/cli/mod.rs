//! Command-line interface for todo
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is defined in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{Config, CONFIG_FILE};
use crate::error::{Error, Result};
use crate::kv::FileStore;
use crate::output::OutputOptions;
use crate::registry::TaskRegistry;
use crate::storage::TaskStore;

mod config;
mod snapshot;
mod task;

/// todo - a small persistent to-do list
///
/// Tasks live in a JSON file in the data directory, with the previous
/// version kept as a backup.
#[derive(Parser, Debug)]
#[command(name = "todo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding task data and config.toml
    #[arg(long, global = true, env = "TODO_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Read settings from this file instead of <data-dir>/config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a task
    Add {
        /// Task title (1-100 characters)
        title: String,

        /// Priority: low, medium, high (default from config)
        #[arg(short, long)]
        priority: Option<String>,

        /// Longer description (up to 1000 characters)
        #[arg(short, long)]
        description: Option<String>,

        /// Due date, RFC3339 or YYYY-MM-DD
        #[arg(long)]
        due: Option<String>,

        /// Tag (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },

    /// Change fields of a task
    Edit {
        /// Task id or unique prefix
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long, conflicts_with = "clear_description")]
        description: Option<String>,

        /// Remove the description
        #[arg(long)]
        clear_description: bool,

        /// Priority: low, medium, high
        #[arg(short, long)]
        priority: Option<String>,

        /// Status: pending, in-progress, completed
        #[arg(short, long)]
        status: Option<String>,

        /// Due date, RFC3339 or YYYY-MM-DD
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,

        /// Remove the due date
        #[arg(long)]
        clear_due: bool,

        /// Replace tags (repeatable)
        #[arg(short, long = "tag", conflicts_with = "clear_tags")]
        tags: Vec<String>,

        /// Remove all tags
        #[arg(long)]
        clear_tags: bool,
    },

    /// Set the status of a task
    Status {
        /// Task id or unique prefix
        id: String,

        /// pending, in-progress, completed
        status: String,
    },

    /// Flip a task between completed and pending
    Toggle {
        /// Task id or unique prefix
        id: String,
    },

    /// Delete a task
    Rm {
        /// Task id or unique prefix
        id: String,

        /// Skip the confirmation requirement
        #[arg(short, long)]
        yes: bool,
    },

    /// Show one task
    Show {
        /// Task id or unique prefix
        id: String,
    },

    /// List tasks, grouped per config
    List {
        /// Only tasks with this status
        #[arg(short, long)]
        status: Option<String>,

        /// Only tasks with this priority
        #[arg(short, long)]
        priority: Option<String>,

        /// Only tasks carrying this tag
        #[arg(short, long)]
        tag: Option<String>,

        /// Include completed tasks even when config hides them
        #[arg(short, long)]
        all: bool,

        /// Override grouping: status, priority, none
        #[arg(long)]
        group_by: Option<String>,
    },

    /// Search titles, descriptions and tags
    Search {
        /// Case-insensitive text to look for
        query: String,
    },

    /// List every tag in use
    Tags,

    /// Show task counts by status and priority
    Stats,

    /// Delete all completed tasks
    ClearCompleted,

    /// Print the stored collection as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Replace all tasks with a previously exported collection
    Import {
        /// File produced by `todo export`
        file: PathBuf,
    },

    /// Delete all tasks and the backup
    Reset {
        /// Confirm the reset
        #[arg(short, long)]
        yes: bool,
    },

    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Write a default config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Flags shared by every command.
#[derive(Debug, Clone)]
pub struct CommonOptions {
    pub data_dir: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

impl CommonOptions {
    pub fn output(&self) -> OutputOptions {
        OutputOptions {
            json: self.json,
            quiet: self.quiet,
        }
    }

    /// `--data-dir` / `TODO_DATA_DIR`, else the platform data directory.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(FileStore::default_dir)
    }

    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| self.data_dir().join(CONFIG_FILE))
    }

    /// An explicit `--config` must parse; the data-directory file falls back
    /// to defaults.
    pub fn load_config(&self) -> Result<Config> {
        let Some(path) = self.config.as_deref() else {
            return Ok(Config::load_from_dir(&self.data_dir()));
        };
        if !path.exists() {
            return Ok(Config::default());
        }
        Config::load(path).map_err(|err| match err {
            Error::TomlParse(inner) => {
                Error::InvalidConfig(format!("{}: {inner}", path.display()))
            }
            other => other,
        })
    }

    pub fn open_registry(&self) -> TaskRegistry<FileStore> {
        let dir = self.data_dir();
        tracing::debug!(dir = %dir.display(), "opening task registry");
        TaskRegistry::initialize(TaskStore::new(FileStore::new(dir)))
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let common = CommonOptions {
            data_dir: self.data_dir,
            config: self.config,
            json: self.json,
            quiet: self.quiet,
        };

        match self.command {
            Commands::Add {
                title,
                priority,
                description,
                due,
                tags,
            } => task::run_add(task::AddOptions {
                title,
                priority,
                description,
                due,
                tags,
                common,
            }),
            Commands::Edit {
                id,
                title,
                description,
                clear_description,
                priority,
                status,
                due,
                clear_due,
                tags,
                clear_tags,
            } => task::run_edit(task::EditOptions {
                id,
                title,
                description,
                clear_description,
                priority,
                status,
                due,
                clear_due,
                tags,
                clear_tags,
                common,
            }),
            Commands::Status { id, status } => {
                task::run_status(task::StatusOptions { id, status, common })
            }
            Commands::Toggle { id } => task::run_toggle(task::IdOptions { id, common }),
            Commands::Rm { id, yes } => task::run_rm(task::RmOptions { id, yes, common }),
            Commands::Show { id } => task::run_show(task::IdOptions { id, common }),
            Commands::List {
                status,
                priority,
                tag,
                all,
                group_by,
            } => task::run_list(task::ListOptions {
                status,
                priority,
                tag,
                all,
                group_by,
                common,
            }),
            Commands::Search { query } => task::run_search(task::SearchOptions { query, common }),
            Commands::Tags => task::run_tags(common),
            Commands::Stats => task::run_stats(common),
            Commands::ClearCompleted => task::run_clear_completed(common),
            Commands::Export { out } => snapshot::run_export(snapshot::ExportOptions { out, common }),
            Commands::Import { file } => {
                snapshot::run_import(snapshot::ImportOptions { file, common })
            }
            Commands::Reset { yes } => snapshot::run_reset(snapshot::ResetOptions { yes, common }),
            Commands::Config(cmd) => match cmd {
                ConfigCommands::Show => config::run_show(common),
                ConfigCommands::Init { force } => config::run_init(common, force),
            },
        }
    }
}
