//! Configuration loading and management
//!
//! Handles parsing of `config.toml` in the data directory. These settings
//! belong to the command-line front end; the registry receives them as
//! arguments.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::task::TaskPriority;
use crate::view::GroupBy;

/// File name of the configuration inside the data directory
pub const CONFIG_FILE: &str = "config.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Task display and editing defaults
    #[serde(default)]
    pub tasks: TasksConfig,
}

/// Tasks configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Priority for new tasks when none is given
    #[serde(default)]
    pub default_priority: TaskPriority,

    /// Include completed tasks in list output
    #[serde(default = "default_true")]
    pub show_completed: bool,

    /// Grouping used by `todo list`
    #[serde(default)]
    pub group_by: GroupBy,

    /// Require `--yes` before deleting a task
    #[serde(default = "default_true")]
    pub confirm_delete: bool,
}

fn default_true() -> bool {
    true
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            default_priority: TaskPriority::default(),
            show_completed: default_true(),
            group_by: GroupBy::default(),
            confirm_delete: default_true(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a data directory, or return defaults
    pub fn load_from_dir(dir: &Path) -> Self {
        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Self::default();
        }
        Self::load(&config_path).unwrap_or_else(|err| {
            tracing::warn!(path = %config_path.display(), error = %err, "ignoring invalid config");
            Self::default()
        })
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}
