//! todo-list - a persistent to-do list library
//!
//! This library provides the core of the `todo` CLI: a validated task
//! model, a key-value persistence layer with a single backup slot, and an
//! in-memory registry that writes through on every change.
//!
//! # Core Concepts
//!
//! - **Tasks**: titled items with status, priority, optional due date and tags
//! - **Store**: the whole collection saved under one key, the previous
//!   version kept under a backup key
//! - **Registry**: the authoritative list, with queries, statistics and
//!   change notification
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `config.toml`
//! - `error`: Error types and result aliases
//! - `kv`: Key-value backends (files on disk, or memory)
//! - `lock`: File locking and atomic writes
//! - `notify`: Change notification for observers
//! - `output`: Human and JSON output for commands
//! - `registry`: The in-memory task list and its operations
//! - `storage`: Collection persistence with backup rotation
//! - `task`: Task model and validation
//! - `view`: Visibility and grouping for list displays

pub mod cli;
pub mod config;
pub mod error;
pub mod kv;
pub mod lock;
pub mod notify;
pub mod output;
pub mod registry;
pub mod storage;
pub mod task;
pub mod view;

pub use error::{Error, Result};
