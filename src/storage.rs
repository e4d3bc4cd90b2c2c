//! Persistence store for the task collection
//!
//! Exactly one collection lives in the primary slot and one rolling backup in
//! the backup slot:
//!
//! ```text
//! todoList.data          # { items, version, lastSync }
//! todoList.data.backup   # primary as it was before the last save
//! ```
//!
//! Reads degrade instead of failing: an unreadable or invalid primary falls
//! back to the backup, and then to an empty collection. Writes surface as
//! `Error::StorageWrite`.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::kv::KeyValueStore;
use crate::task::{self, Task, TaskCollection, CURRENT_SCHEMA_VERSION};

/// Key of the primary slot
pub const PRIMARY_KEY: &str = "todoList.data";

/// Key of the single backup slot
pub const BACKUP_KEY: &str = "todoList.data.backup";

enum Slot {
    Missing,
    Valid(TaskCollection),
    Invalid(String),
}

/// Versioned task collection on top of a key-value backend.
#[derive(Debug)]
pub struct TaskStore<S> {
    backend: S,
}

impl<S: KeyValueStore> TaskStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Load the collection, falling back to the backup and then to an empty
    /// collection. Never fails.
    pub fn initialize(&self) -> TaskCollection {
        match self.read_slot(PRIMARY_KEY) {
            Ok(Slot::Valid(collection)) => return migrate(collection),
            Ok(Slot::Missing) => debug!("primary task slot is empty"),
            Ok(Slot::Invalid(reason)) => warn!(%reason, "primary task data is invalid"),
            Err(err) => warn!(error = %err, "failed to read primary task data"),
        }

        self.restore_from_backup().unwrap_or_else(|| {
            debug!("starting with an empty task collection");
            TaskCollection::empty()
        })
    }

    /// Read the primary slot. Missing or invalid data yields an empty
    /// collection; only backend read failures are errors.
    pub fn load(&self) -> Result<TaskCollection> {
        match self.read_slot(PRIMARY_KEY)? {
            Slot::Valid(collection) => Ok(migrate(collection)),
            Slot::Missing => Ok(TaskCollection::empty()),
            Slot::Invalid(reason) => {
                warn!(%reason, "task data failed validation, using empty collection");
                Ok(TaskCollection::empty())
            }
        }
    }

    /// Copy a valid backup into the primary slot and return it.
    pub fn restore_from_backup(&self) -> Option<TaskCollection> {
        let collection = match self.read_slot(BACKUP_KEY) {
            Ok(Slot::Valid(collection)) => migrate(collection),
            Ok(Slot::Missing) => return None,
            Ok(Slot::Invalid(reason)) => {
                warn!(%reason, "backup task data is invalid");
                return None;
            }
            Err(err) => {
                warn!(error = %err, "failed to read backup task data");
                return None;
            }
        };

        let written = self
            .backend
            .lock()
            .map_err(storage_write)
            .and_then(|_guard| self.write_primary(&collection));
        match written {
            Ok(()) => info!(tasks = collection.items.len(), "restored task data from backup"),
            Err(err) => warn!(error = %err, "restored backup could not be written to primary"),
        }
        Some(collection)
    }

    /// Rotate the current primary into the backup slot, then write `items`.
    pub fn save(&self, items: &[Task]) -> Result<()> {
        let _guard = self.backend.lock().map_err(storage_write)?;

        if let Some(current) = self.backend.get(PRIMARY_KEY).map_err(storage_write)? {
            self.backend
                .set(BACKUP_KEY, &current)
                .map_err(storage_write)?;
        }

        let collection = TaskCollection::with_items(items.to_vec());
        self.write_primary(&collection)?;
        debug!(tasks = items.len(), "saved task collection");
        Ok(())
    }

    /// Empty both slots.
    pub fn clear_all(&self) -> Result<()> {
        let _guard = self.backend.lock().map_err(storage_write)?;
        self.backend.remove(PRIMARY_KEY).map_err(storage_write)?;
        self.backend.remove(BACKUP_KEY).map_err(storage_write)?;
        info!("cleared task data and backup");
        Ok(())
    }

    /// Pretty-printed JSON of `items`, the collection as the caller holds
    /// it. Storage is not read, so changes a failed save left behind are
    /// still exported.
    pub fn export_snapshot(&self, items: &[Task]) -> Result<String> {
        let collection = TaskCollection::with_items(items.to_vec());
        Ok(serde_json::to_string_pretty(&collection)?)
    }

    /// Replace the primary slot with `text` once it validates. The backup is
    /// left alone.
    pub fn import_snapshot(&self, text: &str) -> Result<TaskCollection> {
        let collection = parse_collection(text).map_err(Error::ImportValidation)?;
        let collection = migrate(collection);

        let _guard = self.backend.lock().map_err(storage_write)?;
        self.write_primary(&collection)?;
        info!(tasks = collection.items.len(), "imported task data");
        Ok(collection)
    }

    fn read_slot(&self, key: &str) -> Result<Slot> {
        let Some(text) = self.backend.get(key)? else {
            return Ok(Slot::Missing);
        };
        Ok(match parse_collection(&text) {
            Ok(collection) => Slot::Valid(collection),
            Err(reason) => Slot::Invalid(reason),
        })
    }

    fn write_primary(&self, collection: &TaskCollection) -> Result<()> {
        let json = serde_json::to_string_pretty(collection)?;
        self.backend
            .set(PRIMARY_KEY, &json)
            .map_err(storage_write)
    }
}

fn storage_write(err: Error) -> Error {
    match err {
        Error::StorageWrite(_) => err,
        other => Error::StorageWrite(other.to_string()),
    }
}

/// Parse and validate a persisted collection.
///
/// The shape check runs first so that the reason names the offending field;
/// the typed decode then rejects unknown enum values, and duplicate ids are
/// refused.
pub fn parse_collection(text: &str) -> std::result::Result<TaskCollection, String> {
    let value: Value = serde_json::from_str(text).map_err(|err| format!("malformed JSON: {err}"))?;
    validate_structure(&value)?;

    let collection: TaskCollection =
        serde_json::from_value(value).map_err(|err| format!("invalid task data: {err}"))?;

    let mut seen = HashSet::new();
    for item in &collection.items {
        if !seen.insert(item.id.as_str()) {
            return Err(format!("duplicate task id '{}'", item.id));
        }
    }

    Ok(collection)
}

fn validate_structure(value: &Value) -> std::result::Result<(), String> {
    let object = value.as_object().ok_or("collection must be a JSON object")?;
    let items = object
        .get("items")
        .and_then(Value::as_array)
        .ok_or("`items` must be an array")?;
    if !object.get("version").is_some_and(Value::is_number) {
        return Err("`version` must be a number".to_string());
    }

    for (index, item) in items.iter().enumerate() {
        for field in ["id", "title", "status", "priority"] {
            if !item.get(field).is_some_and(Value::is_string) {
                return Err(format!("items[{index}].{field} must be a string"));
            }
        }
        for field in ["createdAt", "updatedAt"] {
            if !item.get(field).is_some_and(Value::is_number) {
                return Err(format!("items[{index}].{field} must be a number"));
            }
        }
    }

    Ok(())
}

// Placeholder step: no field changes between schema versions yet.
fn migrate(mut collection: TaskCollection) -> TaskCollection {
    if collection.version < CURRENT_SCHEMA_VERSION {
        info!(
            from = collection.version,
            to = CURRENT_SCHEMA_VERSION,
            "migrating task data"
        );
        collection.version = CURRENT_SCHEMA_VERSION;
        collection.last_synced_at = task::now();
    }
    collection
}
