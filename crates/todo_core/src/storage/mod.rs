//! String-keyed persistence slots and the task-list codec stored in them.

pub mod json_store;
mod memory;

pub use json_store::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::model::Task;

/// Slot holding the serialized authoritative task list.
pub const TASKS_KEY: &str = "todos";

/// Opaque key/value string store. Reads and writes whole values.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        (**self).set(key, value)
    }
}

/// Reads the task list stored under `key`. `Ok(None)` means the slot has
/// never been written.
pub fn load_tasks<S: KeyValueStore + ?Sized>(
    store: &S,
    key: &str,
) -> Result<Option<Vec<Task>>, AppError> {
    let Some(content) = store.get(key)? else {
        return Ok(None);
    };

    let tasks = serde_json::from_str(&content)
        .map_err(|err| AppError::invalid_data(format!("stored '{key}' is not a task list: {err}")))?;
    Ok(Some(tasks))
}

pub fn save_tasks<S: KeyValueStore + ?Sized>(
    store: &mut S,
    key: &str,
    tasks: &[Task],
) -> Result<(), AppError> {
    let content =
        serde_json::to_string(tasks).map_err(|err| AppError::invalid_data(err.to_string()))?;
    store.set(key, &content)
}
