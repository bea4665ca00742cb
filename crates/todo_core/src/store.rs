//! The authoritative task list: initialization, mutations, persistence and
//! change notification.

use crate::clock::{Clock, SystemClock};
use crate::error::AppError;
use crate::model::{Task, TaskDraft, TaskPatch};
use crate::seed::{DEFAULT_SEED_LIMIT, SeedSource, fetch_seed};
use crate::storage::{self, KeyValueStore, TASKS_KEY};
use std::sync::Arc;
use thiserror::Error;

/// Where the list came from during [`TaskStore::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Loaded { count: usize },
    Seeded { count: usize },
}

/// Why [`TaskStore::initialize`] stopped. A storage failure means the
/// persisted list exists but cannot be trusted; a seed failure leaves an
/// empty, usable store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    #[error("stored tasks could not be loaded: {0}")]
    Storage(AppError),
    #[error("seeding failed: {0}")]
    Seed(AppError),
}

impl InitError {
    pub fn app_error(&self) -> &AppError {
        match self {
            Self::Storage(err) | Self::Seed(err) => err,
        }
    }
}

impl From<InitError> for AppError {
    fn from(err: InitError) -> Self {
        match err {
            InitError::Storage(err) | InitError::Seed(err) => err,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&[Task])>;

pub struct TaskStore<S: KeyValueStore> {
    storage: S,
    clock: Box<dyn Clock>,
    seed_limit: usize,
    tasks: Arc<Vec<Task>>,
    last_id: i64,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl<S: KeyValueStore> TaskStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_clock(storage, Box::new(SystemClock))
    }

    pub fn with_clock(storage: S, clock: Box<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            seed_limit: DEFAULT_SEED_LIMIT,
            tasks: Arc::new(Vec::new()),
            last_id: 0,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn seed_limit(mut self, limit: usize) -> Self {
        self.seed_limit = limit;
        self
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Shared handle on the current list. A later snapshot is `Arc::ptr_eq`
    /// to this one exactly when no mutation changed the list in between.
    pub fn snapshot(&self) -> Arc<Vec<Task>> {
        Arc::clone(&self.tasks)
    }

    pub fn get(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Loads the persisted list, or seeds from `source` when nothing has been
    /// persisted yet. On error the in-memory list is left untouched and no
    /// retry happens.
    pub fn initialize(&mut self, source: &dyn SeedSource) -> Result<InitOutcome, InitError> {
        if let Some(tasks) = self.load_persisted().map_err(InitError::Storage)? {
            let count = tasks.len();
            log::debug!("loaded {count} tasks from storage");
            self.replace(tasks, false);
            return Ok(InitOutcome::Loaded { count });
        }

        let count = self.seed_from(source).map_err(InitError::Seed)?;
        Ok(InitOutcome::Seeded { count })
    }

    pub fn load_persisted(&self) -> Result<Option<Vec<Task>>, AppError> {
        storage::load_tasks(&self.storage, TASKS_KEY)
    }

    /// Replaces the list with the first `seed_limit` records from `source`
    /// and writes it to storage.
    pub fn seed_from(&mut self, source: &dyn SeedSource) -> Result<usize, AppError> {
        let remote = fetch_seed(source, self.seed_limit)?;
        let seeded_at = self.clock.now_millis();

        let mut tasks = Vec::with_capacity(remote.len());
        for todo in remote {
            let fallback_id = self.next_id(seeded_at);
            let task = todo.into_task(fallback_id, seeded_at);
            self.last_id = self.last_id.max(task.id);
            tasks.push(task);
        }

        let count = tasks.len();
        log::debug!("seeded {count} tasks");
        self.replace(tasks, true);
        Ok(count)
    }

    pub fn add(&mut self, draft: TaskDraft) -> Task {
        let now = self.clock.now_millis();
        let id = self.next_id(now);
        let task = draft.into_task(id, now);

        let mut tasks = self.tasks.as_ref().clone();
        tasks.push(task.clone());
        self.replace(tasks, true);
        task
    }

    pub fn toggle(&mut self, id: i64) -> Option<Task> {
        self.replace_task(id, |task| Task {
            completed: !task.completed,
            ..task.clone()
        })
    }

    pub fn update(&mut self, id: i64, patch: &TaskPatch) -> Option<Task> {
        self.replace_task(id, |task| patch.apply_to(task))
    }

    pub fn delete(&mut self, id: i64) -> Option<Task> {
        let index = self.tasks.iter().position(|task| task.id == id)?;

        let mut tasks = self.tasks.as_ref().clone();
        let removed = tasks.remove(index);
        self.replace(tasks, true);
        Some(removed)
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&[Task]) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    fn replace_task<F>(&mut self, id: i64, change: F) -> Option<Task>
    where
        F: FnOnce(&Task) -> Task,
    {
        let index = self.tasks.iter().position(|task| task.id == id)?;
        let updated = change(&self.tasks[index]);

        let mut tasks = self.tasks.as_ref().clone();
        tasks[index] = updated.clone();
        self.replace(tasks, true);
        Some(updated)
    }

    fn replace(&mut self, tasks: Vec<Task>, persist: bool) {
        if let Some(max_id) = tasks.iter().map(|task| task.id).max() {
            self.last_id = self.last_id.max(max_id);
        }
        self.tasks = Arc::new(tasks);

        if persist {
            self.persist();
        }
        for (_, listener) in self.listeners.iter_mut() {
            listener(self.tasks.as_slice());
        }
    }

    fn persist(&mut self) {
        match storage::save_tasks(&mut self.storage, TASKS_KEY, &self.tasks) {
            Ok(()) => log::debug!("persisted {} tasks", self.tasks.len()),
            Err(err) => log::warn!("failed to persist tasks: {err}"),
        }
    }

    /// Issues an id above every id seen so far. Once `i64::MAX` has been
    /// seen, falls back to the first id at or after `now` that no task holds.
    fn next_id(&mut self, now: i64) -> i64 {
        if now > self.last_id {
            self.last_id = now;
            return now;
        }

        match self.last_id.checked_add(1) {
            Some(id) => {
                self.last_id = id;
                id
            }
            None => self.free_id_from(now),
        }
    }

    fn free_id_from(&self, start: i64) -> i64 {
        (start..=i64::MAX)
            .chain(i64::MIN..start)
            .find(|candidate| !self.tasks.iter().any(|task| task.id == *candidate))
            .unwrap_or(start)
    }
}
