//! Remote seed sources used to populate an empty store on first run.

use crate::error::AppError;
use crate::model::{Task, TaskDraft};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;

pub const DEFAULT_SEED_URL: &str = "https://jsonplaceholder.typicode.com/todos";
pub const DEFAULT_SEED_LIMIT: usize = 5;

/// Task-like record as served by the placeholder API. Fields beyond these
/// are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteTodo {
    #[serde(default)]
    pub id: Option<i64>,
    pub title: String,
}

impl RemoteTodo {
    pub fn into_task(self, fallback_id: i64, created_at: i64) -> Task {
        let id = self.id.unwrap_or(fallback_id);
        TaskDraft::new(self.title).into_task(id, created_at)
    }
}

pub trait SeedSource {
    /// Returns the raw candidate records in the order the source serves them.
    fn fetch_candidates(&self) -> Result<Vec<Value>, AppError>;
}

#[derive(Debug, Clone)]
pub struct HttpSeedSource {
    url: String,
    client: Client,
}

impl HttpSeedSource {
    pub fn new<U: Into<String>>(url: U) -> Self {
        Self {
            url: url.into(),
            client: Client::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl SeedSource for HttpSeedSource {
    fn fetch_candidates(&self) -> Result<Vec<Value>, AppError> {
        log::debug!("fetching seed tasks from {}", self.url);
        let response = self.client.get(&self.url).send()?.error_for_status()?;
        let candidates: Vec<Value> = response.json()?;
        log::debug!("seed source returned {} records", candidates.len());
        Ok(candidates)
    }
}

/// Fixed in-memory candidates, for offline sessions and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSeedSource {
    candidates: Vec<Value>,
}

impl StaticSeedSource {
    pub fn new(candidates: Vec<Value>) -> Self {
        Self { candidates }
    }
}

impl SeedSource for StaticSeedSource {
    fn fetch_candidates(&self) -> Result<Vec<Value>, AppError> {
        Ok(self.candidates.clone())
    }
}

/// Fetches from `source` and decodes only the first `limit` candidates.
pub fn fetch_seed(source: &dyn SeedSource, limit: usize) -> Result<Vec<RemoteTodo>, AppError> {
    source
        .fetch_candidates()?
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value(value).map_err(|err| {
                AppError::invalid_data(format!("seed record {index} is malformed: {err}"))
            })
        })
        .collect()
}
