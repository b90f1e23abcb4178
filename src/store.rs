//! High-level store API: the todo manager façade.

use crate::backup::MANUAL_SUFFIX;
use crate::config::Config;
use crate::draft::{Draft, TodoPatch};
use crate::query::{ListQuery, TodoPage};
use crate::stats::Statistics;
use crate::storage::Storage;
use crate::types::{Todo, ValidationError};
use chrono::{Local, Utc};
use std::path::PathBuf;

/// Errors that can occur during store operations.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Candidate record failed one or more field rules.
    Validation(Vec<ValidationError>),
    /// No record with this id.
    NotFound(u64),
    /// A batch delete matched nothing.
    NoMatches,
    /// A filter, sort or other argument has an unknown value.
    InvalidArgument(String),
    /// Writing the backing file failed.
    Storage(String),
    /// A manual backup could not be made.
    Backup(String),
}

impl StoreError {
    /// Human-readable messages, one per problem.
    pub fn messages(&self) -> Vec<String> {
        match self {
            StoreError::Validation(errors) => errors.iter().map(ToString::to_string).collect(),
            other => vec![other.to_string()],
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Validation(errors) => {
                let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
                write!(f, "{}", messages.join("; "))
            }
            StoreError::NotFound(id) => write!(f, "Todo {} not found", id),
            StoreError::NoMatches => write!(f, "No matching todos found"),
            StoreError::InvalidArgument(message) => write!(f, "{}", message),
            StoreError::Storage(message) => write!(f, "{}", message),
            StoreError::Backup(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for StoreError {}

/// Outcome of a delete.
#[derive(Debug, Clone, PartialEq)]
pub struct Deleted {
    pub count: usize,
    pub message: String,
}

/// The todo store.
///
/// Owns the backing file, its cache and its backups. Every operation takes
/// `&mut self`, so one store never runs two load-modify-save sequences at
/// once; share it across tasks through a single owner (see the daemon).
pub struct TodoStore {
    config: Config,
    storage: Storage,
}

impl TodoStore {
    /// Open a store. The backing file is not created until the first write.
    pub fn open(config: Config) -> Self {
        let storage = Storage::new(&config);
        Self { config, storage }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Add a new todo with the next free id.
    pub fn add(&mut self, draft: Draft) -> Result<Todo, StoreError> {
        self.storage.invalidate();
        let mut todos = self.storage.load(true);

        let id = match todos.iter().map(|t| t.id).max().unwrap_or(0).checked_add(1) {
            Some(id) => id,
            None => {
                log::error!("No id left above {} in {}", u64::MAX, self.storage.path().display());
                return Err(StoreError::Storage("No todo ids left".to_string()));
            }
        };
        let now = Utc::now();
        let todo = draft.into_todo(id, now, now).map_err(StoreError::Validation)?;

        todos.push(todo.clone());
        self.persist(&todos, "Failed to save todo")?;

        log::info!("Added todo {}", id);
        Ok(todo)
    }

    /// Get a todo by id.
    pub fn get(&mut self, id: u64) -> Result<Todo, StoreError> {
        self.storage
            .load(false)
            .into_iter()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    /// Filter, sort and paginate.
    pub fn list(&mut self, query: &ListQuery) -> TodoPage {
        let todos = self.storage.load(false);
        query.run(todos, &today())
    }

    /// Merge `patch` over an existing todo, validate the result and save it.
    pub fn update(&mut self, id: u64, patch: TodoPatch) -> Result<Todo, StoreError> {
        self.storage.invalidate();
        let mut todos = self.storage.load(true);

        let index = todos
            .iter()
            .position(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))?;

        let existing = &todos[index];
        let mut draft = Draft::from(existing);
        patch.apply(&mut draft);

        let updated = draft
            .into_todo(existing.id, existing.created_at, Utc::now())
            .map_err(StoreError::Validation)?;

        todos[index] = updated.clone();
        self.persist(&todos, "Failed to save todo")?;

        log::info!("Updated todo {}", id);
        Ok(updated)
    }

    /// Mark a todo done.
    pub fn complete(&mut self, id: u64) -> Result<Todo, StoreError> {
        self.update(id, TodoPatch::complete())
    }

    /// Delete a todo by id.
    pub fn delete(&mut self, id: u64) -> Result<Deleted, StoreError> {
        self.storage.invalidate();
        let mut todos = self.storage.load(true);

        let before = todos.len();
        todos.retain(|t| t.id != id);
        if todos.len() == before {
            return Err(StoreError::NotFound(id));
        }

        self.persist(&todos, "Failed to save todos")?;

        log::info!("Deleted todo {}", id);
        Ok(Deleted {
            count: 1,
            message: format!("Todo {} deleted", id),
        })
    }

    /// Delete every todo whose id is in `ids`. Ids that do not exist are
    /// ignored as long as at least one matches.
    pub fn batch_delete(&mut self, ids: &[u64]) -> Result<Deleted, StoreError> {
        self.storage.invalidate();
        let mut todos = self.storage.load(true);

        let before = todos.len();
        todos.retain(|t| !ids.contains(&t.id));
        let count = before - todos.len();
        if count == 0 {
            return Err(StoreError::NoMatches);
        }

        self.persist(&todos, "Failed to save todos")?;

        log::info!("Batch deleted {} todos", count);
        Ok(Deleted {
            count,
            message: format!("{} todos deleted", count),
        })
    }

    /// Copy the backing file to a `manual` backup.
    pub fn backup(&mut self) -> Result<PathBuf, StoreError> {
        match self.storage.backups().backup(Some(MANUAL_SUFFIX)) {
            Ok(Some(path)) => Ok(path),
            Ok(None) => {
                log::warn!("Manual backup requested but {} does not exist", self.storage.path().display());
                Err(StoreError::Backup("Failed to create backup".to_string()))
            }
            Err(e) => {
                log::error!("Error creating backup: {:#}", e);
                Err(StoreError::Backup("Failed to create backup".to_string()))
            }
        }
    }

    /// Backups currently on disk.
    pub fn backups(&self) -> Result<Vec<PathBuf>, StoreError> {
        self.storage.backups().list().map_err(|e| {
            log::error!("Error listing backups: {:#}", e);
            StoreError::Backup(format!("Failed to list backups: {}", e))
        })
    }

    /// Counts by status, priority, due bucket and tag.
    pub fn statistics(&mut self) -> Statistics {
        let todos = self.storage.load(false);
        Statistics::tally(&todos, &today())
    }

    fn persist(&mut self, todos: &[Todo], failure: &str) -> Result<(), StoreError> {
        self.storage.save(todos).map_err(|e| {
            log::error!("Error saving todos to {}: {:#}", self.storage.path().display(), e);
            StoreError::Storage(failure.to_string())
        })
    }
}

/// Today's local date as `YYYY-MM-DD`.
pub fn today() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}
