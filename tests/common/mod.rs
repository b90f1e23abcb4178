//! Shared test infrastructure for todolist integration tests.
//!
//! Provides TestEnv helper for consistent test setup/teardown.

#![allow(dead_code)]

use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use todolist::{Config, Draft, ListQuery, Response, Status, Todo, TodoPatch, TodoStore, dispatch_line};

/// Test environment with automatic cleanup.
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub store: TodoStore,
}

impl TestEnv {
    /// Create a new test environment with an empty store.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = TodoStore::open(Self::config_in(&temp_dir));
        Self { temp_dir, store }
    }

    /// Create a test environment whose cache never serves reads.
    pub fn without_cache() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = TodoStore::open(Self::config_in(&temp_dir).with_cache_ttl(Duration::ZERO));
        Self { temp_dir, store }
    }

    fn config_in(temp_dir: &TempDir) -> Config {
        Config::new(temp_dir.path().join("todos.json"), temp_dir.path().join("backups"))
    }

    pub fn todo_file(&self) -> PathBuf {
        self.store.config().todo_file.clone()
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.store.config().backup_dir.clone()
    }

    /// Reopen the same files with a fresh store, discarding any cache.
    pub fn reopen(&mut self) {
        self.store = TodoStore::open(Self::config_in(&self.temp_dir));
    }

    /// Add a todo with defaults.
    pub fn add(&mut self, title: &str) -> Todo {
        self.store.add(Draft::new(title)).expect("Failed to add todo")
    }

    /// Add a todo from a prepared draft.
    pub fn add_draft(&mut self, draft: Draft) -> Todo {
        self.store.add(draft).expect("Failed to add todo")
    }

    /// Update a todo, panicking on failure.
    pub fn update(&mut self, id: u64, patch: TodoPatch) -> Todo {
        self.store.update(id, patch).expect("Failed to update todo")
    }

    /// Ids of the todos matching `query`, in result order.
    pub fn ids(&mut self, query: &ListQuery) -> Vec<u64> {
        self.store.list(query).todos.iter().map(|t| t.id).collect()
    }

    /// All todos in id order.
    pub fn all(&mut self) -> Vec<Todo> {
        self.store.list(&ListQuery::new().limit(usize::MAX)).todos
    }

    /// Count todos with the given status.
    pub fn count_by_status(&mut self, status: Status) -> usize {
        self.store.list(&ListQuery::new().status(status)).total_count
    }

    /// Names of the files in the backup directory.
    pub fn backup_names(&self) -> Vec<String> {
        self.store
            .backups()
            .expect("Failed to list backups")
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(String::from))
            .collect()
    }

    /// Send a JSON tool call through the dispatcher and return the JSON reply.
    pub fn call(&mut self, request: Value) -> Value {
        let (response, _) = dispatch_line(&mut self.store, &request.to_string());
        serde_json::to_value(response).expect("Failed to serialize response")
    }

    /// Send a JSON tool call and return the typed reply.
    pub fn call_typed(&mut self, request: Value) -> Response {
        dispatch_line(&mut self.store, &request.to_string()).0
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
