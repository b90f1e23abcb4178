//! todolist: a single-user todo store.
//!
//! Records live in one JSON document on disk. Reads go through a short-lived
//! in-memory cache, every write is preceded by a timestamped backup, and the
//! whole store is exposed as a set of named tools that return uniform
//! `{success, ...}` responses.
//!
//! # Example
//!
//! ```no_run
//! use todolist::{Config, Draft, ListQuery, Status, TodoPatch, TodoStore};
//!
//! let mut store = TodoStore::open(Config::new("todos.json", "backups"));
//!
//! // Add todos
//! let milk = store.add(Draft::new("Buy milk").priority("high").tag("home")).unwrap();
//! store.add(Draft::new("File taxes").due_date("2026-04-15")).unwrap();
//!
//! // Partial update
//! store.update(milk.id, TodoPatch::new().description("2 litres")).unwrap();
//! store.complete(milk.id).unwrap();
//!
//! // Query
//! let page = store.list(&ListQuery::new().status(Status::Pending));
//! assert_eq!(page.total_count, 1);
//! ```

mod backup;
mod draft;
mod storage;
mod store;
mod types;

pub mod client;
pub mod config;
pub mod daemon;
pub mod dispatch;
pub mod protocol;
pub mod query;
pub mod stats;
pub mod tools;

// Re-export public API
pub use backup::BackupManager;
pub use client::Client;
pub use config::Config;
pub use daemon::{Daemon, DaemonConfig, daemon_pid, is_daemon_running, serve_lines, serve_stdio, start_daemon};
pub use dispatch::{dispatch, dispatch_line};
pub use draft::{Draft, TagsArg, TodoPatch};
pub use protocol::{Body, Request, Response, UpdateArgs};
pub use query::{ListArgs, ListQuery, TodoPage};
pub use stats::{DueDateCounts, Statistics};
pub use store::{Deleted, StoreError, TodoStore, today};
pub use tools::{ParamKind, ParamSpec, ToolSpec};
pub use types::{Choice, DueBucket, Priority, SortField, SortOrder, Status, Todo, ValidationError};
