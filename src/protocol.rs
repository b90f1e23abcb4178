//! Tool-call protocol: requests and the uniform `{success, ...}` response.
//!
//! Messages are newline-delimited JSON. A request names its tool in the
//! `"tool"` field with the arguments alongside it:
//!
//! ```json
//! {"tool": "add_todo", "title": "Buy milk", "tags": ["home"]}
//! ```

use crate::draft::{Draft, TodoPatch};
use crate::query::{ListArgs, TodoPage};
use crate::stats::Statistics;
use crate::store::StoreError;
use crate::tools::ToolSpec;
use crate::types::Todo;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Arguments of `update_todo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateArgs {
    pub todo_id: u64,
    #[serde(flatten)]
    pub patch: TodoPatch,
}

/// Request sent to the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum Request {
    /// Add a new todo.
    AddTodo(Draft),

    /// Filtered, sorted, paginated listing.
    ListTodos(ListArgs),

    /// Get a todo by id.
    GetTodo { todo_id: u64 },

    /// Update the provided fields of a todo.
    UpdateTodo(UpdateArgs),

    /// Mark a todo done.
    CompleteTodo { todo_id: u64 },

    /// Delete one todo.
    DeleteTodo { todo_id: u64 },

    /// Delete several todos.
    BatchDeleteTodos { todo_ids: Vec<u64> },

    /// Manual backup of the backing file.
    CreateBackup,

    /// Aggregate counts.
    GetStatistics,

    /// Declared tools and their parameters.
    ListTools,

    /// Ping to check the server is alive.
    Ping,

    /// Stop the server.
    Shutdown,
}

/// Payload of a response.
///
/// Untagged: variants are told apart by their fields, so the more specific
/// shapes come first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Body {
    Errors { errors: Vec<String> },
    Todo { todo: Todo },
    Page(TodoPage),
    Statistics(Statistics),
    Deleted { message: String, deleted_count: usize },
    Backup { backup_path: PathBuf },
    Tools { tools: Vec<ToolSpec> },
    Message { message: String },
}

/// Response sent back for every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(flatten)]
    pub body: Body,
}

impl Response {
    /// A successful response.
    pub fn ok(body: Body) -> Self {
        Self { success: true, body }
    }

    /// A failed response carrying `errors`.
    pub fn failure(errors: Vec<String>) -> Self {
        Self {
            success: false,
            body: Body::Errors { errors },
        }
    }

    /// Create an error response from one message.
    pub fn error(message: impl Into<String>) -> Self {
        Self::failure(vec![message.into()])
    }

    /// Convert a store result, mapping the success value with `body`.
    pub fn from_result<T>(result: Result<T, StoreError>, body: impl FnOnce(T) -> Body) -> Self {
        match result {
            Ok(value) => Self::ok(body(value)),
            Err(e) => Self::failure(e.messages()),
        }
    }

    /// The error messages of a failed response.
    pub fn errors(&self) -> Option<&[String]> {
        match &self.body {
            Body::Errors { errors } if !self.success => Some(errors),
            _ => None,
        }
    }
}
