//! Declared tool surface: names, descriptions and parameter schemas.

use crate::query::DEFAULT_LIMIT;
use crate::types::{Choice, DueBucket, Priority, SortField, Status};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Parameter value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    String,
    Integer,
    StringList,
    IntegerList,
}

/// One declared parameter of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    pub description: String,
}

/// A callable tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParamSpec>,
}

impl ToolSpec {
    fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters: Vec::new(),
        }
    }

    fn required(mut self, name: &str, kind: ParamKind, description: &str) -> Self {
        self.parameters.push(ParamSpec {
            name: name.to_string(),
            kind,
            required: true,
            default: None,
            description: description.to_string(),
        });
        self
    }

    fn optional(mut self, name: &str, kind: ParamKind, default: Option<Value>, description: &str) -> Self {
        self.parameters.push(ParamSpec {
            name: name.to_string(),
            kind,
            required: false,
            default,
            description: description.to_string(),
        });
        self
    }
}

/// Every tool the dispatcher serves.
pub fn catalog() -> Vec<ToolSpec> {
    let status_desc = format!("One of: {}", Status::valid_values());
    let priority_desc = format!("One of: {}", Priority::valid_values());

    vec![
        ToolSpec::new("add_todo", "Add a new todo item")
            .required("title", ParamKind::String, "Title of the todo (max 100 chars)")
            .optional("description", ParamKind::String, Some(json!("")), "Detailed description (max 1000 chars)")
            .optional("due_date", ParamKind::String, None, "Due date as zero-padded YYYY-MM-DD (2024-01-05, not 2024-1-5)")
            .optional("status", ParamKind::String, Some(json!("pending")), &status_desc)
            .optional("priority", ParamKind::String, Some(json!("medium")), &priority_desc)
            .optional("tags", ParamKind::StringList, None, "Tags for categorization"),
        ToolSpec::new("list_todos", "List todos with filtering, sorting and pagination")
            .optional("status", ParamKind::String, None, &format!("Filter by status. {}", status_desc))
            .optional("priority", ParamKind::String, None, &format!("Filter by priority. {}", priority_desc))
            .optional("search", ParamKind::String, None, "Case-insensitive search in title and description")
            .optional("tag", ParamKind::String, None, "Filter by tag")
            .optional(
                "due_date_filter",
                ParamKind::String,
                None,
                &format!("Filter by due date. One of: {}", DueBucket::valid_values()),
            )
            .optional(
                "sort_by",
                ParamKind::String,
                Some(json!("id")),
                &format!("Field to sort by. One of: {}", SortField::valid_values()),
            )
            .optional("sort_order", ParamKind::String, Some(json!("asc")), "asc or desc")
            .optional("limit", ParamKind::Integer, Some(json!(DEFAULT_LIMIT)), "Maximum number of todos to return")
            .optional("offset", ParamKind::Integer, Some(json!(0)), "Number of todos to skip"),
        ToolSpec::new("get_todo", "Get a todo by id").required("todo_id", ParamKind::Integer, "ID of the todo"),
        ToolSpec::new("update_todo", "Update a todo by id; only the given fields change")
            .required("todo_id", ParamKind::Integer, "ID of the todo")
            .optional("title", ParamKind::String, None, "New title")
            .optional("description", ParamKind::String, None, "New description")
            .optional("due_date", ParamKind::String, None, "New due date as zero-padded YYYY-MM-DD, empty to clear")
            .optional("status", ParamKind::String, None, &status_desc)
            .optional("priority", ParamKind::String, None, &priority_desc)
            .optional("tags", ParamKind::StringList, None, "New list of tags"),
        ToolSpec::new("complete_todo", "Mark a todo as done").required("todo_id", ParamKind::Integer, "ID of the todo"),
        ToolSpec::new("delete_todo", "Delete a todo by id").required("todo_id", ParamKind::Integer, "ID of the todo"),
        ToolSpec::new("batch_delete_todos", "Delete multiple todos by id").required(
            "todo_ids",
            ParamKind::IntegerList,
            "IDs of the todos to delete",
        ),
        ToolSpec::new("create_backup", "Create a manual backup of the todo file"),
        ToolSpec::new("get_statistics", "Counts by status, priority, due date and tag"),
    ]
}
