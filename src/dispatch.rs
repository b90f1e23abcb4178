//! Routes tool requests to the store and shapes the responses.

use crate::protocol::{Body, Request, Response};
use crate::query::ListQuery;
use crate::store::TodoStore;
use crate::tools;

/// Handle one request against `store`.
///
/// Never fails: every store error becomes a `success: false` response.
/// `Shutdown` is acknowledged here; stopping is up to the caller.
pub fn dispatch(store: &mut TodoStore, request: Request) -> Response {
    match request {
        Request::AddTodo(draft) => Response::from_result(store.add(draft), |todo| Body::Todo { todo }),

        Request::ListTodos(args) => match ListQuery::try_from(args) {
            Ok(query) => Response::ok(Body::Page(store.list(&query))),
            Err(e) => Response::failure(e.messages()),
        },

        Request::GetTodo { todo_id } => Response::from_result(store.get(todo_id), |todo| Body::Todo { todo }),

        Request::UpdateTodo(args) => {
            Response::from_result(store.update(args.todo_id, args.patch), |todo| Body::Todo { todo })
        }

        Request::CompleteTodo { todo_id } => {
            Response::from_result(store.complete(todo_id), |todo| Body::Todo { todo })
        }

        Request::DeleteTodo { todo_id } => Response::from_result(store.delete(todo_id), |deleted| Body::Deleted {
            message: deleted.message,
            deleted_count: deleted.count,
        }),

        Request::BatchDeleteTodos { todo_ids } => {
            Response::from_result(store.batch_delete(&todo_ids), |deleted| Body::Deleted {
                message: deleted.message,
                deleted_count: deleted.count,
            })
        }

        Request::CreateBackup => Response::from_result(store.backup(), |backup_path| Body::Backup { backup_path }),

        Request::GetStatistics => Response::ok(Body::Statistics(store.statistics())),

        Request::ListTools => Response::ok(Body::Tools {
            tools: tools::catalog(),
        }),

        Request::Ping => Response::ok(Body::Message {
            message: "pong".to_string(),
        }),

        Request::Shutdown => Response::ok(Body::Message {
            message: "shutting down".to_string(),
        }),
    }
}

/// Parse one JSON line and dispatch it. Malformed input gets a failure
/// response rather than an error.
pub fn dispatch_line(store: &mut TodoStore, line: &str) -> (Response, bool) {
    match serde_json::from_str::<Request>(line) {
        Ok(request) => {
            let is_shutdown = matches!(request, Request::Shutdown);
            (dispatch(store, request), is_shutdown)
        }
        Err(e) => {
            log::warn!("Rejected malformed request: {}", e);
            (Response::error(format!("Invalid request: {}", e)), false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup_test_store() -> (TempDir, TodoStore) {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::new(temp_dir.path().join("todos.json"), temp_dir.path().join("backups"));
        (temp_dir, TodoStore::open(config))
    }

    fn call(store: &mut TodoStore, value: serde_json::Value) -> serde_json::Value {
        let (response, _) = dispatch_line(store, &value.to_string());
        serde_json::to_value(response).unwrap()
    }

    #[test]
    fn test_add_then_list() {
        let (_temp_dir, mut store) = setup_test_store();

        let added = call(&mut store, json!({"tool": "add_todo", "title": "Buy milk", "tags": ["home"]}));
        assert_eq!(added["success"], true);
        assert_eq!(added["todo"]["id"], 1);
        assert_eq!(added["todo"]["status"], "pending");
        assert_eq!(added["todo"]["priority"], "medium");
        assert_eq!(added["todo"]["due_date"], serde_json::Value::Null);

        let listed = call(&mut store, json!({"tool": "list_todos"}));
        assert_eq!(listed["success"], true);
        assert_eq!(listed["total_count"], 1);
        assert_eq!(listed["limit"], 100);
        assert_eq!(listed["todos"][0]["title"], "Buy milk");
    }

    #[test]
    fn test_add_validation_failure() {
        let (_temp_dir, mut store) = setup_test_store();

        let resp = call(&mut store, json!({"tool": "add_todo", "status": "bogus", "tags": "x"}));
        assert_eq!(
            resp,
            json!({
                "success": false,
                "errors": [
                    "Title is required",
                    "Status must be one of: pending, in_progress, done, cancelled",
                    "Tags must be a list"
                ]
            })
        );
    }

    #[test]
    fn test_list_invalid_filter() {
        let (_temp_dir, mut store) = setup_test_store();
        let resp = call(&mut store, json!({"tool": "list_todos", "priority": "urgent"}));
        assert_eq!(resp["success"], false);
        assert_eq!(
            resp["errors"][0],
            "Invalid priority. Must be one of: low, medium, high, critical"
        );
    }

    #[test]
    fn test_not_found_and_batch_delete() {
        let (_temp_dir, mut store) = setup_test_store();
        call(&mut store, json!({"tool": "add_todo", "title": "Only"}));

        let missing = call(&mut store, json!({"tool": "get_todo", "todo_id": 5}));
        assert_eq!(missing, json!({"success": false, "errors": ["Todo 5 not found"]}));

        let deleted = call(&mut store, json!({"tool": "batch_delete_todos", "todo_ids": [1, 2]}));
        assert_eq!(
            deleted,
            json!({"success": true, "message": "1 todos deleted", "deleted_count": 1})
        );

        let none = call(&mut store, json!({"tool": "batch_delete_todos", "todo_ids": [1]}));
        assert_eq!(none, json!({"success": false, "errors": ["No matching todos found"]}));
    }

    #[test]
    fn test_statistics_and_tools() {
        let (_temp_dir, mut store) = setup_test_store();

        let stats = call(&mut store, json!({"tool": "get_statistics"}));
        assert_eq!(stats["success"], true);
        assert_eq!(stats["total_count"], 0);
        assert_eq!(stats["status_counts"]["done"], 0);
        assert_eq!(stats["tag_counts"], json!({}));

        let tools = call(&mut store, json!({"tool": "list_tools"}));
        assert_eq!(tools["tools"].as_array().unwrap().len(), 9);
    }

    #[test]
    fn test_malformed_and_shutdown() {
        let (_temp_dir, mut store) = setup_test_store();

        let (resp, stop) = dispatch_line(&mut store, "{not json");
        assert!(!resp.success);
        assert!(!stop);

        let (resp, stop) = dispatch_line(&mut store, r#"{"tool": "shutdown"}"#);
        assert!(resp.success);
        assert!(stop);
    }
}
