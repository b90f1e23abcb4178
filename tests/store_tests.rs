//! Integration tests for the store lifecycle: ids, persistence, cache and backups.

mod common;

use common::TestEnv;
use std::fs;
use std::time::Duration;
use todolist::{Config, Draft, ListQuery, Priority, Status, Todo, TodoPatch, TodoStore};

// =============================================================================
// Id Assignment
// =============================================================================

#[test]
fn test_ids_start_at_one_and_increase() {
    let mut env = TestEnv::new();

    let a = env.add("First");
    let b = env.add("Second");
    let c = env.add("Third");

    assert_eq!((a.id, b.id, c.id), (1, 2, 3));
}

#[test]
fn test_id_is_max_plus_one_after_deletes() {
    let mut env = TestEnv::new();
    for title in ["a", "b", "c"] {
        env.add(title);
    }

    env.store.delete(3).unwrap();
    assert_eq!(env.add("d").id, 3);

    env.store.delete(1).unwrap();
    assert_eq!(env.add("e").id, 4);
}

#[test]
fn test_id_reused_after_everything_deleted() {
    let mut env = TestEnv::new();
    env.add("a");
    env.add("b");
    env.store.batch_delete(&[1, 2]).unwrap();

    assert_eq!(env.add("fresh").id, 1);
}

#[test]
fn test_add_fails_cleanly_when_ids_are_exhausted() {
    let mut env = TestEnv::new();
    let content = format!(
        r#"[{{"id": {}, "title": "Last", "description": "", "due_date": null,
             "status": "pending", "priority": "medium", "tags": [],
             "created_at": "2024-01-02T03:04:05Z", "updated_at": "2024-01-02T03:04:05Z"}}]"#,
        u64::MAX
    );
    fs::write(env.todo_file(), &content).unwrap();

    let err = env.store.add(Draft::new("next")).unwrap_err();

    assert_eq!(err.to_string(), "No todo ids left");
    assert_eq!(fs::read_to_string(env.todo_file()).unwrap(), content);
    assert_eq!(env.store.get(u64::MAX).unwrap().title, "Last");
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_round_trip_through_disk() {
    let mut env = TestEnv::new();
    let added = env.add_draft(
        Draft::new("Write report")
            .description("Quarterly numbers")
            .due_date("2030-01-31")
            .status("in_progress")
            .priority("critical")
            .tags(["work", "q1", "work"]),
    );

    env.reopen();
    let loaded = env.store.get(added.id).unwrap();

    assert_eq!(loaded, added);
    assert_eq!(loaded.tags, vec!["work", "q1", "work"]);
}

#[test]
fn test_file_is_pretty_json_array() {
    let mut env = TestEnv::new();
    env.add("Only");

    let content = fs::read_to_string(env.todo_file()).unwrap();
    assert!(content.starts_with('['));
    assert!(content.contains("\n  {"));

    let parsed: Vec<Todo> = serde_json::from_str(&content).unwrap();
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].title, "Only");
}

#[test]
fn test_missing_file_is_empty_store() {
    let mut env = TestEnv::new();

    assert!(env.all().is_empty());
    assert!(!env.todo_file().exists());
}

#[test]
fn test_reads_legacy_naive_timestamps() {
    let mut env = TestEnv::new();
    fs::write(
        env.todo_file(),
        r#"[{"id": 7, "title": "Old", "description": "", "due_date": null,
             "status": "done", "priority": "low", "tags": [],
             "created_at": "2024-01-02T03:04:05.123456",
             "updated_at": "2024-01-02T03:04:05.123456"}]"#,
    )
    .unwrap();

    env.reopen();
    let todo = env.store.get(7).unwrap();
    assert_eq!(todo.status, Status::Done);
    assert_eq!(todo.created_at.to_rfc3339().get(..19), Some("2024-01-02T03:04:05"));
    assert_eq!(env.add("Next").id, 8);
}

// =============================================================================
// Corruption Recovery
// =============================================================================

#[test]
fn test_corrupted_file_is_backed_up_and_treated_as_empty() {
    let mut env = TestEnv::new();
    fs::write(env.todo_file(), "{ this is not json").unwrap();

    assert!(env.all().is_empty());
    assert!(
        env.backup_names().iter().any(|n| n.ends_with("_corrupted.json")),
        "Expected a corrupted backup, found {:?}",
        env.backup_names()
    );

    // The next write starts over from an empty store.
    assert_eq!(env.add("Recovered").id, 1);
    assert_eq!(env.all().len(), 1);
}

#[test]
fn test_corrupted_backup_keeps_original_bytes() {
    let mut env = TestEnv::new();
    fs::write(env.todo_file(), "[{\"id\": ").unwrap();

    env.all();

    let backups = env.store.backups().unwrap();
    let corrupted = backups
        .iter()
        .find(|p| p.to_string_lossy().ends_with("_corrupted.json"))
        .unwrap();
    assert_eq!(fs::read_to_string(corrupted).unwrap(), "[{\"id\": ");
}

// =============================================================================
// Cache
// =============================================================================

#[test]
fn test_reads_within_window_use_cache() {
    let mut env = TestEnv::new();
    env.add("Cached");

    // Replace the file behind the store's back.
    fs::write(env.todo_file(), "[]").unwrap();

    assert_eq!(env.all().len(), 1);
}

#[test]
fn test_mutations_reload_from_disk() {
    let mut env = TestEnv::new();
    env.add("One");
    env.add("Two");

    fs::write(env.todo_file(), "[]").unwrap();

    // add() ignores the cache, so it sees the emptied file.
    assert_eq!(env.add("Three").id, 1);
    assert_eq!(env.all().len(), 1);
}

#[test]
fn test_zero_window_always_reads_disk() {
    let mut env = TestEnv::without_cache();
    env.add("One");

    fs::write(env.todo_file(), "[]").unwrap();

    assert!(env.all().is_empty());
}

// =============================================================================
// Backups
// =============================================================================

#[test]
fn test_writes_back_up_previous_file() {
    let mut env = TestEnv::new();
    env.add("First");
    assert!(env.backup_names().is_empty(), "nothing to back up before the first write");

    env.add("Second");
    let names = env.backup_names();
    assert!(!names.is_empty());
    assert!(names.iter().all(|n| n.starts_with("todos_backup_") && n.ends_with(".json")));
}

#[test]
fn test_manual_backup() {
    let mut env = TestEnv::new();
    env.add("Keep me");

    let path = env.store.backup().unwrap();
    let name = path.file_name().unwrap().to_string_lossy().into_owned();

    assert!(name.ends_with("_manual.json"));
    assert!(path.starts_with(env.backup_dir()));
    assert_eq!(fs::read(&path).unwrap(), fs::read(env.todo_file()).unwrap());
}

#[test]
fn test_manual_backup_without_file_fails() {
    let mut env = TestEnv::new();

    let err = env.store.backup().unwrap_err();
    assert_eq!(err.to_string(), "Failed to create backup");
}

// =============================================================================
// Update / Complete
// =============================================================================

#[test]
fn test_complete_matches_update_to_done() {
    let mut env = TestEnv::new();
    let a = env.add_draft(Draft::new("A").description("same").priority("high").tags(["x"]));
    let b = env.add_draft(Draft::new("A").description("same").priority("high").tags(["x"]));

    std::thread::sleep(Duration::from_millis(5));
    let completed = env.store.complete(a.id).unwrap();
    let updated = env.update(b.id, TodoPatch::new().status("done"));

    assert_eq!(completed.status, Status::Done);
    assert_eq!(updated.status, Status::Done);
    assert_eq!(completed.title, updated.title);
    assert_eq!(completed.description, updated.description);
    assert_eq!(completed.priority, updated.priority);
    assert_eq!(completed.tags, updated.tags);

    assert_eq!(completed.title, a.title);
    assert_eq!(completed.description, a.description);
    assert_eq!(completed.tags, a.tags);
    assert_eq!(completed.created_at, a.created_at);
    assert!(completed.updated_at > a.updated_at);
}

#[test]
fn test_update_preserves_identity_and_created_at() {
    let mut env = TestEnv::new();
    let original = env.add_draft(Draft::new("Draft").description("keep"));

    let updated = env.update(original.id, TodoPatch::new().title("Final").priority(Priority::Low.to_string()));

    assert_eq!(updated.id, original.id);
    assert_eq!(updated.created_at, original.created_at);
    assert!(updated.updated_at >= original.updated_at);
    assert_eq!(updated.title, "Final");
    assert_eq!(updated.description, "keep");
    assert_eq!(updated.priority, Priority::Low);
}

#[test]
fn test_update_empty_due_date_clears_it() {
    let mut env = TestEnv::new();
    let todo = env.add_draft(Draft::new("Dated").due_date("2031-05-05"));

    let updated = env.update(todo.id, TodoPatch::new().due_date(""));
    assert_eq!(updated.due_date, None);
}

#[test]
fn test_failed_update_leaves_file_untouched() {
    let mut env = TestEnv::new();
    let todo = env.add("Stable");
    let before = fs::read_to_string(env.todo_file()).unwrap();

    assert!(env.store.update(todo.id, TodoPatch::new().title("")).is_err());

    assert_eq!(fs::read_to_string(env.todo_file()).unwrap(), before);
    assert_eq!(env.store.get(todo.id).unwrap().title, "Stable");
}

// =============================================================================
// Delete
// =============================================================================

#[test]
fn test_delete_message() {
    let mut env = TestEnv::new();
    env.add("Gone");

    let deleted = env.store.delete(1).unwrap();
    assert_eq!(deleted.count, 1);
    assert_eq!(deleted.message, "Todo 1 deleted");
    assert!(env.store.get(1).is_err());
}

#[test]
fn test_batch_delete_partial_match() {
    let mut env = TestEnv::new();
    for title in ["a", "b", "c"] {
        env.add(title);
    }

    let deleted = env.store.batch_delete(&[1, 3, 99]).unwrap();

    assert_eq!(deleted.count, 2);
    assert_eq!(deleted.message, "2 todos deleted");
    assert_eq!(env.ids(&ListQuery::new()), vec![2]);
}

#[test]
fn test_batch_delete_duplicate_ids_count_once() {
    let mut env = TestEnv::new();
    env.add("a");
    env.add("b");

    let deleted = env.store.batch_delete(&[1, 1, 1]).unwrap();
    assert_eq!(deleted.count, 1);
}

#[test]
fn test_store_in_nested_directory_is_created_on_write() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let file = temp_dir.path().join("nested").join("deeper").join("todos.json");
    let mut store = TodoStore::open(Config::new(&file, temp_dir.path().join("backups")));

    store.add(Draft::new("Deep")).unwrap();
    assert!(file.exists());
}
