//! Aggregate counts over the record set.

use crate::types::{Choice, DueBucket, Priority, Status, Todo};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counts per due-date bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueDateCounts {
    pub overdue: usize,
    pub today: usize,
    pub upcoming: usize,
    pub no_date: usize,
}

/// Store-wide statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_count: usize,
    /// Every status, including those with zero records
    pub status_counts: BTreeMap<Status, usize>,
    /// Every priority, including those with zero records
    pub priority_counts: BTreeMap<Priority, usize>,
    pub due_date_counts: DueDateCounts,
    /// Only tags that occur; a record counts once per distinct tag
    pub tag_counts: BTreeMap<String, usize>,
}

impl Statistics {
    /// Tally `todos` relative to `today` (`YYYY-MM-DD`).
    pub fn tally(todos: &[Todo], today: &str) -> Self {
        let mut status_counts: BTreeMap<Status, usize> = Status::ALL.iter().map(|s| (*s, 0)).collect();
        let mut priority_counts: BTreeMap<Priority, usize> = Priority::ALL.iter().map(|p| (*p, 0)).collect();
        let mut due_date_counts = DueDateCounts::default();
        let mut tag_counts: BTreeMap<String, usize> = BTreeMap::new();

        for todo in todos {
            *status_counts.entry(todo.status).or_default() += 1;
            *priority_counts.entry(todo.priority).or_default() += 1;

            match todo.due_bucket(today) {
                DueBucket::Overdue => due_date_counts.overdue += 1,
                DueBucket::Today => due_date_counts.today += 1,
                DueBucket::Upcoming => due_date_counts.upcoming += 1,
                DueBucket::NoDate => due_date_counts.no_date += 1,
            }

            let mut seen: Vec<&str> = Vec::with_capacity(todo.tags.len());
            for tag in &todo.tags {
                if !seen.contains(&tag.as_str()) {
                    seen.push(tag);
                    *tag_counts.entry(tag.clone()).or_default() += 1;
                }
            }
        }

        Self {
            total_count: todos.len(),
            status_counts,
            priority_counts,
            due_date_counts,
            tag_counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn todo(id: u64, status: Status, priority: Priority, due: Option<&str>, tags: &[&str]) -> Todo {
        let now = Utc::now();
        Todo {
            id,
            title: format!("Todo {}", id),
            description: String::new(),
            due_date: due.map(String::from),
            status,
            priority,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_empty_store() {
        let stats = Statistics::tally(&[], "2024-06-15");
        assert_eq!(stats.total_count, 0);
        assert_eq!(stats.status_counts.len(), 4);
        assert!(stats.status_counts.values().all(|c| *c == 0));
        assert_eq!(stats.priority_counts.len(), 4);
        assert!(stats.priority_counts.values().all(|c| *c == 0));
        assert_eq!(stats.due_date_counts, DueDateCounts::default());
        assert!(stats.tag_counts.is_empty());
    }

    #[test]
    fn test_counts() {
        let todos = vec![
            todo(1, Status::Done, Priority::High, Some("2024-06-01"), &["work", "work"]),
            todo(2, Status::Pending, Priority::High, Some("2024-06-15"), &["work", "home"]),
            todo(3, Status::Pending, Priority::Low, Some("2025-01-01"), &[]),
            todo(4, Status::Cancelled, Priority::Critical, None, &["home"]),
        ];
        let stats = Statistics::tally(&todos, "2024-06-15");

        assert_eq!(stats.total_count, 4);
        assert_eq!(stats.status_counts[&Status::Pending], 2);
        assert_eq!(stats.status_counts[&Status::InProgress], 0);
        assert_eq!(stats.priority_counts[&Priority::High], 2);
        assert_eq!(stats.priority_counts[&Priority::Medium], 0);
        assert_eq!(
            stats.due_date_counts,
            DueDateCounts {
                overdue: 1,
                today: 1,
                upcoming: 1,
                no_date: 1
            }
        );
        assert_eq!(stats.tag_counts.len(), 2);
        assert_eq!(stats.tag_counts["work"], 2);
        assert_eq!(stats.tag_counts["home"], 2);
    }

    #[test]
    fn test_serializes_with_wire_names() {
        let stats = Statistics::tally(&[], "2024-06-15");
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["status_counts"]["in_progress"], 0);
        assert_eq!(json["priority_counts"]["critical"], 0);
        assert_eq!(json["due_date_counts"]["no_date"], 0);
    }
}
