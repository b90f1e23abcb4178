//! Query engine: filtering, sorting and pagination over a record set.

use crate::store::StoreError;
use crate::types::{Choice, DueBucket, Priority, SortField, SortOrder, Status, Todo};
use serde::{Deserialize, Serialize};

/// Default page size.
pub const DEFAULT_LIMIT: usize = 100;

/// Listing arguments as received from a caller, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListArgs {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub search: Option<String>,
    pub tag: Option<String>,
    pub due_date_filter: Option<String>,
    pub sort_by: String,
    pub sort_order: String,
    pub limit: usize,
    pub offset: usize,
}

impl Default for ListArgs {
    fn default() -> Self {
        Self {
            status: None,
            priority: None,
            search: None,
            tag: None,
            due_date_filter: None,
            sort_by: SortField::Id.as_str().to_string(),
            sort_order: "asc".to_string(),
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoPage {
    pub todos: Vec<Todo>,
    /// Matches before pagination
    pub total_count: usize,
    pub limit: usize,
    pub offset: usize,
}

impl TodoPage {
    /// 1-based positions of the first and last todo on this page, or `None`
    /// when the page is empty.
    pub fn window(&self) -> Option<(usize, usize)> {
        if self.todos.is_empty() {
            return None;
        }
        Some((
            self.offset.saturating_add(1),
            self.offset.saturating_add(self.todos.len()),
        ))
    }
}

/// A validated listing query.
///
/// Filters compose with AND in the order status, priority, search, tag, due.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub search: Option<String>,
    pub tag: Option<String>,
    pub due: Option<DueBucket>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    pub limit: usize,
    pub offset: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            status: None,
            priority: None,
            search: None,
            tag: None,
            due: None,
            sort_by: SortField::Id,
            sort_order: SortOrder::Asc,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl ListQuery {
    /// Every record, sorted by id, first page.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Case-insensitive substring of title or description.
    pub fn search(mut self, needle: impl Into<String>) -> Self {
        self.search = Some(needle.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn due(mut self, bucket: DueBucket) -> Self {
        self.due = Some(bucket);
        self
    }

    pub fn sort_by(mut self, field: SortField) -> Self {
        self.sort_by = field;
        self
    }

    pub fn sort_order(mut self, order: SortOrder) -> Self {
        self.sort_order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    fn matches_with(&self, todo: &Todo, needle: Option<&str>, today: &str) -> bool {
        self.status.is_none_or(|s| todo.status == s)
            && self.priority.is_none_or(|p| todo.priority == p)
            && needle.is_none_or(|n| todo.mentions(n))
            && self.tag.as_deref().is_none_or(|t| todo.has_tag(t))
            && self.due.is_none_or(|d| todo.due_bucket(today) == d)
    }

    /// Filter, sort and paginate `todos`.
    ///
    /// The sort is stable in both directions: `Desc` reverses the comparator,
    /// so records with equal keys keep their original relative order.
    pub fn run(&self, todos: Vec<Todo>, today: &str) -> TodoPage {
        let needle = self.search.as_ref().map(|s| s.to_lowercase());
        let mut matched: Vec<Todo> = todos
            .into_iter()
            .filter(|t| self.matches_with(t, needle.as_deref(), today))
            .collect();

        match self.sort_order {
            SortOrder::Asc => matched.sort_by(|a, b| self.sort_by.compare(a, b)),
            SortOrder::Desc => matched.sort_by(|a, b| self.sort_by.compare(b, a)),
        }

        let total_count = matched.len();
        let todos = matched.into_iter().skip(self.offset).take(self.limit).collect();

        TodoPage {
            todos,
            total_count,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

impl TryFrom<ListArgs> for ListQuery {
    type Error = StoreError;

    /// Empty filter strings mean "no filter". Unknown enumerated values fail
    /// with a message naming the valid set.
    fn try_from(args: ListArgs) -> Result<Self, Self::Error> {
        let status = match non_empty(args.status.as_deref()) {
            Some(s) => Some(Status::parse(s).ok_or_else(|| {
                StoreError::InvalidArgument(format!("Invalid status. Must be one of: {}", Status::valid_values()))
            })?),
            None => None,
        };

        let priority = match non_empty(args.priority.as_deref()) {
            Some(p) => Some(Priority::parse(p).ok_or_else(|| {
                StoreError::InvalidArgument(format!(
                    "Invalid priority. Must be one of: {}",
                    Priority::valid_values()
                ))
            })?),
            None => None,
        };

        let due = match non_empty(args.due_date_filter.as_deref()) {
            Some(d) => Some(DueBucket::parse(d).ok_or_else(|| {
                StoreError::InvalidArgument(format!(
                    "Invalid due_date_filter. Must be one of: {}",
                    DueBucket::valid_values()
                ))
            })?),
            None => None,
        };

        let sort_by = SortField::parse(&args.sort_by).ok_or_else(|| {
            StoreError::InvalidArgument(format!("Invalid sort_by. Must be one of: {}", SortField::valid_values()))
        })?;

        Ok(Self {
            status,
            priority,
            search: args.search.filter(|s| !s.is_empty()),
            tag: args.tag.filter(|t| !t.is_empty()),
            due,
            sort_by,
            sort_order: SortOrder::from_arg(&args.sort_order),
            limit: args.limit,
            offset: args.offset,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}
