//! Core data types for the todo store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A single task record as persisted in the backing file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Todo {
    /// Store-assigned identifier, `max(existing) + 1`
    pub id: u64,

    /// Short description of the work
    pub title: String,

    /// Longer free-form description
    #[serde(default)]
    pub description: String,

    /// Calendar date in `YYYY-MM-DD` form
    #[serde(default)]
    pub due_date: Option<String>,

    /// Current state
    #[serde(default)]
    pub status: Status,

    /// Urgency
    #[serde(default)]
    pub priority: Priority,

    /// Freeform tags, order and duplicates preserved
    #[serde(default)]
    pub tags: Vec<String>,

    /// When created, never changes afterwards
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,

    /// Last successful mutation
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// Which due-date bucket this record falls in relative to `today`.
    pub fn due_bucket(&self, today: &str) -> DueBucket {
        DueBucket::classify(self.due_date.as_deref(), today)
    }

    /// True if `needle` (already lowercased) occurs in the title or description.
    pub fn mentions(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.description.to_lowercase().contains(needle)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// A closed set of string-named values, as used on the wire.
pub trait Choice: Sized + Copy + 'static {
    /// Every value, in declaration order.
    const ALL: &'static [Self];

    /// The wire name of this value.
    fn as_str(&self) -> &'static str;

    /// Look up a value by its wire name.
    fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_str() == s)
    }

    /// Comma-separated list of every wire name, for error messages.
    fn valid_values() -> String {
        Self::ALL.iter().map(|v| v.as_str()).collect::<Vec<_>>().join(", ")
    }
}

/// Task status states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Pending,
    InProgress,
    Done,
    Cancelled,
}

impl Choice for Status {
    const ALL: &'static [Self] = &[Status::Pending, Status::InProgress, Status::Done, Status::Cancelled];

    fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::InProgress => "in_progress",
            Status::Done => "done",
            Status::Cancelled => "cancelled",
        }
    }
}

/// Task priority levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Choice for Priority {
    const ALL: &'static [Self] = &[Priority::Low, Priority::Medium, Priority::High, Priority::Critical];

    fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

/// Where a due date falls relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueBucket {
    Overdue,
    Today,
    Upcoming,
    NoDate,
}

impl DueBucket {
    /// Classify a due date against `today`.
    ///
    /// Both sides are `YYYY-MM-DD`, so plain string comparison is date order.
    pub fn classify(due: Option<&str>, today: &str) -> DueBucket {
        match due {
            None | Some("") => DueBucket::NoDate,
            Some(d) => match d.cmp(today) {
                Ordering::Less => DueBucket::Overdue,
                Ordering::Equal => DueBucket::Today,
                Ordering::Greater => DueBucket::Upcoming,
            },
        }
    }
}

impl Choice for DueBucket {
    const ALL: &'static [Self] = &[DueBucket::Overdue, DueBucket::Today, DueBucket::Upcoming, DueBucket::NoDate];

    fn as_str(&self) -> &'static str {
        match self {
            DueBucket::Overdue => "overdue",
            DueBucket::Today => "today",
            DueBucket::Upcoming => "upcoming",
            DueBucket::NoDate => "no_date",
        }
    }
}

/// Fields a listing can be sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Id,
    Title,
    DueDate,
    Status,
    Priority,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    /// Compare two records on this field. A missing due date sorts as "".
    pub fn compare(&self, a: &Todo, b: &Todo) -> Ordering {
        match self {
            SortField::Id => a.id.cmp(&b.id),
            SortField::Title => a.title.cmp(&b.title),
            SortField::DueDate => a.due_date.as_deref().unwrap_or("").cmp(b.due_date.as_deref().unwrap_or("")),
            SortField::Status => a.status.as_str().cmp(b.status.as_str()),
            SortField::Priority => a.priority.as_str().cmp(b.priority.as_str()),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
    }
}

impl Choice for SortField {
    const ALL: &'static [Self] = &[
        SortField::Id,
        SortField::Title,
        SortField::DueDate,
        SortField::Status,
        SortField::Priority,
        SortField::CreatedAt,
        SortField::UpdatedAt,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Title => "title",
            SortField::DueDate => "due_date",
            SortField::Status => "status",
            SortField::Priority => "priority",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Anything other than a case-insensitive "desc" sorts ascending.
    pub fn from_arg(s: &str) -> SortOrder {
        if s.eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }
}

macro_rules! display_choice {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_choice!(Status, Priority, DueBucket, SortField);

/// Maximum title length, in characters.
pub const MAX_TITLE_LEN: usize = 100;

/// Maximum description length, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// Validation errors for candidate records.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    TitleRequired,
    TitleTooLong,
    DescriptionTooLong,
    InvalidDueDate,
    InvalidStatus,
    InvalidPriority,
    InvalidTags,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::TitleRequired => write!(f, "Title is required"),
            ValidationError::TitleTooLong => {
                write!(f, "Title must be less than {} characters", MAX_TITLE_LEN)
            }
            ValidationError::DescriptionTooLong => {
                write!(f, "Description must be less than {} characters", MAX_DESCRIPTION_LEN)
            }
            ValidationError::InvalidDueDate => write!(f, "Due date must be in YYYY-MM-DD format"),
            ValidationError::InvalidStatus => write!(f, "Status must be one of: {}", Status::valid_values()),
            ValidationError::InvalidPriority => {
                write!(f, "Priority must be one of: {}", Priority::valid_values())
            }
            ValidationError::InvalidTags => write!(f, "Tags must be a list"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// RFC 3339 timestamps, also accepting naive ISO-8601 values (read as UTC).
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|e| de::Error::custom(format!("invalid timestamp '{}': {}", raw, e)))
    }
}
