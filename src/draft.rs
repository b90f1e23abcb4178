//! Candidate records, partial updates and the validator.
//!
//! Caller input arrives as raw strings. A [`Draft`] holds a candidate record
//! exactly as received; [`Draft::validate`] collects every violation, and
//! [`Draft::into_todo`] turns a clean draft into a typed [`Todo`].

use crate::types::{Choice, MAX_DESCRIPTION_LEN, MAX_TITLE_LEN, Priority, Status, Todo, ValidationError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Tags as supplied by a caller. Anything other than a list of strings is
/// kept so the validator can report it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagsArg {
    List(Vec<String>),
    Invalid(serde_json::Value),
}

impl From<Vec<String>> for TagsArg {
    fn from(tags: Vec<String>) -> Self {
        TagsArg::List(tags)
    }
}

/// A candidate record awaiting validation.
///
/// Deserializes from tool arguments; a missing title becomes empty so the
/// validator reports it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Draft {
    pub title: String,
    pub description: String,
    pub due_date: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub tags: Option<TagsArg>,
}

impl Draft {
    /// Start a draft with just a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    /// Append one tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        if let Some(TagsArg::List(tags)) = &mut self.tags {
            tags.push(tag.into());
        } else {
            self.tags = Some(TagsArg::List(vec![tag.into()]));
        }
        self
    }

    /// Replace the tags with `tags`.
    pub fn tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = Some(TagsArg::List(tags.into_iter().map(Into::into).collect()));
        self
    }

    /// Check every field rule and return the violations in rule order.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.title.is_empty() {
            errors.push(ValidationError::TitleRequired);
        } else if self.title.chars().count() > MAX_TITLE_LEN {
            errors.push(ValidationError::TitleTooLong);
        }

        if self.description.chars().count() > MAX_DESCRIPTION_LEN {
            errors.push(ValidationError::DescriptionTooLong);
        }

        if let Some(due) = present(&self.due_date)
            && !is_calendar_date(due)
        {
            errors.push(ValidationError::InvalidDueDate);
        }

        if let Some(status) = present(&self.status)
            && Status::parse(status).is_none()
        {
            errors.push(ValidationError::InvalidStatus);
        }

        if let Some(priority) = present(&self.priority)
            && Priority::parse(priority).is_none()
        {
            errors.push(ValidationError::InvalidPriority);
        }

        if let Some(TagsArg::Invalid(_)) = &self.tags {
            errors.push(ValidationError::InvalidTags);
        }

        errors
    }

    /// Validate and build the typed record.
    pub fn into_todo(
        self,
        id: u64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Todo, Vec<ValidationError>> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Todo {
            id,
            status: present(&self.status).and_then(Status::parse).unwrap_or_default(),
            priority: present(&self.priority).and_then(Priority::parse).unwrap_or_default(),
            due_date: self.due_date.filter(|d| !d.is_empty()),
            tags: match self.tags {
                Some(TagsArg::List(tags)) => tags,
                _ => Vec::new(),
            },
            title: self.title,
            description: self.description,
            created_at,
            updated_at,
        })
    }
}

impl From<&Todo> for Draft {
    fn from(todo: &Todo) -> Self {
        Self {
            title: todo.title.clone(),
            description: todo.description.clone(),
            due_date: todo.due_date.clone(),
            status: Some(todo.status.as_str().to_string()),
            priority: Some(todo.priority.as_str().to_string()),
            tags: Some(TagsArg::List(todo.tags.clone())),
        }
    }
}

/// A partial update: only the fields that are `Some` are changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TodoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<TagsArg>,
}

impl TodoPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// The patch applied by `complete`.
    pub fn complete() -> Self {
        Self::new().status(Status::Done.as_str())
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the due date. An empty string clears it.
    pub fn due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    pub fn tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = Some(TagsArg::List(tags.into_iter().map(Into::into).collect()));
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the provided fields over `draft`.
    ///
    /// An empty status or priority counts as not provided.
    pub fn apply(self, draft: &mut Draft) {
        if let Some(title) = self.title {
            draft.title = title;
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
        if let Some(due_date) = self.due_date {
            draft.due_date = Some(due_date);
        }
        if let Some(status) = self.status.filter(|s| !s.is_empty()) {
            draft.status = Some(status);
        }
        if let Some(priority) = self.priority.filter(|p| !p.is_empty()) {
            draft.priority = Some(priority);
        }
        if let Some(tags) = self.tags {
            draft.tags = Some(tags);
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Strict `YYYY-MM-DD`: zero-padded and a real calendar day.
fn is_calendar_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| if i == 4 || i == 7 { *b == b'-' } else { b.is_ascii_digit() });
    shape_ok && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}
