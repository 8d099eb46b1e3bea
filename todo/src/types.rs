//! Domain types for the to-do list.
//!
//! A to-do list is an ordered collection of [`Todo`] entities plus the
//! transient view state (search, sort, remote fetch status) that the
//! presentation layer reads through the derived view.

use crate::error::{ParseOptionError, ValidationError};
use checkmark_core::environment::IdGenerator;
use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a to-do
///
/// Locally created ids are decimal millisecond timestamps; remote ids are
/// the stringified remote integer id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    /// Creates a `TodoId` from any string
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Draws a fresh id from the generator
    #[must_use]
    pub fn generate(ids: &dyn IdGenerator) -> Self {
        Self(ids.next_id())
    }

    /// Returns the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<String> for TodoId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TodoId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// `HH:MM:SS` wire format for times of day
mod hms {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M:%S";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Drops sub-second precision so the time survives an `HH:MM:SS` round trip
fn whole_seconds(time: NaiveTime) -> NaiveTime {
    time.with_nanosecond(0).unwrap_or(time)
}

/// A single to-do
///
/// Serialized with camelCase field names; `dueDate` is `YYYY-MM-DD` and
/// `dueTime` is `HH:MM:SS`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Unique identifier, immutable after creation
    pub id: TodoId,
    /// Short title
    pub name: String,
    /// Longer free text
    pub description: String,
    /// Calendar day the to-do is due
    pub due_date: NaiveDate,
    /// Time of day the to-do is due
    #[serde(with = "hms")]
    pub due_time: NaiveTime,
    /// Whether the to-do is done
    #[serde(default)]
    pub completed: bool,
}

impl Todo {
    /// Creates a to-do from a draft, without validating it
    ///
    /// A draft without an id gets one from `ids`. The new to-do is never
    /// completed.
    #[must_use]
    pub fn create(draft: TodoDraft, ids: &dyn IdGenerator) -> Self {
        Self {
            id: draft.id.unwrap_or_else(|| TodoId::generate(ids)),
            name: draft.name,
            description: draft.description,
            due_date: draft.due_date,
            due_time: whole_seconds(draft.due_time),
            completed: false,
        }
    }

    /// Returns a copy with the edit applied; id and completion are kept
    #[must_use]
    pub fn edited(&self, edit: TodoEdit) -> Self {
        Self {
            id: self.id.clone(),
            name: edit.name.unwrap_or_else(|| self.name.clone()),
            description: edit.description.unwrap_or_else(|| self.description.clone()),
            due_date: edit.due_date.unwrap_or(self.due_date),
            due_time: edit.due_time.map_or(self.due_time, whole_seconds),
            completed: self.completed,
        }
    }

    /// Due date in its stored `YYYY-MM-DD` form
    #[must_use]
    pub fn due_date_string(&self) -> String {
        self.due_date.format("%Y-%m-%d").to_string()
    }

    /// Due time in its stored `HH:MM:SS` form
    #[must_use]
    pub fn due_time_string(&self) -> String {
        self.due_time.format(hms::FORMAT).to_string()
    }

    /// Runs field validation against this to-do's current name and description
    #[must_use]
    pub fn validation(&self) -> FieldValidation {
        validate(&self.name, &self.description)
    }
}

/// Result of validating the two required text fields
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldValidation {
    /// Name is non-empty after trimming
    pub name_valid: bool,
    /// Description is non-empty after trimming
    pub description_valid: bool,
}

impl FieldValidation {
    /// Both fields are valid
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.name_valid && self.description_valid
    }

    /// Converts to a `Result` naming the invalid fields
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] matching whichever fields are empty.
    pub const fn into_result(self) -> Result<(), ValidationError> {
        match (self.name_valid, self.description_valid) {
            (true, true) => Ok(()),
            (false, true) => Err(ValidationError::MissingName),
            (true, false) => Err(ValidationError::MissingDescription),
            (false, false) => Err(ValidationError::MissingNameAndDescription),
        }
    }
}

/// Validates the required text fields of a to-do
///
/// Each field is valid iff it is non-empty after trimming surrounding
/// whitespace. There are no length or character restrictions.
#[must_use]
pub fn validate(name: &str, description: &str) -> FieldValidation {
    FieldValidation {
        name_valid: !name.trim().is_empty(),
        description_valid: !description.trim().is_empty(),
    }
}

/// Form input for a new to-do
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TodoDraft {
    /// Caller-supplied id; generated when absent
    pub id: Option<TodoId>,
    /// Short title
    pub name: String,
    /// Longer free text
    pub description: String,
    /// Calendar day the to-do is due
    pub due_date: NaiveDate,
    /// Time of day the to-do is due
    pub due_time: NaiveTime,
}

impl TodoDraft {
    /// Creates a draft without an id
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        due_date: NaiveDate,
        due_time: NaiveTime,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: description.into(),
            due_date,
            due_time,
        }
    }

    /// Uses a caller-supplied id instead of a generated one
    #[must_use]
    pub fn with_id(mut self, id: impl Into<TodoId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Validates the draft's required fields
    #[must_use]
    pub fn validate(&self) -> FieldValidation {
        validate(&self.name, &self.description)
    }

    /// Validates the draft and creates the to-do
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the name or description is blank.
    pub fn into_todo(self, ids: &dyn IdGenerator) -> Result<Todo, ValidationError> {
        self.validate().into_result()?;
        Ok(Todo::create(self, ids))
    }
}

/// Partial update for an existing to-do; `None` keeps the current value
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TodoEdit {
    /// New name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New due date
    pub due_date: Option<NaiveDate>,
    /// New due time
    pub due_time: Option<NaiveTime>,
}

/// Field the derived view is sorted by
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    /// Sort by name
    Name,
    /// Sort by due date
    #[default]
    Date,
    /// Sort by due time of day
    Time,
}

impl FromStr for SortField {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "date" => Ok(Self::Date),
            "time" => Ok(Self::Time),
            _ => Err(ParseOptionError {
                kind: "sort field",
                value: s.to_string(),
                expected: "name, date, time",
            }),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Name => "name",
            Self::Date => "date",
            Self::Time => "time",
        })
    }
}

/// Direction of the derived view's sort
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest first
    #[default]
    Asc,
    /// Largest first
    Desc,
}

impl SortOrder {
    /// The opposite direction
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl FromStr for SortOrder {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(ParseOptionError {
                kind: "sort order",
                value: s.to_string(),
                expected: "asc, desc",
            }),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        })
    }
}

/// State of the to-do list
///
/// Only `todos` is durable; everything else is transient view state and is
/// reset on restart.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TodoState {
    /// All to-dos in creation order
    pub todos: Vec<Todo>,
    /// Free-text filter applied by the derived view
    pub search_query: String,
    /// Sort key of the derived view
    pub sort_by: SortField,
    /// Sort direction of the derived view
    pub sort_order: SortOrder,
    /// A remote fetch is in flight
    pub is_loading: bool,
    /// Message of the last failed remote fetch
    pub error: Option<String>,
}

impl TodoState {
    /// Creates a new empty state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a state rehydrated with a persisted collection
    #[must_use]
    pub fn with_todos(todos: Vec<Todo>) -> Self {
        Self {
            todos,
            ..Self::default()
        }
    }

    /// Returns the number of to-dos
    #[must_use]
    pub fn count(&self) -> usize {
        self.todos.len()
    }

    /// Returns the number of completed to-dos
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.todos.iter().filter(|t| t.completed).count()
    }

    /// Returns the first to-do with the given id
    #[must_use]
    pub fn get(&self, id: &TodoId) -> Option<&Todo> {
        self.todos.iter().find(|t| &t.id == id)
    }

    /// Checks if a to-do with the given id exists
    #[must_use]
    pub fn contains(&self, id: &TodoId) -> bool {
        self.get(id).is_some()
    }
}

/// Every input the to-do reducer accepts
///
/// Local mutations never fail: an id that matches nothing leaves the state
/// unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodoAction {
    /// Append a to-do; the caller guarantees a fresh id
    AddTodo(Todo),
    /// Replace the to-do with the same id in place
    UpdateTodo(Todo),
    /// Remove every to-do with this id
    DeleteTodo {
        /// To-do to delete
        id: TodoId,
    },
    /// Flip the completion flag
    ToggleTodo {
        /// To-do to toggle
        id: TodoId,
    },
    /// Set the derived view's filter
    SetSearchQuery(String),
    /// Set the derived view's sort key
    SetSortBy(SortField),
    /// Set the derived view's sort direction
    SetSortOrder(SortOrder),
    /// Install a collection verbatim
    ReplaceAll(Vec<Todo>),
    /// Append to-dos whose ids are not present yet
    Merge(Vec<Todo>),
    /// Set the loading flag
    SetLoading(bool),
    /// Set or clear the fetch error
    SetError(Option<String>),
    /// Start a remote fetch
    FetchRemote,
    /// A remote fetch succeeded
    RemoteFetched(Vec<Todo>),
    /// A remote fetch failed
    RemoteFetchFailed {
        /// Human-readable failure message
        message: String,
    },
}

impl TodoAction {
    /// Whether this action ends a remote fetch
    #[must_use]
    pub const fn is_fetch_outcome(&self) -> bool {
        matches!(self, Self::RemoteFetched(_) | Self::RemoteFetchFailed { .. })
    }
}
