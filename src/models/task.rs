use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::validate_not_blank;

pub const PRIORITY_HIGH: i64 = 1;
pub const PRIORITY_MEDIUM: i64 = 2;
pub const PRIORITY_LOW: i64 = 3;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Represents a task as stored in the database and returned by the API.
///
/// A task has no owner column: it belongs to whoever owns `project_id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub is_done: bool,
    pub due_date: Option<NaiveDate>,
    /// 1 = high, 2 = medium, 3 = low.
    pub priority: i64,
    pub created_at: DateTime<Utc>,
}

fn default_priority() -> i64 {
    PRIORITY_MEDIUM
}

/// Input structure for creating a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// The project the task is filed under. Must be owned by the caller.
    pub project_id: i64,

    /// Must contain at least one non-whitespace character.
    #[validate(custom = "validate_not_blank")]
    pub title: String,

    pub description: Option<String>,

    pub due_date: Option<NaiveDate>,

    #[serde(default = "default_priority")]
    #[validate(range(min = 1, max = 3))]
    pub priority: i64,
}

/// Partial update of a task. Absent fields are left untouched.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct TaskPatch {
    #[validate(custom = "validate_not_blank")]
    pub title: Option<String>,
    pub is_done: Option<bool>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.is_done.is_none()
    }
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// Filters and pagination for listing tasks.
///
/// Whatever the filters say, results are always limited to tasks in projects the
/// caller owns.
#[derive(Debug, Deserialize, Validate)]
pub struct TaskQuery {
    pub project_id: Option<i64>,
    pub is_done: Option<bool>,
    /// Case-insensitive substring of the title.
    pub q: Option<String>,
    /// Inclusive upper bound on the due date. Tasks without a due date never match.
    pub due_before: Option<NaiveDate>,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: i64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub offset: i64,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            project_id: None,
            is_done: None,
            q: None,
            due_before: None,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}
