use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::validate_not_blank;

/// A project and the single user who owns it. The owner is fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a project, from a JSON body or the query string.
#[derive(Debug, Deserialize, Validate)]
pub struct ProjectInput {
    /// Surrounding whitespace is dropped before the name is stored.
    #[validate(custom = "validate_not_blank")]
    pub name: String,
}

impl ProjectInput {
    pub fn trimmed_name(&self) -> &str {
        self.name.trim()
    }
}
