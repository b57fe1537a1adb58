pub mod project;
pub mod task;
pub mod user;

pub use project::{Project, ProjectInput};
pub use task::{Task, TaskInput, TaskPatch, TaskQuery};
pub use user::{User, UserPublic};

use validator::ValidationError;

/// Rejects strings that are empty once surrounding whitespace is removed.
pub(crate) fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("must not be blank".into());
        return Err(error);
    }
    Ok(())
}
