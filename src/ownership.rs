//! Ownership-scoped authorization.
//!
//! Every project has exactly one owner and every task inherits the owner of its
//! project. A caller may only see or change resources they own. A resource that
//! exists but belongs to someone else is reported exactly like one that does not
//! exist, so non-owners cannot discover which ids exist.

use log::debug;
use sqlx::sqlite::SqliteExecutor;

use crate::error::AppError;
use crate::models::{Project, Task};
use crate::store;

/// Returns the project if `caller_id` owns it, `NotFound` otherwise.
pub async fn authorize_project<'e, E>(
    executor: E,
    project_id: i64,
    caller_id: i64,
) -> Result<Project, AppError>
where
    E: SqliteExecutor<'e>,
{
    match store::projects::find_by_id(executor, project_id).await? {
        Some(project) if project.owner_id == caller_id => Ok(project),
        Some(_) => {
            debug!("User {} denied access to project {}", caller_id, project_id);
            Err(project_not_found())
        }
        None => Err(project_not_found()),
    }
}

/// Returns the task if `caller_id` owns its parent project, `NotFound` otherwise.
///
/// Task and project are resolved in one join filtered on the project owner, so a
/// missing task, an orphaned task and a foreign task all come back the same way.
pub async fn authorize_task<'e, E>(
    executor: E,
    task_id: i64,
    caller_id: i64,
) -> Result<Task, AppError>
where
    E: SqliteExecutor<'e>,
{
    store::tasks::find_owned(executor, task_id, caller_id)
        .await?
        .ok_or_else(|| {
            debug!("Task {} not visible to user {}", task_id, caller_id);
            task_not_found()
        })
}

fn project_not_found() -> AppError {
    AppError::NotFound("Project not found".into())
}

fn task_not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}
