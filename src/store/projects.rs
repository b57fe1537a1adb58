use chrono::Utc;
use sqlx::sqlite::{SqliteConnection, SqliteExecutor};

use crate::error::AppError;
use crate::models::Project;

const PROJECT_COLUMNS: &str = "id, name, owner_id, created_at";

pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Project>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let project = sqlx::query_as::<_, Project>(&format!(
        "SELECT {} FROM projects WHERE id = ?",
        PROJECT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(project)
}

pub async fn list_for_owner<'e, E>(executor: E, owner_id: i64) -> Result<Vec<Project>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let projects = sqlx::query_as::<_, Project>(&format!(
        "SELECT {} FROM projects WHERE owner_id = ? ORDER BY id",
        PROJECT_COLUMNS
    ))
    .bind(owner_id)
    .fetch_all(executor)
    .await?;
    Ok(projects)
}

/// `name` is stored as given; callers trim it first.
pub async fn insert<'e, E>(executor: E, name: &str, owner_id: i64) -> Result<Project, AppError>
where
    E: SqliteExecutor<'e>,
{
    let project = sqlx::query_as::<_, Project>(&format!(
        "INSERT INTO projects (name, owner_id, created_at) VALUES (?, ?, ?) RETURNING {}",
        PROJECT_COLUMNS
    ))
    .bind(name)
    .bind(owner_id)
    .bind(Utc::now())
    .fetch_one(executor)
    .await?;
    Ok(project)
}

/// Deletes a project together with all of its tasks.
///
/// The tasks are removed explicitly so the cascade does not depend on foreign key
/// enforcement being switched on. Run this inside a transaction.
pub async fn delete_with_tasks(conn: &mut SqliteConnection, id: i64) -> Result<u64, AppError> {
    let tasks = sqlx::query("DELETE FROM tasks WHERE project_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(tasks)
}
