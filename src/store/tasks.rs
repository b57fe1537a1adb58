use chrono::Utc;
use sqlx::sqlite::{Sqlite, SqliteExecutor};
use sqlx::QueryBuilder;

use crate::error::AppError;
use crate::models::{Task, TaskInput, TaskPatch, TaskQuery};

const TASK_COLUMNS: &str =
    "id, project_id, title, description, is_done, due_date, priority, created_at";
const JOINED_TASK_COLUMNS: &str =
    "t.id, t.project_id, t.title, t.description, t.is_done, t.due_date, t.priority, t.created_at";

pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Task>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let task = sqlx::query_as::<_, Task>(&format!("SELECT {} FROM tasks WHERE id = ?", TASK_COLUMNS))
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(task)
}

/// Loads a task only if its project is owned by `owner_id`.
pub async fn find_owned<'e, E>(executor: E, id: i64, owner_id: i64) -> Result<Option<Task>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let task = sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks t JOIN projects p ON p.id = t.project_id \
         WHERE t.id = ? AND p.owner_id = ?",
        JOINED_TASK_COLUMNS
    ))
    .bind(id)
    .bind(owner_id)
    .fetch_optional(executor)
    .await?;
    Ok(task)
}

/// Inserts a task. The title is stored trimmed; `is_done` starts out false.
pub async fn insert<'e, E>(executor: E, input: &TaskInput) -> Result<Task, AppError>
where
    E: SqliteExecutor<'e>,
{
    let task = sqlx::query_as::<_, Task>(&format!(
        "INSERT INTO tasks (project_id, title, description, is_done, due_date, priority, created_at) \
         VALUES (?, ?, ?, 0, ?, ?, ?) RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(input.project_id)
    .bind(input.title.trim())
    .bind(input.description.as_deref())
    .bind(input.due_date)
    .bind(input.priority)
    .bind(Utc::now())
    .fetch_one(executor)
    .await?;
    Ok(task)
}

/// Applies the fields present in `patch`; absent ones keep their stored value.
pub async fn update<'e, E>(executor: E, id: i64, patch: &TaskPatch) -> Result<Task, AppError>
where
    E: SqliteExecutor<'e>,
{
    let task = sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks SET title = COALESCE(?, title), is_done = COALESCE(?, is_done) \
         WHERE id = ? RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(patch.title.as_deref().map(str::trim))
    .bind(patch.is_done)
    .bind(id)
    .fetch_one(executor)
    .await?;
    Ok(task)
}

pub async fn delete<'e, E>(executor: E, id: i64) -> Result<u64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// Lists the tasks visible to `owner_id`, newest first.
///
/// The ownership restriction is applied before any filter, so a `project_id`
/// filter naming someone else's project simply matches nothing.
pub async fn list_for_owner<'e, E>(
    executor: E,
    owner_id: i64,
    query: &TaskQuery,
) -> Result<Vec<Task>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let mut builder = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {} FROM tasks t WHERE t.project_id IN (SELECT id FROM projects WHERE owner_id = ",
        JOINED_TASK_COLUMNS
    ));
    builder.push_bind(owner_id).push(")");

    if let Some(project_id) = query.project_id {
        builder.push(" AND t.project_id = ").push_bind(project_id);
    }
    if let Some(is_done) = query.is_done {
        builder.push(" AND t.is_done = ").push_bind(is_done);
    }
    if let Some(q) = query.q.as_deref().filter(|q| !q.is_empty()) {
        builder
            .push(" AND instr(lower(t.title), lower(")
            .push_bind(q.to_string())
            .push(")) > 0");
    }
    if let Some(due_before) = query.due_before {
        builder
            .push(" AND t.due_date IS NOT NULL AND t.due_date <= ")
            .push_bind(due_before);
    }

    builder
        .push(" ORDER BY t.created_at DESC, t.id DESC LIMIT ")
        .push_bind(query.limit)
        .push(" OFFSET ")
        .push_bind(query.offset);

    let tasks = builder.build_query_as::<Task>().fetch_all(executor).await?;
    Ok(tasks)
}
