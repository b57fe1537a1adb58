use crate::{
    auth::CurrentUser,
    db,
    error::AppError,
    models::{TaskInput, TaskPatch, TaskQuery},
    ownership,
    routes::body_or_query,
    store::tasks,
};
use actix_web::{delete, get, patch, post, web, Error, HttpRequest, HttpResponse, Responder};
use log::{debug, info};
use sqlx::SqlitePool;
use validator::Validate;

/// Lists the caller's tasks, newest first.
///
/// ## Query Parameters:
/// - `project_id` (optional): only tasks of this project. Someone else's project
///   yields an empty list.
/// - `is_done` (optional): completion flag.
/// - `q` (optional): case-insensitive substring of the title.
/// - `due_before` (optional): `YYYY-MM-DD`, inclusive.
/// - `limit` (1-100, default 20) and `offset` (default 0).
#[get("")]
pub async fn list_tasks(
    pool: web::Data<SqlitePool>,
    CurrentUser(user): CurrentUser,
    query_params: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    query_params.validate()?;

    let tasks = tasks::list_for_owner(pool.get_ref(), user.id, &query_params).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a task in one of the caller's projects.
///
/// ## Request Body:
/// `project_id`, `title`, and optionally `description`, `due_date`, `priority`
/// (1-3, default 2), as JSON or as query parameters.
///
/// ## Responses:
/// - `201 Created`: the new task.
/// - `400 Bad Request`: blank title or priority out of range.
/// - `404 Not Found`: the project is absent or owned by someone else.
#[post("")]
pub async fn create_task(
    pool: web::Data<SqlitePool>,
    CurrentUser(user): CurrentUser,
    body: Result<web::Json<TaskInput>, Error>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let input = body_or_query(body, &req)?;
    input.validate()?;

    let mut tx = db::begin_write(pool.get_ref()).await?;
    ownership::authorize_project(&mut *tx, input.project_id, user.id).await?;
    let task = tasks::insert(&mut *tx, &input).await?;
    tx.commit().await?;

    info!("User {} created task {}", user.id, task.id);
    Ok(HttpResponse::Created().json(task))
}

/// Retrieves one task. `404 Not Found` when absent or not owned.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<SqlitePool>,
    CurrentUser(user): CurrentUser,
    task_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let task = ownership::authorize_task(pool.get_ref(), task_id.into_inner(), user.id).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Updates `title` and/or `is_done` of a task.
///
/// ## Responses:
/// - `200 OK`: the updated task.
/// - `400 Bad Request`: blank title.
/// - `404 Not Found`: absent or not owned.
#[patch("/{id}")]
pub async fn update_task(
    pool: web::Data<SqlitePool>,
    CurrentUser(user): CurrentUser,
    task_id: web::Path<i64>,
    body: Result<web::Json<TaskPatch>, Error>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let patch = body_or_query(body, &req)?;
    patch.validate()?;

    let mut tx = db::begin_write(pool.get_ref()).await?;
    let task = ownership::authorize_task(&mut *tx, task_id.into_inner(), user.id).await?;
    if patch.is_empty() {
        return Ok(HttpResponse::Ok().json(task));
    }
    let task = tasks::update(&mut *tx, task.id, &patch).await?;
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(task))
}

/// Deletes a task.
///
/// Always `204 No Content`: deleting an absent or foreign task is a silent no-op.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<SqlitePool>,
    CurrentUser(user): CurrentUser,
    task_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let task_id = task_id.into_inner();

    let mut tx = db::begin_write(pool.get_ref()).await?;
    match ownership::authorize_task(&mut *tx, task_id, user.id).await {
        Ok(task) => {
            tasks::delete(&mut *tx, task.id).await?;
            tx.commit().await?;
            info!("User {} deleted task {}", user.id, task.id);
        }
        Err(AppError::NotFound(_)) => {
            debug!("Delete of task {} by user {} ignored", task_id, user.id);
        }
        Err(other) => return Err(other),
    }

    Ok(HttpResponse::NoContent().finish())
}
