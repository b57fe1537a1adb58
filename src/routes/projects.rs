use crate::{
    auth::CurrentUser,
    db,
    error::AppError,
    models::ProjectInput,
    ownership,
    routes::body_or_query,
    store::projects,
};
use actix_web::{delete, get, post, web, Error, HttpRequest, HttpResponse, Responder};
use log::info;
use sqlx::SqlitePool;
use validator::Validate;

/// Lists the caller's projects.
#[get("")]
pub async fn list_projects(
    pool: web::Data<SqlitePool>,
    CurrentUser(user): CurrentUser,
) -> Result<impl Responder, AppError> {
    let projects = projects::list_for_owner(pool.get_ref(), user.id).await?;
    Ok(HttpResponse::Ok().json(projects))
}

/// Creates a project owned by the caller.
///
/// `name` comes from a JSON body or the query string and is stored trimmed.
///
/// ## Responses:
/// - `201 Created`: the new project.
/// - `400 Bad Request`: `name` missing or blank.
#[post("")]
pub async fn create_project(
    pool: web::Data<SqlitePool>,
    CurrentUser(user): CurrentUser,
    body: Result<web::Json<ProjectInput>, Error>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let input = body_or_query(body, &req)?;
    input.validate()?;

    let mut tx = db::begin_write(pool.get_ref()).await?;
    let project = projects::insert(&mut *tx, input.trimmed_name(), user.id).await?;
    tx.commit().await?;

    info!("User {} created project {}", user.id, project.id);
    Ok(HttpResponse::Created().json(project))
}

/// Deletes a project and every task in it.
///
/// ## Responses:
/// - `204 No Content`: deleted.
/// - `404 Not Found`: absent or owned by someone else.
#[delete("/{id}")]
pub async fn delete_project(
    pool: web::Data<SqlitePool>,
    CurrentUser(user): CurrentUser,
    project_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let project_id = project_id.into_inner();

    let mut tx = db::begin_write(pool.get_ref()).await?;
    let project = ownership::authorize_project(&mut *tx, project_id, user.id).await?;
    let removed_tasks = projects::delete_with_tasks(&mut *tx, project.id).await?;
    tx.commit().await?;

    info!(
        "User {} deleted project {} ({} tasks)",
        user.id, project.id, removed_tasks
    );
    Ok(HttpResponse::NoContent().finish())
}
