pub mod auth;
pub mod health;
pub mod projects;
pub mod tasks;

use actix_web::{mime, web, Error, HttpMessage, HttpRequest};
use serde::de::DeserializeOwned;

use crate::auth::RequireAuth;
use crate::error::AppError;

/// Registers every route. Mount it at the root and again under `/api`.
///
/// `/auth/*` and the health routes are public; `/projects` and `/tasks` sit behind
/// `RequireAuth`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(err.to_string()).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(err.to_string()).into()
    }))
    .app_data(web::FormConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(err.to_string()).into()
    }))
    .service(health::index)
    .service(health::health)
    .service(
        web::scope("/auth")
            .service(auth::signup)
            .service(auth::login),
    )
    .service(
        web::scope("/projects")
            .wrap(RequireAuth)
            .service(projects::list_projects)
            .service(projects::create_project)
            .service(projects::delete_project),
    )
    .service(
        web::scope("/tasks")
            .wrap(RequireAuth)
            .service(tasks::list_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    );
}

/// Takes the input from the JSON body when one was sent, from the query string
/// otherwise.
///
/// A request that declares a JSON content type is held to its body: a body that
/// fails to parse is reported as is, without falling back to the query string.
pub(crate) fn body_or_query<T: DeserializeOwned>(
    body: Result<web::Json<T>, Error>,
    req: &HttpRequest,
) -> Result<T, AppError> {
    match body {
        Ok(body) => Ok(body.into_inner()),
        Err(err) if sends_json(req) => Err(match err.as_error::<AppError>() {
            Some(AppError::ValidationError(msg)) => AppError::ValidationError(msg.clone()),
            _ => AppError::ValidationError(err.to_string()),
        }),
        Err(_) => web::Query::<T>::from_query(req.query_string())
            .map(web::Query::into_inner)
            .map_err(|e| AppError::ValidationError(e.to_string())),
    }
}

fn sends_json(req: &HttpRequest) -> bool {
    matches!(
        req.mime_type(),
        Ok(Some(mime)) if mime.subtype() == mime::JSON || mime.suffix() == Some(mime::JSON)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProjectInput;
    use actix_web::{http::header::ContentType, test::{self}};

    fn json_error(msg: &str) -> Error {
        AppError::ValidationError(msg.to_string()).into()
    }

    #[test]
    fn test_body_wins_over_query() {
        let req = test::TestRequest::post()
            .uri("/projects?name=FromQuery")
            .insert_header(ContentType::json())
            .to_http_request();
        let body = web::Json(ProjectInput {
            name: "FromBody".to_string(),
        });

        let input = body_or_query(Ok(body), &req).unwrap();
        assert_eq!(input.name, "FromBody");
    }

    #[test]
    fn test_query_fallback() {
        let req = test::TestRequest::post()
            .uri("/projects?name=My%20Project")
            .to_http_request();

        let input: ProjectInput =
            body_or_query(Err(json_error("Content type error")), &req).unwrap();
        assert_eq!(input.name, "My Project");

        let req = test::TestRequest::post().uri("/projects").to_http_request();
        let missing = body_or_query::<ProjectInput>(Err(json_error("Content type error")), &req);
        assert!(matches!(missing, Err(AppError::ValidationError(_))));
    }

    #[test]
    fn test_broken_json_body_is_reported() {
        let req = test::TestRequest::post()
            .uri("/projects?name=FromQuery")
            .insert_header(ContentType::json())
            .to_http_request();

        let result = body_or_query::<ProjectInput>(Err(json_error("Json deserialize error: EOF")), &req);
        match result {
            Err(AppError::ValidationError(msg)) => assert_eq!(msg, "Json deserialize error: EOF"),
            other => panic!("expected a validation error, got {:?}", other.map(|p| p.name)),
        }
    }

    #[test]
    fn test_sends_json() {
        let json = test::TestRequest::default()
            .insert_header(ContentType::json())
            .to_http_request();
        assert!(sends_json(&json));

        let problem_json = test::TestRequest::default()
            .insert_header(("content-type", "application/problem+json"))
            .to_http_request();
        assert!(sends_json(&problem_json));

        let form = test::TestRequest::default()
            .insert_header(ContentType::form_url_encoded())
            .to_http_request();
        assert!(!sends_json(&form));
        assert!(!sends_json(&test::TestRequest::default().to_http_request()));
    }
}
