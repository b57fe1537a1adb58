#![allow(dead_code)]

use actix_http::Request;
use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    http::{header, StatusCode},
    test, web, App, Error,
};
use jsonwebtoken::Algorithm;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use taskvault::auth::{PasswordHasher, TokenService};
use taskvault::{db, routes};

pub const TEST_SECRET: &[u8] = b"integration-test-secret";
pub const PASSWORD: &str = "test123";

pub fn token_service() -> TokenService {
    TokenService::new(TEST_SECRET, Algorithm::HS256, 60)
}

pub async fn test_pool() -> SqlitePool {
    let pool = db::connect("sqlite::memory:", 1)
        .await
        .expect("Failed to open in-memory database");
    db::migrate(&pool).await.expect("Failed to run migrations");
    pool
}

/// A migrated database file under `dir`, served by a pool of several
/// connections, as in production.
pub async fn file_pool(dir: &tempfile::TempDir) -> SqlitePool {
    let url = format!("sqlite://{}", dir.path().join("taskvault.db").display());
    let pool = db::connect(&url, 5)
        .await
        .expect("Failed to open database file");
    db::migrate(&pool).await.expect("Failed to run migrations");
    pool
}

/// The full application over a fresh in-memory database.
pub async fn spawn_app() -> (
    impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error>,
    SqlitePool,
) {
    spawn_app_on(test_pool().await).await
}

/// The full application over `pool`.
pub async fn spawn_app_on(
    pool: SqlitePool,
) -> (
    impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error>,
    SqlitePool,
) {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(token_service()))
            .app_data(web::Data::new(PasswordHasher::new(4)))
            .configure(routes::config)
            .service(web::scope("/api").configure(routes::config)),
    )
    .await;
    (app, pool)
}

/// Sends `req` and returns the status and the JSON body (`Null` when empty).
pub async fn send(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error>,
    req: Request,
) -> (StatusCode, Value) {
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()))
    };
    (status, json)
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

pub async fn signup(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error>,
    email: &str,
    password: &str,
) -> (StatusCode, Value) {
    let req = test::TestRequest::post()
        .uri("/auth/signup")
        .set_json(json!({ "email": email, "password": password }))
        .to_request();
    send(app, req).await
}

pub async fn login(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error>,
    email: &str,
    password: &str,
) -> (StatusCode, Value) {
    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_form([("username", email), ("password", password)])
        .to_request();
    send(app, req).await
}

/// Signs `email` up with [`PASSWORD`] and returns an access token.
pub async fn signup_and_token(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error>,
    email: &str,
) -> String {
    let (status, body) = signup(app, email, PASSWORD).await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {}", body);

    let (status, body) = login(app, email, PASSWORD).await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["access_token"]
        .as_str()
        .expect("login response has no access_token")
        .to_string()
}

pub async fn create_project(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error>,
    token: &str,
    name: &str,
) -> i64 {
    let req = test::TestRequest::post()
        .uri("/projects")
        .insert_header(bearer(token))
        .set_json(json!({ "name": name }))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "create project failed: {}", body);
    body["id"].as_i64().expect("project has no id")
}

pub async fn create_task(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error>,
    token: &str,
    payload: Value,
) -> (StatusCode, Value) {
    let req = test::TestRequest::post()
        .uri("/tasks")
        .insert_header(bearer(token))
        .set_json(payload)
        .to_request();
    send(app, req).await
}

pub async fn list_tasks(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error>,
    token: &str,
    query: &str,
) -> (StatusCode, Value) {
    let req = test::TestRequest::get()
        .uri(&format!("/tasks{}", query))
        .insert_header(bearer(token))
        .to_request();
    send(app, req).await
}

pub fn ids(body: &Value) -> Vec<i64> {
    body.as_array()
        .expect("expected a JSON array")
        .iter()
        .map(|item| item["id"].as_i64().expect("item has no id"))
        .collect()
}
