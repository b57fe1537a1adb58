use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use log::warn;
use serde_json::json;
use sqlx::SqlitePool;

#[get("/")]
pub async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "message": "Task Manager API is running"
    }))
}

/// Health check endpoint
///
/// Reports `"ok"` while the database answers a trivial query and `"degraded"`
/// otherwise. The response is `200 OK` either way so the caller can read the body.
#[get("/health")]
pub async fn health(pool: web::Data<SqlitePool>) -> impl Responder {
    let database = match sqlx::query("SELECT 1").fetch_one(pool.get_ref()).await {
        Ok(_) => "connected",
        Err(e) => {
            warn!("Health check could not reach the database: {}", e);
            "disconnected"
        }
    };

    HttpResponse::Ok().json(json!({
        "status": if database == "connected" { "ok" } else { "degraded" },
        "database": database,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now()
    }))
}
