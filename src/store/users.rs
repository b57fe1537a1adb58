//! Credential store: user identities and their password hashes.

use chrono::Utc;
use log::info;
use sqlx::sqlite::{SqliteExecutor, SqlitePool};

use crate::error::AppError;
use crate::models::User;

const USER_COLUMNS: &str = "id, email, password_hash, created_at";

pub async fn find_by_email<'e, E>(executor: E, email: &str) -> Result<Option<User>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE email = ?",
        USER_COLUMNS
    ))
    .bind(email)
    .fetch_optional(executor)
    .await?;
    Ok(user)
}

pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<User>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(user)
}

/// Inserts a new user.
///
/// The lookup before the insert only saves a round of work in the common case; two
/// concurrent signups can both pass it. The `UNIQUE` constraint on `users.email` is
/// what actually guarantees uniqueness, and its violation is reported as the same
/// `Conflict`. The insert is a single statement, so it needs no transaction and
/// takes the write lock without first holding a read lock.
pub async fn create(pool: &SqlitePool, email: &str, password_hash: &str) -> Result<User, AppError> {
    if find_by_email(pool, email).await?.is_some() {
        return Err(email_taken());
    }

    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (email, password_hash, created_at) VALUES (?, ?, ?) RETURNING {}",
        USER_COLUMNS
    ))
    .bind(email)
    .bind(password_hash)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => email_taken(),
        other => other,
    })?;

    info!("Created user {}", user.id);
    Ok(user)
}

fn email_taken() -> AppError {
    AppError::Conflict("Email already registered".into())
}
