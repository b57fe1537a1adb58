use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored account. The password hash never leaves the server, so this type is
/// deliberately not `Serialize`; responses use [`UserPublic`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// The public view of a user returned by signup.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserPublic {
    pub id: i64,
    pub email: String,
}

impl From<&User> for UserPublic {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
        }
    }
}
