use crate::{
    auth::{LoginForm, PasswordHasher, SignupRequest, TokenResponse, TokenService},
    error::AppError,
    models::UserPublic,
    store::users,
};
use actix_web::{post, web, HttpResponse, Responder};
use log::{info, warn};
use sqlx::SqlitePool;
use validator::Validate;

/// Register a new user
///
/// ## Request Body:
/// JSON `{"email": ..., "password": ...}`.
///
/// ## Responses:
/// - `201 Created`: `{"id": ..., "email": ...}`.
/// - `400 Bad Request`: malformed email or password shorter than 6 characters.
/// - `409 Conflict`: the email is already registered.
#[post("/signup")]
pub async fn signup(
    pool: web::Data<SqlitePool>,
    hasher: web::Data<PasswordHasher>,
    signup_data: web::Json<SignupRequest>,
) -> Result<impl Responder, AppError> {
    signup_data.validate()?;
    let SignupRequest { email, password } = signup_data.into_inner();

    let hasher = *hasher.get_ref();
    let password_hash = web::block(move || hasher.hash(&password)).await??;

    let user = users::create(pool.get_ref(), &email, &password_hash).await?;
    info!("User {} signed up", user.id);

    Ok(HttpResponse::Created().json(UserPublic::from(&user)))
}

/// Login user
///
/// ## Request Body:
/// Form-encoded `username` (the email) and `password`.
///
/// ## Responses:
/// - `200 OK`: `{"access_token": ..., "token_type": "bearer"}`.
/// - `401 Unauthorized`: unknown email or wrong password (indistinguishable).
#[post("/login")]
pub async fn login(
    pool: web::Data<SqlitePool>,
    hasher: web::Data<PasswordHasher>,
    tokens: web::Data<TokenService>,
    login_data: web::Form<LoginForm>,
) -> Result<impl Responder, AppError> {
    let LoginForm { username, password } = login_data.into_inner();

    let Some(user) = users::find_by_email(pool.get_ref(), &username).await? else {
        warn!("Login rejected: unknown email");
        return Err(invalid_credentials());
    };

    let hasher = *hasher.get_ref();
    let digest = user.password_hash.clone();
    let matches = web::block(move || hasher.verify(&password, &digest)).await?;
    if !matches {
        warn!("Login rejected for user {}: wrong password", user.id);
        return Err(invalid_credentials());
    }

    let token = tokens.issue(user.id)?;
    info!("User {} logged in", user.id);

    Ok(HttpResponse::Ok().json(TokenResponse::bearer(token)))
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid credentials".into())
}
