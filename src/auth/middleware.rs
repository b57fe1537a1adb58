//! Authentication gate for protected scopes.
//!
//! `RequireAuth` resolves the `Authorization: Bearer <token>` header to a stored
//! [`User`] before the wrapped service runs and places that user in the request
//! extensions, where the [`CurrentUser`](super::extractors::CurrentUser) extractor
//! picks it up. Requests that cannot be resolved are answered with 401 directly.

use std::rc::Rc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use log::debug;
use sqlx::SqlitePool;

use crate::auth::token::TokenService;
use crate::error::AppError;
use crate::models::User;
use crate::store;

/// Extracts the token from an `Authorization` header value.
///
/// The scheme is matched case-insensitively; an empty token counts as absent.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Resolves a raw `Authorization` header value to the calling user.
///
/// Fails with `Unauthorized` when the header is missing or not a bearer token,
/// when the token does not verify, or when its user no longer exists.
pub async fn authenticate(
    header_value: Option<&str>,
    tokens: &TokenService,
    pool: &SqlitePool,
) -> Result<User, AppError> {
    let token = header_value
        .and_then(bearer_token)
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".into()))?;

    let user_id = tokens.verify(token)?;

    store::users::find_by_id(pool, user_id).await?.ok_or_else(|| {
        debug!("Token subject {} has no matching user", user_id);
        AppError::Unauthorized("User not found".into())
    })
}

pub struct RequireAuth;

impl<S, B> Transform<S, ServiceRequest> for RequireAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RequireAuthService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireAuthService {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireAuthService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            match resolve_caller(&req).await {
                Ok(user) => {
                    req.extensions_mut().insert(user);
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                Err(err) => Ok(req.error_response(err).map_into_right_body()),
            }
        })
    }
}

async fn resolve_caller(req: &ServiceRequest) -> Result<User, AppError> {
    let tokens = req
        .app_data::<web::Data<TokenService>>()
        .ok_or_else(|| AppError::InternalServerError("TokenService is not registered".into()))?;
    let pool = req
        .app_data::<web::Data<SqlitePool>>()
        .ok_or_else(|| AppError::InternalServerError("Database pool is not registered".into()))?;

    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    authenticate(header_value, tokens, pool).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use jsonwebtoken::Algorithm;

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("  Bearer   abc  "), Some("abc"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token(""), None);
    }

    #[actix_rt::test]
    async fn test_authenticate() {
        let pool = db::connect("sqlite::memory:", 1).await.unwrap();
        db::migrate(&pool).await.unwrap();
        let tokens = TokenService::new(b"gate-secret", Algorithm::HS256, 60);

        let user = store::users::create(&pool, "a@test.com", "x").await.unwrap();
        let header_value = format!("Bearer {}", tokens.issue(user.id).unwrap());

        let resolved = authenticate(Some(header_value.as_str()), &tokens, &pool).await.unwrap();
        assert_eq!(resolved.id, user.id);

        assert!(matches!(
            authenticate(None, &tokens, &pool).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            authenticate(Some("Bearer garbage"), &tokens, &pool).await,
            Err(AppError::Unauthorized(_))
        ));

        // A valid token whose user has since disappeared.
        let orphan = format!("Bearer {}", tokens.issue(user.id + 1).unwrap());
        assert!(matches!(
            authenticate(Some(orphan.as_str()), &tokens, &pool).await,
            Err(AppError::Unauthorized(_))
        ));
    }
}
