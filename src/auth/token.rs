use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::AppError;

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token: the user's id, as a string.
    pub sub: String,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: usize,
}

/// Issues and verifies signed, expiring bearer tokens.
///
/// Tokens are stateless: nothing is stored server side, and expiry is the only
/// way a token stops being valid.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], algorithm: Algorithm, ttl_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm,
            // Out-of-range lifetimes saturate; `issue` then reports the overflow.
            ttl: Duration::try_minutes(ttl_minutes).unwrap_or(if ttl_minutes < 0 {
                Duration::MIN
            } else {
                Duration::MAX
            }),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.jwt_secret.as_bytes(),
            config.jwt_algorithm,
            config.access_token_expire_minutes,
        )
    }

    /// Generates a token whose subject is `user_id`.
    pub fn issue(&self, user_id: i64) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::InternalServerError("Token expiry out of range".into()))?;

        let claims = Claims {
            sub: user_id.to_string(),
            exp: expiration.timestamp().max(0) as usize,
            iat: now.timestamp().max(0) as usize,
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
    }

    /// Verifies the signature and expiry of `token` and returns its subject.
    ///
    /// Every failure, whatever the cause, is `Unauthorized` with the same message.
    pub fn verify(&self, token: &str) -> Result<i64, AppError> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Rejected bearer token: {}", e);
                invalid_token()
            })?;

        claims.sub.parse::<i64>().map_err(|_| {
            debug!("Rejected bearer token: non-numeric subject");
            invalid_token()
        })
    }
}

fn invalid_token() -> AppError {
    AppError::Unauthorized("Invalid token".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &[u8] = b"test_secret_for_tokens";

    fn service() -> TokenService {
        TokenService::new(SECRET, Algorithm::HS256, 60)
    }

    fn assert_invalid(result: Result<i64, AppError>) {
        match result {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, "Invalid token"),
            other => panic!("expected Unauthorized, got {:?}", other),
        }
    }

    #[test]
    fn test_token_generation_and_verification() {
        let tokens = service();
        let token = tokens.issue(42).unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), 42);
    }

    #[test]
    fn test_token_expiration() {
        let expired = TokenService::new(SECRET, Algorithm::HS256, -120);
        let token = expired.issue(2).unwrap();
        assert_invalid(service().verify(&token));
    }

    #[test]
    fn test_unrepresentable_lifetime_does_not_panic() {
        let forever = TokenService::new(SECRET, Algorithm::HS256, i64::MAX);
        assert!(matches!(forever.issue(1), Err(AppError::InternalServerError(_))));

        let never = TokenService::new(SECRET, Algorithm::HS256, i64::MIN);
        assert!(never.issue(1).is_err());
    }

    #[test]
    fn test_invalid_token_signature() {
        let other = TokenService::new(b"a_completely_different_secret", Algorithm::HS256, 60);
        let token = other.issue(1).unwrap();
        assert_invalid(service().verify(&token));
    }

    #[test]
    fn test_algorithm_mismatch_is_rejected() {
        let other = TokenService::new(SECRET, Algorithm::HS512, 60);
        let token = other.issue(1).unwrap();
        assert_invalid(service().verify(&token));
    }

    #[test]
    fn test_malformed_tokens() {
        let tokens = service();
        assert_invalid(tokens.verify(""));
        assert_invalid(tokens.verify("not-a-jwt"));
        assert_invalid(tokens.verify("a.b.c"));
    }

    #[test]
    fn test_subject_is_mandatory() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &json!({ "exp": exp, "iat": exp - 3600 }),
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();
        assert_invalid(service().verify(&token));
    }

    #[test]
    fn test_subject_must_be_numeric() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &json!({ "sub": "alice", "exp": exp, "iat": exp - 3600 }),
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();
        assert_invalid(service().verify(&token));
    }
}
