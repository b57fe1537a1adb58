pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use extractors::CurrentUser;
pub use middleware::{authenticate, RequireAuth};
pub use password::PasswordHasher;
pub use token::{Claims, TokenService};

/// Payload for `POST /auth/signup`.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    /// Stored exactly as given; lookups are case-sensitive.
    #[validate(email)]
    pub email: String,
    /// Must be at least 6 characters long.
    #[validate(length(min = 6, max = 128))]
    pub password: String,
}

/// Form body for `POST /auth/login` (`application/x-www-form-urlencoded`).
///
/// Follows the OAuth2 password-grant field names, so `username` carries the email.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Response body of a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_signup_request_validation() {
        let valid = SignupRequest {
            email: "a@test.com".to_string(),
            password: "test123".to_string(),
        };
        assert!(valid.validate().is_ok());

        let invalid_email = SignupRequest {
            email: "atest.com".to_string(),
            password: "test123".to_string(),
        };
        assert!(invalid_email.validate().is_err());

        let short_password = SignupRequest {
            email: "a@test.com".to_string(),
            password: "123".to_string(),
        };
        assert!(short_password.validate().is_err());
    }

    #[test]
    fn test_token_response_is_bearer() {
        let response = TokenResponse::bearer("abc".to_string());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["access_token"], "abc");
        assert_eq!(json["token_type"], "bearer");
    }
}
