use chrono::{Duration, Utc};
use jsonwebtoken::Algorithm;
use std::env;
use std::fmt;
use std::str::FromStr;

const DEFAULT_DATABASE_URL: &str = "sqlite://taskvault.db";
const DEFAULT_CORS_ORIGINS: &str = "http://127.0.0.1:5173,http://localhost:5173";

/// Deployment configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
    pub access_token_expire_minutes: i64,
    pub bcrypt_cost: u32,
    pub cors_allowed_origins: Vec<String>,
}

/// A variable is missing or does not parse.
#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => {
                write!(f, "{} has an invalid value: {:?}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }

        let jwt_algorithm = parse_algorithm(&var_or("JWT_ALGORITHM", "HS256"))?;

        let access_token_expire_minutes: i64 = parse_var("ACCESS_TOKEN_EXPIRE_MINUTES", "60")?;
        if !token_ttl_in_range(access_token_expire_minutes) {
            return Err(ConfigError::Invalid {
                key: "ACCESS_TOKEN_EXPIRE_MINUTES",
                value: access_token_expire_minutes.to_string(),
            });
        }

        let bcrypt_cost: u32 = parse_var("BCRYPT_COST", "12")?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
            });
        }

        Ok(Self {
            database_url: var_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", "5")?,
            server_port: parse_var("SERVER_PORT", "8080")?,
            server_host: var_or("SERVER_HOST", "127.0.0.1"),
            jwt_secret,
            jwt_algorithm,
            access_token_expire_minutes,
            bcrypt_cost,
            cors_allowed_origins: split_origins(&var_or(
                "CORS_ALLOWED_ORIGINS",
                DEFAULT_CORS_ORIGINS,
            )),
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

/// Positive, and small enough that a token issued now still has a representable
/// expiry.
fn token_ttl_in_range(minutes: i64) -> bool {
    minutes > 0
        && Duration::try_minutes(minutes)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .is_some()
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError> {
    let value = var_or(key, default);
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}

/// Only the HMAC family works with a shared secret.
fn parse_algorithm(value: &str) -> Result<Algorithm, ConfigError> {
    match Algorithm::from_str(value.trim()) {
        Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => Ok(alg),
        _ => Err(ConfigError::Invalid {
            key: "JWT_ALGORITHM",
            value: value.to_string(),
        }),
    }
}

fn split_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}
