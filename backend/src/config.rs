//! Application configuration loaded from the environment (and `.env`).

use std::env;
use std::net::SocketAddr;

use chrono::Duration;

/// Lowest work factor bcrypt accepts.
pub const MIN_BCRYPT_COST: u32 = 4;

/// Ten years.
const MAX_TOKEN_TTL_HOURS: i64 = 87_600;

/// Runtime configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file, or `:memory:`
    pub database_url: String,
    pub database_pool_size: u32,
    pub bind_addr: SocketAddr,
    /// HS256 key used to sign access tokens
    pub jwt_secret: Vec<u8>,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
    /// Refuse inactive accounts at login and on every authenticated request
    pub require_activation: bool,
    /// Mark the session cookie `Secure`
    pub cookie_secure: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port: u16 = parse_or(&lookup, "PORT", 3000)?;
        let bind_addr = format!("{host}:{port}")
            .parse()
            .map_err(|_| ConfigError::Invalid {
                var: "HOST",
                value: host.clone(),
            })?;

        let jwt_secret = lookup("JWT_SECRET_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET_KEY"))?
            .into_bytes();

        let bcrypt_cost: u32 = parse_or(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(MIN_BCRYPT_COST..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                var: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
            });
        }

        let database_pool_size: u32 = parse_or(&lookup, "DATABASE_POOL_SIZE", 8)?;
        if database_pool_size == 0 {
            return Err(ConfigError::Invalid {
                var: "DATABASE_POOL_SIZE",
                value: "0".to_string(),
            });
        }

        let ttl_hours: i64 = parse_or(&lookup, "TOKEN_TTL_HOURS", 720)?;
        let token_ttl = Some(ttl_hours)
            .filter(|hours| (1..=MAX_TOKEN_TTL_HOURS).contains(hours))
            .and_then(Duration::try_hours)
            .ok_or_else(|| ConfigError::Invalid {
                var: "TOKEN_TTL_HOURS",
                value: ttl_hours.to_string(),
            })?;

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| "chiron.db".to_string()),
            database_pool_size,
            bind_addr,
            jwt_secret,
            token_ttl,
            bcrypt_cost,
            require_activation: parse_or(&lookup, "REQUIRE_ACTIVATION", false)?,
            cookie_secure: parse_or(&lookup, "COOKIE_SECURE", true)?,
        })
    }

    /// In-memory configuration for tests.
    pub fn test_default() -> Self {
        Self {
            database_url: ":memory:".to_string(),
            database_pool_size: 1,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            jwt_secret: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            token_ttl: Duration::hours(1),
            bcrypt_cost: MIN_BCRYPT_COST,
            require_activation: false,
            cookie_secure: false,
        }
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}
