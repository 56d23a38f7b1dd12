//! Central module for application-wide configuration settings.
//!
//! This module handles loading and managing configuration parameters such as
//! the database URL, server port, CORS origins and the token signing settings.
//! Everything is read once at startup and handed to the components that need
//! it; nothing reads the environment afterwards.

use anyhow::{Context, Result, bail};
use chrono::Duration;
use jsonwebtoken::Algorithm;
use std::env;
use std::str::FromStr;

/// Token signing and password hashing settings.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub secret_key: String,
    pub algorithm: Algorithm,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub project_name: String,
    pub api_prefix: String,
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub seed_database: bool,
    pub auth: AuthSettings,
}

impl Config {
    /// Loads configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let project_name = var_or("PROJECT_NAME", "KCK Swap Shop");
        let api_prefix = var_or("API_PREFIX", "/api");

        let database_url = var_or("DATABASE_URL", "sqlite://app.db?mode=rwc");

        let max_connections = var_or("DB_MAX_CONNECTIONS", "5")
            .parse::<u32>()
            .context("DB_MAX_CONNECTIONS must be a valid number")?;

        let acquire_timeout_seconds = var_or("DB_ACQUIRE_TIMEOUT_SECONDS", "3")
            .parse::<u64>()
            .context("DB_ACQUIRE_TIMEOUT_SECONDS must be a valid number")?;

        let server_port = var_or("SERVER_PORT", "8000")
            .parse::<u16>()
            .context("SERVER_PORT must be a valid number")?;

        let cors_origins = var_or("BACKEND_CORS_ORIGINS", "")
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect();

        let seed_database = var_or("SEED_DATABASE", "false")
            .parse::<bool>()
            .context("SEED_DATABASE must be true or false")?;

        let secret_key = lookup("SECRET_KEY").context("SECRET_KEY not set")?;
        if secret_key.is_empty() {
            bail!("SECRET_KEY must not be empty");
        }

        let algorithm_name = var_or("ALGORITHM", "HS256");
        let algorithm = Algorithm::from_str(&algorithm_name)
            .with_context(|| format!("ALGORITHM '{}' is not a known JWT algorithm", algorithm_name))?;
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            bail!(
                "ALGORITHM '{}' is not supported, a shared-secret HMAC algorithm is required",
                algorithm_name
            );
        }

        let access_token_ttl = positive_ttl(
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            &var_or("ACCESS_TOKEN_EXPIRE_MINUTES", "60"),
            Duration::try_minutes,
        )?;

        let refresh_token_ttl = positive_ttl(
            "REFRESH_TOKEN_EXPIRE_DAYS",
            &var_or("REFRESH_TOKEN_EXPIRE_DAYS", "7"),
            Duration::try_days,
        )?;

        let bcrypt_cost = match lookup("BCRYPT_COST") {
            Some(cost) => cost.parse::<u32>().context("BCRYPT_COST must be a valid number")?,
            None => bcrypt::DEFAULT_COST,
        };

        Ok(Config {
            project_name,
            api_prefix,
            database_url,
            max_connections,
            acquire_timeout_seconds,
            server_port,
            cors_origins,
            seed_database,
            auth: AuthSettings {
                secret_key,
                algorithm,
                access_token_ttl,
                refresh_token_ttl,
                bcrypt_cost,
            },
        })
    }
}

/// Parses a token lifetime that must be positive and representable.
fn positive_ttl(
    key: &str,
    raw: &str,
    to_duration: fn(i64) -> Option<Duration>,
) -> Result<Duration> {
    let amount = raw
        .parse::<i64>()
        .with_context(|| format!("{} must be a valid number", key))?;

    if amount <= 0 {
        bail!("{} must be greater than zero", key);
    }

    to_duration(amount).with_context(|| format!("{} is out of range", key))
}
