use std::env;
use std::path::PathBuf;

use axum_extra::extract::cookie::SameSite;
use mongodb::options::ConnectionString;

const DEFAULT_MONGO_URL: &str = "mongodb://localhost:27017/adminboard";
const DEFAULT_DATABASE: &str = "adminboard";
const DEV_JWT_SECRET: &str = "dev_jwt_secret";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mongo_url: String,
    pub mongo_database: String,
    pub host: String,
    pub port: u16,
    pub production: bool,
    pub jwt_secret: String,
    pub jwt_expiry_secs: i64,
    pub cookie_name: String,
    pub cookie_domain: Option<String>,
    pub allowed_origins: Vec<String>,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
}

/// Configuration problems detected at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),
    #[error("invalid MONGO_URL: {0}")]
    InvalidMongoUrl(String),
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let production = lookup("APP_ENV").is_some_and(|v| v.eq_ignore_ascii_case("production"));

        let mongo_url = lookup("MONGO_URL")
            .or_else(|| lookup("MONGO_URI"))
            .unwrap_or_else(|| DEFAULT_MONGO_URL.to_string());

        let connection = ConnectionString::parse(&mongo_url)
            .map_err(|e| ConfigError::InvalidMongoUrl(e.to_string()))?;
        let mongo_database = lookup("MONGO_DATABASE")
            .or(connection.default_database)
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let jwt_secret = match lookup("JWT_SECRET") {
            Some(secret) => secret,
            None if production => return Err(ConfigError::Missing("JWT_SECRET")),
            None => DEV_JWT_SECRET.to_string(),
        };

        let cookie_domain = match lookup("COOKIE_DOMAIN") {
            Some(domain) if domain.is_empty() => None,
            Some(domain) => Some(domain),
            None if production => None,
            None => Some("localhost".to_string()),
        };

        let allowed_origins = lookup("ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        Ok(Self {
            mongo_url,
            mongo_database,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(4000),
            production,
            jwt_secret,
            jwt_expiry_secs: lookup("JWT_EXPIRY_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(7 * 24 * 60 * 60),
            cookie_name: lookup("COOKIE_NAME").unwrap_or_else(|| "token".to_string()),
            cookie_domain,
            allowed_origins,
            upload_dir: PathBuf::from(lookup("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string())),
            max_upload_bytes: lookup("MAX_UPLOAD_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(5 * 1024 * 1024),
        })
    }

    /// SameSite policy for the session cookie.
    pub fn cookie_same_site(&self) -> SameSite {
        if self.production {
            SameSite::None
        } else {
            SameSite::Lax
        }
    }

    /// Session cookies are only marked `Secure` in production.
    pub fn cookie_secure(&self) -> bool {
        self.production
    }
}
