//! Application settings loaded from environment variables.

use std::env;
use std::path::PathBuf;

use super::constants::{
    DEFAULT_DATABASE_URL, DEFAULT_FROM_EMAIL, DEFAULT_JWT_EXPIRATION_HOURS, DEFAULT_MEDIA_ROOT,
    DEFAULT_REDIS_URL, DEFAULT_REGISTRATION_EXPIRY_DAYS, DEFAULT_SERVER_HOST,
    DEFAULT_SERVER_PORT, DEFAULT_SITE_URL, MIN_JWT_SECRET_LENGTH,
};

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub server_host: String,
    pub server_port: u16,
    /// Public base URL used to build links in emails
    pub site_url: String,
    /// Root directory for uploaded documents
    pub media_root: PathBuf,
    pub default_from_email: String,
    pub registration_expiry_days: i64,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("redis_url", &"[REDACTED]")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("site_url", &self.site_url)
            .field("media_root", &self.media_root)
            .field("default_from_email", &self.default_from_email)
            .field("registration_expiry_days", &self.registration_expiry_days)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if JWT_SECRET is not set or is too short (security requirement).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            if cfg!(debug_assertions) {
                tracing::warn!("JWT_SECRET not set, using insecure default for development");
                "dev-secret-key-minimum-32-chars!!".to_string()
            } else {
                panic!("JWT_SECRET environment variable must be set in production");
            }
        });

        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            panic!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            );
        }

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string()),
            jwt_secret,
            jwt_expiration_hours: parse_env("JWT_EXPIRATION_HOURS")
                .unwrap_or(DEFAULT_JWT_EXPIRATION_HOURS),
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            server_port: parse_env("SERVER_PORT").unwrap_or(DEFAULT_SERVER_PORT),
            site_url: env::var("SITE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_SITE_URL.to_string()),
            media_root: env::var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_MEDIA_ROOT)),
            default_from_email: env::var("DEFAULT_FROM_EMAIL")
                .unwrap_or_else(|_| DEFAULT_FROM_EMAIL.to_string()),
            registration_expiry_days: parse_env("REGISTRATION_EXPIRY_DAYS")
                .unwrap_or(DEFAULT_REGISTRATION_EXPIRY_DAYS),
        }
    }

    /// Build a configuration for tests without touching the environment.
    pub fn for_tests() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            redis_url: DEFAULT_REDIS_URL.to_string(),
            jwt_secret: "test-secret-key-for-testing-only-32chars".to_string(),
            jwt_expiration_hours: DEFAULT_JWT_EXPIRATION_HOURS,
            server_host: DEFAULT_SERVER_HOST.to_string(),
            server_port: DEFAULT_SERVER_PORT,
            site_url: DEFAULT_SITE_URL.to_string(),
            media_root: PathBuf::from(DEFAULT_MEDIA_ROOT),
            default_from_email: DEFAULT_FROM_EMAIL.to_string(),
            registration_expiry_days: DEFAULT_REGISTRATION_EXPIRY_DAYS,
        }
    }

    /// Get JWT secret bytes for token signing/verification.
    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Absolute link to a path on the public site.
    pub fn site_link(&self, path: &str) -> String {
        format!("{}/{}", self.site_url, path.trim_start_matches('/'))
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config::for_tests();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("test-secret-key"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_site_link_joins_paths() {
        let config = Config::for_tests();
        assert_eq!(
            config.site_link("/registration/status/abc/"),
            "http://localhost:3000/registration/status/abc/"
        );
        assert_eq!(config.site_link("login/"), "http://localhost:3000/login/");
    }
}
