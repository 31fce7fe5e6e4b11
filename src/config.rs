//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STORE_API_BASE_URL` - Base URL of the store backend (coupon, location,
//!   review, cart, wishlist and payment endpoints)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 0.0.0.0)
//! - `STOREFRONT_PORT` - Listen port (default: 8083)
//! - `STORE_API_TIMEOUT_SECS` - Backend request timeout (default: 10)
//! - `STORE_API_USER_AGENT` - User agent sent to the backend
//! - `NATS_URL` - Publish domain events when set
//! - `SESSION_IDLE_SECS` - Page sessions idle this long are dropped (default: 1800)
//! - `SESSION_MAX_PAGES` - Upper bound on live page sessions per kind (default: 10000)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    pub host: IpAddr,
    pub port: u16,
    pub store_api: StoreApiConfig,
    pub nats_url: Option<String>,
    pub sessions: SessionConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
}

/// Limits for in-memory page sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub idle_secs: u64,
    pub max_pages: u64,
}

impl SessionConfig {
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration { Duration::from_secs(self.idle_secs) }
}

impl Default for SessionConfig {
    fn default() -> Self { Self { idle_secs: 1800, max_pages: 10_000 } }
}

impl StorefrontConfig {
    /// Load configuration from the process environment, after `.env`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);
        let host = env.parse_or("STOREFRONT_HOST", "0.0.0.0")?;
        let port = env.parse_or("STOREFRONT_PORT", "8083")?;
        let base_url = env.required("STORE_API_BASE_URL")?;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidEnvVar("STORE_API_BASE_URL".into(), "must be an http(s) URL".into()));
        }
        let timeout_secs = env.parse_or("STORE_API_TIMEOUT_SECS", "10")?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar("STORE_API_TIMEOUT_SECS".into(), "must be positive".into()));
        }
        let idle_secs = env.parse_or("SESSION_IDLE_SECS", "1800")?;
        if idle_secs == 0 {
            return Err(ConfigError::InvalidEnvVar("SESSION_IDLE_SECS".into(), "must be positive".into()));
        }
        let max_pages = env.parse_or("SESSION_MAX_PAGES", "10000")?;

        Ok(Self {
            host,
            port,
            store_api: StoreApiConfig { base_url, timeout_secs, user_agent: env.optional("STORE_API_USER_AGENT") },
            nats_url: env.optional("NATS_URL"),
            sessions: SessionConfig { idle_secs, max_pages },
        })
    }

    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr { SocketAddr::new(self.host, self.port) }
}

struct Env<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    /// Blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn parse_or<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key)
            .as_deref()
            .unwrap_or(default)
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        StorefrontConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("STORE_API_BASE_URL", "https://shop.test")]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8083");
        assert_eq!(config.store_api.timeout_secs, 10);
        assert_eq!(config.store_api.user_agent, None);
        assert_eq!(config.nats_url, None);
        assert_eq!(config.sessions, SessionConfig::default());
        assert_eq!(config.sessions.idle_timeout(), Duration::from_secs(1800));
    }

    #[test]
    fn test_session_limits() {
        let base = ("STORE_API_BASE_URL", "https://shop.test");
        let config = load(&[base, ("SESSION_IDLE_SECS", "60"), ("SESSION_MAX_PAGES", "500")]).unwrap();
        assert_eq!(config.sessions, SessionConfig { idle_secs: 60, max_pages: 500 });
        assert!(matches!(load(&[base, ("SESSION_IDLE_SECS", "0")]), Err(ConfigError::InvalidEnvVar(k, _)) if k == "SESSION_IDLE_SECS"));
    }

    #[test]
    fn test_missing_base_url() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::MissingEnvVar("STORE_API_BASE_URL".into()));
        assert_eq!(load(&[("STORE_API_BASE_URL", "  ")]).unwrap_err(), ConfigError::MissingEnvVar("STORE_API_BASE_URL".into()));
    }

    #[test]
    fn test_invalid_values() {
        let base = ("STORE_API_BASE_URL", "https://shop.test");
        assert!(matches!(load(&[base, ("STOREFRONT_PORT", "eighty")]), Err(ConfigError::InvalidEnvVar(k, _)) if k == "STOREFRONT_PORT"));
        assert!(matches!(load(&[base, ("STORE_API_TIMEOUT_SECS", "0")]), Err(ConfigError::InvalidEnvVar(k, _)) if k == "STORE_API_TIMEOUT_SECS"));
        assert!(matches!(load(&[("STORE_API_BASE_URL", "shop.test")]), Err(ConfigError::InvalidEnvVar(..))));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("STORE_API_BASE_URL", "http://localhost:8000"),
            ("STOREFRONT_HOST", "127.0.0.1"),
            ("STOREFRONT_PORT", "9000"),
            ("STORE_API_USER_AGENT", "pages/1"),
            ("NATS_URL", "nats://localhost:4222"),
        ])
        .unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:9000");
        assert_eq!(config.store_api.user_agent.as_deref(), Some("pages/1"));
        assert_eq!(config.nats_url.as_deref(), Some("nats://localhost:4222"));
    }
}
