//! Configuration Module
//!
//! Handles loading the host's configuration from environment variables.

use std::env;
use std::str::FromStr;

use crate::error::SessionCacheError;

/// Which kind of connection the login gate hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Cached connections
    Connection,
    /// Registered logical sessions
    Session,
}

impl FromStr for BackendKind {
    type Err = SessionCacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "connection" => Ok(BackendKind::Connection),
            "session" => Ok(BackendKind::Session),
            other => Err(SessionCacheError::InvalidRequest(format!(
                "unknown backend: {other}"
            ))),
        }
    }
}

/// Host configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Default cache TTL in seconds for connections opened through the login form
    pub default_ttl: i64,
    /// Seconds a UI session may stay unused before it is reaped
    pub session_idle_timeout: u64,
    /// Seconds between reaper runs
    pub reaper_interval: u64,
    pub backend: BackendKind,
    /// Credentials the in-memory backend accepts
    pub demo_account: String,
    pub demo_user: String,
    pub demo_password: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `DEFAULT_TTL` - Cache TTL in seconds offered to new connections (default: 3600)
    /// - `SESSION_IDLE_TIMEOUT` - Idle UI session lifetime in seconds (default: 1800)
    /// - `REAPER_INTERVAL` - Reaper frequency in seconds (default: 60)
    /// - `BACKEND` - `connection` or `session` (default: connection)
    /// - `DEMO_ACCOUNT`, `DEMO_USER`, `DEMO_PASSWORD` - accepted credentials
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parsed("SERVER_PORT").unwrap_or(defaults.server_port),
            default_ttl: parsed("DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            session_idle_timeout: parsed("SESSION_IDLE_TIMEOUT")
                .unwrap_or(defaults.session_idle_timeout),
            reaper_interval: parsed("REAPER_INTERVAL").unwrap_or(defaults.reaper_interval),
            backend: parsed("BACKEND").unwrap_or(defaults.backend),
            demo_account: env::var("DEMO_ACCOUNT").unwrap_or(defaults.demo_account),
            demo_user: env::var("DEMO_USER").unwrap_or(defaults.demo_user),
            demo_password: env::var("DEMO_PASSWORD").unwrap_or(defaults.demo_password),
        }
    }
}

fn parsed<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            default_ttl: 3600,
            session_idle_timeout: 1800,
            reaper_interval: 60,
            backend: BackendKind::Connection,
            demo_account: "demo".to_string(),
            demo_user: "demo".to_string(),
            demo_password: "demo".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.default_ttl, 3600);
        assert_eq!(config.session_idle_timeout, 1800);
        assert_eq!(config.reaper_interval, 60);
        assert_eq!(config.backend, BackendKind::Connection);
    }

    #[test]
    fn test_config_from_env_defaults() {
        for name in [
            "SERVER_PORT",
            "DEFAULT_TTL",
            "SESSION_IDLE_TIMEOUT",
            "REAPER_INTERVAL",
            "BACKEND",
        ] {
            env::remove_var(name);
        }

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.default_ttl, 3600);
        assert_eq!(config.backend, BackendKind::Connection);
    }

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!("Session".parse::<BackendKind>(), Ok(BackendKind::Session));
        assert_eq!(" connection ".parse::<BackendKind>(), Ok(BackendKind::Connection));
        assert!("pool".parse::<BackendKind>().is_err());
    }
}
