/// Configuration management for the web server
///
/// Configuration is read from environment variables, after loading a `.env`
/// file if one is present.
///
/// # Environment Variables
///
/// - `APP_HOST`: host to bind to (default: 0.0.0.0)
/// - `APP_PORT`: port to bind to (default: 3500)
/// - `APP_PRODUCTION`: enables HSTS and secure cookies (default: false)
/// - `ASSETS_DIR`: static files directory (default: assets)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `SESSION_TTL_SECONDS`: session and cookie lifetime (default: 3600)
/// - `SESSION_COOKIE_NAME`: session cookie name (default: sid)
/// - `SESSION_COOKIE_SECURE`: `Secure` cookie flag (default: APP_PRODUCTION)
/// - `SESSION_PURGE_INTERVAL_SECONDS`: expired-session reaper period (default: 300)
/// - `LOG_FORMAT`: `json` for JSON logs (read in `main`)
/// - `RUST_LOG`: log filter
///
/// # Example
///
/// ```no_run
/// use taskgate_web::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Production mode: HSTS header, secure cookies by default
    pub production: bool,

    /// Directory served for unmatched GET paths
    pub assets_dir: PathBuf,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Lifetime of both the server-side session and the cookie
    pub ttl_seconds: i64,

    pub cookie_name: String,

    pub cookie_secure: bool,

    /// How often expired sessions are deleted
    pub purge_interval_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 3600,
            cookie_name: "sid".to_string(),
            cookie_secure: false,
            purge_interval_seconds: 300,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value {:?}: {}", key, raw, e)),
        None => Ok(default),
    }
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is missing or a variable has an
    /// invalid value.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let production = parse_or(&lookup, "APP_PRODUCTION", false)?;

        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let ttl_seconds = parse_or(&lookup, "SESSION_TTL_SECONDS", 3600i64)?;
        if ttl_seconds <= 0 {
            anyhow::bail!("SESSION_TTL_SECONDS must be positive");
        }

        let purge_interval_seconds = parse_or(&lookup, "SESSION_PURGE_INTERVAL_SECONDS", 300u64)?;
        if purge_interval_seconds == 0 {
            anyhow::bail!("SESSION_PURGE_INTERVAL_SECONDS must be positive");
        }

        Ok(Self {
            server: ServerConfig {
                host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&lookup, "APP_PORT", 3500u16)?,
                production,
                assets_dir: lookup("ASSETS_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("assets")),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)?,
            },
            session: SessionConfig {
                ttl_seconds,
                cookie_name: lookup("SESSION_COOKIE_NAME").unwrap_or_else(|| "sid".to_string()),
                cookie_secure: parse_or(&lookup, "SESSION_COOKIE_SECURE", production)?,
                purge_interval_seconds,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
