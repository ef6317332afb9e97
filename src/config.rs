//! Configuration module for the boxd backend.
//!
//! Loads configuration from `config.toml` with environment variable overrides.

use config::{Config as ConfigLoader, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

use crate::error::AppError;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub letterboxd: LetterboxdConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/boxd.db")
}

/// Letterboxd profile configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LetterboxdConfig {
    /// Profile whose favourites are scraped. Required for scrape endpoints.
    pub username: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for LetterboxdConfig {
    fn default() -> Self {
        Self {
            username: None,
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "https://letterboxd.com".to_string()
}

/// Authentication configuration
#[derive(Clone, Deserialize, Default)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
    /// Shared secret word checked when issuing tokens.
    pub secret_word: Option<String>,
}

// Custom Debug implementation to avoid exposing secrets
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .field(
                "secret_word",
                &self.secret_word.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Headless browser configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Budget applied to each page-load wait, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Grace delay after structural readiness, for lazy-loaded assets.
    #[serde(default = "default_quiescence_ms")]
    pub quiescence_ms: u64,
    /// Path to a Chrome/Chromium executable (None for auto-detection).
    pub chrome_path: Option<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            quiescence_ms: default_quiescence_ms(),
            chrome_path: None,
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_quiescence_ms() -> u64 {
    2000
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. `config.toml` in current directory (optional)
    /// 3. Environment variables with `BOXD_` prefix
    ///
    /// Environment variables use double underscore for nesting:
    /// - `BOXD_SERVER__PORT=9000` sets `server.port`
    /// - `BOXD_LETTERBOXD__USERNAME=someone` sets `letterboxd.username`
    pub fn load() -> Result<Self, AppError> {
        Self::load_from("config.toml")
    }

    /// Load configuration from a specific file path.
    pub fn load_from(config_path: &str) -> Result<Self, AppError> {
        let config = ConfigLoader::builder()
            // Start with defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("database.path", "./data/boxd.db")?
            .set_default("letterboxd.base_url", "https://letterboxd.com")?
            .set_default("scraper.timeout_secs", 30)?
            .set_default("scraper.quiescence_ms", 2000)?
            // Add config file (optional)
            .add_source(File::with_name(config_path).required(false))
            // Override with environment variables
            // BOXD_SERVER__PORT=9000 -> server.port = 9000
            .add_source(
                Environment::with_prefix("BOXD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration for required fields.
    fn validate(&self) -> Result<(), AppError> {
        // Missing secrets only disable the endpoints that need them, so warn
        // here instead of failing startup.
        if self.auth.jwt_secret.is_none() {
            tracing::warn!("JWT secret not configured - authentication will not work");
        }

        if self.letterboxd.username.is_none() {
            tracing::warn!("Letterboxd username not configured - scrape endpoints will fail");
        }

        Ok(())
    }

    /// Get the server socket address
    pub fn server_addr(&self) -> std::net::SocketAddr {
        use std::net::{IpAddr, SocketAddr};
        let ip: IpAddr = self.server.host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid host '{}', using 0.0.0.0", self.server.host);
            "0.0.0.0".parse().unwrap()
        });
        SocketAddr::new(ip, self.server.port)
    }
}
