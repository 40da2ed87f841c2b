//! Configuration management for the loans server

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

/// Bestseller ranking service
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BestsellersConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

/// Borrowing policy applied when a loan is created
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct PolicyConfig {
    pub max_active_loans: usize,
    pub loan_duration_days: i64,
    /// Ranks at or below this value are bestsellers
    pub bestseller_threshold: i32,
    pub max_bestseller_loans: usize,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub bestsellers: BestsellersConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // LOANS_POLICY__MAX_ACTIVE_LOANS=5 sets policy.max_active_loans
            .add_source(
                Environment::with_prefix("LOANS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .set_override_option("bestsellers.base_url", env::var("BESTSELLERS_URL").ok())?
            .build()?;

        config.try_deserialize()
    }
}

impl BestsellersConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for BestsellersConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_ms: 5_000,
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_active_loans: 3,
            loan_duration_days: 14,
            bestseller_threshold: 15,
            max_bestseller_loans: 2,
        }
    }
}
