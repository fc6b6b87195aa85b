//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Redis configuration.
    pub redis: RedisConfig,
    /// Report pipeline configuration.
    #[serde(default)]
    pub reports: ReportConfig,
    /// Cold-storage archive configuration.
    #[serde(default)]
    pub archive: ArchiveConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL.
    pub url: String,
}

/// Report pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Number of most-recent completed runs kept fully in the hot store.
    #[serde(default = "default_retention_hot_runs")]
    pub retention_hot_runs: usize,
    /// Cron expression for the daily report trigger (seconds-resolution,
    /// evaluated in UTC).
    #[serde(default = "default_daily_trigger_cron")]
    pub daily_trigger_cron: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            retention_hot_runs: default_retention_hot_runs(),
            daily_trigger_cron: default_daily_trigger_cron(),
        }
    }
}

/// Cold-storage archive configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveConfig {
    /// Backend kind: "local" or "s3".
    #[serde(default = "default_archive_backend")]
    pub backend: String,
    /// Base path for local archives.
    #[serde(default = "default_archive_path")]
    pub local_path: PathBuf,
    /// S3 endpoint URL (s3 backend only).
    #[serde(default)]
    pub s3_endpoint: Option<String>,
    /// S3 bucket name (s3 backend only).
    #[serde(default)]
    pub s3_bucket: Option<String>,
    /// AWS region (s3 backend only).
    #[serde(default)]
    pub s3_region: Option<String>,
    /// Access key ID (s3 backend only).
    #[serde(default)]
    pub s3_access_key_id: Option<String>,
    /// Secret access key (s3 backend only).
    #[serde(default)]
    pub s3_secret_access_key: Option<String>,
    /// Key prefix within the bucket.
    #[serde(default)]
    pub s3_prefix: Option<String>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            backend: default_archive_backend(),
            local_path: default_archive_path(),
            s3_endpoint: None,
            s3_bucket: None,
            s3_region: None,
            s3_access_key_id: None,
            s3_secret_access_key: None,
            s3_prefix: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_retention_hot_runs() -> usize {
    3
}

fn default_daily_trigger_cron() -> String {
    // 06:00 UTC every day
    "0 0 6 * * *".to_string()
}

fn default_archive_backend() -> String {
    "local".to_string()
}

fn default_archive_path() -> PathBuf {
    PathBuf::from("./archives")
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `BEACON_ENV`)
    /// 3. Environment variables with `BEACON_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("BEACON_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("BEACON")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("BEACON")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
