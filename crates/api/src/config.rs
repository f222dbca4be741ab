//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use projection_store::RetryPolicy;
use sync_engine::SyncConfig;

/// Log output format of the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`, `PORT`: bind address (default: `0.0.0.0:3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `pretty` or `json` (default: `pretty`)
/// - `DATABASE_URL`: PostgreSQL connection string; in-memory store when unset
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `5`)
/// - `SYNC_MAX_CONCURRENCY`, `SYNC_BACKGROUND_THRESHOLD`, `SYNC_WORKERS`,
///   `SYNC_QUEUE_CAPACITY`, `SYNC_JOB_RETRIES`: orchestrator tuning;
///   `SYNC_WORKERS=0` turns background sync off and runs every event inline
/// - `STORE_RETRY_ATTEMPTS`, `STORE_RETRY_BASE_MS`: store call backoff
///
/// Unparseable values fall back to their defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub sync: SyncConfig,
    pub store_retry: RetryPolicy,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let sync = SyncConfig {
            max_concurrency: parse_var(&lookup, "SYNC_MAX_CONCURRENCY")
                .unwrap_or(defaults.sync.max_concurrency),
            background_threshold_nights: parse_var(&lookup, "SYNC_BACKGROUND_THRESHOLD")
                .unwrap_or(defaults.sync.background_threshold_nights),
            worker_count: parse_var(&lookup, "SYNC_WORKERS")
                .unwrap_or(defaults.sync.worker_count),
            queue_capacity: parse_var(&lookup, "SYNC_QUEUE_CAPACITY")
                .unwrap_or(defaults.sync.queue_capacity),
            job_retries: parse_var(&lookup, "SYNC_JOB_RETRIES")
                .unwrap_or(defaults.sync.job_retries),
        };

        let store_retry = RetryPolicy {
            max_attempts: parse_var(&lookup, "STORE_RETRY_ATTEMPTS")
                .unwrap_or(defaults.store_retry.max_attempts),
            base_delay: parse_var(&lookup, "STORE_RETRY_BASE_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.store_retry.base_delay),
            ..defaults.store_retry
        };

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT").unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: parse_var(&lookup, "LOG_FORMAT").unwrap_or(defaults.log_format),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            database_max_connections: parse_var(&lookup, "DATABASE_MAX_CONNECTIONS")
                .unwrap_or(defaults.database_max_connections),
            sync,
            store_retry,
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|value| value.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            database_url: None,
            database_max_connections: 5,
            sync: SyncConfig::default(),
            store_retry: RetryPolicy::default(),
        }
    }
}
