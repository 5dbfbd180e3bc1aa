//! Ingestion configuration
//!
//! Worker, CSV dialect and exchange-rate source settings, loaded from
//! `INGEST_*` and `EXCHANGE_RATE_*` environment variables.

use pricelist_common::currency::DEFAULT_BASE_CURRENCY;
use pricelist_common::CurrencyCode;
use std::time::Duration;

use super::csv::CsvOptions;

/// Default number of apalis workers.
pub const DEFAULT_WORKER_THREADS: usize = 2;

/// Default number of products written per transaction.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Upper bound on the chunk size; keeps one bulk insert under the
/// PostgreSQL bind-parameter limit.
pub const MAX_CHUNK_SIZE: usize = 10_000;

/// Default whole-job timeout in seconds (15 minutes).
pub const DEFAULT_JOB_TIMEOUT_SECS: u64 = 900;

/// Default exchange-rate API host.
pub const DEFAULT_RATE_API_BASE_URL: &str = "https://cdn.jsdelivr.net";

/// Default exchange-rate request timeout in seconds.
pub const DEFAULT_RATE_TIMEOUT_SECS: u64 = 10;

/// Main ingestion configuration
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Whether the background workers are started
    pub enabled: bool,
    /// Number of concurrent batch workers
    pub worker_threads: usize,
    /// Products per persisted chunk
    pub chunk_size: usize,
    pub csv: CsvOptions,
    /// Whole-job timeout in seconds
    pub job_timeout_secs: u64,
    /// Delete uploaded files once they have been read
    pub remove_processed_files: bool,
    pub rates: RatesConfig,
}

/// Exchange-rate source configuration
#[derive(Debug, Clone)]
pub struct RatesConfig {
    pub base_url: String,
    pub base_currency: CurrencyCode,
    pub timeout_secs: u64,
}

impl IngestConfig {
    /// Load ingestion configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let delimiter = std::env::var("INGEST_CSV_DELIMITER").unwrap_or_else(|_| ";".to_string());

        let config = Self {
            enabled: env_or("INGEST_ENABLED", true),
            worker_threads: env_or("INGEST_WORKER_THREADS", DEFAULT_WORKER_THREADS),
            chunk_size: env_or("INGEST_CHUNK_SIZE", DEFAULT_CHUNK_SIZE),
            csv: CsvOptions {
                delimiter: parse_delimiter(&delimiter)?,
                has_headers: env_or("INGEST_CSV_HAS_HEADERS", true),
            },
            job_timeout_secs: env_or("INGEST_JOB_TIMEOUT_SECS", DEFAULT_JOB_TIMEOUT_SECS),
            remove_processed_files: env_or("INGEST_REMOVE_PROCESSED_FILES", true),
            rates: RatesConfig::from_env()?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.enabled && self.worker_threads == 0 {
            anyhow::bail!("INGEST_WORKER_THREADS must be greater than 0");
        }
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            anyhow::bail!(
                "INGEST_CHUNK_SIZE must be between 1 and {}, got: {}",
                MAX_CHUNK_SIZE,
                self.chunk_size
            );
        }
        if self.job_timeout_secs == 0 {
            anyhow::bail!("INGEST_JOB_TIMEOUT_SECS must be greater than 0");
        }
        self.rates.validate()?;
        Ok(())
    }

    /// Get job timeout as Duration
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }
}

impl RatesConfig {
    /// Load rate source configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let base_currency = std::env::var("EXCHANGE_RATE_BASE_CURRENCY")
            .unwrap_or_else(|_| DEFAULT_BASE_CURRENCY.to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("EXCHANGE_RATE_BASE_CURRENCY: {}", e))?;

        Ok(Self {
            base_url: std::env::var("EXCHANGE_RATE_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_RATE_API_BASE_URL.to_string()),
            base_currency,
            timeout_secs: env_or("EXCHANGE_RATE_TIMEOUT_SECS", DEFAULT_RATE_TIMEOUT_SECS),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.base_url.is_empty() {
            anyhow::bail!("EXCHANGE_RATE_API_BASE_URL cannot be empty");
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("EXCHANGE_RATE_TIMEOUT_SECS must be greater than 0");
        }
        Ok(())
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            worker_threads: DEFAULT_WORKER_THREADS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            csv: CsvOptions::default(),
            job_timeout_secs: DEFAULT_JOB_TIMEOUT_SECS,
            remove_processed_files: true,
            rates: RatesConfig::default(),
        }
    }
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_RATE_API_BASE_URL.to_string(),
            base_currency: CurrencyCode::default_base(),
            timeout_secs: DEFAULT_RATE_TIMEOUT_SECS,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_delimiter(value: &str) -> anyhow::Result<u8> {
    match value.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        b"\\t" => Ok(b'\t'),
        _ => anyhow::bail!(
            "INGEST_CSV_DELIMITER must be a single ASCII character, got: {:?}",
            value
        ),
    }
}
