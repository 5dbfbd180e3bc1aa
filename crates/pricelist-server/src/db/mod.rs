//! Durable stores for upload batches and the product catalog
//!
//! The worker and the intake path only see the [`BatchStore`] and
//! [`CatalogStore`] traits. [`PgStore`] implements both on PostgreSQL.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::models::{FetchedRate, NewProduct, UploadBatch};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

/// Store operation errors with contextual information
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQL query or connection error
    #[error("Database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Requested record does not exist
    #[error("{0}")]
    NotFound(String),

    /// A stored row could not be mapped back to a domain value
    #[error("Stored record is invalid: {0}")]
    Corrupt(String),

    /// The stored batch already reached `finished` or `failed`
    #[error("Upload batch '{0}' is already terminal")]
    Terminal(Uuid),
}

impl StoreError {
    /// Create a not found error with resource context
    pub fn not_found(resource_type: &str, identifier: &str) -> Self {
        Self::NotFound(format!("{} '{}' not found in database", resource_type, identifier))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Lifecycle records of upload batches
#[async_trait]
pub trait BatchStore: Send + Sync {
    /// Insert a new `pending` batch for `file_name`
    async fn create(&self, file_name: &str) -> StoreResult<UploadBatch>;

    /// Current snapshot, `None` if the id is unknown
    async fn get(&self, id: Uuid) -> StoreResult<Option<UploadBatch>>;

    /// Persist the full attribute set of `batch`; last write wins, except
    /// that a terminal row is never overwritten ([`StoreError::Terminal`])
    async fn save(&self, batch: &UploadBatch) -> StoreResult<()>;
}

/// Write side of the product catalog
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert the rate snapshot of one batch atomically
    async fn save_rates(&self, batch_id: Uuid, rates: &[FetchedRate]) -> StoreResult<()>;

    /// Insert one chunk of products and the batch's current `total_rows` in a
    /// single transaction; rejected once the batch is terminal
    async fn save_product_chunk(
        &self,
        batch: &UploadBatch,
        products: &[NewProduct],
    ) -> StoreResult<()>;
}

/// Build the connection pool from the server configuration
pub async fn create_pool(config: &DatabaseConfig) -> StoreResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect(&config.url)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Database connection pool created"
    );

    Ok(pool)
}

pub async fn health_check(pool: &PgPool) -> StoreResult<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(StoreError::from)
}
