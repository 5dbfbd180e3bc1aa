//! Ingestion queue
//!
//! Intake pushes one [`ProcessCsvJob`] per created batch through the
//! [`IngestQueue`] seam. In production the queue is apalis storage in
//! PostgreSQL, drained by the workers registered in [`super::scheduler`].

use apalis::prelude::*;
use apalis_postgres::PostgresStorage;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::jobs::ProcessCsvJob;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Failed to enqueue job for batch {batch_id}: {message}")]
    Enqueue { batch_id: Uuid, message: String },
}

/// Durable, at-least-once job queue
#[async_trait]
pub trait IngestQueue: Send + Sync {
    async fn enqueue(&self, job: ProcessCsvJob) -> Result<(), QueueError>;
}

/// apalis-backed [`IngestQueue`]
#[derive(Clone)]
pub struct ApalisQueue {
    storage: PostgresStorage<ProcessCsvJob>,
}

impl ApalisQueue {
    /// Create the apalis schema if it does not exist yet
    pub async fn setup(db: &PgPool) -> anyhow::Result<()> {
        info!("Setting up PostgreSQL storage for apalis");
        PostgresStorage::setup(db)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to set up apalis storage: {}", e))?;
        Ok(())
    }

    pub fn new(db: &PgPool) -> Self {
        Self {
            storage: PostgresStorage::new(db),
        }
    }

    /// Storage handle for registering workers on the same queue
    pub fn storage(&self) -> PostgresStorage<ProcessCsvJob> {
        self.storage.clone()
    }
}

#[async_trait]
impl IngestQueue for ApalisQueue {
    #[tracing::instrument(skip(self, job), fields(batch_id = %job.batch_id))]
    async fn enqueue(&self, job: ProcessCsvJob) -> Result<(), QueueError> {
        let batch_id = job.batch_id;
        let mut storage = self.storage.clone();

        storage.push(job).await.map_err(|e| QueueError::Enqueue {
            batch_id,
            message: e.to_string(),
        })?;

        tracing::debug!("CSV processing job enqueued");
        Ok(())
    }
}

#[cfg(test)]
pub use memory::MemoryQueue;
