//! Batch worker
//!
//! Drives one upload batch from `pending` to a terminal state:
//!
//! 1. load the batch
//! 2. `processing`, persisted immediately
//! 3. parse and normalize the file, persist the valid row count
//! 4. fetch and save the rate snapshot, then persist products chunk by chunk,
//!    each chunk together with the cumulative row count
//! 5. `finished`
//!
//! Any error after the batch was loaded moves it to `failed` and is returned
//! to the job runner. Chunks committed before the error stay committed.
//!
//! Every status or row-count change is applied to a copy and only adopted
//! once the store accepted it, so the in-memory batch always matches the last
//! persisted snapshot.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::config::IngestConfig;
use super::csv::{read_products_from_path, CsvOptions, CsvReadError, ParsedFile};
use super::jobs::ProcessCsvJob;
use super::rates::{RateFetchError, RateFetcher};
use crate::db::{BatchStore, CatalogStore, StoreError};
use crate::models::{BatchStatus, TransitionError, UploadBatch};
use crate::storage::UploadStorage;

/// Worker tuning, usually derived from [`IngestConfig`]
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub chunk_size: usize,
    pub csv: CsvOptions,
    pub job_timeout: Duration,
    pub remove_processed_files: bool,
}

impl From<&IngestConfig> for WorkerSettings {
    fn from(config: &IngestConfig) -> Self {
        Self {
            chunk_size: config.chunk_size.max(1),
            csv: config.csv,
            job_timeout: config.job_timeout(),
            remove_processed_files: config.remove_processed_files,
        }
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self::from(&IngestConfig::default())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BatchJobError {
    #[error("Upload batch {0} not found")]
    BatchNotFound(Uuid),

    #[error("Upload batch {0} already failed")]
    AlreadyFailed(Uuid),

    #[error("Upload batch {0} was left in processing by an earlier run")]
    Interrupted(Uuid),

    #[error("Processing of batch {batch_id} timed out after {secs}s")]
    Timeout { batch_id: Uuid, secs: u64 },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid batch transition: {0}")]
    Transition(#[from] TransitionError),

    #[error("CSV error: {0}")]
    Csv(#[from] CsvReadError),

    #[error("Exchange rate error: {0}")]
    Rates(#[from] RateFetchError),

    #[error("CSV parser task failed: {0}")]
    Parser(String),
}

/// Consumes [`ProcessCsvJob`]s; the only writer of products and rates
pub struct BatchWorker {
    batches: Arc<dyn BatchStore>,
    catalog: Arc<dyn CatalogStore>,
    rates: Arc<dyn RateFetcher>,
    uploads: UploadStorage,
    settings: WorkerSettings,
}

impl BatchWorker {
    pub fn new(
        batches: Arc<dyn BatchStore>,
        catalog: Arc<dyn CatalogStore>,
        rates: Arc<dyn RateFetcher>,
        uploads: UploadStorage,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            batches,
            catalog,
            rates,
            uploads,
            settings,
        }
    }

    /// Run one job to a terminal batch state
    ///
    /// Returns the final snapshot on success. Redelivered jobs are resolved
    /// from the stored status: `finished` is skipped, `failed` is reported
    /// again, and a `processing` leftover is failed.
    #[tracing::instrument(skip(self, job), fields(batch_id = %job.batch_id))]
    pub async fn process(&self, job: &ProcessCsvJob) -> Result<UploadBatch, BatchJobError> {
        let mut batch = self
            .batches
            .get(job.batch_id)
            .await?
            .ok_or(BatchJobError::BatchNotFound(job.batch_id))?;

        match batch.status() {
            BatchStatus::Pending => {},
            BatchStatus::Finished => {
                info!("Batch already finished, skipping redelivered job");
                self.discard_upload(job).await;
                return Ok(batch);
            },
            BatchStatus::Failed => {
                warn!("Batch already failed, not reprocessing");
                self.discard_upload(job).await;
                return Err(BatchJobError::AlreadyFailed(batch.id()));
            },
            BatchStatus::Processing => {
                warn!("Batch found in processing from an earlier run, failing it");
                self.mark_failed(&mut batch).await;
                self.discard_upload(job).await;
                return Err(BatchJobError::Interrupted(batch.id()));
            },
        }

        // Only the interruptible part runs under the timeout. The final
        // `finished` write is never cancelled once issued.
        let timed = tokio::time::timeout(self.settings.job_timeout, self.run(&mut batch, job)).await;
        let outcome = match timed {
            Ok(Ok(())) => self.commit(&mut batch, |b| b.finish(Utc::now())).await,
            Ok(Err(err)) => Err(err),
            Err(_) => Err(BatchJobError::Timeout {
                batch_id: batch.id(),
                secs: self.settings.job_timeout.as_secs(),
            }),
        };

        match outcome {
            Ok(()) => {
                info!(total_rows = batch.total_rows(), "Batch finished");
                Ok(batch)
            },
            Err(err) => {
                error!(error = %err, "Batch processing failed");
                self.mark_failed(&mut batch).await;
                Err(err)
            },
        }
    }

    /// Everything up to the last product chunk
    ///
    /// `total_rows` is first set to the number of valid rows, then to the
    /// cumulative persisted count after each chunk, so it dips mid-run
    /// (1001, 1000, 1001) before settling on the final count.
    async fn run(&self, batch: &mut UploadBatch, job: &ProcessCsvJob) -> Result<(), BatchJobError> {
        self.commit(batch, UploadBatch::start_processing).await?;
        info!(file = %job.file.original_name, "Batch processing started");

        let parsed = self.parse(job).await?;
        let valid = parsed.products.len();
        self.commit(batch, |b| b.record_rows(valid)).await?;

        let rates = self.rates.fetch().await?;
        self.catalog.save_rates(batch.id(), &rates).await?;
        debug!(count = rates.len(), "Exchange rates saved");

        let chunk_size = self.settings.chunk_size;
        for (index, chunk) in parsed.products.chunks(chunk_size).enumerate() {
            let persisted = index * chunk_size + chunk.len();
            let mut next = batch.clone();
            next.record_rows(persisted)?;
            self.catalog.save_product_chunk(&next, chunk).await?;
            *batch = next;
            debug!(persisted, total = valid, "Product chunk persisted");
        }

        Ok(())
    }

    /// Apply `change` to a copy, persist it, then adopt it
    async fn commit<F>(&self, batch: &mut UploadBatch, change: F) -> Result<(), BatchJobError>
    where
        F: FnOnce(&mut UploadBatch) -> Result<(), TransitionError>,
    {
        let mut next = batch.clone();
        change(&mut next)?;
        self.batches.save(&next).await?;
        *batch = next;
        Ok(())
    }

    async fn parse(&self, job: &ProcessCsvJob) -> Result<ParsedFile, BatchJobError> {
        let path = job.file.path.clone();
        let options = self.settings.csv;

        let parsed = tokio::task::spawn_blocking(move || read_products_from_path(&path, &options))
            .await
            .map_err(|e| BatchJobError::Parser(e.to_string()))??;

        info!(
            valid = parsed.products.len(),
            rejected = parsed.rejected,
            "CSV parsed"
        );

        self.discard_upload(job).await;
        Ok(parsed)
    }

    /// Best effort; the batch outcome never depends on it
    ///
    /// Starts from the stored snapshot: an interrupted write may have landed
    /// after the in-memory copy was taken, and a terminal row is left as is.
    async fn mark_failed(&self, batch: &mut UploadBatch) {
        let mut next = match self.batches.get(batch.id()).await {
            Ok(Some(stored)) => stored,
            Ok(None) => batch.clone(),
            Err(e) => {
                warn!(error = %e, "Could not reload batch before failing it");
                batch.clone()
            },
        };

        if next.status().is_terminal() {
            warn!(status = next.status().as_str(), "Batch already terminal, not failing it");
            *batch = next;
            return;
        }
        if let Err(e) = next.fail(Utc::now()) {
            warn!(error = %e, "Batch cannot be marked failed");
            return;
        }
        match self.batches.save(&next).await {
            Ok(()) => *batch = next,
            Err(e) => error!(error = %e, "Failed to persist failed batch status"),
        }
    }

    async fn discard_upload(&self, job: &ProcessCsvJob) {
        if !self.settings.remove_processed_files {
            return;
        }
        if let Err(e) = self.uploads.remove(&job.file.path).await {
            warn!(error = %e, "Failed to remove processed upload");
        }
    }
}
