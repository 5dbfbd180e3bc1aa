//! Job scheduler
//!
//! Registers the batch workers on the apalis PostgreSQL queue.

use anyhow::Result;
use apalis::prelude::*;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::{
    config::IngestConfig,
    jobs::ProcessCsvJob,
    queue::ApalisQueue,
    worker::{BatchJobError, BatchWorker},
};

/// Job scheduler
pub struct IngestScheduler {
    config: IngestConfig,
    queue: ApalisQueue,
    worker: Arc<BatchWorker>,
}

impl IngestScheduler {
    pub fn new(config: IngestConfig, queue: ApalisQueue, worker: Arc<BatchWorker>) -> Self {
        Self {
            config,
            queue,
            worker,
        }
    }

    /// Spawn the apalis monitor with `worker_threads` workers
    pub async fn start(self) -> Result<JoinHandle<()>> {
        let host = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "localhost".to_string());

        info!(
            "Starting ingest scheduler with {} workers on {}",
            self.config.worker_threads, host
        );

        let mut monitor = Monitor::new();
        for slot in 0..self.config.worker_threads {
            let storage = self.queue.storage();
            let worker = self.worker.clone();
            let name = format!("pricelist-ingest-{}-{}", host, slot);
            monitor = monitor.register(move |_index| {
                WorkerBuilder::new(name.clone())
                    .backend(storage.clone())
                    .data(worker.clone())
                    .build(process_csv_job)
            });
        }

        let handle = tokio::spawn(async move {
            info!("Ingest workers started");
            if let Err(e) = monitor.run().await {
                error!("Ingest worker error: {:?}", e);
            }
            info!("Ingest workers stopped");
        });

        Ok(handle)
    }
}

/// apalis handler for [`ProcessCsvJob`]
///
/// The batch is already terminal when this returns an error, so a retry only
/// hits the redelivery checks in [`BatchWorker::process`].
pub async fn process_csv_job(
    job: ProcessCsvJob,
    worker: Data<Arc<BatchWorker>>,
) -> Result<(), BatchJobError> {
    info!(
        "Processing CSV job for batch {} ({})",
        job.batch_id, job.file.original_name
    );

    let batch = worker.process(&job).await?;

    info!(
        "CSV job completed for batch {}: {} products",
        batch.id(),
        batch.total_rows()
    );
    Ok(())
}
