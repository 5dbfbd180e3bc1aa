//! Price-list ingestion
//!
//! - **csv**: reading and normalizing uploaded price lists
//! - **rates**: exchange-rate snapshot taken once per batch
//! - **jobs**: the queued job payload
//! - **queue**: enqueue seam and its apalis implementation
//! - **worker**: the batch state machine
//! - **scheduler**: apalis worker registration
//! - **config**: `INGEST_*` and `EXCHANGE_RATE_*` settings

pub mod config;
pub mod csv;
pub mod jobs;
pub mod queue;
pub mod rates;
pub mod scheduler;
pub mod worker;

pub use config::{IngestConfig, RatesConfig};
pub use jobs::{ProcessCsvJob, UploadedFile};
pub use queue::{ApalisQueue, IngestQueue, QueueError};
pub use rates::{HttpRateFetcher, RateFetchError, RateFetcher};
pub use scheduler::IngestScheduler;
pub use worker::{BatchJobError, BatchWorker, WorkerSettings};
