//! Shared fixtures for database-backed integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use pricelist_common::CurrencyCode;
use pricelist_server::{
    db::PgStore,
    features::{FeatureState, IntakeState},
    ingest::{
        BatchWorker, IngestQueue, ProcessCsvJob, QueueError, RateFetchError, RateFetcher,
        WorkerSettings,
    },
    models::FetchedRate,
    storage::{config::StorageConfig, UploadStorage},
};
use sqlx::{types::BigDecimal, PgPool};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const MAX_FILE_SIZE: usize = 64 * 1024;

/// Queue that keeps jobs in memory so tests can run them by hand
#[derive(Clone, Default)]
pub struct RecordingQueue {
    jobs: Arc<Mutex<Vec<ProcessCsvJob>>>,
}

impl RecordingQueue {
    pub fn jobs(&self) -> Vec<ProcessCsvJob> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl IngestQueue for RecordingQueue {
    async fn enqueue(&self, job: ProcessCsvJob) -> Result<(), QueueError> {
        self.jobs.lock().unwrap().push(job);
        Ok(())
    }
}

/// Fixed rate snapshot
pub struct StaticRates(pub Vec<(&'static str, &'static str)>);

impl StaticRates {
    pub fn usd() -> Self {
        Self(vec![("brl", "5.710000"), ("eur", "0.920000"), ("gbp", "0.790000")])
    }
}

#[async_trait]
impl RateFetcher for StaticRates {
    async fn fetch(&self) -> Result<Vec<FetchedRate>, RateFetchError> {
        Ok(self
            .0
            .iter()
            .map(|(currency, rate)| FetchedRate {
                currency: CurrencyCode::from_str(currency).unwrap(),
                rate: BigDecimal::from_str(rate).unwrap(),
            })
            .collect())
    }
}

/// Rate source whose response lacks the base currency
pub struct MissingBase;

#[async_trait]
impl RateFetcher for MissingBase {
    async fn fetch(&self) -> Result<Vec<FetchedRate>, RateFetchError> {
        Err(RateFetchError::MissingBase("usd".to_string()))
    }
}

pub struct TestEnv {
    pub pool: PgPool,
    pub store: Arc<PgStore>,
    pub queue: RecordingQueue,
    pub uploads: UploadStorage,
    _tmp: TempDir,
}

impl TestEnv {
    pub async fn new(pool: PgPool) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let uploads = UploadStorage::new(&StorageConfig {
            upload_dir: tmp.path().join("uploads"),
            max_file_size: MAX_FILE_SIZE,
        })
        .await
        .unwrap();

        Self {
            store: Arc::new(PgStore::new(pool.clone())),
            pool,
            queue: RecordingQueue::default(),
            uploads,
            _tmp: tmp,
        }
    }

    pub fn feature_state(&self) -> FeatureState {
        FeatureState {
            db: self.pool.clone(),
            intake: IntakeState {
                batches: self.store.clone(),
                queue: Arc::new(self.queue.clone()),
                uploads: self.uploads.clone(),
                max_file_size: MAX_FILE_SIZE,
            },
        }
    }

    pub fn worker(&self, rates: impl RateFetcher + 'static, settings: WorkerSettings) -> BatchWorker {
        BatchWorker::new(
            self.store.clone(),
            self.store.clone(),
            Arc::new(rates),
            self.uploads.clone(),
            settings,
        )
    }
}

pub fn csv_with_rows(count: usize) -> String {
    let mut csv = String::from("name;price;expiration\n");
    for i in 0..count {
        csv.push_str(&format!("Product {:05};{},{:02};12/31/2027\n", i, i % 500 + 1, i % 100));
    }
    csv
}

pub async fn count_products(pool: &PgPool, batch_id: uuid::Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE upload_batch_id = $1")
        .bind(batch_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn count_rates(pool: &PgPool, batch_id: uuid::Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM exchange_rates WHERE upload_batch_id = $1")
        .bind(batch_id)
        .fetch_one(pool)
        .await
        .unwrap()
}
