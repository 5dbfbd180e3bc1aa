//! In-memory stores for exercising the worker and the handlers without a database

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use super::{BatchStore, CatalogStore, StoreError, StoreResult};
use crate::models::{FetchedRate, NewProduct, UploadBatch};

#[derive(Default)]
struct State {
    batches: HashMap<Uuid, UploadBatch>,
    /// Every snapshot ever written, in write order
    history: Vec<UploadBatch>,
    rates: Vec<(Uuid, FetchedRate)>,
    products: Vec<(Uuid, NewProduct)>,
    chunk_calls: usize,
    fail_chunk_at: Option<usize>,
}

impl State {
    fn writable(&self, id: Uuid) -> StoreResult<()> {
        match self.batches.get(&id) {
            None => Err(StoreError::not_found("Upload batch", &id.to_string())),
            Some(stored) if stored.status().is_terminal() => Err(StoreError::Terminal(id)),
            Some(_) => Ok(()),
        }
    }
}

/// Shared in-memory implementation of [`BatchStore`] and [`CatalogStore`]
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Seed a batch directly
    pub fn insert(&self, batch: UploadBatch) {
        let mut state = self.lock();
        state.history.push(batch.clone());
        state.batches.insert(batch.id(), batch);
    }

    /// Make the `n`th chunk write (1-based) fail
    pub fn fail_chunk(&self, n: usize) {
        self.lock().fail_chunk_at = Some(n);
    }

    pub fn history(&self, id: Uuid) -> Vec<UploadBatch> {
        self.lock()
            .history
            .iter()
            .filter(|b| b.id() == id)
            .cloned()
            .collect()
    }

    pub fn products(&self, id: Uuid) -> Vec<NewProduct> {
        self.lock()
            .products
            .iter()
            .filter(|(batch_id, _)| *batch_id == id)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn rates(&self, id: Uuid) -> Vec<FetchedRate> {
        self.lock()
            .rates
            .iter()
            .filter(|(batch_id, _)| *batch_id == id)
            .map(|(_, r)| r.clone())
            .collect()
    }

    pub fn chunk_calls(&self) -> usize {
        self.lock().chunk_calls
    }
}

#[async_trait]
impl BatchStore for MemoryStore {
    async fn create(&self, file_name: &str) -> StoreResult<UploadBatch> {
        let batch = UploadBatch::new(file_name);
        self.insert(batch.clone());
        Ok(batch)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<UploadBatch>> {
        Ok(self.lock().batches.get(&id).cloned())
    }

    async fn save(&self, batch: &UploadBatch) -> StoreResult<()> {
        let mut state = self.lock();
        state.writable(batch.id())?;
        state.history.push(batch.clone());
        state.batches.insert(batch.id(), batch.clone());
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn save_rates(&self, batch_id: Uuid, rates: &[FetchedRate]) -> StoreResult<()> {
        let mut state = self.lock();
        state
            .rates
            .extend(rates.iter().cloned().map(|r| (batch_id, r)));
        Ok(())
    }

    async fn save_product_chunk(
        &self,
        batch: &UploadBatch,
        products: &[NewProduct],
    ) -> StoreResult<()> {
        let mut state = self.lock();
        state.chunk_calls += 1;
        if state.fail_chunk_at == Some(state.chunk_calls) {
            return Err(StoreError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        state.writable(batch.id())?;
        state
            .products
            .extend(products.iter().cloned().map(|p| (batch.id(), p)));
        state.history.push(batch.clone());
        state.batches.insert(batch.id(), batch.clone());
        Ok(())
    }
}
