use mediator::Request;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{BatchStore, StoreError};
use crate::features::uploads::BatchSnapshot;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetBatchStatusQuery {
    pub batch_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GetBatchStatusError {
    #[error("Upload batch '{0}' not found")]
    NotFound(String),
    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

impl Request<Result<BatchSnapshot, GetBatchStatusError>> for GetBatchStatusQuery {}

/// Read-only; an id that is not a UUID cannot exist and is reported as not found
#[tracing::instrument(skip(batches))]
pub async fn handle(
    batches: Arc<dyn BatchStore>,
    query: GetBatchStatusQuery,
) -> Result<BatchSnapshot, GetBatchStatusError> {
    let id = Uuid::parse_str(query.batch_id.trim())
        .map_err(|_| GetBatchStatusError::NotFound(query.batch_id.clone()))?;

    let batch = batches
        .get(id)
        .await?
        .ok_or_else(|| GetBatchStatusError::NotFound(query.batch_id.clone()))?;

    Ok(BatchSnapshot::from(&batch))
}
