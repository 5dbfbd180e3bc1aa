use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{BatchStatus, UploadBatch};

/// Externally visible state of an upload batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSnapshot {
    pub id: Uuid,
    pub total_rows: i64,
    pub status: BatchStatus,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<&UploadBatch> for BatchSnapshot {
    fn from(batch: &UploadBatch) -> Self {
        Self {
            id: batch.id(),
            total_rows: batch.total_rows(),
            status: batch.status(),
            created_at: batch.created_at(),
            finished_at: batch.finished_at(),
        }
    }
}
