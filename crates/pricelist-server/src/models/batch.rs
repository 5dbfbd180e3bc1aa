//! Upload batch lifecycle
//!
//! A batch moves `pending -> processing -> finished`, or to `failed` from
//! either non-terminal state. Status and row-count changes only happen through
//! the transition methods on [`UploadBatch`]; there is no public setter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle status of an upload batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Pending,
    Processing,
    Finished,
    Failed,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Pending => "pending",
            BatchStatus::Processing => "processing",
            BatchStatus::Finished => "finished",
            BatchStatus::Failed => "failed",
        }
    }

    /// `finished` and `failed` admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchStatus::Finished | BatchStatus::Failed)
    }

    pub fn can_transition_to(&self, next: BatchStatus) -> bool {
        matches!(
            (self, next),
            (BatchStatus::Pending, BatchStatus::Processing)
                | (BatchStatus::Pending, BatchStatus::Failed)
                | (BatchStatus::Processing, BatchStatus::Finished)
                | (BatchStatus::Processing, BatchStatus::Failed)
        )
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatchStatus {
    type Err = UnknownBatchStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BatchStatus::Pending),
            "processing" => Ok(BatchStatus::Processing),
            "finished" => Ok(BatchStatus::Finished),
            "failed" => Ok(BatchStatus::Failed),
            other => Err(UnknownBatchStatus(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown batch status '{0}'")]
pub struct UnknownBatchStatus(pub String);

/// Rejected lifecycle change
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("Batch {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: Uuid,
        from: BatchStatus,
        to: BatchStatus,
    },

    #[error("Batch {id} is {status}; row counts only change while processing")]
    NotProcessing { id: Uuid, status: BatchStatus },
}

/// Snapshot of one upload batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadBatch {
    id: Uuid,
    file_name: String,
    status: BatchStatus,
    total_rows: i64,
    created_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl UploadBatch {
    /// A fresh `pending` batch for an accepted upload
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_name: file_name.into(),
            status: BatchStatus::Pending,
            total_rows: 0,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Rebuild a snapshot read back from a store
    pub(crate) fn restore(
        id: Uuid,
        file_name: String,
        status: BatchStatus,
        total_rows: i64,
        created_at: DateTime<Utc>,
        finished_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            file_name,
            status,
            total_rows,
            created_at,
            finished_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn status(&self) -> BatchStatus {
        self.status
    }

    pub fn total_rows(&self) -> i64 {
        self.total_rows
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// `pending -> processing`
    pub fn start_processing(&mut self) -> Result<(), TransitionError> {
        self.transition(BatchStatus::Processing)?;
        Ok(())
    }

    /// Record the current row count; only valid while processing
    pub fn record_rows(&mut self, total_rows: usize) -> Result<(), TransitionError> {
        if self.status != BatchStatus::Processing {
            return Err(TransitionError::NotProcessing {
                id: self.id,
                status: self.status,
            });
        }
        self.total_rows = i64::try_from(total_rows).unwrap_or(i64::MAX);
        Ok(())
    }

    /// `processing -> finished`, stamping `finished_at`
    pub fn finish(&mut self, at: DateTime<Utc>) -> Result<(), TransitionError> {
        self.transition(BatchStatus::Finished)?;
        self.finished_at = Some(at);
        Ok(())
    }

    /// `pending | processing -> failed`, stamping `finished_at`
    pub fn fail(&mut self, at: DateTime<Utc>) -> Result<(), TransitionError> {
        self.transition(BatchStatus::Failed)?;
        self.finished_at = Some(at);
        Ok(())
    }

    fn transition(&mut self, next: BatchStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError::InvalidTransition {
                id: self.id,
                from: self.status,
                to: next,
            });
        }
        tracing::debug!(batch_id = %self.id, from = %self.status, to = %next, "Batch transition");
        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_batch_is_pending() {
        let batch = UploadBatch::new("prices.csv");
        assert_eq!(batch.status(), BatchStatus::Pending);
        assert_eq!(batch.total_rows(), 0);
        assert_eq!(batch.file_name(), "prices.csv");
        assert!(batch.finished_at().is_none());
    }

    #[test]
    fn test_success_path() {
        let mut batch = UploadBatch::new("prices.csv");
        batch.start_processing().unwrap();
        batch.record_rows(42).unwrap();
        let at = Utc::now();
        batch.finish(at).unwrap();

        assert_eq!(batch.status(), BatchStatus::Finished);
        assert_eq!(batch.total_rows(), 42);
        assert_eq!(batch.finished_at(), Some(at));
    }

    #[test]
    fn test_fail_from_pending_and_processing() {
        let mut pending = UploadBatch::new("a.csv");
        pending.fail(Utc::now()).unwrap();
        assert_eq!(pending.status(), BatchStatus::Failed);
        assert!(pending.finished_at().is_some());

        let mut processing = UploadBatch::new("b.csv");
        processing.start_processing().unwrap();
        processing.fail(Utc::now()).unwrap();
        assert_eq!(processing.status(), BatchStatus::Failed);
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        let mut batch = UploadBatch::new("a.csv");
        batch.start_processing().unwrap();
        batch.finish(Utc::now()).unwrap();
        let snapshot = batch.clone();

        assert!(batch.start_processing().is_err());
        assert!(batch.fail(Utc::now()).is_err());
        assert!(batch.finish(Utc::now()).is_err());
        assert!(matches!(
            batch.record_rows(5),
            Err(TransitionError::NotProcessing { .. })
        ));
        assert_eq!(batch, snapshot);
    }

    #[test]
    fn test_pending_cannot_finish_or_count_rows() {
        let mut batch = UploadBatch::new("a.csv");
        assert!(matches!(
            batch.finish(Utc::now()),
            Err(TransitionError::InvalidTransition {
                from: BatchStatus::Pending,
                to: BatchStatus::Finished,
                ..
            })
        ));
        assert!(batch.record_rows(1).is_err());
        assert!(batch.finished_at().is_none());
    }

    #[test]
    fn test_status_literals() {
        for status in [
            BatchStatus::Pending,
            BatchStatus::Processing,
            BatchStatus::Finished,
            BatchStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<BatchStatus>().unwrap(), status);
            assert_eq!(
                serde_json::to_value(status).unwrap(),
                serde_json::json!(status.as_str())
            );
        }
        assert!("done".parse::<BatchStatus>().is_err());
    }
}
