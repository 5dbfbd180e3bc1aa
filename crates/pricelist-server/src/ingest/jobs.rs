//! Job definitions for data ingestion
//!
//! Defines the payload pushed to the apalis queue for every accepted upload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// An upload written to local storage, waiting to be parsed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Where the stored copy lives
    pub path: PathBuf,
    /// File name as sent by the client
    pub original_name: String,
    /// Declared MIME type, if any
    pub mime_type: Option<String>,
    /// Size in bytes
    pub size: u64,
}

/// CSV processing job payload
///
/// Exactly one is enqueued per created batch. The queue does not deduplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessCsvJob {
    /// Batch this job drives
    pub batch_id: Uuid,
    pub file: UploadedFile,
    /// Timestamp when job was created
    pub created_at: DateTime<Utc>,
}

impl ProcessCsvJob {
    /// Create a new processing job
    pub fn new(batch_id: Uuid, file: UploadedFile) -> Self {
        Self {
            batch_id,
            file,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uploaded() -> UploadedFile {
        UploadedFile {
            path: PathBuf::from("/tmp/uploads/abc.csv"),
            original_name: "prices.csv".to_string(),
            mime_type: Some("text/csv".to_string()),
            size: 42,
        }
    }

    #[test]
    fn test_process_csv_job_new() {
        let batch_id = Uuid::new_v4();
        let job = ProcessCsvJob::new(batch_id, uploaded());

        assert_eq!(job.batch_id, batch_id);
        assert_eq!(job.file.original_name, "prices.csv");
        assert!(job.created_at <= Utc::now());
    }

    #[test]
    fn test_payload_shape() {
        let job = ProcessCsvJob::new(Uuid::nil(), uploaded());
        let value = serde_json::to_value(&job).unwrap();

        assert_eq!(value["batch_id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(value["file"]["path"], "/tmp/uploads/abc.csv");
        assert_eq!(value["file"]["mime_type"], "text/csv");
        assert_eq!(value["file"]["size"], 42);
    }
}
