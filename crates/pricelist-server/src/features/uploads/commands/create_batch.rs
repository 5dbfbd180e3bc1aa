//! Accept an uploaded price list
//!
//! Stores the file, records a `pending` batch and enqueues exactly one
//! processing job. Nothing here parses the file.

use chrono::Utc;
use mediator::Request;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{error, info, warn};

use crate::db::StoreError;
use crate::features::uploads::{BatchSnapshot, IntakeState};
use crate::ingest::{ProcessCsvJob, QueueError};

const MAX_FILE_NAME_LEN: usize = 255;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBatchCommand {
    pub file_name: String,
    pub content_type: Option<String>,
    #[serde(skip)]
    pub content: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateBatchError {
    #[error("A file is required in the 'file' field")]
    FileRequired,
    #[error("File name is required and cannot be empty")]
    FileNameRequired,
    #[error("File name must not exceed 255 characters")]
    FileNameLength,
    #[error("File is empty")]
    ContentRequired,
    #[error("Only CSV files are accepted, got '{0}'")]
    NotCsv(String),
    #[error("File exceeds the upload limit of {limit} bytes")]
    TooLarge { limit: usize },
    #[error("Invalid multipart request: {0}")]
    Multipart(String),
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
    #[error("Database error: {0}")]
    Store(#[from] StoreError),
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
}

impl Request<Result<BatchSnapshot, CreateBatchError>> for CreateBatchCommand {}

impl CreateBatchCommand {
    pub fn validate(&self) -> Result<(), CreateBatchError> {
        if self.file_name.trim().is_empty() {
            return Err(CreateBatchError::FileNameRequired);
        }
        if self.file_name.len() > MAX_FILE_NAME_LEN {
            return Err(CreateBatchError::FileNameLength);
        }
        if self.content.is_empty() {
            return Err(CreateBatchError::ContentRequired);
        }
        if !is_csv(self.content_type.as_deref(), &self.file_name) {
            let declared = self
                .content_type
                .clone()
                .unwrap_or_else(|| self.file_name.clone());
            return Err(CreateBatchError::NotCsv(declared));
        }
        Ok(())
    }
}

/// `text/csv` (parameters ignored), or no usable MIME type and a `.csv` name
fn is_csv(content_type: Option<&str>, file_name: &str) -> bool {
    let essence = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase());

    match essence.as_deref() {
        Some("text/csv") => true,
        None | Some("") | Some("application/octet-stream") => Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv")),
        _ => false,
    }
}

#[tracing::instrument(
    skip(intake, command),
    fields(file = %command.file_name, size = command.content.len())
)]
pub async fn handle(
    intake: IntakeState,
    command: CreateBatchCommand,
) -> Result<BatchSnapshot, CreateBatchError> {
    command.validate()?;
    if command.content.len() > intake.max_file_size {
        return Err(CreateBatchError::TooLarge {
            limit: intake.max_file_size,
        });
    }

    let file = intake
        .uploads
        .save(&command.file_name, command.content_type.clone(), &command.content)
        .await?;

    let batch = match intake.batches.create(&command.file_name).await {
        Ok(batch) => batch,
        Err(e) => {
            discard(&intake, &file.path).await;
            return Err(e.into());
        },
    };

    let stored_path = file.path.clone();
    if let Err(e) = intake.queue.enqueue(ProcessCsvJob::new(batch.id(), file)).await {
        error!(batch_id = %batch.id(), error = %e, "Enqueue failed, failing batch");

        let mut failed = batch.clone();
        match failed.fail(Utc::now()) {
            Ok(()) => {
                if let Err(save_err) = intake.batches.save(&failed).await {
                    error!(batch_id = %batch.id(), error = %save_err, "Failed to persist failed batch");
                }
            },
            Err(transition) => warn!(error = %transition, "Batch cannot be marked failed"),
        }
        discard(&intake, &stored_path).await;
        return Err(e.into());
    }

    info!(batch_id = %batch.id(), "Upload batch created and queued");

    Ok(BatchSnapshot::from(&batch))
}

async fn discard(intake: &IntakeState, path: &Path) {
    if let Err(e) = intake.uploads.remove(path).await {
        warn!(error = %e, "Failed to remove rejected upload");
    }
}
