pub mod commands;
pub mod queries;
pub mod routes;
pub mod types;

use std::sync::Arc;

use crate::db::BatchStore;
use crate::ingest::IngestQueue;
use crate::storage::UploadStorage;

pub use commands::{CreateBatchCommand, CreateBatchError};
pub use queries::{GetBatchStatusError, GetBatchStatusQuery};
pub use routes::uploads_routes;
pub use types::BatchSnapshot;

/// Everything the intake path needs; it never touches the catalog
#[derive(Clone)]
pub struct IntakeState {
    pub batches: Arc<dyn BatchStore>,
    pub queue: Arc<dyn IngestQueue>,
    pub uploads: UploadStorage,
    /// Largest accepted file in bytes
    pub max_file_size: usize,
}
