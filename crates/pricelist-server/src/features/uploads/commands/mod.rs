pub mod create_batch;

pub use create_batch::{CreateBatchCommand, CreateBatchError};
