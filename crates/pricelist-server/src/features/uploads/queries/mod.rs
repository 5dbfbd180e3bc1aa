pub mod get_status;

pub use get_status::{GetBatchStatusError, GetBatchStatusQuery};
