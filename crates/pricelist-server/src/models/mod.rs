//! Domain models shared by the stores, the worker and the HTTP features

pub mod batch;
pub mod exchange_rate;
pub mod product;

pub use batch::{BatchStatus, TransitionError, UploadBatch};
pub use exchange_rate::{ExchangeRate, FetchedRate};
pub use product::{NewProduct, Product};
