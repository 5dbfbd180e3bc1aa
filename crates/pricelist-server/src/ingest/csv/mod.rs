//! CSV price-list parsing
//!
//! - **record**: ordered fields with header lookup falling back to position
//! - **normalizer**: row cleaning and validation
//! - **reader**: file reading on top of the `csv` crate

pub mod normalizer;
pub mod reader;
pub mod record;

pub use normalizer::{normalize_record, RowRejection};
pub use reader::{read_products, read_products_from_path, CsvOptions, CsvReadError, ParsedFile};
pub use record::CsvRecord;
