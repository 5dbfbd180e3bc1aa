//! Error types shared across the pricelist crates

use thiserror::Error;

/// Result type alias for pricelist operations
pub type Result<T> = std::result::Result<T, PricelistError>;

/// Main error type for shared pricelist code
#[derive(Error, Debug)]
pub enum PricelistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
