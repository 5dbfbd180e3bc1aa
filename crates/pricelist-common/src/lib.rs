//! Pricelist Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the pricelist workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`PricelistError`] and the [`Result`] alias
//! - **Logging**: tracing subscriber bootstrap shared by every binary
//! - **Currency**: validated ISO currency codes and the target currency set
//!
//! # Example
//!
//! ```no_run
//! use pricelist_common::currency::CurrencyCode;
//!
//! fn base() -> pricelist_common::Result<CurrencyCode> {
//!     "USD".parse()
//! }
//! ```

pub mod currency;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use currency::CurrencyCode;
pub use error::{PricelistError, Result};
