//! Currency codes
//!
//! Exchange rates are stored and looked up by lowercase ISO 4217 code. The
//! set of currencies a rate snapshot is taken for is fixed; the base currency
//! the rates are expressed against is configurable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PricelistError;

/// Currencies captured in every exchange-rate snapshot.
pub const TARGET_CURRENCIES: [&str; 5] = ["brl", "mxn", "cad", "eur", "gbp"];

/// Default base currency for fetched rates.
pub const DEFAULT_BASE_CURRENCY: &str = "usd";

/// A validated, lowercase three-letter currency code
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// The code as a lowercase string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this code belongs to [`TARGET_CURRENCIES`]
    pub fn is_target(&self) -> bool {
        TARGET_CURRENCIES.contains(&self.0.as_str())
    }

    /// [`DEFAULT_BASE_CURRENCY`] as a code
    pub fn default_base() -> Self {
        CurrencyCode(DEFAULT_BASE_CURRENCY.to_string())
    }

    /// The fixed target set as parsed codes
    pub fn targets() -> Vec<CurrencyCode> {
        TARGET_CURRENCIES
            .iter()
            .map(|code| CurrencyCode((*code).to_string()))
            .collect()
    }
}

impl FromStr for CurrencyCode {
    type Err = PricelistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(PricelistError::InvalidCurrency(s.to_string()));
        }
        Ok(CurrencyCode(code.to_ascii_lowercase()))
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = PricelistError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case() {
        let code: CurrencyCode = " USD ".parse().unwrap();
        assert_eq!(code.as_str(), "usd");
        assert_eq!(code.to_string(), "usd");
    }

    #[test]
    fn test_parse_rejects_bad_codes() {
        for bad in ["", "us", "usdx", "u$d", "12a"] {
            assert!(bad.parse::<CurrencyCode>().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_target_membership() {
        assert!("EUR".parse::<CurrencyCode>().unwrap().is_target());
        assert!(!"usd".parse::<CurrencyCode>().unwrap().is_target());
        assert_eq!(CurrencyCode::targets().len(), TARGET_CURRENCIES.len());
        assert!(!CurrencyCode::default_base().is_target());
    }

    #[test]
    fn test_try_from_string() {
        let code = CurrencyCode::try_from("GBP".to_string()).unwrap();
        assert_eq!(String::from(code), "gbp");
        assert!(CurrencyCode::try_from("toolong".to_string()).is_err());
    }
}
