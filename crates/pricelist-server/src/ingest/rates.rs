//! Exchange-rate fetching
//!
//! One GET against the currency API returns a JSON object keyed by the base
//! currency, holding a map of currency code to rate:
//!
//! ```json
//! { "date": "2026-03-01", "usd": { "brl": 5.71, "eur": 0.92, ... } }
//! ```
//!
//! Only [`TARGET_CURRENCIES`] are kept. Targets absent from the response are
//! skipped; a response without the base key fails the whole fetch.

use async_trait::async_trait;
use pricelist_common::currency::TARGET_CURRENCIES;
use pricelist_common::CurrencyCode;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use sqlx::types::BigDecimal;
use std::str::FromStr;

use super::config::RatesConfig;
use crate::models::FetchedRate;

/// Largest value a NUMERIC(10,6) column holds
const MAX_RATE: f64 = 9_999.999_999;

#[derive(Debug, thiserror::Error)]
pub enum RateFetchError {
    #[error("Exchange rate request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Exchange rate source returned HTTP {0}")]
    Status(StatusCode),

    #[error("Exchange rate response has no '{0}' rates")]
    MissingBase(String),

    #[error("Exchange rate for '{currency}' is invalid: {value}")]
    Malformed { currency: String, value: String },

    #[error("Exchange rate response contains none of the target currencies")]
    NoRates,
}

/// Source of the rate snapshot taken for every batch
#[async_trait]
pub trait RateFetcher: Send + Sync {
    async fn fetch(&self) -> Result<Vec<FetchedRate>, RateFetchError>;
}

/// [`RateFetcher`] over the public currency API
pub struct HttpRateFetcher {
    client: Client,
    base_url: String,
    base_currency: CurrencyCode,
}

impl HttpRateFetcher {
    pub fn new(config: &RatesConfig) -> Result<Self, RateFetchError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("pricelist-server/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            base_currency: config.base_currency.clone(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/npm/@fawazahmed0/currency-api@latest/v1/currencies/{}.json",
            self.base_url, self.base_currency
        )
    }
}

#[async_trait]
impl RateFetcher for HttpRateFetcher {
    #[tracing::instrument(skip(self), fields(base = %self.base_currency))]
    async fn fetch(&self) -> Result<Vec<FetchedRate>, RateFetchError> {
        let response = self.client.get(self.url()).send().await?;

        if !response.status().is_success() {
            return Err(RateFetchError::Status(response.status()));
        }

        let body: Value = response.json().await?;
        let rates = extract_rates(&body, &self.base_currency)?;

        tracing::debug!(count = rates.len(), "Exchange rates fetched");
        Ok(rates)
    }
}

/// Pull the target currencies out of a response body
pub fn extract_rates(
    body: &Value,
    base: &CurrencyCode,
) -> Result<Vec<FetchedRate>, RateFetchError> {
    let table = body
        .get(base.as_str())
        .and_then(Value::as_object)
        .ok_or_else(|| RateFetchError::MissingBase(base.to_string()))?;

    let mut rates = Vec::with_capacity(TARGET_CURRENCIES.len());
    for currency in CurrencyCode::targets() {
        let Some(value) = table.get(currency.as_str()) else {
            continue;
        };
        let rate = parse_rate(&currency, value)?;
        rates.push(FetchedRate { currency, rate });
    }

    if rates.is_empty() {
        return Err(RateFetchError::NoRates);
    }
    Ok(rates)
}

fn parse_rate(currency: &CurrencyCode, value: &Value) -> Result<BigDecimal, RateFetchError> {
    let malformed = || RateFetchError::Malformed {
        currency: currency.to_string(),
        value: value.to_string(),
    };

    let number = value.as_f64().ok_or_else(malformed)?;
    let formatted = format!("{:.6}", number);
    let rounded: f64 = formatted.parse().map_err(|_| malformed())?;
    if rounded.is_nan() || rounded <= 0.0 || rounded > MAX_RATE {
        return Err(malformed());
    }

    BigDecimal::from_str(&formatted).map_err(|_| malformed())
}
