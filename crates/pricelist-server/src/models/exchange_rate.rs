use pricelist_common::CurrencyCode;
use sqlx::types::BigDecimal;
use uuid::Uuid;

/// One currency of a rate snapshot, before it is tied to a batch
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedRate {
    pub currency: CurrencyCode,
    /// Relative to the configured base currency, six decimal places
    pub rate: BigDecimal,
}

/// A persisted rate row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExchangeRate {
    pub id: Uuid,
    pub currency: String,
    pub rate: BigDecimal,
    pub upload_batch_id: Uuid,
}
