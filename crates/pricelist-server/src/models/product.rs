use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::BigDecimal;
use uuid::Uuid;

/// A normalized row ready to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    /// Positive, two decimal places
    pub price: BigDecimal,
    pub expiration: NaiveDate,
}

/// A committed catalog row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: BigDecimal,
    pub expiration: NaiveDate,
    pub upload_batch_id: Uuid,
    pub created_at: DateTime<Utc>,
}
