//! Product catalog listing
//!
//! Filters, sorts and pages committed products. Each item carries the rate
//! snapshot of the batch it came from so clients can convert prices locally.

use chrono::{DateTime, NaiveDate, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use uuid::Uuid;

use crate::features::shared::pagination::{Paginated, PaginationMetadata};
use crate::models::{ExchangeRate, Product};

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 50;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListProductsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateItem {
    pub currency: String,
    pub rate: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListItem {
    pub id: Uuid,
    pub name: String,
    pub price: String,
    pub expiration: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub upload_batch_id: Uuid,
    pub exchange_rates: Vec<RateItem>,
}

pub type ListProductsResponse = Paginated<ProductListItem>;

#[derive(Debug, thiserror::Error)]
pub enum ListProductsError {
    #[error("Page must be greater than 0 and within range")]
    InvalidPage,
    #[error("Limit must be between 1 and 50")]
    InvalidLimit,
    #[error("Prices must be non-negative numbers")]
    InvalidPrice,
    #[error("min_price cannot be greater than max_price")]
    PriceRange,
    #[error("from_date cannot be after to_date")]
    DateRange,
    #[error("sort_by must be one of: name, price, expiration")]
    InvalidSortField,
    #[error("sort_order must be asc or desc")]
    InvalidSortOrder,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<ListProductsResponse, ListProductsError>> for ListProductsQuery {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortField {
    Name,
    Price,
    Expiration,
}

impl SortField {
    fn column(self) -> &'static str {
        match self {
            SortField::Name => "LOWER(name)",
            SortField::Price => "price",
            SortField::Expiration => "expiration",
        }
    }
}

impl ListProductsQuery {
    pub fn validate(&self) -> Result<(), ListProductsError> {
        if let Some(page) = self.page {
            if page < 1 {
                return Err(ListProductsError::InvalidPage);
            }
        }
        if let Some(limit) = self.limit {
            if !(1..=MAX_LIMIT).contains(&limit) {
                return Err(ListProductsError::InvalidLimit);
            }
        }
        self.offset()?;
        for price in [self.min_price, self.max_price].into_iter().flatten() {
            if !price.is_finite() || price < 0.0 {
                return Err(ListProductsError::InvalidPrice);
            }
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(ListProductsError::PriceRange);
            }
        }
        if self.from_date() > self.to_date() {
            return Err(ListProductsError::DateRange);
        }
        self.sort_field()?;
        self.descending()?;
        Ok(())
    }

    fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Rows to skip; a page whose offset does not fit in `i64` is invalid
    fn offset(&self) -> Result<i64, ListProductsError> {
        (self.page() - 1)
            .checked_mul(self.limit())
            .ok_or(ListProductsError::InvalidPage)
    }

    fn from_date(&self) -> NaiveDate {
        self.from_date
            .unwrap_or(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN))
    }

    fn to_date(&self) -> NaiveDate {
        self.to_date
            .unwrap_or(NaiveDate::from_ymd_opt(2100, 12, 31).unwrap_or(NaiveDate::MAX))
    }

    fn name_pattern(&self) -> Option<String> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| format!("%{}%", name.to_lowercase()))
    }

    fn sort_field(&self) -> Result<SortField, ListProductsError> {
        match self.sort_by.as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("name") => Ok(SortField::Name),
            Some("price") => Ok(SortField::Price),
            Some("expiration") => Ok(SortField::Expiration),
            Some(_) => Err(ListProductsError::InvalidSortField),
        }
    }

    fn descending(&self) -> Result<bool, ListProductsError> {
        match self.sort_order.as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("asc") => Ok(false),
            Some("desc") => Ok(true),
            Some(_) => Err(ListProductsError::InvalidSortOrder),
        }
    }

    /// Append the shared WHERE clause
    fn push_filters(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        builder
            .push(" WHERE expiration BETWEEN ")
            .push_bind(self.from_date())
            .push(" AND ")
            .push_bind(self.to_date())
            .push(" AND price >= ")
            .push_bind(self.min_price.unwrap_or(0.0))
            .push("::numeric");

        if let Some(max) = self.max_price {
            builder.push(" AND price <= ").push_bind(max).push("::numeric");
        }
        if let Some(pattern) = self.name_pattern() {
            builder.push(" AND LOWER(name) LIKE ").push_bind(pattern);
        }
    }
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    query: ListProductsQuery,
) -> Result<ListProductsResponse, ListProductsError> {
    query.validate()?;

    let page = query.page();
    let limit = query.limit();
    let offset = query.offset()?;
    let sort = query.sort_field()?;
    let direction = if query.descending()? { "DESC" } else { "ASC" };

    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
    query.push_filters(&mut count);
    let total: i64 = count.build_query_scalar().fetch_one(&pool).await?;

    let mut select = QueryBuilder::<Postgres>::new(
        "SELECT id, name, price, expiration, upload_batch_id, created_at FROM products",
    );
    query.push_filters(&mut select);
    select
        .push(format!(" ORDER BY {} {}, id ASC", sort.column(), direction))
        .push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let products: Vec<Product> = select.build_query_as().fetch_all(&pool).await?;

    let rates = rates_by_batch(&pool, &products).await?;
    let items = products
        .into_iter()
        .map(|p| ProductListItem {
            exchange_rates: rates.get(&p.upload_batch_id).cloned().unwrap_or_default(),
            id: p.id,
            name: p.name,
            price: p.price.with_scale(2).to_string(),
            expiration: p.expiration,
            created_at: p.created_at,
            upload_batch_id: p.upload_batch_id,
        })
        .collect();

    Ok(Paginated::new(items, PaginationMetadata::new(page, limit, total)))
}

async fn rates_by_batch(
    pool: &PgPool,
    products: &[Product],
) -> Result<HashMap<Uuid, Vec<RateItem>>, sqlx::Error> {
    let mut batch_ids: Vec<Uuid> = products.iter().map(|p| p.upload_batch_id).collect();
    batch_ids.sort_unstable();
    batch_ids.dedup();

    if batch_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<_, ExchangeRate>(
        r#"
        SELECT id, currency, rate, upload_batch_id
        FROM exchange_rates
        WHERE upload_batch_id = ANY($1)
        ORDER BY currency
        "#,
    )
    .bind(&batch_ids)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<RateItem>> = HashMap::new();
    for row in rows {
        grouped.entry(row.upload_batch_id).or_default().push(RateItem {
            currency: row.currency,
            rate: row.rate.with_scale(6).to_string(),
        });
    }
    Ok(grouped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_defaults() {
        let query = ListProductsQuery::default();
        assert!(query.validate().is_ok());
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), 10);
        assert_eq!(query.sort_field().unwrap(), SortField::Name);
        assert!(!query.descending().unwrap());
        assert_eq!(query.from_date(), NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());
        assert_eq!(query.to_date(), NaiveDate::from_ymd_opt(2100, 12, 31).unwrap());
    }

    #[test]
    fn test_validation_pagination() {
        let query = ListProductsQuery {
            page: Some(0),
            ..Default::default()
        };
        assert!(matches!(query.validate(), Err(ListProductsError::InvalidPage)));

        let query = ListProductsQuery {
            page: Some(i64::MAX),
            limit: Some(50),
            ..Default::default()
        };
        assert!(matches!(query.validate(), Err(ListProductsError::InvalidPage)));

        let query = ListProductsQuery {
            page: Some(i64::MAX / 50),
            limit: Some(50),
            ..Default::default()
        };
        assert_eq!(query.offset().unwrap(), (i64::MAX / 50 - 1) * 50);

        let query = ListProductsQuery {
            limit: Some(51),
            ..Default::default()
        };
        assert!(matches!(query.validate(), Err(ListProductsError::InvalidLimit)));
    }

    #[test]
    fn test_validation_ranges() {
        let query = ListProductsQuery {
            min_price: Some(10.0),
            max_price: Some(5.0),
            ..Default::default()
        };
        assert!(matches!(query.validate(), Err(ListProductsError::PriceRange)));

        let query = ListProductsQuery {
            min_price: Some(-1.0),
            ..Default::default()
        };
        assert!(matches!(query.validate(), Err(ListProductsError::InvalidPrice)));

        let query = ListProductsQuery {
            from_date: NaiveDate::from_ymd_opt(2027, 1, 1),
            to_date: NaiveDate::from_ymd_opt(2026, 1, 1),
            ..Default::default()
        };
        assert!(matches!(query.validate(), Err(ListProductsError::DateRange)));

        let query = ListProductsQuery {
            from_date: NaiveDate::from_ymd_opt(2101, 1, 1),
            ..Default::default()
        };
        assert!(matches!(query.validate(), Err(ListProductsError::DateRange)));
    }

    #[test]
    fn test_validation_sorting() {
        let query = ListProductsQuery {
            sort_by: Some("Price".to_string()),
            sort_order: Some("DESC".to_string()),
            ..Default::default()
        };
        assert!(query.validate().is_ok());
        assert_eq!(query.sort_field().unwrap(), SortField::Price);
        assert!(query.descending().unwrap());

        let query = ListProductsQuery {
            sort_by: Some("created_at".to_string()),
            ..Default::default()
        };
        assert!(matches!(query.validate(), Err(ListProductsError::InvalidSortField)));

        let query = ListProductsQuery {
            sort_order: Some("up".to_string()),
            ..Default::default()
        };
        assert!(matches!(query.validate(), Err(ListProductsError::InvalidSortOrder)));
    }

    #[test]
    fn test_name_pattern() {
        let query = ListProductsQuery {
            name: Some("  Wid ".to_string()),
            ..Default::default()
        };
        assert_eq!(query.name_pattern().as_deref(), Some("%wid%"));

        let blank = ListProductsQuery {
            name: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(blank.name_pattern().is_none());
    }

    #[test]
    fn test_filters_sql() {
        let query = ListProductsQuery {
            name: Some("wid".to_string()),
            max_price: Some(20.0),
            ..Default::default()
        };
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
        query.push_filters(&mut builder);

        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM products WHERE expiration BETWEEN $1 AND $2 \
             AND price >= $3::numeric AND price <= $4::numeric AND LOWER(name) LIKE $5"
        );
    }
}
