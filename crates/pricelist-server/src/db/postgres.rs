//! PostgreSQL implementation of the batch and catalog stores

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{BatchStore, CatalogStore, StoreError, StoreResult};
use crate::models::{BatchStatus, FetchedRate, NewProduct, UploadBatch};

/// Stores backed by a shared connection pool
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BatchRow {
    id: Uuid,
    file_name: String,
    status: String,
    total_rows: i64,
    created_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl TryFrom<BatchRow> for UploadBatch {
    type Error = StoreError;

    fn try_from(row: BatchRow) -> Result<Self, Self::Error> {
        let status: BatchStatus = row
            .status
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("batch {}: {}", row.id, e)))?;

        Ok(UploadBatch::restore(
            row.id,
            row.file_name,
            status,
            row.total_rows,
            row.created_at,
            row.finished_at,
        ))
    }
}

#[async_trait]
impl BatchStore for PgStore {
    #[tracing::instrument(skip(self))]
    async fn create(&self, file_name: &str) -> StoreResult<UploadBatch> {
        let batch = UploadBatch::new(file_name);

        sqlx::query(
            r#"
            INSERT INTO upload_batches (id, file_name, status, total_rows, created_at, finished_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(batch.id())
        .bind(batch.file_name())
        .bind(batch.status().as_str())
        .bind(batch.total_rows())
        .bind(batch.created_at())
        .bind(batch.finished_at())
        .execute(&self.db)
        .await?;

        tracing::debug!(batch_id = %batch.id(), "Upload batch created");
        Ok(batch)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<UploadBatch>> {
        let row = sqlx::query_as::<_, BatchRow>(
            r#"
            SELECT id, file_name, status, total_rows, created_at, finished_at
            FROM upload_batches
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(UploadBatch::try_from).transpose()
    }

    async fn save(&self, batch: &UploadBatch) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE upload_batches
            SET status = $2, total_rows = $3, finished_at = $4
            WHERE id = $1 AND status NOT IN ('finished', 'failed')
            "#,
        )
        .bind(batch.id())
        .bind(batch.status().as_str())
        .bind(batch.total_rows())
        .bind(batch.finished_at())
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.rejected_update(batch.id()).await);
        }
        Ok(())
    }
}

impl PgStore {
    /// Why an update guarded on a non-terminal status touched no row
    async fn rejected_update(&self, id: Uuid) -> StoreError {
        let status: Result<Option<String>, sqlx::Error> =
            sqlx::query_scalar("SELECT status FROM upload_batches WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.db)
                .await;

        match status {
            Ok(Some(_)) => StoreError::Terminal(id),
            Ok(None) => StoreError::not_found("Upload batch", &id.to_string()),
            Err(e) => StoreError::Sqlx(e),
        }
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    #[tracing::instrument(skip(self, rates), fields(count = rates.len()))]
    async fn save_rates(&self, batch_id: Uuid, rates: &[FetchedRate]) -> StoreResult<()> {
        if rates.is_empty() {
            return Ok(());
        }

        let mut tx = self.db.begin().await?;

        let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO exchange_rates (id, currency, rate, upload_batch_id) ",
        );
        query_builder.push_values(rates, |mut b, rate| {
            b.push_bind(Uuid::new_v4())
                .push_bind(rate.currency.as_str())
                .push_bind(&rate.rate)
                .push_bind(batch_id);
        });
        query_builder.build().execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, batch, products), fields(batch_id = %batch.id(), count = products.len()))]
    async fn save_product_chunk(
        &self,
        batch: &UploadBatch,
        products: &[NewProduct],
    ) -> StoreResult<()> {
        let mut tx = self.db.begin().await?;

        if !products.is_empty() {
            let created_at = Utc::now();
            let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO products (id, name, price, expiration, upload_batch_id, created_at) ",
            );
            query_builder.push_values(products, |mut b, product| {
                b.push_bind(Uuid::new_v4())
                    .push_bind(&product.name)
                    .push_bind(&product.price)
                    .push_bind(product.expiration)
                    .push_bind(batch.id())
                    .push_bind(created_at);
            });
            query_builder.build().execute(&mut *tx).await?;
        }

        let result = sqlx::query(
            "UPDATE upload_batches SET total_rows = $2 \
             WHERE id = $1 AND status NOT IN ('finished', 'failed')",
        )
        .bind(batch.id())
        .bind(batch.total_rows())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // dropping the transaction rolls the chunk back
            tx.rollback().await?;
            return Err(self.rejected_update(batch.id()).await);
        }

        tx.commit().await?;
        Ok(())
    }
}
