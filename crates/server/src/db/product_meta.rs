//! Per-product shipping metadata repository.

use serde_json::Value as JsonValue;
use sqlx::PgPool;
use tracing::instrument;

use product_shipping_core::{InMemoryMetadata, MetaWrite, ProductId};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct ProductMetaRow {
    product_id: i32,
    meta_key: String,
    meta_value: JsonValue,
}

/// Repository for product metadata operations.
pub struct ProductMetaRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductMetaRepository<'a> {
    /// Create a new product metadata repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load the shipping metadata of a set of products into one snapshot.
    ///
    /// Products without rows are simply absent. Unknown keys and malformed
    /// values are skipped by the snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, product_ids), fields(products = product_ids.len()))]
    pub async fn load_snapshot(
        &self,
        product_ids: &[ProductId],
    ) -> Result<InMemoryMetadata, RepositoryError> {
        let mut metadata = InMemoryMetadata::new();
        if product_ids.is_empty() {
            return Ok(metadata);
        }

        let ids: Vec<i32> = product_ids.iter().map(|id| id.as_i32()).collect();
        let rows = sqlx::query_as::<_, ProductMetaRow>(
            r"
            SELECT product_id, meta_key, meta_value
            FROM psm.product_meta
            WHERE product_id = ANY($1)
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        for row in &rows {
            metadata.apply_row(ProductId::new(row.product_id), &row.meta_key, &row.meta_value);
        }

        tracing::debug!(rows = rows.len(), "loaded product shipping metadata");
        Ok(metadata)
    }

    /// Apply the writes of one admin save, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; nothing is
    /// written in that case.
    #[instrument(skip(self, writes), fields(product_id = %product_id, writes = writes.len()))]
    pub async fn apply_writes(
        &self,
        product_id: ProductId,
        writes: &[MetaWrite],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for write in writes {
            sqlx::query(
                r"
                INSERT INTO psm.product_meta (product_id, meta_key, meta_value)
                VALUES ($1, $2, $3)
                ON CONFLICT (product_id, meta_key)
                DO UPDATE SET meta_value = EXCLUDED.meta_value, updated_at = NOW()
                ",
            )
            .bind(product_id)
            .bind(write.storage_key())
            .bind(write.value.to_json())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
