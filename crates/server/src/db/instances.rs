//! Shipping method instance repository.
//!
//! Instances are synced from the host store. This service only edits the
//! pickup address of local pickup instances.

use sqlx::PgPool;
use tracing::instrument;

use product_shipping_core::{MethodInstanceId, ShippingMethodInstance};

use super::RepositoryError;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct InstanceRow {
    instance_id: String,
    title: String,
    pickup_address: String,
}

impl TryFrom<InstanceRow> for ShippingMethodInstance {
    type Error = RepositoryError;

    fn try_from(row: InstanceRow) -> Result<Self, Self::Error> {
        let instance_id = MethodInstanceId::new(row.instance_id);
        if instance_id.is_blank() {
            return Err(RepositoryError::DataCorruption(
                "blank shipping method instance id".to_string(),
            ));
        }

        Ok(Self::from_record(
            instance_id,
            row.title,
            Some(row.pickup_address),
        ))
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for shipping method instance operations.
pub struct InstanceRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> InstanceRepository<'a> {
    /// Create a new instance repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List every configured instance, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored ID is blank.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<ShippingMethodInstance>, RepositoryError> {
        let rows = sqlx::query_as::<_, InstanceRow>(
            r"
            SELECT instance_id, title, pickup_address
            FROM psm.shipping_method_instance
            ORDER BY instance_id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Set the configured pickup address of an instance.
    ///
    /// The caller is responsible for only doing this on local pickup instances.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no instance has this ID.
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, address), fields(instance_id = %instance_id))]
    pub async fn set_pickup_address(
        &self,
        instance_id: &MethodInstanceId,
        address: &str,
    ) -> Result<ShippingMethodInstance, RepositoryError> {
        let row = sqlx::query_as::<_, InstanceRow>(
            r"
            UPDATE psm.shipping_method_instance
            SET pickup_address = $2, updated_at = NOW()
            WHERE instance_id = $1
            RETURNING instance_id, title, pickup_address
            ",
        )
        .bind(instance_id)
        .bind(address)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }
}
