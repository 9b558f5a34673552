//! Cached list of configured shipping method instances.
//!
//! The list is read on every admin edit and save and changes rarely, so it is
//! cached with `moka` and invalidated whenever an instance is written.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, instrument};

use product_shipping_core::{MethodInstanceId, ShippingMethodInstance};

use crate::db::{InstanceRepository, RepositoryError};

const CACHE_KEY: &str = "instances";

/// Errors from catalog writes.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("shipping method instance not found: {0}")]
    NotFound(MethodInstanceId),

    #[error("shipping method instance {0} is not a local pickup method")]
    NotLocalPickup(MethodInstanceId),
}

/// Shipping method instances, cached.
#[derive(Clone)]
pub struct InstanceCatalog {
    pool: PgPool,
    cache: Cache<&'static str, Arc<Vec<ShippingMethodInstance>>>,
}

impl InstanceCatalog {
    /// Create a catalog whose cached list lives for `ttl`.
    #[must_use]
    pub fn new(pool: PgPool, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();
        Self { pool, cache }
    }

    /// Every configured instance, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the instances cannot be loaded.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Arc<Vec<ShippingMethodInstance>>, RepositoryError> {
        if let Some(instances) = self.cache.get(CACHE_KEY).await {
            debug!("Cache hit for shipping method instances");
            return Ok(instances);
        }

        let instances = Arc::new(InstanceRepository::new(&self.pool).list_all().await?);
        self.cache.insert(CACHE_KEY, Arc::clone(&instances)).await;

        Ok(instances)
    }

    /// Set the configured pickup address of a local pickup instance.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for unknown instances,
    /// `CatalogError::NotLocalPickup` for any other kind of instance, and
    /// `CatalogError::Repository` if the write fails.
    #[instrument(skip(self, address), fields(instance_id = %instance_id))]
    pub async fn set_pickup_address(
        &self,
        instance_id: &MethodInstanceId,
        address: &str,
    ) -> Result<ShippingMethodInstance, CatalogError> {
        if !instance_id.is_local_pickup() {
            return Err(CatalogError::NotLocalPickup(instance_id.clone()));
        }

        let updated = InstanceRepository::new(&self.pool)
            .set_pickup_address(instance_id, address)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CatalogError::NotFound(instance_id.clone()),
                other => CatalogError::Repository(other),
            })?;

        self.invalidate().await;
        Ok(updated)
    }

    /// Drop the cached list.
    pub async fn invalidate(&self) {
        self.cache.invalidate(CACHE_KEY).await;
    }
}
