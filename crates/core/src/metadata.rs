//! Product shipping metadata lookups.
//!
//! The selector and resolver never reach into storage themselves. They are
//! handed a [`ProductShippingMetadata`] implementation, usually an
//! [`InMemoryMetadata`] snapshot loaded for the products of one request.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::meta_keys::{MetaValue, ProductMetaField};
use crate::types::{MethodInstanceId, ProductId};

/// Read access to per-product shipping configuration.
///
/// Missing data is never an error: an unknown product has no allowed methods
/// and no pickup addresses.
pub trait ProductShippingMetadata {
    /// Method instance IDs the product is restricted to, in configured order.
    ///
    /// An empty list means the product does not restrict shipping.
    fn allowed_method_ids(&self, product_id: ProductId) -> Vec<MethodInstanceId>;

    /// Pickup address stored on the product for a local pickup instance.
    fn pickup_address(&self, product_id: ProductId, instance_id: &MethodInstanceId)
    -> Option<String>;
}

impl<T: ProductShippingMetadata + ?Sized> ProductShippingMetadata for &T {
    fn allowed_method_ids(&self, product_id: ProductId) -> Vec<MethodInstanceId> {
        (**self).allowed_method_ids(product_id)
    }

    fn pickup_address(
        &self,
        product_id: ProductId,
        instance_id: &MethodInstanceId,
    ) -> Option<String> {
        (**self).pickup_address(product_id, instance_id)
    }
}

/// Shipping configuration of a single product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductShippingConfig {
    #[serde(default)]
    pub allowed_methods: Vec<MethodInstanceId>,
    #[serde(default)]
    pub pickup_addresses: HashMap<MethodInstanceId, String>,
}

/// An in-memory metadata snapshot keyed by product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InMemoryMetadata {
    products: HashMap<ProductId, ProductShippingConfig>,
}

impl InMemoryMetadata {
    /// Create an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`Self::set_allowed_methods`].
    #[must_use]
    pub fn with_allowed_methods<I, S>(mut self, product_id: ProductId, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<MethodInstanceId>,
    {
        self.set_allowed_methods(product_id, ids);
        self
    }

    /// Builder-style variant of [`Self::set_pickup_address`].
    #[must_use]
    pub fn with_pickup_address(
        mut self,
        product_id: ProductId,
        instance_id: impl Into<MethodInstanceId>,
        address: impl Into<String>,
    ) -> Self {
        self.set_pickup_address(product_id, instance_id, address);
        self
    }

    /// Replace the allowed method list of a product.
    pub fn set_allowed_methods<I, S>(&mut self, product_id: ProductId, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<MethodInstanceId>,
    {
        self.products.entry(product_id).or_default().allowed_methods =
            ids.into_iter().map(Into::into).collect();
    }

    /// Store the pickup address of a product for one instance.
    pub fn set_pickup_address(
        &mut self,
        product_id: ProductId,
        instance_id: impl Into<MethodInstanceId>,
        address: impl Into<String>,
    ) {
        self.products
            .entry(product_id)
            .or_default()
            .pickup_addresses
            .insert(instance_id.into(), address.into());
    }

    /// Apply one stored metadata row.
    ///
    /// Unknown keys and values of the wrong shape are skipped, so a corrupt row
    /// degrades to "no restriction" instead of failing the request.
    pub fn apply_row(&mut self, product_id: ProductId, meta_key: &str, meta_value: &Value) {
        let Some(field) = ProductMetaField::from_storage_key(meta_key) else {
            debug!(%product_id, meta_key, "ignoring unknown product meta key");
            return;
        };

        match (field, MetaValue::from_json(meta_value)) {
            (ProductMetaField::AllowedMethods, Some(MetaValue::MethodList(ids))) => {
                self.set_allowed_methods(product_id, ids);
            }
            (ProductMetaField::PickupAddress(instance_id), Some(MetaValue::Text(address))) => {
                self.set_pickup_address(product_id, instance_id, address);
            }
            (field, _) => {
                debug!(%product_id, ?field, "ignoring malformed product meta value");
            }
        }
    }

    /// The configuration of one product, if any was loaded.
    #[must_use]
    pub fn product(&self, product_id: ProductId) -> Option<&ProductShippingConfig> {
        self.products.get(&product_id)
    }

    /// Number of products with configuration.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Returns `true` if no product has configuration.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl FromIterator<(ProductId, ProductShippingConfig)> for InMemoryMetadata {
    fn from_iter<I: IntoIterator<Item = (ProductId, ProductShippingConfig)>>(iter: I) -> Self {
        Self {
            products: iter.into_iter().collect(),
        }
    }
}

impl ProductShippingMetadata for InMemoryMetadata {
    fn allowed_method_ids(&self, product_id: ProductId) -> Vec<MethodInstanceId> {
        self.products
            .get(&product_id)
            .map(|config| config.allowed_methods.clone())
            .unwrap_or_default()
    }

    fn pickup_address(
        &self,
        product_id: ProductId,
        instance_id: &MethodInstanceId,
    ) -> Option<String> {
        self.products
            .get(&product_id)
            .and_then(|config| config.pickup_addresses.get(instance_id))
            .cloned()
    }
}
