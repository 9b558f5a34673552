//! Pickup addresses for an order.

use tracing::debug;

use crate::metadata::ProductShippingMetadata;
use crate::types::OrderLineItem;

/// Resolve the distinct pickup addresses of an order's products.
///
/// Only local pickup instances on a product's allowed method list contribute.
/// Addresses keep first-seen order; empty addresses and exact duplicates are
/// dropped.
#[must_use]
pub fn resolve_pickup_addresses<M>(line_items: &[OrderLineItem], metadata: &M) -> Vec<String>
where
    M: ProductShippingMetadata + ?Sized,
{
    let mut addresses: Vec<String> = Vec::new();

    for item in line_items {
        for instance_id in metadata.allowed_method_ids(item.product_id) {
            if !instance_id.is_local_pickup() {
                continue;
            }

            let Some(address) = metadata.pickup_address(item.product_id, &instance_id) else {
                debug!(product_id = %item.product_id, %instance_id, "no pickup address stored");
                continue;
            };

            if address.is_empty() || addresses.contains(&address) {
                continue;
            }
            addresses.push(address);
        }
    }

    addresses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::InMemoryMetadata;
    use crate::types::ProductId;

    fn items(ids: &[i32]) -> Vec<OrderLineItem> {
        ids.iter().map(|id| ProductId::new(*id).into()).collect()
    }

    #[test]
    fn test_shared_instance_yields_one_address() {
        let metadata = InMemoryMetadata::new()
            .with_allowed_methods(ProductId::new(1), ["local_pickup:1"])
            .with_pickup_address(ProductId::new(1), "local_pickup:1", "123 Main St")
            .with_allowed_methods(ProductId::new(2), ["local_pickup:1"])
            .with_pickup_address(ProductId::new(2), "local_pickup:1", "123 Main St");

        assert_eq!(
            resolve_pickup_addresses(&items(&[1, 2]), &metadata),
            vec!["123 Main St"]
        );
    }

    #[test]
    fn test_first_seen_order() {
        let metadata = InMemoryMetadata::new()
            .with_allowed_methods(ProductId::new(1), ["local_pickup:2", "local_pickup:1"])
            .with_pickup_address(ProductId::new(1), "local_pickup:1", "North Depot")
            .with_pickup_address(ProductId::new(1), "local_pickup:2", "South Depot")
            .with_allowed_methods(ProductId::new(2), ["local_pickup:3"])
            .with_pickup_address(ProductId::new(2), "local_pickup:3", "Harbour Shed");

        assert_eq!(
            resolve_pickup_addresses(&items(&[2, 1]), &metadata),
            vec!["Harbour Shed", "South Depot", "North Depot"]
        );
    }

    #[test]
    fn test_flat_instance_address_is_ignored() {
        let metadata = InMemoryMetadata::new()
            .with_allowed_methods(ProductId::new(1), ["flat_rate:1"])
            .with_pickup_address(ProductId::new(1), "flat_rate:1", "Should not appear");

        assert!(resolve_pickup_addresses(&items(&[1]), &metadata).is_empty());
    }

    #[test]
    fn test_address_of_unselected_instance_is_ignored() {
        let metadata = InMemoryMetadata::new()
            .with_allowed_methods(ProductId::new(1), ["flat_rate:1"])
            .with_pickup_address(ProductId::new(1), "local_pickup:1", "Stale address");

        assert!(resolve_pickup_addresses(&items(&[1]), &metadata).is_empty());
    }

    #[test]
    fn test_missing_and_empty_addresses_are_skipped() {
        let metadata = InMemoryMetadata::new()
            .with_allowed_methods(ProductId::new(1), ["local_pickup:1", "local_pickup:2"])
            .with_pickup_address(ProductId::new(1), "local_pickup:2", "");

        assert!(resolve_pickup_addresses(&items(&[1, 99]), &metadata).is_empty());
    }

    #[test]
    fn test_no_line_items() {
        let metadata = InMemoryMetadata::new();
        assert!(resolve_pickup_addresses(&[], &metadata).is_empty());
    }
}
