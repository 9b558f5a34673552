//! Hooks called by the host store during checkout and order emails.
//!
//! Neither hook may block a purchase: when product metadata cannot be loaded
//! the rate hook returns the candidate rates unfiltered and the email hook
//! returns no addresses. The failure is still reported to Sentry.

use std::collections::BTreeSet;

use axum::{Json, extract::State};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use product_shipping_core::{
    CandidateRate, CartLine, EmailFormat, EmailKind, InMemoryMetadata, OrderLineItem, ProductId,
    RateFilterOutcome, evaluate_rates, pickup_block_for_email, resolve_pickup_addresses,
};

use crate::db::{ProductMetaRepository, RepositoryError};
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// A package the host is about to show shipping rates for.
#[derive(Debug, Deserialize)]
pub struct PackageRatesRequest {
    #[serde(default, deserialize_with = "lenient_list")]
    pub contents: Vec<CartLine>,
    #[serde(default, deserialize_with = "candidate_rates")]
    pub rates: Vec<CandidateRate>,
}

#[derive(Debug, Serialize)]
pub struct PackageRatesResponse {
    pub rates: Vec<CandidateRate>,
    /// `None` when metadata could not be loaded and rates were passed through.
    pub outcome: Option<RateFilterOutcome>,
}

/// An order email about to be rendered.
#[derive(Debug, Deserialize)]
pub struct OrderEmailRequest {
    pub email_id: EmailKind,
    #[serde(default)]
    pub plain_text: bool,
    #[serde(default, deserialize_with = "lenient_list")]
    pub line_items: Vec<OrderLineItem>,
}

#[derive(Debug, Serialize)]
pub struct OrderEmailResponse {
    pub addresses: Vec<String>,
    pub block: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Filter the candidate rates of a package by its products' allowed methods.
#[instrument(skip(state, request), fields(lines = request.contents.len(), rates = request.rates.len()))]
pub async fn package_rates(
    State(state): State<AppState>,
    Json(request): Json<PackageRatesRequest>,
) -> Json<PackageRatesResponse> {
    let product_ids = distinct_products(request.contents.iter().map(|line| line.product_id));

    let metadata = match load_metadata(&state, &product_ids).await {
        Ok(metadata) => metadata,
        Err(e) => {
            report_degraded(&e, "package rates left unfiltered");
            return Json(PackageRatesResponse {
                rates: request.rates,
                outcome: None,
            });
        }
    };

    let selection = evaluate_rates(&request.contents, request.rates, &metadata);
    Json(PackageRatesResponse {
        rates: selection.rates,
        outcome: Some(selection.outcome),
    })
}

/// Resolve pickup addresses for an order email and render the block.
#[instrument(skip(state, request), fields(email_id = %request.email_id, items = request.line_items.len()))]
pub async fn order_email(
    State(state): State<AppState>,
    Json(request): Json<OrderEmailRequest>,
) -> Json<OrderEmailResponse> {
    let empty = OrderEmailResponse {
        addresses: Vec::new(),
        block: None,
    };

    if !request.email_id.shows_pickup_addresses() {
        debug!("email does not show pickup addresses");
        return Json(empty);
    }

    let product_ids = distinct_products(request.line_items.iter().map(|item| item.product_id));
    let metadata = match load_metadata(&state, &product_ids).await {
        Ok(metadata) => metadata,
        Err(e) => {
            report_degraded(&e, "order email rendered without pickup addresses");
            return Json(empty);
        }
    };

    let addresses = resolve_pickup_addresses(&request.line_items, &metadata);
    let format = EmailFormat::from_plain_text(request.plain_text);
    let block = pickup_block_for_email(&request.email_id, format, addresses.clone())
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to render pickup address block");
            None
        });

    Json(OrderEmailResponse { addresses, block })
}

// =============================================================================
// Helpers
// =============================================================================

async fn load_metadata(
    state: &AppState,
    product_ids: &[ProductId],
) -> Result<InMemoryMetadata, RepositoryError> {
    if product_ids.is_empty() {
        return Ok(InMemoryMetadata::new());
    }
    ProductMetaRepository::new(state.pool())
        .load_snapshot(product_ids)
        .await
}

fn report_degraded(error: &RepositoryError, message: &str) {
    let event_id = sentry::capture_error(error);
    tracing::error!(error = %error, sentry_event_id = %event_id, "{message}");
}

fn distinct_products(ids: impl Iterator<Item = ProductId>) -> Vec<ProductId> {
    ids.collect::<BTreeSet<_>>().into_iter().collect()
}

/// Entries of a JSON array, or the values of a JSON object keyed by the host's
/// own item keys.
fn entries(value: Value) -> Vec<(Option<String>, Value)> {
    match value {
        Value::Array(items) => items.into_iter().map(|item| (None, item)).collect(),
        Value::Object(map) => map.into_iter().map(|(k, v)| (Some(k), v)).collect(),
        _ => Vec::new(),
    }
}

/// Deserialize a list, skipping entries that do not parse.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let items = entries(value);
    let total = items.len();

    let parsed: Vec<T> = items
        .into_iter()
        .filter_map(|(_, item)| serde_json::from_value(item).ok())
        .collect();

    if parsed.len() < total {
        debug!(skipped = total - parsed.len(), "skipped malformed entries");
    }
    Ok(parsed)
}

/// Deserialize candidate rates. Every entry is kept, so rates the filter cannot
/// read still reach the host. Rates keyed by rate key take the key when they
/// do not carry one themselves.
fn candidate_rates<'de, D>(deserializer: D) -> Result<Vec<CandidateRate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;

    Ok(entries(value)
        .into_iter()
        .map(|(key, item)| {
            let mut rate = CandidateRate::from_value(item);
            if let Some(key) = key {
                rate.fill_rate_key(key);
            }
            if rate.instance_id().is_blank() {
                debug!(rate_key = rate.rate_key(), "rate without instance id");
            }
            rate
        })
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_package_request_skips_malformed_lines() {
        let request: PackageRatesRequest = serde_json::from_value(json!({
            "contents": [
                {"product_id": 1, "quantity": 2},
                {"quantity": 1},
                "garbage",
                {"product_id": 3}
            ],
            "rates": [{"rate_key": "flat_rate:1", "instance_id": "flat_rate:1"}]
        }))
        .unwrap();

        let ids: Vec<i32> = request
            .contents
            .iter()
            .map(|line| line.product_id.as_i32())
            .collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(request.rates.len(), 1);
    }

    #[test]
    fn test_package_request_accepts_keyed_maps() {
        let request: PackageRatesRequest = serde_json::from_value(json!({
            "contents": {"a1b2": {"product_id": 5}},
            "rates": {
                "local_pickup:2": {"instance_id": "local_pickup:2", "label": "Pickup"}
            }
        }))
        .unwrap();

        assert_eq!(request.contents.len(), 1);
        assert_eq!(request.rates[0].rate_key(), "local_pickup:2");
        assert_eq!(request.rates[0].label(), Some("Pickup"));
    }

    #[test]
    fn test_package_request_keeps_unreadable_rates() {
        let request: PackageRatesRequest = serde_json::from_value(json!({
            "rates": [
                {"rate_key": "flat_rate:1", "instance_id": "flat_rate:1", "cost": 12.5},
                {"rate_key": "flat_rate:2", "instance_id": 2},
                {"rate_key": "odd", "instance_id": {"nested": true}},
                "garbage"
            ]
        }))
        .unwrap();

        assert_eq!(request.rates.len(), 4);
        assert_eq!(request.rates[1].instance_id().as_str(), "2");
        assert!(request.rates[2].instance_id().is_blank());
        assert!(request.rates[3].instance_id().is_blank());
    }

    #[test]
    fn test_order_email_request_defaults() {
        let request: OrderEmailRequest = serde_json::from_value(json!({
            "email_id": "customer_completed_order"
        }))
        .unwrap();

        assert_eq!(request.email_id, EmailKind::CustomerCompletedOrder);
        assert!(!request.plain_text);
        assert!(request.line_items.is_empty());
    }

    #[test]
    fn test_distinct_products() {
        let ids = distinct_products([3, 1, 3, 2].into_iter().map(ProductId::new));
        assert_eq!(
            ids,
            vec![ProductId::new(1), ProductId::new(2), ProductId::new(3)]
        );
    }
}
