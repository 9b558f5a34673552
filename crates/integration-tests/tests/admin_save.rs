//! Integration tests for the admin save flow.
//!
//! Covers the save gate with real save tokens, the writes a form submission
//! produces, and reading those writes back the way the hooks do.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::collections::HashMap;

use secrecy::SecretString;
use serde_json::json;

use product_shipping_core::{
    InMemoryMetadata, MetaValue, MethodInstanceId, OrderLineItem, ProductId, ProductMetaField,
    ProductShippingForm, ProductShippingMetadata, SaveDecision, SaveTarget, SaveTrigger,
    SkipReason, TokenCheck, evaluate_save, resolve_pickup_addresses,
};
use product_shipping_integration_tests::test_config;
use product_shipping_server::services::SaveTokenSigner;

fn signer() -> SaveTokenSigner {
    let config = test_config();
    SaveTokenSigner::new(config.save_token_secret, config.save_token_ttl)
}

fn form(methods: &[&str], fields: &[(&str, &str)]) -> ProductShippingForm {
    ProductShippingForm {
        shipping_methods: methods.iter().map(|id| MethodInstanceId::new(*id)).collect(),
        fields: fields
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect::<HashMap<_, _>>(),
    }
}

/// Apply writes the way the database stores and reloads them.
fn store(product_id: ProductId, form: ProductShippingForm) -> InMemoryMetadata {
    let mut metadata = InMemoryMetadata::new();
    for write in form.into_writes() {
        metadata.apply_row(product_id, &write.storage_key(), &write.value.to_json());
    }
    metadata
}

// =============================================================================
// Save Gate
// =============================================================================

#[test]
fn test_issued_token_allows_save() {
    let signer = signer();
    let product = ProductId::new(7);
    let token = signer.issue(product).unwrap();

    let check = signer.check(product, Some(&token));
    assert_eq!(check, TokenCheck::Valid);

    let decision = evaluate_save(SaveTrigger::UserSubmission, &SaveTarget::Product, check);
    assert_eq!(decision, SaveDecision::Proceed);
}

#[test]
fn test_token_for_another_product_is_rejected() {
    let signer = signer();
    let token = signer.issue(ProductId::new(7)).unwrap();

    let check = signer.check(ProductId::new(8), Some(&token));
    let decision = evaluate_save(SaveTrigger::UserSubmission, &SaveTarget::Product, check);

    assert_eq!(decision, SaveDecision::Skip(SkipReason::InvalidToken));
}

#[test]
fn test_token_from_another_key_is_rejected() {
    let other = SaveTokenSigner::new(
        SecretString::from("Zr8!pQ2@xW5#mN9$kL3%vB7^cT1&hY4*"),
        test_config().save_token_ttl,
    );
    let token = other.issue(ProductId::new(7)).unwrap();

    assert_eq!(
        signer().check(ProductId::new(7), Some(&token)),
        TokenCheck::Invalid
    );
}

#[test]
fn test_autosave_skips_even_with_valid_token() {
    let signer = signer();
    let product = ProductId::new(7);
    let token = signer.issue(product).unwrap();

    let decision = evaluate_save(
        SaveTrigger::Autosave,
        &SaveTarget::Product,
        signer.check(product, Some(&token)),
    );

    assert_eq!(decision, SaveDecision::Skip(SkipReason::Autosave));
}

#[test]
fn test_other_post_types_are_not_saved() {
    let signer = signer();
    let product = ProductId::new(7);
    let token = signer.issue(product).unwrap();

    let decision = evaluate_save(
        SaveTrigger::UserSubmission,
        &SaveTarget::from_post_type("page"),
        signer.check(product, Some(&token)),
    );

    assert_eq!(decision, SaveDecision::Skip(SkipReason::NotAProduct));
}

#[test]
fn test_missing_token_is_skipped() {
    let check = signer().check(ProductId::new(7), None);
    let decision = evaluate_save(SaveTrigger::UserSubmission, &SaveTarget::Product, check);

    assert_eq!(decision, SaveDecision::Skip(SkipReason::MissingToken));
}

// =============================================================================
// Form Writes
// =============================================================================

#[test]
fn test_saved_form_drives_rules() {
    let product = ProductId::new(12);
    let metadata = store(
        product,
        form(
            &["flat_rate:2", "local_pickup:4"],
            &[("_psm_local_pickup_address_local_pickup:4", " 7 <em>Warehouse</em> Rd ")],
        ),
    );

    assert_eq!(
        metadata.allowed_method_ids(product),
        vec![
            MethodInstanceId::new("flat_rate:2"),
            MethodInstanceId::new("local_pickup:4"),
        ]
    );

    let addresses = resolve_pickup_addresses(&[OrderLineItem::from(product)], &metadata);
    assert_eq!(addresses, vec!["7 Warehouse Rd"]);
}

#[test]
fn test_address_with_less_than_is_stored_whole() {
    let product = ProductId::new(12);
    let metadata = store(
        product,
        form(
            &["local_pickup:4"],
            &[("_psm_local_pickup_address_local_pickup:4", "Unit 3 < 5 Main Rd, Cape Town")],
        ),
    );

    let addresses = resolve_pickup_addresses(&[OrderLineItem::from(product)], &metadata);
    assert_eq!(addresses, vec!["Unit 3 < 5 Main Rd, Cape Town"]);
}

#[test]
fn test_address_of_unselected_instance_is_not_written() {
    let writes = form(
        &["flat_rate:2"],
        &[("_psm_local_pickup_address_local_pickup:4", "7 Warehouse Rd")],
    )
    .into_writes();

    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].field, ProductMetaField::AllowedMethods);
}

#[test]
fn test_clearing_the_selection_lifts_the_restriction() {
    let product = ProductId::new(12);
    let metadata = store(product, form(&[], &[]));

    assert!(metadata.allowed_method_ids(product).is_empty());
}

#[test]
fn test_writes_use_stored_meta_keys() {
    let writes = form(&["local_pickup:1"], &[]).into_writes();
    let keys: Vec<String> = writes.iter().map(|w| w.storage_key()).collect();

    assert_eq!(
        keys,
        vec![
            "_psm_shipping_methods".to_string(),
            "_psm_local_pickup_address_local_pickup:1".to_string(),
        ]
    );
    assert_eq!(writes[0].value.to_json(), json!(["local_pickup:1"]));
    assert_eq!(writes[1].value, MetaValue::Text(String::new()));
}

#[test]
fn test_form_deserializes_from_admin_post() {
    let form: ProductShippingForm = serde_json::from_value(json!({
        "shipping_methods": ["local_pickup:1"],
        "fields": {"_psm_local_pickup_address_local_pickup:1": "Depot"}
    }))
    .unwrap();

    let metadata = store(ProductId::new(3), form);
    assert_eq!(
        metadata.pickup_address(ProductId::new(3), &MethodInstanceId::new("local_pickup:1")),
        Some("Depot".to_string())
    );
}
