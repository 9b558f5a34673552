//! Admin endpoints: instance settings and the product shipping section.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use product_shipping_core::meta_keys::sanitize_text;
use product_shipping_core::{
    MetaValue, MethodInstanceId, MethodKind, ProductId, ProductMetaField, ProductShippingForm,
    ProductShippingMetadata, SaveDecision, SaveTarget, SaveTrigger, SettingField,
    ShippingMethodInstance, SkipReason, evaluate_save, pickup_address_setting_field,
};

use crate::db::ProductMetaRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct PickupAddressUpdate {
    pub pickup_address: String,
}

/// One checkbox of the product shipping section.
#[derive(Debug, Serialize)]
pub struct ProductMethodOption {
    pub instance_id: MethodInstanceId,
    pub title: String,
    pub kind: MethodKind,
    pub checked: bool,
    /// Form field carrying this instance's pickup address (local pickup only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_address: Option<String>,
}

/// Everything the admin needs to render the product shipping section.
#[derive(Debug, Serialize)]
pub struct ProductShippingEdit {
    pub product_id: ProductId,
    pub methods_field: String,
    pub methods: Vec<ProductMethodOption>,
    pub save_token: String,
}

/// An admin save of the product shipping section.
#[derive(Debug, Deserialize)]
pub struct ProductShippingSave {
    #[serde(default)]
    pub autosave: bool,
    #[serde(default = "default_post_type")]
    pub post_type: String,
    #[serde(default)]
    pub save_token: Option<String>,
    #[serde(flatten)]
    pub form: ProductShippingForm,
}

fn default_post_type() -> String {
    SaveTarget::PRODUCT_POST_TYPE.to_owned()
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<SkipReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_methods: Option<Vec<MethodInstanceId>>,
}

// =============================================================================
// Instance Settings
// =============================================================================

/// List every configured shipping method instance.
#[instrument(skip(state))]
pub async fn list_instances(
    State(state): State<AppState>,
) -> Result<Json<Vec<ShippingMethodInstance>>> {
    let instances = state.instances().list().await?;
    Ok(Json(instances.as_ref().clone()))
}

/// Descriptor of the extra settings field on local pickup instances.
pub async fn settings_schema() -> Json<SettingField> {
    Json(pickup_address_setting_field())
}

/// Set the configured pickup address of a local pickup instance.
#[instrument(skip(state, update), fields(instance_id = %instance_id))]
pub async fn set_instance_pickup_address(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
    Json(update): Json<PickupAddressUpdate>,
) -> Result<Json<ShippingMethodInstance>> {
    let instance_id = MethodInstanceId::new(instance_id);
    if instance_id.is_blank() {
        return Err(AppError::BadRequest("instance id is blank".to_string()));
    }

    let address = sanitize_text(&update.pickup_address);
    let instance = state
        .instances()
        .set_pickup_address(&instance_id, &address)
        .await?;

    info!(%instance_id, "updated instance pickup address");
    Ok(Json(instance))
}

// =============================================================================
// Product Shipping Section
// =============================================================================

/// Edit data for a product's shipping section, with a fresh save token.
///
/// A local pickup instance without a per-product address shows the address
/// configured on the instance.
#[instrument(skip(state), fields(product_id = %product_id))]
pub async fn product_edit(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
) -> Result<Json<ProductShippingEdit>> {
    let product_id = ProductId::new(product_id);
    let instances = state.instances().list().await?;
    let metadata = ProductMetaRepository::new(state.pool())
        .load_snapshot(&[product_id])
        .await?;
    let selected = metadata.allowed_method_ids(product_id);

    let methods = instances
        .iter()
        .map(|instance| {
            let instance_id = instance.instance_id().clone();
            let (address_field, pickup_address) = match instance {
                ShippingMethodInstance::LocalPickup { pickup_address, .. } => (
                    Some(ProductMetaField::PickupAddress(instance_id.clone()).form_key()),
                    Some(
                        metadata
                            .pickup_address(product_id, &instance_id)
                            .unwrap_or_else(|| pickup_address.clone()),
                    ),
                ),
                ShippingMethodInstance::Flat { .. } => (None, None),
            };

            ProductMethodOption {
                checked: selected.contains(&instance_id),
                title: instance.title().to_owned(),
                kind: instance.kind(),
                instance_id,
                address_field,
                pickup_address,
            }
        })
        .collect();

    Ok(Json(ProductShippingEdit {
        product_id,
        methods_field: ProductMetaField::AllowedMethods.form_key(),
        methods,
        save_token: state.save_tokens().issue(product_id)?,
    }))
}

/// Save a product's shipping section.
///
/// A save the gate rejects is a no-op answered with `saved: false`.
/// Selected IDs that are not configured instances are dropped.
#[instrument(skip(state, request), fields(product_id = %product_id))]
pub async fn save_product(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
    Json(request): Json<ProductShippingSave>,
) -> Result<Json<SaveResponse>> {
    let product_id = ProductId::new(product_id);

    let trigger = if request.autosave {
        SaveTrigger::Autosave
    } else {
        SaveTrigger::UserSubmission
    };
    let target = SaveTarget::from_post_type(&request.post_type);
    let token = state
        .save_tokens()
        .check(product_id, request.save_token.as_deref());

    if let SaveDecision::Skip(reason) = evaluate_save(trigger, &target, token) {
        info!(%reason, "skipped product shipping save");
        return Ok(Json(SaveResponse {
            saved: false,
            reason: Some(reason),
            allowed_methods: None,
        }));
    }

    let instances = state.instances().list().await?;
    let mut form = request.form;
    form.retain_methods(|id| instances.iter().any(|i| i.instance_id() == id));

    let writes = form.into_writes();
    ProductMetaRepository::new(state.pool())
        .apply_writes(product_id, &writes)
        .await?;

    let allowed_methods = writes
        .into_iter()
        .find_map(|write| match (write.field, write.value) {
            (ProductMetaField::AllowedMethods, MetaValue::MethodList(ids)) => Some(ids),
            _ => None,
        })
        .unwrap_or_default();

    info!(allowed = allowed_methods.len(), "saved product shipping methods");
    Ok(Json(SaveResponse {
        saved: true,
        reason: None,
        allowed_methods: Some(allowed_methods),
    }))
}
