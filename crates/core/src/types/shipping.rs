//! Shipping method instances, cart lines, and candidate rates.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::{MethodInstanceId, MethodKind, ProductId};

/// A configured shipping method instance.
///
/// The local pickup tag is decided once, in [`ShippingMethodInstance::from_record`],
/// when instance data is loaded. Code downstream matches on the variant instead
/// of inspecting the ID prefix again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShippingMethodInstance {
    /// Any method that delivers to the customer.
    Flat {
        instance_id: MethodInstanceId,
        title: String,
    },
    /// A local pickup point. `pickup_address` may be empty.
    LocalPickup {
        instance_id: MethodInstanceId,
        title: String,
        pickup_address: String,
    },
}

impl ShippingMethodInstance {
    /// Build an instance from stored fields, tagging it by its ID prefix.
    ///
    /// `pickup_address` is ignored for non-pickup instances.
    #[must_use]
    pub fn from_record(
        instance_id: MethodInstanceId,
        title: impl Into<String>,
        pickup_address: Option<String>,
    ) -> Self {
        let title = title.into();
        match instance_id.kind() {
            MethodKind::LocalPickup => Self::LocalPickup {
                instance_id,
                title,
                pickup_address: pickup_address.unwrap_or_default(),
            },
            MethodKind::Flat => Self::Flat { instance_id, title },
        }
    }

    /// The instance ID.
    #[must_use]
    pub const fn instance_id(&self) -> &MethodInstanceId {
        match self {
            Self::Flat { instance_id, .. } | Self::LocalPickup { instance_id, .. } => instance_id,
        }
    }

    /// The admin-facing title.
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Flat { title, .. } | Self::LocalPickup { title, .. } => title,
        }
    }

    /// The configured pickup address, for local pickup instances only.
    #[must_use]
    pub fn pickup_address(&self) -> Option<&str> {
        match self {
            Self::LocalPickup { pickup_address, .. } => Some(pickup_address),
            Self::Flat { .. } => None,
        }
    }

    /// The method family.
    #[must_use]
    pub const fn kind(&self) -> MethodKind {
        match self {
            Self::Flat { .. } => MethodKind::Flat,
            Self::LocalPickup { .. } => MethodKind::LocalPickup,
        }
    }
}

/// A line of the package being priced. Quantity does not affect filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

impl CartLine {
    /// A single unit of a product.
    #[must_use]
    pub const fn new(product_id: ProductId) -> Self {
        Self {
            product_id,
            quantity: 1,
        }
    }
}

const fn default_quantity() -> u32 {
    1
}

/// A line item of a finalized order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub product_id: ProductId,
}

impl From<ProductId> for OrderLineItem {
    fn from(product_id: ProductId) -> Self {
        Self { product_id }
    }
}

/// A shipping rate already computed by the host rate engine.
///
/// The rate is kept exactly as the host sent it and serializes back to the same
/// JSON. Only `rate_key` and `instance_id` are read out of it. Parsing never
/// fails: an entry with no usable `instance_id` gets a blank ID, which never
/// matches a restriction but is still passed back to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRate {
    rate_key: String,
    instance_id: MethodInstanceId,
    raw: Value,
}

impl CandidateRate {
    /// A rate with just a key and instance ID.
    #[must_use]
    pub fn new(rate_key: impl Into<String>, instance_id: impl Into<MethodInstanceId>) -> Self {
        let rate_key = rate_key.into();
        let instance_id = instance_id.into();
        let mut raw = Map::new();
        raw.insert("rate_key".to_owned(), Value::String(rate_key.clone()));
        raw.insert(
            "instance_id".to_owned(),
            Value::String(instance_id.as_str().to_owned()),
        );
        Self {
            rate_key,
            instance_id,
            raw: Value::Object(raw),
        }
    }

    /// Read a rate from the host's JSON.
    ///
    /// Instance IDs may be strings or numbers. Anything else leaves the ID blank.
    #[must_use]
    pub fn from_value(raw: Value) -> Self {
        let field = |name: &str| raw.get(name).and_then(scalar_text).unwrap_or_default();
        Self {
            rate_key: field("rate_key"),
            instance_id: MethodInstanceId::new(field("instance_id")),
            raw,
        }
    }

    /// Key of the rate in the host's rate map.
    #[must_use]
    pub fn rate_key(&self) -> &str {
        &self.rate_key
    }

    /// Instance the rate was computed for.
    #[must_use]
    pub const fn instance_id(&self) -> &MethodInstanceId {
        &self.instance_id
    }

    /// Customer-facing label, if the host sent one.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.raw.get("label").and_then(Value::as_str)
    }

    /// Cost as a decimal, whether the host sent it as a string or a number.
    #[must_use]
    pub fn cost(&self) -> Option<Decimal> {
        let text = self.raw.get("cost").and_then(scalar_text)?;
        text.parse()
            .ok()
            .or_else(|| Decimal::from_scientific(&text).ok())
    }

    /// The rate as the host sent it.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.raw
    }

    /// Use `key` as the rate key when the rate does not carry one.
    pub fn fill_rate_key(&mut self, key: impl Into<String>) {
        if !self.rate_key.is_empty() {
            return;
        }
        let key = key.into();
        if let Value::Object(map) = &mut self.raw {
            map.insert("rate_key".to_owned(), Value::String(key.clone()));
        }
        self.rate_key = key;
    }

    /// Set the customer-facing label.
    #[must_use]
    pub fn with_label(self, label: impl Into<String>) -> Self {
        self.with_field("label", Value::String(label.into()))
    }

    /// Set the cost.
    #[must_use]
    pub fn with_cost(self, cost: Decimal) -> Self {
        self.with_field("cost", Value::String(cost.to_string()))
    }

    fn with_field(mut self, name: &str, value: Value) -> Self {
        if let Value::Object(map) = &mut self.raw {
            map.insert(name.to_owned(), value);
        }
        self
    }
}

impl Serialize for CandidateRate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CandidateRate {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_record_tags_local_pickup() {
        let instance = ShippingMethodInstance::from_record(
            MethodInstanceId::new("local_pickup:4"),
            "Warehouse pickup",
            Some("12 Dock Rd".to_string()),
        );
        assert_eq!(instance.kind(), MethodKind::LocalPickup);
        assert_eq!(instance.pickup_address(), Some("12 Dock Rd"));
        assert_eq!(instance.title(), "Warehouse pickup");
    }

    #[test]
    fn test_from_record_drops_address_for_flat() {
        let instance = ShippingMethodInstance::from_record(
            MethodInstanceId::new("flat_rate:1"),
            "Courier",
            Some("ignored".to_string()),
        );
        assert_eq!(
            instance,
            ShippingMethodInstance::Flat {
                instance_id: MethodInstanceId::new("flat_rate:1"),
                title: "Courier".to_string(),
            }
        );
        assert_eq!(instance.pickup_address(), None);
    }

    #[test]
    fn test_from_record_missing_address_is_empty() {
        let instance = ShippingMethodInstance::from_record(
            MethodInstanceId::new("local_pickup:9"),
            "Shop counter",
            None,
        );
        assert_eq!(instance.pickup_address(), Some(""));
    }

    #[test]
    fn test_instance_serializes_with_kind_tag() {
        let instance = ShippingMethodInstance::from_record(
            MethodInstanceId::new("local_pickup:1"),
            "Pickup",
            Some("123 Main St".to_string()),
        );
        let json = serde_json::to_value(&instance).unwrap();
        assert_eq!(json["kind"], "local_pickup");
        assert_eq!(json["pickup_address"], "123 Main St");
    }

    #[test]
    fn test_cart_line_quantity_defaults_to_one() {
        let line: CartLine = serde_json::from_str(r#"{"product_id": 7}"#).unwrap();
        assert_eq!(line, CartLine::new(ProductId::new(7)));
    }

    #[test]
    fn test_candidate_rate_keeps_host_json() {
        let json = serde_json::json!({
            "rate_key": "flat_rate:3",
            "instance_id": "flat_rate:3",
            "cost": "12.50",
            "taxes": {"1": "1.25"}
        });
        let rate: CandidateRate = serde_json::from_value(json.clone()).unwrap();

        assert_eq!(rate.cost(), Some(Decimal::new(1250, 2)));
        assert_eq!(serde_json::to_value(&rate).unwrap(), json);
    }

    #[test]
    fn test_candidate_rate_numeric_fields() {
        let json = serde_json::json!({"rate_key": "flat_rate:2", "instance_id": 2, "cost": 12.5});
        let rate: CandidateRate = serde_json::from_value(json.clone()).unwrap();

        assert_eq!(rate.instance_id().as_str(), "2");
        assert_eq!(rate.cost(), Some(Decimal::new(125, 1)));
        assert_eq!(serde_json::to_value(&rate).unwrap(), json);
    }

    #[test]
    fn test_candidate_rate_without_instance_id_is_blank() {
        let rate: CandidateRate = serde_json::from_str(r#"{"rate_key": "weird"}"#).unwrap();
        assert!(rate.instance_id().is_blank());
    }

    #[test]
    fn test_candidate_rate_from_non_object_passes_through() {
        let rate: CandidateRate = serde_json::from_str(r#""garbage""#).unwrap();

        assert!(rate.instance_id().is_blank());
        assert_eq!(rate.rate_key(), "");
        assert_eq!(serde_json::to_value(&rate).unwrap(), "garbage");
    }

    #[test]
    fn test_fill_rate_key_only_when_missing() {
        let mut keyed = CandidateRate::from_value(serde_json::json!({"instance_id": "local_pickup:2"}));
        keyed.fill_rate_key("local_pickup:2");
        assert_eq!(keyed.rate_key(), "local_pickup:2");
        assert_eq!(keyed.as_value()["rate_key"], "local_pickup:2");

        let mut own = CandidateRate::new("a", "flat_rate:1");
        own.fill_rate_key("b");
        assert_eq!(own.rate_key(), "a");
    }
}
