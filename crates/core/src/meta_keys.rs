//! Mapping between admin form fields and stored product metadata.
//!
//! Every metadata key this crate reads or writes is built and parsed through
//! [`META_FIELDS`]. Per-instance fields append the instance ID to a fixed
//! prefix; a fixed key must never start with a per-instance prefix, which the
//! tests below check.
//!
//! | Field | Storage key | Form field |
//! |-------|-------------|------------|
//! | allowed methods | `_psm_shipping_methods` | `_psm_shipping_methods[]` |
//! | pickup address | `_psm_local_pickup_address_<instance>` | `_psm_local_pickup_address_<instance>` |

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::MethodInstanceId;

/// Which metadata field a table row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaFieldKind {
    AllowedMethods,
    PickupAddress,
}

/// One row of the mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaFieldSpec {
    pub kind: MetaFieldKind,
    /// Full key, or key prefix when `per_instance` is set.
    pub storage_key: &'static str,
    /// Full form field name, or prefix when `per_instance` is set.
    pub form_key: &'static str,
    /// Whether the instance ID is appended to the keys.
    pub per_instance: bool,
}

const ALLOWED_METHODS: MetaFieldSpec = MetaFieldSpec {
    kind: MetaFieldKind::AllowedMethods,
    storage_key: "_psm_shipping_methods",
    form_key: "_psm_shipping_methods[]",
    per_instance: false,
};

const PICKUP_ADDRESS: MetaFieldSpec = MetaFieldSpec {
    kind: MetaFieldKind::PickupAddress,
    storage_key: "_psm_local_pickup_address_",
    form_key: "_psm_local_pickup_address_",
    per_instance: true,
};

/// All product metadata fields.
pub const META_FIELDS: &[MetaFieldSpec] = &[ALLOWED_METHODS, PICKUP_ADDRESS];

impl MetaFieldKind {
    /// The table row for this field.
    #[must_use]
    pub const fn spec(self) -> &'static MetaFieldSpec {
        match self {
            Self::AllowedMethods => &ALLOWED_METHODS,
            Self::PickupAddress => &PICKUP_ADDRESS,
        }
    }
}

/// A concrete product metadata field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProductMetaField {
    /// The method instances the product is restricted to.
    AllowedMethods,
    /// The product's pickup address for one local pickup instance.
    PickupAddress(MethodInstanceId),
}

impl ProductMetaField {
    /// The table row for this field.
    #[must_use]
    pub const fn kind(&self) -> MetaFieldKind {
        match self {
            Self::AllowedMethods => MetaFieldKind::AllowedMethods,
            Self::PickupAddress(_) => MetaFieldKind::PickupAddress,
        }
    }

    /// Key under which the value is stored.
    #[must_use]
    pub fn storage_key(&self) -> String {
        self.build_key(self.kind().spec().storage_key)
    }

    /// Name of the admin form field carrying the value.
    #[must_use]
    pub fn form_key(&self) -> String {
        self.build_key(self.kind().spec().form_key)
    }

    /// Parse a storage key. Returns `None` for keys this crate does not own.
    #[must_use]
    pub fn from_storage_key(key: &str) -> Option<Self> {
        Self::parse_key(key, |spec| spec.storage_key)
    }

    /// Parse a form field name. Returns `None` for unrelated fields.
    #[must_use]
    pub fn from_form_key(key: &str) -> Option<Self> {
        Self::parse_key(key, |spec| spec.form_key)
    }

    fn build_key(&self, base: &str) -> String {
        match self {
            Self::AllowedMethods => base.to_owned(),
            Self::PickupAddress(instance_id) => format!("{base}{instance_id}"),
        }
    }

    fn parse_key(key: &str, base: impl Fn(&MetaFieldSpec) -> &'static str) -> Option<Self> {
        META_FIELDS.iter().find_map(|spec| {
            let key_base = base(spec);
            if spec.per_instance {
                let instance_id = MethodInstanceId::new(key.strip_prefix(key_base)?);
                Self::with_instance(spec.kind, instance_id)
            } else if key == key_base {
                Self::fixed(spec.kind)
            } else {
                None
            }
        })
    }

    const fn fixed(kind: MetaFieldKind) -> Option<Self> {
        match kind {
            MetaFieldKind::AllowedMethods => Some(Self::AllowedMethods),
            MetaFieldKind::PickupAddress => None,
        }
    }

    fn with_instance(kind: MetaFieldKind, instance_id: MethodInstanceId) -> Option<Self> {
        if instance_id.is_blank() {
            return None;
        }
        match kind {
            MetaFieldKind::PickupAddress if instance_id.is_local_pickup() => {
                Some(Self::PickupAddress(instance_id))
            }
            _ => None,
        }
    }
}

/// A stored metadata value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaValue {
    MethodList(Vec<MethodInstanceId>),
    Text(String),
}

impl MetaValue {
    /// JSON form used by the metadata store.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::MethodList(ids) => Value::Array(
                ids.iter()
                    .map(|id| Value::String(id.as_str().to_owned()))
                    .collect(),
            ),
            Self::Text(text) => Value::String(text.clone()),
        }
    }

    /// Read a stored JSON value. Non-string list entries are dropped.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(Self::MethodList(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(MethodInstanceId::from)
                    .filter(|id| !id.is_blank())
                    .collect(),
            )),
            Value::String(text) => Some(Self::Text(text.clone())),
            _ => None,
        }
    }
}

/// A single metadata write produced by an admin save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaWrite {
    pub field: ProductMetaField,
    pub value: MetaValue,
}

impl MetaWrite {
    /// Key under which the value is stored.
    #[must_use]
    pub fn storage_key(&self) -> String {
        self.field.storage_key()
    }
}

/// The product shipping section of the admin product form.
///
/// `fields` holds the remaining raw form fields by name; only the ones the
/// mapping table recognises are used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductShippingForm {
    #[serde(default)]
    pub shipping_methods: Vec<MethodInstanceId>,
    #[serde(default)]
    pub fields: HashMap<String, String>,
}

impl ProductShippingForm {
    /// Drop selected methods the predicate rejects (e.g. deleted instances).
    pub fn retain_methods(&mut self, keep: impl FnMut(&MethodInstanceId) -> bool) {
        self.shipping_methods.retain(keep);
    }

    /// The metadata writes this form submission performs for a product.
    ///
    /// The allowed method list comes first. Then every selected local pickup
    /// instance gets its address written, empty when the form left it out.
    #[must_use]
    pub fn into_writes(self) -> Vec<MetaWrite> {
        let mut seen = HashSet::new();
        let methods: Vec<MethodInstanceId> = self
            .shipping_methods
            .into_iter()
            .map(|id| MethodInstanceId::new(id.as_str().trim()))
            .filter(|id| !id.is_blank() && seen.insert(id.clone()))
            .collect();

        let mut addresses: HashMap<MethodInstanceId, String> = self
            .fields
            .into_iter()
            .filter_map(|(key, value)| match ProductMetaField::from_form_key(&key)? {
                ProductMetaField::PickupAddress(id) => Some((id, value)),
                ProductMetaField::AllowedMethods => None,
            })
            .collect();

        let pickup_writes: Vec<MetaWrite> = methods
            .iter()
            .filter(|id| id.is_local_pickup())
            .map(|id| MetaWrite {
                field: ProductMetaField::PickupAddress(id.clone()),
                value: MetaValue::Text(sanitize_text(
                    &addresses.remove(id).unwrap_or_default(),
                )),
            })
            .collect();

        let mut writes = Vec::with_capacity(pickup_writes.len() + 1);
        writes.push(MetaWrite {
            field: ProductMetaField::AllowedMethods,
            value: MetaValue::MethodList(methods),
        });
        writes.extend(pickup_writes);
        writes
    }
}

/// Clean free text from a form: strip markup, collapse whitespace, trim.
///
/// A `<` only opens a tag when a letter, `/`, `!` or `?` follows it. Any other
/// `<` is kept as text.
#[must_use]
pub fn sanitize_text(input: &str) -> String {
    let mut stripped = String::with_capacity(input.len());
    let mut in_tag = false;
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            _ if in_tag => in_tag = c != '>',
            '<' if chars.peek().is_some_and(|&next| opens_tag(next)) => in_tag = true,
            _ => stripped.push(c),
        }
    }
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

const fn opens_tag(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?')
}
