//! Extra settings field registered on local pickup method instances.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Settings key of the pickup address field.
pub const PICKUP_ADDRESS_SETTING_KEY: &str = "pickup_address";

/// Input type of a settings field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingFieldType {
    Text,
}

/// Descriptor of a settings form field, in the shape the host settings form
/// expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingField {
    pub key: String,
    pub title: String,
    #[serde(rename = "type")]
    pub field_type: SettingFieldType,
    pub description: String,
    pub default: String,
    pub desc_tip: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_attributes: BTreeMap<String, String>,
}

/// The pickup address field of local pickup instances.
#[must_use]
pub fn pickup_address_setting_field() -> SettingField {
    SettingField {
        key: PICKUP_ADDRESS_SETTING_KEY.to_owned(),
        title: "Pickup Address".to_owned(),
        field_type: SettingFieldType::Text,
        description: "Enter the pickup address for this local pickup shipping method.".to_owned(),
        default: String::new(),
        desc_tip: true,
        custom_attributes: BTreeMap::from([(
            "class".to_owned(),
            "psm-local-pickup-address".to_owned(),
        )]),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pickup_address_field_json() {
        let json = serde_json::to_value(pickup_address_setting_field()).unwrap();
        assert_eq!(json["key"], "pickup_address");
        assert_eq!(json["title"], "Pickup Address");
        assert_eq!(json["type"], "text");
        assert_eq!(json["default"], "");
        assert_eq!(json["desc_tip"], true);
        assert_eq!(
            json["custom_attributes"]["class"],
            "psm-local-pickup-address"
        );
    }
}
