//! Declarative schema of a VIF block and its typed decoding.
//!
//! A VIF block arrives as an untyped JSON object (one per `vif { ... }`
//! block in the resource configuration). [`VifConfig::decode`] checks every
//! key against [`VIF_SCHEMA`], then deserializes into typed optional fields
//! and applies the consistency rules between them.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Result, VifError};
use crate::network::NetworkDescriptor;

pub const NETWORK_NAME_LABEL: &str = "network_name_label";
pub const NETWORK_UUID: &str = "network_uuid";
pub const MAC: &str = "mac";
pub const MAC_AUTOGENERATED: &str = "mac_autogenerated";
pub const MTU: &str = "mtu";
pub const DEVICE: &str = "device";

/// Value type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Int,
    Bool,
}

impl FieldType {
    fn describe(&self) -> &'static str {
        match self {
            FieldType::String => "a string",
            FieldType::Int => "a non-negative 32-bit integer",
            FieldType::Bool => "a boolean",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Int => value.as_u64().is_some_and(|n| n <= u64::from(u32::MAX)),
            FieldType::Bool => value.is_boolean(),
        }
    }
}

/// One recognized configuration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub field_type: FieldType,
    /// May be omitted from configuration
    pub optional: bool,
    /// Filled in from remote state when omitted
    pub computed: bool,
}

/// The six keys a VIF block accepts.
pub const VIF_SCHEMA: &[FieldSchema] = &[
    FieldSchema { name: NETWORK_NAME_LABEL, field_type: FieldType::String, optional: true, computed: false },
    FieldSchema { name: NETWORK_UUID, field_type: FieldType::String, optional: true, computed: false },
    FieldSchema { name: MAC, field_type: FieldType::String, optional: true, computed: false },
    FieldSchema { name: MAC_AUTOGENERATED, field_type: FieldType::Bool, optional: true, computed: true },
    FieldSchema { name: MTU, field_type: FieldType::Int, optional: true, computed: false },
    FieldSchema { name: DEVICE, field_type: FieldType::Int, optional: true, computed: true },
];

/// Look up a field by key.
pub fn field(name: &str) -> Option<&'static FieldSchema> {
    VIF_SCHEMA.iter().find(|f| f.name == name)
}

/// A VIF block with every key typed and optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VifConfig {
    pub network_name_label: Option<String>,
    pub network_uuid: Option<String>,
    pub mac: Option<String>,
    pub mac_autogenerated: Option<bool>,
    pub mtu: Option<u32>,
    /// `None` means the slot is derived from the VM at creation time
    pub device: Option<u32>,
}

impl VifConfig {
    /// Decode and validate the VIF block at position `index`.
    ///
    /// `null` values and empty strings are treated as absent.
    pub fn decode(index: usize, record: &Value) -> Result<Self> {
        let invalid = |msg: String| VifError::InvalidConfig(format!("VIF block {}: {}", index, msg));

        let map = record
            .as_object()
            .ok_or_else(|| invalid(format!("expected an object, got {}", record)))?;

        let mut present = Map::new();
        for (key, value) in map {
            let schema = field(key).ok_or_else(|| {
                let known: Vec<_> = VIF_SCHEMA.iter().map(|f| f.name).collect();
                invalid(format!("unknown field `{}`, expected one of {}", key, known.join(", ")))
            })?;

            if value.is_null() || value.as_str() == Some("") {
                continue;
            }
            if !schema.field_type.matches(value) {
                return Err(invalid(format!(
                    "field `{}` must be {}, got {}",
                    key,
                    schema.field_type.describe(),
                    value
                )));
            }
            present.insert(key.clone(), value.clone());
        }

        let config: VifConfig = serde_json::from_value(Value::Object(present))
            .map_err(|e| invalid(e.to_string()))?;
        config.validate().map_err(invalid)?;
        Ok(config)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.network_name_label.is_none() && self.network_uuid.is_none() {
            return Err(format!("one of `{}` or `{}` is required", NETWORK_NAME_LABEL, NETWORK_UUID));
        }
        if self.mtu == Some(0) {
            return Err(format!("`{}` must be positive", MTU));
        }
        if let (false, Some(mac)) = (self.is_mac_autogenerated(), &self.mac) {
            normalize_mac(mac)?;
        }
        Ok(())
    }

    /// Network identity fields of this block.
    pub fn network_descriptor(&self) -> NetworkDescriptor {
        NetworkDescriptor {
            name_label: self.network_name_label.clone(),
            uuid: self.network_uuid.clone(),
        }
    }

    /// Whether the pool assigns the MAC. Computed as "no MAC given" when unset.
    pub fn is_mac_autogenerated(&self) -> bool {
        self.mac_autogenerated.unwrap_or(self.mac.is_none())
    }

    /// The MAC to send: empty when autogenerated or not given (the pool
    /// then assigns one), normalized otherwise.
    pub fn effective_mac(&self) -> Result<String> {
        match &self.mac {
            Some(mac) if !self.is_mac_autogenerated() => normalize_mac(mac).map_err(VifError::InvalidConfig),
            _ => Ok(String::new()),
        }
    }
}

/// Validate a colon-separated 6-octet MAC and lower-case it.
pub fn normalize_mac(mac: &str) -> std::result::Result<String, String> {
    let octets: Vec<&str> = mac.split(':').collect();
    let well_formed = octets.len() == 6
        && octets
            .iter()
            .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));

    if !well_formed {
        return Err(format!("`{}` is not a colon-separated 6-octet MAC address", mac));
    }
    Ok(mac.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_table() {
        assert_eq!(VIF_SCHEMA.len(), 6);
        assert!(VIF_SCHEMA.iter().all(|f| f.optional));

        let computed: Vec<_> = VIF_SCHEMA.iter().filter(|f| f.computed).map(|f| f.name).collect();
        assert_eq!(computed, vec![MAC_AUTOGENERATED, DEVICE]);
        assert_eq!(field(MTU).unwrap().field_type, FieldType::Int);
        assert!(field("bridge").is_none());
    }

    #[test]
    fn test_decode_full_block() {
        let config = VifConfig::decode(
            0,
            &json!({
                "network_name_label": "Pool-wide network",
                "mac": "AA:BB:CC:00:11:22",
                "mac_autogenerated": false,
                "mtu": 9000,
                "device": 3
            }),
        )
        .unwrap();

        assert_eq!(config.network_name_label.as_deref(), Some("Pool-wide network"));
        assert_eq!(config.mtu, Some(9000));
        assert_eq!(config.device, Some(3));
        assert!(!config.is_mac_autogenerated());
        assert_eq!(config.effective_mac().unwrap(), "aa:bb:cc:00:11:22");
    }

    #[test]
    fn test_autogenerated_mac_discards_supplied_value() {
        let config = VifConfig::decode(
            0,
            &json!({
                "network_uuid": "6b8c",
                "mac": "aa:bb:cc:00:11:22",
                "mac_autogenerated": true
            }),
        )
        .unwrap();

        assert!(config.is_mac_autogenerated());
        assert_eq!(config.effective_mac().unwrap(), "");
    }

    #[test]
    fn test_mac_autogenerated_computed_from_mac_presence() {
        let without_mac = VifConfig::decode(0, &json!({"network_uuid": "6b8c"})).unwrap();
        assert!(without_mac.is_mac_autogenerated());

        let with_mac = VifConfig::decode(0, &json!({"network_uuid": "6b8c", "mac": "02:00:00:00:00:01"})).unwrap();
        assert!(!with_mac.is_mac_autogenerated());
    }

    #[test]
    fn test_empty_strings_and_nulls_are_absent() {
        let config = VifConfig::decode(
            0,
            &json!({"network_name_label": "", "network_uuid": "6b8c", "mac": "", "device": null}),
        )
        .unwrap();

        assert_eq!(config.network_name_label, None);
        assert_eq!(config.mac, None);
        assert_eq!(config.device, None);
    }

    #[test]
    fn test_manual_mac_flag_without_mac_is_accepted() {
        for record in [
            json!({"network_uuid": "n", "mac_autogenerated": false}),
            json!({"network_uuid": "n", "mac_autogenerated": false, "mac": ""}),
        ] {
            let config = VifConfig::decode(0, &record).unwrap();
            assert!(!config.is_mac_autogenerated());
            assert_eq!(config.effective_mac().unwrap(), "");
        }
    }

    #[test]
    fn test_explicit_zero_device_is_kept() {
        let config = VifConfig::decode(0, &json!({"network_uuid": "6b8c", "device": 0})).unwrap();
        assert_eq!(config.device, Some(0));
    }

    #[test]
    fn test_decode_errors() {
        let cases = [
            (json!("eth0"), "expected an object"),
            (json!({"network_uuid": "n", "bridge": "xenbr0"}), "unknown field `bridge`"),
            (json!({"network_uuid": "n", "mtu": "1500"}), "`mtu` must be a non-negative"),
            (json!({"network_uuid": "n", "mac_autogenerated": "yes"}), "must be a boolean"),
            (json!({"network_uuid": "n", "device": -1}), "`device` must be a non-negative"),
            (json!({"network_uuid": "n", "mtu": 0}), "must be positive"),
            (json!({"mtu": 1500}), "is required"),
            (json!({"network_uuid": "n", "mac": "aa-bb-cc-dd-ee-ff"}), "not a colon-separated"),
        ];

        for (record, expected) in cases {
            let err = VifConfig::decode(4, &record).unwrap_err();
            let msg = err.to_string();
            assert!(matches!(err, VifError::InvalidConfig(_)), "{}", msg);
            assert!(msg.contains("VIF block 4"), "{}", msg);
            assert!(msg.contains(expected), "{:?} -> {}", record, msg);
        }
    }

    #[test]
    fn test_normalize_mac() {
        assert_eq!(normalize_mac("DE:AD:BE:EF:00:01").unwrap(), "de:ad:be:ef:00:01");
        assert!(normalize_mac("de:ad:be:ef:00").is_err());
        assert!(normalize_mac("de:ad:be:ef:00:0g").is_err());
        assert!(normalize_mac("dead.beef.0001").is_err());
    }
}
