//! XenAPI references and the subset of object records this crate reads and writes.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// OPAQUE REFERENCES
// =============================================================================

/// Reference value XenAPI uses for "no object".
pub const NULL_REF: &str = "OpaqueRef:NULL";

macro_rules! opaque_ref {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw reference string.
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// The raw reference string.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// True for `OpaqueRef:NULL` or an empty string.
            pub fn is_null(&self) -> bool {
                self.0.is_empty() || self.0 == NULL_REF
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::new(raw)
            }
        }
    };
}

opaque_ref!(
    /// Authenticated XenAPI session.
    SessionRef
);
opaque_ref!(
    /// Reference to a `VM` object.
    VmRef
);
opaque_ref!(
    /// Reference to a `network` object.
    NetworkRef
);
opaque_ref!(
    /// Reference to a `VIF` object.
    VifRef
);

// =============================================================================
// RECORDS
// =============================================================================

/// VM power state as reported by `VM.get_record`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PowerState {
    #[default]
    Halted,
    Paused,
    Running,
    Suspended,
}

impl PowerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerState::Halted => "Halted",
            PowerState::Paused => "Paused",
            PowerState::Running => "Running",
            PowerState::Suspended => "Suspended",
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields of a `VM` record used for VIF placement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VmRecord {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub name_label: String,
    #[serde(default)]
    pub power_state: PowerState,
    /// VIFs currently attached to this VM, in creation order
    #[serde(rename = "VIFs", default)]
    pub vifs: Vec<VifRef>,
}

/// Fields of a `network` record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkRecord {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub name_label: String,
    #[serde(default)]
    pub bridge: String,
    #[serde(rename = "MTU", default)]
    pub mtu: u32,
}

/// A `VIF` record, as passed to `VIF.create` and returned by `VIF.get_record`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VifRecord {
    /// Assigned by the pool; empty when creating
    #[serde(default)]
    pub uuid: String,
    /// Device order rendered as a decimal string (e.g. "0", "1")
    pub device: String,
    pub network: NetworkRef,
    #[serde(rename = "VM")]
    pub vm: VmRef,
    /// Colon-separated MAC; empty asks the pool to generate one
    #[serde(rename = "MAC", default)]
    pub mac: String,
    #[serde(rename = "MTU")]
    pub mtu: u32,
    #[serde(rename = "MAC_autogenerated", default)]
    pub mac_autogenerated: bool,
    #[serde(default)]
    pub currently_attached: bool,
    #[serde(default)]
    pub other_config: HashMap<String, String>,
    #[serde(default)]
    pub qos_algorithm_type: String,
    #[serde(default)]
    pub qos_algorithm_params: HashMap<String, String>,
}

impl VifRecord {
    /// Parse the decimal `device` string into a slot index.
    pub fn device_order(&self) -> Option<u32> {
        self.device.trim().parse().ok()
    }
}
