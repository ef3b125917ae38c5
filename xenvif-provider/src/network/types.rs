//! Network descriptor and resolved handle types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{NetworkRecord, NetworkRef};

/// Identifies a network by name label and/or UUID.
///
/// When both are set the UUID wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDescriptor {
    /// Human-readable name label
    pub name_label: Option<String>,
    /// Network UUID
    pub uuid: Option<String>,
}

impl NetworkDescriptor {
    /// Descriptor that looks the network up by UUID.
    pub fn by_uuid(uuid: impl Into<String>) -> Self {
        Self {
            name_label: None,
            uuid: Some(uuid.into()),
        }
    }

    /// Descriptor that looks the network up by name label.
    pub fn by_name_label(name_label: impl Into<String>) -> Self {
        Self {
            name_label: Some(name_label.into()),
            uuid: None,
        }
    }
}

impl fmt::Display for NetworkDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.uuid, &self.name_label) {
            (Some(uuid), _) => write!(f, "uuid={}", uuid),
            (None, Some(name)) => write!(f, "name_label={:?}", name),
            (None, None) => f.write_str("<unset>"),
        }
    }
}

/// A network resolved against the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkHandle {
    /// Opaque reference used in `VIF.create`
    pub network_ref: NetworkRef,
    pub uuid: String,
    pub name_label: String,
    /// MTU configured on the network
    pub mtu: u32,
}

impl NetworkHandle {
    pub fn from_record(network_ref: NetworkRef, record: NetworkRecord) -> Self {
        Self {
            network_ref,
            uuid: record.uuid,
            name_label: record.name_label,
            mtu: record.mtu,
        }
    }
}
