//! VIF resource manager.
//!
//! Turns decoded VIF blocks into [`VifDescriptor`]s and drives them through
//! the pool:
//!
//! ```text
//! resolved(network, VM) ──[VM not running]──► created (vif_ref) ──► plugged
//!        │                        │                    │
//!        ▼                        ▼                    ▼
//!   rejected (VmRunning)     create failed     plug failed (stays created)
//! ```
//!
//! Every remote call is awaited in order and its failure is returned as-is.
//! Nothing is retried and nothing is rolled back.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::connection::{Connection, RefreshPolicy, VifOptions};
use crate::error::{Result, VifError};
use crate::network::{NetworkHandle, NetworkResolver};
use crate::schema::VifConfig;
use crate::types::{NetworkRecord, VifRecord, VifRef};
use crate::vm::VmHandle;

/// Where a descriptor is on the creation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VifPhase {
    /// Network resolved, nothing exists remotely
    #[default]
    Resolved,
    /// `VIF.create` succeeded; not (yet) plugged
    Created,
    /// `VIF.plug` succeeded
    Plugged,
}

/// One virtual network interface attachment.
#[derive(Debug, Clone)]
pub struct VifDescriptor {
    /// Resolved network, shared read-only
    pub network: Arc<NetworkHandle>,
    /// Empty when the pool assigns the MAC
    pub mac: String,
    pub mac_autogenerated: bool,
    /// Slot on the VM; `None` until derived from the VM's VIF count
    pub device_order: Option<u32>,
    pub mtu: u32,
    /// Owning VM, supplied by the caller before creation
    pub vm: Option<VmHandle>,
    /// Set once `VIF.create` succeeds
    pub vif_ref: Option<VifRef>,
    /// Pool-assigned UUID, known after a refresh
    pub uuid: Option<String>,
    pub currently_attached: bool,
    pub phase: VifPhase,
}

impl VifDescriptor {
    /// Build a descriptor from a decoded block and its resolved network.
    ///
    /// An unset MTU follows the network's own MTU, falling back to
    /// `options.default_mtu` when the pool reports none.
    pub fn new(network: Arc<NetworkHandle>, config: &VifConfig, options: &VifOptions) -> Result<Self> {
        let mtu = config
            .mtu
            .or(Some(network.mtu).filter(|mtu| *mtu > 0))
            .unwrap_or(options.default_mtu);

        Ok(Self {
            network,
            mac: config.effective_mac()?,
            mac_autogenerated: config.is_mac_autogenerated(),
            device_order: config.device,
            mtu,
            vm: None,
            vif_ref: None,
            uuid: None,
            currently_attached: false,
            phase: VifPhase::Resolved,
        })
    }

    /// Set the owning VM.
    pub fn with_vm(mut self, vm: VmHandle) -> Self {
        self.vm = Some(vm);
        self
    }

    /// Fill an unset device order with the VM's current VIF count and
    /// return the effective slot.
    pub fn derive_device_order(&mut self, vm: &VmHandle) -> u32 {
        *self.device_order.get_or_insert(vm.vif_count)
    }

    /// The record passed to `VIF.create`.
    pub fn to_record(&self, vm: &VmHandle, device: u32) -> VifRecord {
        VifRecord {
            uuid: String::new(),
            device: device.to_string(),
            network: self.network.network_ref.clone(),
            vm: vm.vm_ref.clone(),
            mac: if self.mac_autogenerated { String::new() } else { self.mac.clone() },
            mtu: self.mtu,
            mac_autogenerated: self.mac_autogenerated,
            currently_attached: false,
            other_config: Default::default(),
            qos_algorithm_type: String::new(),
            qos_algorithm_params: Default::default(),
        }
    }

    /// Copy remotely-owned fields from a fetched record.
    fn apply_record(&mut self, record: &VifRecord) -> Result<()> {
        let device = parse_device(record)?;
        self.mac = record.mac.clone();
        self.mac_autogenerated = record.mac_autogenerated;
        self.mtu = record.mtu;
        self.device_order = Some(device);
        self.uuid = Some(record.uuid.clone());
        self.currently_attached = record.currently_attached;
        Ok(())
    }

    /// Declarative view of this descriptor.
    pub fn state(&self) -> VifState {
        VifState {
            network_name_label: self.network.name_label.clone(),
            network_uuid: self.network.uuid.clone(),
            mac: self.mac.clone(),
            mtu: self.mtu,
            mac_autogenerated: self.mac_autogenerated,
            device: self.device_order.unwrap_or_default(),
        }
    }
}

/// VIF attributes keyed like the configuration schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VifState {
    pub network_name_label: String,
    pub network_uuid: String,
    pub mac: String,
    pub mtu: u32,
    pub mac_autogenerated: bool,
    pub device: u32,
}

impl VifState {
    pub fn from_records(vif: &VifRecord, network: &NetworkRecord) -> Result<Self> {
        Ok(Self {
            network_name_label: network.name_label.clone(),
            network_uuid: network.uuid.clone(),
            mac: vif.mac.clone(),
            mtu: vif.mtu,
            mac_autogenerated: vif.mac_autogenerated,
            device: parse_device(vif)?,
        })
    }
}

fn parse_device(record: &VifRecord) -> Result<u32> {
    record.device_order().ok_or_else(|| {
        VifError::InvalidState(format!(
            "VIF {} has non-numeric device {:?}",
            record.uuid, record.device
        ))
    })
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// Decode and resolve a list of VIF blocks, preserving order.
///
/// Fails on the first block that does not decode or whose network does not
/// resolve; no descriptors are returned in that case.
#[instrument(skip_all, fields(count = records.len()))]
pub async fn ingest_vifs(
    conn: &Connection,
    resolver: &dyn NetworkResolver,
    records: &[Value],
) -> Result<Vec<VifDescriptor>> {
    let mut vifs = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        let config = VifConfig::decode(index, record)?;
        let network = resolver.resolve(conn, &config.network_descriptor()).await?;
        let vif = VifDescriptor::new(Arc::new(network), &config, conn.options())?;

        debug!(
            index,
            network = %vif.network.name_label,
            device = ?vif.device_order,
            mac_autogenerated = vif.mac_autogenerated,
            "VIF block ingested"
        );
        vifs.push(vif);
    }

    Ok(vifs)
}

/// Create and plug a VIF on its (non-running) VM.
///
/// On success the descriptor holds `vif_ref` and is [`VifPhase::Plugged`].
/// If `VIF.plug` fails the error is returned and the descriptor keeps its
/// `vif_ref` in [`VifPhase::Created`]; the remote VIF is not destroyed.
#[instrument(skip_all, fields(network = %vif.network.name_label))]
pub async fn create_vif(conn: &Connection, vif: &mut VifDescriptor) -> Result<()> {
    let vm = vif
        .vm
        .clone()
        .ok_or_else(|| VifError::InvalidConfig("VIF has no owning VM".to_string()))?;

    // Hot-plug is not supported even when the guest has PV drivers.
    if vm.is_running() {
        return Err(VifError::VmRunning {
            name: vm.name_label,
            uuid: vm.uuid,
        });
    }

    let device = vif.derive_device_order(&vm);
    let record = vif.to_record(&vm, device);

    let vif_ref = conn.client().vif_create(conn.session(), &record).await?;
    vif.vif_ref = Some(vif_ref.clone());
    vif.phase = VifPhase::Created;
    info!(vif = %vif_ref, vm_uuid = %vm.uuid, device, "VIF created");

    if let Err(e) = refresh_vif(conn, vif).await {
        match conn.options().refresh_policy {
            RefreshPolicy::BestEffort => {
                warn!(vif = %vif_ref, error = %e, "Refresh after create failed, continuing");
            }
            RefreshPolicy::Strict => return Err(e),
        }
    }

    conn.client().vif_plug(conn.session(), &vif_ref).await?;
    vif.currently_attached = true;
    vif.phase = VifPhase::Plugged;
    info!(vif = %vif_ref, mac = %vif.mac, "VIF plugged");

    Ok(())
}

/// Re-read a created VIF and update remotely-assigned fields (MAC, device, ...).
pub async fn refresh_vif(conn: &Connection, vif: &mut VifDescriptor) -> Result<()> {
    let vif_ref = vif
        .vif_ref
        .clone()
        .ok_or_else(|| VifError::InvalidState("VIF has not been created".to_string()))?;

    let record = conn.client().vif_get_record(conn.session(), &vif_ref).await?;
    vif.apply_record(&record)
}

/// Read a VIF and its network back into declarative form.
#[instrument(skip(conn))]
pub async fn read_vif_state(conn: &Connection, vif_ref: &VifRef) -> Result<VifState> {
    let vif = conn.client().vif_get_record(conn.session(), vif_ref).await?;
    let network = conn.client().network_get_record(conn.session(), &vif.network).await?;
    VifState::from_records(&vif, &network)
}

/// Unplug (if attached) and destroy a VIF by reference.
#[instrument(skip(conn))]
pub async fn destroy_vif_ref(conn: &Connection, vif_ref: &VifRef) -> Result<()> {
    let record = conn.client().vif_get_record(conn.session(), vif_ref).await?;

    if record.currently_attached {
        conn.client().vif_unplug(conn.session(), vif_ref).await?;
        debug!("VIF unplugged");
    }
    conn.client().vif_destroy(conn.session(), vif_ref).await?;

    info!(uuid = %record.uuid, "VIF destroyed");
    Ok(())
}

/// Tear down a descriptor's remote VIF. A no-op if it was never created.
pub async fn destroy_vif(conn: &Connection, vif: &mut VifDescriptor) -> Result<()> {
    let Some(vif_ref) = vif.vif_ref.clone() else {
        return Ok(());
    };

    destroy_vif_ref(conn, &vif_ref).await?;
    vif.vif_ref = None;
    vif.uuid = None;
    vif.currently_attached = false;
    vif.phase = VifPhase::Resolved;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::XenApiError;
    use crate::mock::MockXenApi;
    use crate::network::{NetworkDescriptor, PoolNetworkResolver};
    use crate::schema::VIF_SCHEMA;
    use crate::types::PowerState;
    use async_trait::async_trait;
    use serde_json::json;

    struct Fixture {
        pool: Arc<MockXenApi>,
        conn: Connection,
        storage_uuid: String,
    }

    async fn fixture(options: VifOptions) -> Fixture {
        let pool = Arc::new(MockXenApi::new());
        pool.add_network("Pool-wide network", 1500);
        let storage = pool.add_network("storage", 9000);
        let storage_uuid = pool.network(&storage).unwrap().uuid;
        let conn = Connection::open(pool.clone(), "root", "secret", options)
            .await
            .unwrap();
        Fixture {
            pool,
            conn,
            storage_uuid,
        }
    }

    async fn single_vif(f: &Fixture, block: Value) -> VifDescriptor {
        ingest_vifs(&f.conn, &PoolNetworkResolver, &[block])
            .await
            .unwrap()
            .remove(0)
    }

    /// Resolver that fails for one name label.
    struct Refusing(&'static str);

    #[async_trait]
    impl NetworkResolver for Refusing {
        async fn resolve(&self, conn: &Connection, descriptor: &NetworkDescriptor) -> Result<NetworkHandle> {
            if descriptor.name_label.as_deref() == Some(self.0) {
                return Err(VifError::NetworkNotFound(descriptor.to_string()));
            }
            PoolNetworkResolver.resolve(conn, descriptor).await
        }
    }

    #[tokio::test]
    async fn test_ingest_preserves_order() {
        let f = fixture(VifOptions::default()).await;
        let records = vec![
            json!({"network_name_label": "storage", "device": 1}),
            json!({"network_name_label": "Pool-wide network", "mtu": 1400}),
            json!({"network_name_label": "storage", "mac": "02:00:00:00:00:0a"}),
        ];

        let vifs = ingest_vifs(&f.conn, &PoolNetworkResolver, &records).await.unwrap();

        assert_eq!(vifs.len(), 3);
        let networks: Vec<_> = vifs.iter().map(|v| v.network.name_label.as_str()).collect();
        assert_eq!(networks, vec!["storage", "Pool-wide network", "storage"]);
        assert_eq!(vifs[0].device_order, Some(1));
        assert_eq!(vifs[0].mtu, 9000);
        assert_eq!(vifs[1].mtu, 1400);
        assert_eq!(vifs[1].device_order, None);
        assert!(vifs[1].mac_autogenerated);
        assert_eq!(vifs[2].mac, "02:00:00:00:00:0a");
        assert!(vifs.iter().all(|v| v.phase == VifPhase::Resolved && v.vif_ref.is_none()));
    }

    #[tokio::test]
    async fn test_ingest_is_atomic_on_resolution_failure() {
        let f = fixture(VifOptions::default()).await;
        let records = vec![
            json!({"network_name_label": "Pool-wide network"}),
            json!({"network_name_label": "storage"}),
            json!({"network_name_label": "Pool-wide network"}),
        ];

        let err = ingest_vifs(&f.conn, &Refusing("storage"), &records)
            .await
            .unwrap_err();
        assert!(matches!(err, VifError::NetworkNotFound(ref n) if n.contains("storage")));
    }

    #[tokio::test]
    async fn test_ingest_surfaces_remote_resolution_error_unchanged() {
        let f = fixture(VifOptions::default()).await;
        f.pool.fail_next(
            "network.get_by_name_label",
            XenApiError::Transport("connection reset".to_string()),
        );

        let err = ingest_vifs(&f.conn, &PoolNetworkResolver, &[json!({"network_name_label": "storage"})])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VifError::Remote(XenApiError::Transport(ref msg)) if msg == "connection reset"
        ));
    }

    #[tokio::test]
    async fn test_create_autogenerated_mac_derived_device() {
        let f = fixture(VifOptions::default()).await;
        let vm_ref = f.pool.add_vm("web-01", PowerState::Halted);

        // Two existing VIFs on the VM.
        for block in [json!({"network_name_label": "storage"}), json!({"network_name_label": "storage"})] {
            let vm = VmHandle::load(&f.conn, "web-01").await.unwrap();
            let mut existing = single_vif(&f, block).await.with_vm(vm);
            create_vif(&f.conn, &mut existing).await.unwrap();
        }

        let vm = VmHandle::load(&f.conn, "web-01").await.unwrap();
        assert_eq!(vm.vif_count, 2);
        let mut vif = single_vif(
            &f,
            json!({"network_name_label": "Pool-wide network", "mac": "aa:bb:cc:dd:ee:ff", "mac_autogenerated": true}),
        )
        .await
        .with_vm(vm);
        f.pool.clear_calls();

        create_vif(&f.conn, &mut vif).await.unwrap();

        assert_eq!(f.pool.calls(), vec!["VIF.create", "VIF.get_record", "VIF.plug"]);
        let vif_ref = vif.vif_ref.clone().unwrap();
        let remote = f.pool.vif(&vif_ref).unwrap();
        assert_eq!(remote.device, "2");
        assert!(remote.mac_autogenerated);
        assert!(remote.currently_attached);
        assert_eq!(remote.vm, vm_ref);

        assert_eq!(vif.phase, VifPhase::Plugged);
        assert_eq!(vif.device_order, Some(2));
        // Refresh picked up the pool-assigned MAC.
        assert_eq!(vif.mac, remote.mac);
        assert_ne!(vif.mac, "aa:bb:cc:dd:ee:ff");
    }

    #[tokio::test]
    async fn test_unset_mtu_follows_network() {
        let f = fixture(VifOptions::default()).await;
        f.pool.add_vm("vm", PowerState::Halted);
        let vm = VmHandle::load(&f.conn, "vm").await.unwrap();

        let mut jumbo = single_vif(&f, json!({"network_name_label": "storage"})).await.with_vm(vm);
        assert_eq!(jumbo.mtu, 9000);
        create_vif(&f.conn, &mut jumbo).await.unwrap();
        let remote = f.pool.vif(jumbo.vif_ref.as_ref().unwrap()).unwrap();
        assert_eq!(remote.mtu, 9000);

        let pinned = single_vif(&f, json!({"network_name_label": "storage", "mtu": 1500})).await;
        assert_eq!(pinned.mtu, 1500);
    }

    #[test]
    fn test_default_mtu_when_network_reports_none() {
        let network = Arc::new(NetworkHandle {
            network_ref: "OpaqueRef:net".into(),
            uuid: "n".to_string(),
            name_label: "lan".to_string(),
            mtu: 0,
        });
        let options = VifOptions {
            default_mtu: 1450,
            ..VifOptions::default()
        };
        let vif = VifDescriptor::new(network, &VifConfig::default(), &options).unwrap();
        assert_eq!(vif.mtu, 1450);
    }

    #[tokio::test]
    async fn test_explicit_manual_mac_without_value_lets_pool_assign() {
        let f = fixture(VifOptions::default()).await;
        f.pool.add_vm("vm", PowerState::Halted);
        let vm = VmHandle::load(&f.conn, "vm").await.unwrap();
        let mut vif = single_vif(&f, json!({"network_name_label": "storage", "mac_autogenerated": false}))
            .await
            .with_vm(vm);
        assert_eq!(vif.mac, "");
        assert!(!vif.mac_autogenerated);

        create_vif(&f.conn, &mut vif).await.unwrap();

        let sent = f.pool.create_requests().pop().unwrap();
        assert_eq!(sent.mac, "");
        assert!(!sent.mac_autogenerated);
        assert!(!vif.mac.is_empty());
    }

    #[test]
    fn test_autogenerated_record_never_carries_mac() {
        let network = Arc::new(NetworkHandle {
            network_ref: "OpaqueRef:net".into(),
            uuid: "n".to_string(),
            name_label: "lan".to_string(),
            mtu: 1500,
        });
        let vm = VmHandle {
            vm_ref: "OpaqueRef:vm".into(),
            uuid: "v".to_string(),
            name_label: "vm".to_string(),
            power_state: PowerState::Halted,
            vif_count: 0,
        };
        let mut vif = VifDescriptor::new(network, &VifConfig::default(), &VifOptions::default()).unwrap();
        vif.mac = "aa:bb:cc:dd:ee:ff".to_string();
        vif.mac_autogenerated = true;

        let record = vif.to_record(&vm, 0);
        assert_eq!(record.mac, "");
        assert!(record.mac_autogenerated);
    }

    #[tokio::test]
    async fn test_device_order_derivation() {
        let f = fixture(VifOptions::default()).await;
        f.pool.add_vm("vm", PowerState::Halted);
        let mut vm = VmHandle::load(&f.conn, "vm").await.unwrap();
        vm.vif_count = 5;

        let mut unset = single_vif(&f, json!({"network_uuid": f.storage_uuid})).await;
        assert_eq!(unset.derive_device_order(&vm), 5);
        assert_eq!(unset.device_order, Some(5));

        let mut explicit = single_vif(&f, json!({"network_name_label": "storage", "device": 3})).await;
        assert_eq!(explicit.derive_device_order(&vm), 3);

        let mut zero = single_vif(&f, json!({"network_name_label": "storage", "device": 0})).await;
        assert_eq!(zero.derive_device_order(&vm), 0);
    }

    #[tokio::test]
    async fn test_running_vm_is_rejected_without_remote_calls() {
        let f = fixture(VifOptions::default()).await;
        f.pool.add_vm("busy", PowerState::Running);
        let vm = VmHandle::load(&f.conn, "busy").await.unwrap();
        let mut vif = single_vif(&f, json!({"network_name_label": "storage"})).await.with_vm(vm.clone());
        f.pool.clear_calls();

        let err = create_vif(&f.conn, &mut vif).await.unwrap_err();

        assert!(f.pool.calls().is_empty());
        let msg = err.to_string();
        assert!(msg.contains("busy") && msg.contains(&vm.uuid), "{}", msg);
        assert!(matches!(err, VifError::VmRunning { .. }));
        assert!(vif.vif_ref.is_none());
        assert_eq!(vif.device_order, None);
    }

    #[tokio::test]
    async fn test_missing_vm_is_rejected() {
        let f = fixture(VifOptions::default()).await;
        let mut vif = single_vif(&f, json!({"network_name_label": "storage"})).await;
        f.pool.clear_calls();

        let err = create_vif(&f.conn, &mut vif).await.unwrap_err();
        assert!(matches!(err, VifError::InvalidConfig(_)));
        assert!(f.pool.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_failure_stops_before_plug() {
        let f = fixture(VifOptions::default()).await;
        f.pool.add_vm("vm", PowerState::Halted);
        let vm = VmHandle::load(&f.conn, "vm").await.unwrap();
        let mut vif = single_vif(&f, json!({"network_name_label": "storage"})).await.with_vm(vm);
        let injected = XenApiError::api("MAC_INVALID", ["zz"]);
        f.pool.fail_next("VIF.create", injected.clone());
        f.pool.clear_calls();

        let err = create_vif(&f.conn, &mut vif).await.unwrap_err();

        assert!(matches!(err, VifError::Remote(ref e) if *e == injected));
        assert_eq!(f.pool.calls(), vec!["VIF.create"]);
        assert!(vif.vif_ref.is_none());
        assert_eq!(vif.phase, VifPhase::Resolved);
    }

    #[tokio::test]
    async fn test_plug_failure_keeps_created_vif() {
        let f = fixture(VifOptions::default()).await;
        let vm_ref = f.pool.add_vm("vm", PowerState::Halted);
        let vm = VmHandle::load(&f.conn, "vm").await.unwrap();
        let mut vif = single_vif(&f, json!({"network_name_label": "storage"})).await.with_vm(vm);
        let injected = XenApiError::api("VM_BAD_POWER_STATE", ["OpaqueRef:vm", "running", "halted"]);
        f.pool.fail_next("VIF.plug", injected.clone());

        let err = create_vif(&f.conn, &mut vif).await.unwrap_err();

        assert!(matches!(err, VifError::Remote(ref e) if *e == injected));
        let vif_ref = vif.vif_ref.clone().expect("created VIF keeps its reference");
        assert_eq!(vif.phase, VifPhase::Created);
        assert!(f.pool.vif(&vif_ref).is_some());
        assert_eq!(f.pool.vm(&vm_ref).unwrap().vifs, vec![vif_ref]);
        assert!(!f.pool.calls().contains(&"VIF.destroy".to_string()));
    }

    #[tokio::test]
    async fn test_refresh_failure_best_effort_still_plugs() {
        let f = fixture(VifOptions::default()).await;
        f.pool.add_vm("vm", PowerState::Halted);
        let vm = VmHandle::load(&f.conn, "vm").await.unwrap();
        let mut vif = single_vif(&f, json!({"network_name_label": "storage"})).await.with_vm(vm);
        f.pool.fail_next("VIF.get_record", XenApiError::Transport("timeout".to_string()));

        create_vif(&f.conn, &mut vif).await.unwrap();

        assert_eq!(vif.phase, VifPhase::Plugged);
        // Pool-assigned MAC was never read back.
        assert_eq!(vif.mac, "");
        assert_eq!(vif.uuid, None);
    }

    #[tokio::test]
    async fn test_refresh_failure_strict_aborts_before_plug() {
        let options = VifOptions {
            refresh_policy: RefreshPolicy::Strict,
            ..VifOptions::default()
        };
        let f = fixture(options).await;
        f.pool.add_vm("vm", PowerState::Halted);
        let vm = VmHandle::load(&f.conn, "vm").await.unwrap();
        let mut vif = single_vif(&f, json!({"network_name_label": "storage"})).await.with_vm(vm);
        f.pool.fail_next("VIF.get_record", XenApiError::Transport("timeout".to_string()));
        f.pool.clear_calls();

        let err = create_vif(&f.conn, &mut vif).await.unwrap_err();

        assert!(matches!(err, VifError::Remote(XenApiError::Transport(_))));
        assert_eq!(f.pool.calls(), vec!["VIF.create", "VIF.get_record"]);
        assert_eq!(vif.phase, VifPhase::Created);
        assert!(vif.vif_ref.is_some());
    }

    #[tokio::test]
    async fn test_read_state_and_destroy() {
        let f = fixture(VifOptions::default()).await;
        let vm_ref = f.pool.add_vm("vm", PowerState::Halted);
        let vm = VmHandle::load(&f.conn, "vm").await.unwrap();
        let mut vif = single_vif(
            &f,
            json!({"network_name_label": "storage", "mac": "02:11:22:33:44:55", "mtu": 9000, "device": 4}),
        )
        .await
        .with_vm(vm);
        create_vif(&f.conn, &mut vif).await.unwrap();
        let vif_ref = vif.vif_ref.clone().unwrap();

        let state = read_vif_state(&f.conn, &vif_ref).await.unwrap();
        assert_eq!(state, vif.state());
        assert_eq!(state.network_name_label, "storage");
        assert_eq!(state.mac, "02:11:22:33:44:55");
        assert!(!state.mac_autogenerated);
        assert_eq!(state.mtu, 9000);
        assert_eq!(state.device, 4);

        f.pool.clear_calls();
        destroy_vif(&f.conn, &mut vif).await.unwrap();
        assert_eq!(f.pool.calls(), vec!["VIF.get_record", "VIF.unplug", "VIF.destroy"]);
        assert!(vif.vif_ref.is_none());
        assert!(f.pool.vm(&vm_ref).unwrap().vifs.is_empty());

        // Nothing left to tear down.
        f.pool.clear_calls();
        destroy_vif(&f.conn, &mut vif).await.unwrap();
        assert!(f.pool.calls().is_empty());
    }

    #[test]
    fn test_state_keys_match_schema() {
        let state = VifState {
            network_name_label: "lan".to_string(),
            network_uuid: "n".to_string(),
            mac: String::new(),
            mtu: 1500,
            mac_autogenerated: true,
            device: 0,
        };
        let value = serde_json::to_value(&state).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();

        assert_eq!(keys.len(), VIF_SCHEMA.len());
        for key in keys {
            assert!(VIF_SCHEMA.iter().any(|f| f.name == key), "{}", key);
        }
    }

    #[test]
    fn test_unparsable_device_is_invalid_state() {
        let record = VifRecord {
            uuid: "u".to_string(),
            device: "eth1".to_string(),
            network: "OpaqueRef:net".into(),
            vm: "OpaqueRef:vm".into(),
            mac: String::new(),
            mtu: 1500,
            mac_autogenerated: true,
            currently_attached: false,
            other_config: Default::default(),
            qos_algorithm_type: String::new(),
            qos_algorithm_params: Default::default(),
        };
        let err = VifState::from_records(&record, &NetworkRecord::default()).unwrap_err();
        assert!(matches!(err, VifError::InvalidState(_)));
    }
}
