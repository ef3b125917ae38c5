//! Mock XenAPI pool for testing and development.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument};

use crate::error::{ApiResult, XenApiError};
use crate::traits::XenApi;
use crate::types::*;

/// Mock XenAPI client backed by an in-memory pool.
///
/// This client simulates the pool-side behaviour of the calls in [`XenApi`]
/// without a real XenServer/XCP-ng host. Useful for:
/// - Unit and integration testing
/// - `--dev` runs of the CLI
///
/// Every call is recorded (by XenAPI message name) so tests can assert
/// which remote operations happened and in what order. Failures can be
/// injected per message with [`MockXenApi::fail_next`].
pub struct MockXenApi {
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    sessions: HashSet<SessionRef>,
    networks: HashMap<NetworkRef, NetworkRecord>,
    vms: HashMap<VmRef, VmRecord>,
    vifs: HashMap<VifRef, VifRecord>,
    calls: Vec<String>,
    create_requests: Vec<VifRecord>,
    failures: HashMap<String, XenApiError>,
}

fn new_ref() -> String {
    format!("OpaqueRef:{}", uuid::Uuid::new_v4())
}

fn handle_invalid(class: &str, reference: &impl std::fmt::Display) -> XenApiError {
    XenApiError::api("HANDLE_INVALID", [class.to_string(), reference.to_string()])
}

/// Generate a random unicast MAC address with the locally administered bit set.
fn generate_mac_address() -> String {
    let mut bytes: [u8; 6] = rand::random();
    bytes[0] = (bytes[0] & 0xfc) | 0x02;
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

impl MockXenApi {
    /// Create an empty mock pool.
    pub fn new() -> Self {
        info!("Creating mock XenAPI pool");
        Self {
            state: Mutex::new(MockState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the call, consume an injected failure and validate the session.
    fn enter(&self, method: &str, session: Option<&SessionRef>) -> ApiResult<MutexGuard<'_, MockState>> {
        let mut state = self.state();
        state.calls.push(method.to_string());

        if let Some(err) = state.failures.remove(method) {
            debug!(method, "Returning injected failure");
            return Err(err);
        }

        if let Some(session) = session {
            if !state.sessions.contains(session) {
                return Err(XenApiError::api("SESSION_INVALID", [session.to_string()]));
            }
        }

        Ok(state)
    }

    // =========================================================================
    // Pool setup and inspection
    // =========================================================================

    /// Add a network and return its reference.
    pub fn add_network(&self, name_label: &str, mtu: u32) -> NetworkRef {
        let network = NetworkRef::new(new_ref());
        let record = NetworkRecord {
            uuid: uuid::Uuid::new_v4().to_string(),
            name_label: name_label.to_string(),
            bridge: format!("xenbr{}", self.state().networks.len()),
            mtu,
        };
        self.state().networks.insert(network.clone(), record);
        network
    }

    /// Add a VM with no VIFs and return its reference.
    pub fn add_vm(&self, name_label: &str, power_state: PowerState) -> VmRef {
        let vm = VmRef::new(new_ref());
        let record = VmRecord {
            uuid: uuid::Uuid::new_v4().to_string(),
            name_label: name_label.to_string(),
            power_state,
            vifs: Vec::new(),
        };
        self.state().vms.insert(vm.clone(), record);
        vm
    }

    /// Change a VM's power state.
    pub fn set_power_state(&self, vm: &VmRef, power_state: PowerState) {
        if let Some(record) = self.state().vms.get_mut(vm) {
            record.power_state = power_state;
        }
    }

    /// Make the next call to `method` (e.g. `"VIF.plug"`) fail with `err`.
    pub fn fail_next(&self, method: &str, err: XenApiError) {
        self.state().failures.insert(method.to_string(), err);
    }

    /// XenAPI messages received so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Records received by `VIF.create`, as sent, in order.
    pub fn create_requests(&self) -> Vec<VifRecord> {
        self.state().create_requests.clone()
    }

    /// Forget the recorded call history and create requests.
    pub fn clear_calls(&self) {
        let mut state = self.state();
        state.calls.clear();
        state.create_requests.clear();
    }

    pub fn network(&self, network: &NetworkRef) -> Option<NetworkRecord> {
        self.state().networks.get(network).cloned()
    }

    pub fn vm(&self, vm: &VmRef) -> Option<VmRecord> {
        self.state().vms.get(vm).cloned()
    }

    pub fn vif(&self, vif: &VifRef) -> Option<VifRecord> {
        self.state().vifs.get(vif).cloned()
    }
}

impl Default for MockXenApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl XenApi for MockXenApi {
    async fn login(&self, username: &str, _password: &str) -> ApiResult<SessionRef> {
        let mut state = self.enter("session.login_with_password", None)?;

        if username.is_empty() {
            return Err(XenApiError::api(
                "SESSION_AUTHENTICATION_FAILED",
                [username, "Authentication failure"],
            ));
        }

        let session = SessionRef::new(new_ref());
        state.sessions.insert(session.clone());
        debug!(username, "Mock session opened");
        Ok(session)
    }

    async fn logout(&self, session: &SessionRef) -> ApiResult<()> {
        let mut state = self.enter("session.logout", Some(session))?;
        state.sessions.remove(session);
        Ok(())
    }

    async fn network_get_by_uuid(&self, session: &SessionRef, uuid: &str) -> ApiResult<NetworkRef> {
        let state = self.enter("network.get_by_uuid", Some(session))?;
        state
            .networks
            .iter()
            .find(|(_, record)| record.uuid == uuid)
            .map(|(network, _)| network.clone())
            .ok_or_else(|| XenApiError::api("UUID_INVALID", ["network", uuid]))
    }

    async fn network_get_by_name_label(
        &self,
        session: &SessionRef,
        name_label: &str,
    ) -> ApiResult<Vec<NetworkRef>> {
        let state = self.enter("network.get_by_name_label", Some(session))?;
        Ok(state
            .networks
            .iter()
            .filter(|(_, record)| record.name_label == name_label)
            .map(|(network, _)| network.clone())
            .collect())
    }

    async fn network_get_record(
        &self,
        session: &SessionRef,
        network: &NetworkRef,
    ) -> ApiResult<NetworkRecord> {
        let state = self.enter("network.get_record", Some(session))?;
        state
            .networks
            .get(network)
            .cloned()
            .ok_or_else(|| handle_invalid("network", network))
    }

    async fn vm_get_by_uuid(&self, session: &SessionRef, uuid: &str) -> ApiResult<VmRef> {
        let state = self.enter("VM.get_by_uuid", Some(session))?;
        state
            .vms
            .iter()
            .find(|(_, record)| record.uuid == uuid)
            .map(|(vm, _)| vm.clone())
            .ok_or_else(|| XenApiError::api("UUID_INVALID", ["VM", uuid]))
    }

    async fn vm_get_by_name_label(&self, session: &SessionRef, name_label: &str) -> ApiResult<Vec<VmRef>> {
        let state = self.enter("VM.get_by_name_label", Some(session))?;
        Ok(state
            .vms
            .iter()
            .filter(|(_, record)| record.name_label == name_label)
            .map(|(vm, _)| vm.clone())
            .collect())
    }

    async fn vm_get_record(&self, session: &SessionRef, vm: &VmRef) -> ApiResult<VmRecord> {
        let state = self.enter("VM.get_record", Some(session))?;
        state.vms.get(vm).cloned().ok_or_else(|| handle_invalid("VM", vm))
    }

    #[instrument(skip(self, session, record), fields(vm = %record.vm, device = %record.device))]
    async fn vif_create(&self, session: &SessionRef, record: &VifRecord) -> ApiResult<VifRef> {
        let mut state = self.enter("VIF.create", Some(session))?;
        state.create_requests.push(record.clone());

        if !state.networks.contains_key(&record.network) {
            return Err(handle_invalid("network", &record.network));
        }
        let attached = state
            .vms
            .get(&record.vm)
            .ok_or_else(|| handle_invalid("VM", &record.vm))?
            .vifs
            .clone();

        let slot_taken = attached
            .iter()
            .filter_map(|vif| state.vifs.get(vif))
            .any(|existing| existing.device == record.device);
        if slot_taken {
            return Err(XenApiError::api("DEVICE_ALREADY_EXISTS", [record.device.as_str()]));
        }

        let mut stored = record.clone();
        stored.uuid = uuid::Uuid::new_v4().to_string();
        stored.currently_attached = false;
        if record.mac_autogenerated || record.mac.is_empty() {
            stored.mac = generate_mac_address();
            stored.mac_autogenerated = true;
        }

        let vif = VifRef::new(new_ref());
        state.vifs.insert(vif.clone(), stored);
        if let Some(vm) = state.vms.get_mut(&record.vm) {
            vm.vifs.push(vif.clone());
        }

        info!(vif = %vif, "Mock VIF created");
        Ok(vif)
    }

    async fn vif_get_record(&self, session: &SessionRef, vif: &VifRef) -> ApiResult<VifRecord> {
        let state = self.enter("VIF.get_record", Some(session))?;
        state.vifs.get(vif).cloned().ok_or_else(|| handle_invalid("VIF", vif))
    }

    #[instrument(skip(self, session), fields(vif = %vif))]
    async fn vif_plug(&self, session: &SessionRef, vif: &VifRef) -> ApiResult<()> {
        let mut state = self.enter("VIF.plug", Some(session))?;
        let record = state.vifs.get_mut(vif).ok_or_else(|| handle_invalid("VIF", vif))?;

        if record.currently_attached {
            return Err(XenApiError::api("DEVICE_ALREADY_ATTACHED", [vif.as_str()]));
        }
        record.currently_attached = true;

        info!("Mock VIF plugged");
        Ok(())
    }

    #[instrument(skip(self, session), fields(vif = %vif))]
    async fn vif_unplug(&self, session: &SessionRef, vif: &VifRef) -> ApiResult<()> {
        let mut state = self.enter("VIF.unplug", Some(session))?;
        let record = state.vifs.get_mut(vif).ok_or_else(|| handle_invalid("VIF", vif))?;

        if !record.currently_attached {
            return Err(XenApiError::api("DEVICE_ALREADY_DETACHED", [vif.as_str()]));
        }
        record.currently_attached = false;

        info!("Mock VIF unplugged");
        Ok(())
    }

    #[instrument(skip(self, session), fields(vif = %vif))]
    async fn vif_destroy(&self, session: &SessionRef, vif: &VifRef) -> ApiResult<()> {
        let mut state = self.enter("VIF.destroy", Some(session))?;
        let record = state.vifs.get(vif).ok_or_else(|| handle_invalid("VIF", vif))?;

        if record.currently_attached {
            return Err(XenApiError::api(
                "OPERATION_NOT_ALLOWED",
                ["VIF is currently attached"],
            ));
        }

        let owner = record.vm.clone();
        state.vifs.remove(vif);
        if let Some(vm) = state.vms.get_mut(&owner) {
            vm.vifs.retain(|attached| attached != vif);
        }

        info!("Mock VIF destroyed");
        Ok(())
    }
}
