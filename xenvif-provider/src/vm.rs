//! Owning VM lookup.

use tracing::{debug, instrument};

use crate::connection::Connection;
use crate::error::{Result, VifError};
use crate::types::{PowerState, VmRecord, VmRef};

/// The VM a VIF attaches to, as seen at lookup time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmHandle {
    pub vm_ref: VmRef,
    pub uuid: String,
    pub name_label: String,
    pub power_state: PowerState,
    /// Number of VIFs attached when the record was read
    pub vif_count: u32,
}

impl VmHandle {
    pub fn from_record(vm_ref: VmRef, record: &VmRecord) -> Self {
        Self {
            vm_ref,
            uuid: record.uuid.clone(),
            name_label: record.name_label.clone(),
            power_state: record.power_state,
            vif_count: u32::try_from(record.vifs.len()).unwrap_or(u32::MAX),
        }
    }

    /// Look a VM up by UUID, or by name label when `id` is not a UUID.
    #[instrument(skip(conn))]
    pub async fn load(conn: &Connection, id: &str) -> Result<Self> {
        let client = conn.client();
        let session = conn.session();

        let vm_ref = if uuid::Uuid::parse_str(id).is_ok() {
            match client.vm_get_by_uuid(session, id).await {
                Ok(vm_ref) => vm_ref,
                Err(e) if e.code() == Some("UUID_INVALID") => {
                    return Err(VifError::VmNotFound(id.to_string()));
                }
                Err(e) => return Err(e.into()),
            }
        } else {
            let mut matches = client.vm_get_by_name_label(session, id).await?;
            match matches.len() {
                0 => return Err(VifError::VmNotFound(id.to_string())),
                1 => matches.remove(0),
                count => {
                    return Err(VifError::AmbiguousVm {
                        name: id.to_string(),
                        count,
                    })
                }
            }
        };

        let handle = Self::fetch(conn, vm_ref).await?;
        debug!(
            uuid = %handle.uuid,
            power_state = %handle.power_state,
            vif_count = handle.vif_count,
            "VM loaded"
        );
        Ok(handle)
    }

    /// Re-read power state and VIF count from the pool.
    pub async fn reload(&self, conn: &Connection) -> Result<Self> {
        Self::fetch(conn, self.vm_ref.clone()).await
    }

    async fn fetch(conn: &Connection, vm_ref: VmRef) -> Result<Self> {
        let record = conn.client().vm_get_record(conn.session(), &vm_ref).await?;
        Ok(Self::from_record(vm_ref, &record))
    }

    pub fn is_running(&self) -> bool {
        self.power_state == PowerState::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::VifOptions;
    use crate::mock::MockXenApi;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_load_by_uuid_and_name() {
        let pool = Arc::new(MockXenApi::new());
        let vm = pool.add_vm("web-01", PowerState::Halted);
        let uuid = pool.vm(&vm).unwrap().uuid;
        let conn = Connection::open(pool.clone(), "root", "secret", VifOptions::default())
            .await
            .unwrap();

        let by_uuid = VmHandle::load(&conn, &uuid).await.unwrap();
        let by_name = VmHandle::load(&conn, "web-01").await.unwrap();
        assert_eq!(by_uuid, by_name);
        assert_eq!(by_uuid.vif_count, 0);
        assert!(!by_uuid.is_running());
    }

    #[tokio::test]
    async fn test_load_missing_and_ambiguous() {
        let pool = Arc::new(MockXenApi::new());
        pool.add_vm("twin", PowerState::Halted);
        pool.add_vm("twin", PowerState::Running);
        let conn = Connection::open(pool.clone(), "root", "secret", VifOptions::default())
            .await
            .unwrap();

        let err = VmHandle::load(&conn, "00000000-0000-0000-0000-000000000000")
            .await
            .unwrap_err();
        assert!(matches!(err, VifError::VmNotFound(_)));

        let err = VmHandle::load(&conn, "twin").await.unwrap_err();
        assert!(matches!(err, VifError::AmbiguousVm { count: 2, .. }));
    }

    #[tokio::test]
    async fn test_reload_sees_power_state_change() {
        let pool = Arc::new(MockXenApi::new());
        let vm = pool.add_vm("app", PowerState::Halted);
        let conn = Connection::open(pool.clone(), "root", "secret", VifOptions::default())
            .await
            .unwrap();

        let handle = VmHandle::load(&conn, "app").await.unwrap();
        pool.set_power_state(&vm, PowerState::Running);
        assert!(handle.reload(&conn).await.unwrap().is_running());
    }
}
