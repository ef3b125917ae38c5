//! XenAPI client abstraction trait.

use async_trait::async_trait;

use crate::error::ApiResult;
use crate::types::*;

/// The slice of the XenAPI RPC surface the VIF manager consumes.
///
/// Each method maps one-to-one onto a XenAPI message (noted in its doc).
/// Implementations return pool failures as [`XenApiError::Api`] and must not
/// retry; callers surface every error unchanged.
///
/// [`XenApiError::Api`]: crate::error::XenApiError::Api
#[async_trait]
pub trait XenApi: Send + Sync {
    // =========================================================================
    // Session
    // =========================================================================

    /// `session.login_with_password`
    async fn login(&self, username: &str, password: &str) -> ApiResult<SessionRef>;

    /// `session.logout`
    async fn logout(&self, session: &SessionRef) -> ApiResult<()>;

    // =========================================================================
    // Network
    // =========================================================================

    /// `network.get_by_uuid`
    async fn network_get_by_uuid(&self, session: &SessionRef, uuid: &str) -> ApiResult<NetworkRef>;

    /// `network.get_by_name_label`
    async fn network_get_by_name_label(
        &self,
        session: &SessionRef,
        name_label: &str,
    ) -> ApiResult<Vec<NetworkRef>>;

    /// `network.get_record`
    async fn network_get_record(
        &self,
        session: &SessionRef,
        network: &NetworkRef,
    ) -> ApiResult<NetworkRecord>;

    // =========================================================================
    // VM
    // =========================================================================

    /// `VM.get_by_uuid`
    async fn vm_get_by_uuid(&self, session: &SessionRef, uuid: &str) -> ApiResult<VmRef>;

    /// `VM.get_by_name_label`
    async fn vm_get_by_name_label(&self, session: &SessionRef, name_label: &str) -> ApiResult<Vec<VmRef>>;

    /// `VM.get_record`
    async fn vm_get_record(&self, session: &SessionRef, vm: &VmRef) -> ApiResult<VmRecord>;

    // =========================================================================
    // VIF
    // =========================================================================

    /// `VIF.create`. Returns the reference of the new (unplugged) VIF.
    async fn vif_create(&self, session: &SessionRef, record: &VifRecord) -> ApiResult<VifRef>;

    /// `VIF.get_record`
    async fn vif_get_record(&self, session: &SessionRef, vif: &VifRef) -> ApiResult<VifRecord>;

    /// `VIF.plug`
    async fn vif_plug(&self, session: &SessionRef, vif: &VifRef) -> ApiResult<()>;

    /// `VIF.unplug`
    async fn vif_unplug(&self, session: &SessionRef, vif: &VifRef) -> ApiResult<()>;

    /// `VIF.destroy`
    async fn vif_destroy(&self, session: &SessionRef, vif: &VifRef) -> ApiResult<()>;
}
