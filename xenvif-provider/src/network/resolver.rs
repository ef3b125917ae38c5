//! Network lookup against the pool.

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::types::{NetworkDescriptor, NetworkHandle};
use crate::connection::Connection;
use crate::error::{Result, VifError};

/// Resolves a [`NetworkDescriptor`] to a concrete network.
///
/// Errors are returned as-is to the ingestion caller.
#[async_trait]
pub trait NetworkResolver: Send + Sync {
    async fn resolve(&self, conn: &Connection, descriptor: &NetworkDescriptor) -> Result<NetworkHandle>;
}

/// Resolver backed by `network.get_by_uuid` / `network.get_by_name_label`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolNetworkResolver;

#[async_trait]
impl NetworkResolver for PoolNetworkResolver {
    #[instrument(skip(self, conn), fields(network = %descriptor))]
    async fn resolve(&self, conn: &Connection, descriptor: &NetworkDescriptor) -> Result<NetworkHandle> {
        let client = conn.client();
        let session = conn.session();

        let network_ref = match (&descriptor.uuid, &descriptor.name_label) {
            (Some(uuid), _) => match client.network_get_by_uuid(session, uuid).await {
                Ok(network_ref) => network_ref,
                Err(e) if e.code() == Some("UUID_INVALID") => {
                    return Err(VifError::NetworkNotFound(descriptor.to_string()));
                }
                Err(e) => return Err(e.into()),
            },
            (None, Some(name)) => {
                let mut matches = client.network_get_by_name_label(session, name).await?;
                match matches.len() {
                    0 => return Err(VifError::NetworkNotFound(descriptor.to_string())),
                    1 => matches.remove(0),
                    count => {
                        return Err(VifError::AmbiguousNetwork {
                            name: name.clone(),
                            count,
                        })
                    }
                }
            }
            (None, None) => {
                return Err(VifError::InvalidConfig(
                    "network descriptor has neither a UUID nor a name label".to_string(),
                ))
            }
        };

        let record = client.network_get_record(session, &network_ref).await?;
        debug!(network_ref = %network_ref, uuid = %record.uuid, "Network resolved");
        Ok(NetworkHandle::from_record(network_ref, record))
    }
}
