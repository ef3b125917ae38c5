//! Authenticated XenAPI connection and per-connection VIF options.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::Result;
use crate::traits::XenApi;
use crate::types::SessionRef;

/// Default MTU applied when a VIF block does not set one.
pub const DEFAULT_MTU: u32 = 1500;

/// How a failed post-create refresh of a VIF is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
    /// Log a warning and continue to plug; remotely assigned fields stay stale.
    #[default]
    BestEffort,
    /// Abort creation with the refresh error. The VIF stays created.
    Strict,
}

/// Options governing VIF ingestion and creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VifOptions {
    /// Post-create refresh failure handling
    pub refresh_policy: RefreshPolicy,
    /// MTU used when a VIF block has none
    pub default_mtu: u32,
}

impl Default for VifOptions {
    fn default() -> Self {
        Self {
            refresh_policy: RefreshPolicy::default(),
            default_mtu: DEFAULT_MTU,
        }
    }
}

/// An authenticated session paired with the client that issued it.
pub struct Connection {
    client: Arc<dyn XenApi>,
    session: SessionRef,
    options: VifOptions,
}

impl Connection {
    /// Log in to the pool and wrap the resulting session.
    #[instrument(skip(client, password, options))]
    pub async fn open(
        client: Arc<dyn XenApi>,
        username: &str,
        password: &str,
        options: VifOptions,
    ) -> Result<Self> {
        let session = client.login(username, password).await?;
        info!("XenAPI session established");
        Ok(Self::with_session(client, session, options))
    }

    /// Wrap an existing session.
    pub fn with_session(client: Arc<dyn XenApi>, session: SessionRef, options: VifOptions) -> Self {
        Self {
            client,
            session,
            options,
        }
    }

    pub fn client(&self) -> &dyn XenApi {
        self.client.as_ref()
    }

    pub fn session(&self) -> &SessionRef {
        &self.session
    }

    pub fn options(&self) -> &VifOptions {
        &self.options
    }

    /// Log out, consuming the connection.
    pub async fn close(self) -> Result<()> {
        self.client.logout(&self.session).await?;
        info!("XenAPI session closed");
        Ok(())
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
