//! Subcommand implementations.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use xenvif_provider::{
    create_vif, destroy_vif_ref, ingest_vifs, read_vif_state, Connection, JsonRpcXenApi,
    MockXenApi, PoolNetworkResolver, PowerState, VifRef, VifState, VmHandle, XenApi,
};

use crate::cli::Command;
use crate::config::{Backend, Config};

/// Network and VM names seeded into the `--dev` mock pool.
pub const DEV_NETWORK: &str = "Pool-wide network";
pub const DEV_VM: &str = "dev-vm";

/// A VIF created by `apply`, as printed to stdout.
#[derive(Debug, Serialize)]
pub struct AppliedVif {
    pub vif_ref: VifRef,
    pub uuid: Option<String>,
    #[serde(flatten)]
    pub state: VifState,
}

/// Build the XenAPI client selected by configuration.
pub fn build_client(config: &Config) -> Result<Arc<dyn XenApi>> {
    match config.xenapi.backend {
        Backend::Mock => {
            let pool = MockXenApi::new();
            pool.add_network(DEV_NETWORK, 1500);
            pool.add_vm(DEV_VM, PowerState::Halted);
            Ok(Arc::new(pool))
        }
        Backend::JsonRpc => {
            let client = JsonRpcXenApi::new(
                &config.xenapi.url,
                Duration::from_secs(config.xenapi.timeout_secs),
                config.xenapi.accept_invalid_certs,
            )?;
            Ok(Arc::new(client))
        }
    }
}

/// Log in, run one subcommand, log out.
pub async fn run(config: Config, command: Command) -> Result<()> {
    let client = build_client(&config)?;
    let conn = Connection::open(
        client,
        &config.xenapi.username,
        &config.xenapi.password,
        config.vif.clone(),
    )
    .await
    .with_context(|| format!("Failed to log in to {}", config.xenapi.url))?;

    let result = match command {
        Command::Apply { vm, vifs } => apply(&conn, &vm, &vifs).await.and_then(|applied| {
            print!("{}", serde_yaml::to_string(&applied)?);
            Ok(())
        }),
        Command::Show { vif } => read_vif_state(&conn, &VifRef::new(vif))
            .await
            .context("Failed to read VIF")
            .and_then(|state| {
                print!("{}", serde_yaml::to_string(&state)?);
                Ok(())
            }),
        Command::Destroy { vif } => destroy_vif_ref(&conn, &VifRef::new(vif))
            .await
            .context("Failed to destroy VIF"),
    };

    if let Err(e) = conn.close().await {
        warn!(error = %e, "Failed to log out");
    }

    result
}

/// Create every VIF block in `vifs_path` on `vm_id`, in file order.
///
/// Stops at the first failure; VIFs created before it are left in place.
pub async fn apply(conn: &Connection, vm_id: &str, vifs_path: &str) -> Result<Vec<AppliedVif>> {
    let content = std::fs::read_to_string(vifs_path)
        .with_context(|| format!("Failed to read VIF file: {}", vifs_path))?;
    let records: Vec<serde_json::Value> = serde_yaml::from_str(&content)
        .with_context(|| format!("VIF file {} must hold a list of VIF blocks", vifs_path))?;

    let mut vm = VmHandle::load(conn, vm_id)
        .await
        .with_context(|| format!("Failed to load VM {}", vm_id))?;
    let descriptors = ingest_vifs(conn, &PoolNetworkResolver, &records)
        .await
        .context("Failed to ingest VIF blocks")?;

    info!(
        vm_uuid = %vm.uuid,
        power_state = %vm.power_state,
        count = descriptors.len(),
        "Applying VIFs"
    );

    let mut applied = Vec::with_capacity(descriptors.len());
    for (index, descriptor) in descriptors.into_iter().enumerate() {
        let mut vif = descriptor.with_vm(vm.clone());
        if let Err(e) = create_vif(conn, &mut vif).await {
            if let Some(vif_ref) = &vif.vif_ref {
                warn!(index, vif = %vif_ref, "VIF left created but unplugged");
            }
            return Err(e).with_context(|| format!("Failed to create VIF block {}", index));
        }

        // The next unset device slot comes from the refreshed VIF count.
        vm = vm.reload(conn).await?;

        if let Some(vif_ref) = vif.vif_ref.clone() {
            applied.push(AppliedVif {
                vif_ref,
                uuid: vif.uuid.clone(),
                state: vif.state(),
            });
        }
    }

    Ok(applied)
}
