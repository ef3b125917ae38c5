//! # xenvif
//!
//! Attaches virtual network interfaces to VMs on a Xen pool through XenAPI,
//! and reads their state back.
//!
//! ## Usage
//! ```bash
//! xenvif --config /etc/xenvif/xenvif.yaml apply --vm web-01 --vifs vifs.yaml
//! xenvif show --vif OpaqueRef:5ba8...
//! xenvif --dev apply --vm dev-vm --vifs vifs.yaml
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

mod cli;
mod commands;
mod config;

use cli::Args;
use config::{Config, DEFAULT_CONFIG_PATH};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration before logging so its level/format can apply
    let (config, loaded_from) = match &args.config {
        Some(config_path) => (Config::load(config_path)?.with_cli_overrides(&args), Some(config_path.as_str())),
        None => match Config::load(DEFAULT_CONFIG_PATH) {
            Ok(cfg) => (cfg.with_cli_overrides(&args), Some(DEFAULT_CONFIG_PATH)),
            Err(_) => (Config::default_with_cli(&args), None),
        },
    };

    // Initialize logging; an explicit --log-level wins over the config file
    let level = if args.log_level != "info" { &args.log_level } else { &config.logging.level };
    if config.logging.json {
        xenvif_common::init_logging_json(level)?;
    } else {
        xenvif_common::init_logging(level)?;
    }

    info!(version = env!("CARGO_PKG_VERSION"), "Starting xenvif");
    match loaded_from {
        Some(path) => info!(config_path = %path, "Configuration loaded"),
        None => info!("No config file found, using CLI arguments and defaults"),
    }
    info!(
        url = %config.xenapi.url,
        backend = ?config.xenapi.backend,
        refresh_policy = ?config.vif.refresh_policy,
        "xenvif configured"
    );

    if let Err(e) = commands::run(config, args.command).await {
        error!(error = %format!("{:#}", e), "Command failed");
        return Err(e);
    }

    Ok(())
}
