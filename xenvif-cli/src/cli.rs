//! Command-line argument parsing.

use clap::{Parser, Subcommand};

/// xenvif - XenAPI virtual network interface manager
#[derive(Parser, Debug)]
#[command(name = "xenvif")]
#[command(about = "xenvif - attach and inspect VIFs on a Xen pool via XenAPI")]
#[command(version)]
pub struct Args {
    /// Path to configuration file (optional, defaults used if not found)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Pool master URL (e.g. https://xen01.example.com)
    #[arg(long)]
    pub url: Option<String>,

    /// XenAPI user name
    #[arg(long)]
    pub username: Option<String>,

    /// XenAPI password
    #[arg(long, env = "XENVIF_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Enable development mode (in-memory mock pool)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create and plug the VIFs described in a YAML file on a stopped VM
    Apply {
        /// VM UUID or name label
        #[arg(long)]
        vm: String,

        /// YAML file holding a list of VIF blocks
        #[arg(long)]
        vifs: String,
    },

    /// Print the state of one VIF
    Show {
        /// VIF opaque reference
        #[arg(long)]
        vif: String,
    },

    /// Unplug and destroy one VIF
    Destroy {
        /// VIF opaque reference
        #[arg(long)]
        vif: String,
    },
}
