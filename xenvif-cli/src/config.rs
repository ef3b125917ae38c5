//! Configuration management for the xenvif CLI.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use xenvif_provider::VifOptions;

use crate::cli::Args;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/xenvif/xenvif.yaml";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pool connection configuration
    pub xenapi: XenApiConfig,
    /// VIF creation options
    pub vif: VifOptions,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).with_context(|| "Failed to parse config file")
    }

    /// Defaults plus CLI overrides, for runs without a config file.
    pub fn default_with_cli(args: &Args) -> Self {
        Self::default().with_cli_overrides(args)
    }

    /// Apply CLI argument overrides to the configuration.
    pub fn with_cli_overrides(mut self, args: &Args) -> Self {
        if let Some(ref url) = args.url {
            self.xenapi.url = url.clone();
        }

        if let Some(ref username) = args.username {
            self.xenapi.username = username.clone();
        }

        if let Some(ref password) = args.password {
            self.xenapi.password = password.clone();
        }

        if args.dev {
            self.xenapi.backend = Backend::Mock;
        }

        if args.json_logs {
            self.logging.json = true;
        }

        self
    }
}

/// XenAPI connection configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct XenApiConfig {
    /// Client backend
    pub backend: Backend,
    /// Pool master URL
    pub url: String,
    /// User name for `session.login_with_password`
    pub username: String,
    /// Password (prefer the XENVIF_PASSWORD environment variable)
    pub password: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Skip TLS certificate verification
    pub accept_invalid_certs: bool,
}

impl Default for XenApiConfig {
    fn default() -> Self {
        Self {
            backend: Backend::JsonRpc,
            url: "https://localhost".to_string(),
            username: "root".to_string(),
            password: String::new(),
            timeout_secs: 30,
            accept_invalid_certs: false,
        }
    }
}

/// XenAPI client backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// JSON-RPC against a real pool master
    #[default]
    JsonRpc,
    /// In-memory mock pool for testing/development
    Mock,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level used when neither RUST_LOG nor --log-level override it
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
