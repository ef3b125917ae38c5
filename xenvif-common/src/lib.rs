//! # xenvif Common
//!
//! Shared utilities for the xenvif binaries.
//!
//! ## Logging
//!
//! ```rust,no_run
//! xenvif_common::init_logging("info").unwrap();
//! tracing::info!(vm_uuid = "0d1f...", "Applying VIFs");
//! ```

pub mod logging;

pub use logging::{init_logging, init_logging_json};
