//! # xenvif Provider
//!
//! VIF (virtual network interface) resource management for Xen pools via XenAPI.
//!
//! Declarative VIF blocks are decoded against a fixed schema, their networks
//! resolved, and the resulting descriptors created and plugged on a stopped VM.
//! Remote state can be read back into the same declarative shape.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │      VIF manager (vif.rs)               │
//! │  ingest_vifs, create_vif, read, destroy │
//! └─────────────────────┬───────────────────┘
//!                       │ Connection (session + options)
//!                       ▼
//! ┌─────────────────────────────────────────┐
//! │            XenApi trait                 │
//! └─────────────────────┬───────────────────┘
//!         ┌─────────────┴─────────────┐
//!         ▼                           ▼
//! ┌───────────────────┐     ┌───────────────────┐
//! │   JsonRpcXenApi   │     │    MockXenApi     │
//! │ (pool /jsonrpc)   │     │   (in-memory)     │
//! └───────────────────┘     └───────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use xenvif_provider::*;
//!
//! let pool = Arc::new(MockXenApi::new());
//! let conn = Connection::open(pool, "root", "secret", VifOptions::default()).await?;
//!
//! let vm = VmHandle::load(&conn, "web-01").await?;
//! let blocks = vec![serde_json::json!({"network_name_label": "Pool-wide network"})];
//! for vif in ingest_vifs(&conn, &PoolNetworkResolver, &blocks).await? {
//!     let mut vif = vif.with_vm(vm.clone());
//!     create_vif(&conn, &mut vif).await?;
//! }
//! ```

pub mod connection;
pub mod error;
pub mod jsonrpc;
pub mod mock;
pub mod network;
pub mod schema;
pub mod traits;
pub mod types;
pub mod vif;
pub mod vm;

pub use connection::{Connection, RefreshPolicy, VifOptions, DEFAULT_MTU};
pub use error::{VifError, XenApiError};
pub use jsonrpc::JsonRpcXenApi;
pub use mock::MockXenApi;
pub use network::{NetworkDescriptor, NetworkHandle, NetworkResolver, PoolNetworkResolver};
pub use schema::{FieldSchema, FieldType, VifConfig, VIF_SCHEMA};
pub use traits::XenApi;
pub use types::*;
pub use vif::{
    create_vif,
    destroy_vif,
    destroy_vif_ref,
    ingest_vifs,
    read_vif_state,
    refresh_vif,
    VifDescriptor,
    VifPhase,
    VifState,
};
pub use vm::VmHandle;
