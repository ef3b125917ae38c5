//! Network module: identifying and resolving the network a VIF attaches to.
//!
//! This module provides:
//! - `NetworkDescriptor`, the name label / UUID pair taken from configuration
//! - `NetworkHandle`, a resolved network shared between VIF descriptors
//! - The `NetworkResolver` seam and its XenAPI-backed implementation

mod resolver;
mod types;

pub use resolver::{NetworkResolver, PoolNetworkResolver};
pub use types::*;
