//! Error types for the VIF resource manager.

use thiserror::Error;

/// Failure reported by (or while talking to) the XenAPI endpoint.
///
/// Values of this type are surfaced to callers verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XenApiError {
    /// The pool rejected the call. `code` is the XenAPI error code
    /// (e.g. `HANDLE_INVALID`), `params` its parameters.
    #[error("XenAPI call failed: {code} {params:?}")]
    Api { code: String, params: Vec<String> },

    /// The request never produced a response (connect, TLS, timeout).
    #[error("XenAPI transport error: {0}")]
    Transport(String),

    /// A response arrived but could not be decoded.
    #[error("Malformed XenAPI response: {0}")]
    Protocol(String),

    /// Client-side failure unrelated to the pool.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl XenApiError {
    /// Build an API failure from a code and its parameters.
    pub fn api<I, S>(code: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Api {
            code: code.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// XenAPI error code, if this is an API failure.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Errors that can occur while ingesting, creating or reading VIFs.
#[derive(Error, Debug)]
pub enum VifError {
    /// The owning VM is running; VIFs are only attached to stopped VMs.
    #[error("VM {name:?}({uuid:?}) is in running state")]
    VmRunning { name: String, uuid: String },

    /// No network matches the given UUID or name label.
    #[error("Network not found: {0}")]
    NetworkNotFound(String),

    /// A name label lookup matched more than one network.
    #[error("Network name label {name:?} matches {count} networks")]
    AmbiguousNetwork { name: String, count: usize },

    /// No VM matches the given UUID or name label.
    #[error("VM not found: {0}")]
    VmNotFound(String),

    /// A name label lookup matched more than one VM.
    #[error("VM name label {name:?} matches {count} VMs")]
    AmbiguousVm { name: String, count: usize },

    /// Configuration failed schema or consistency checks.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The pool returned data this crate cannot interpret.
    #[error("Invalid remote state: {0}")]
    InvalidState(String),

    /// Remote call failure, passed through unchanged.
    #[error(transparent)]
    Remote(#[from] XenApiError),
}

/// Result type alias for XenAPI client calls.
pub type ApiResult<T> = std::result::Result<T, XenApiError>;

/// Result type alias for VIF manager operations.
pub type Result<T> = std::result::Result<T, VifError>;
