//! Error type for discovery, negotiation, and callback chains.
//!
//! A socket whose listener is not accepting yet is never an error: the
//! scanner swallows it and retries on the next pass.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use vmhooks_core::error::{AppError, ErrorKind};

use crate::hooks::definitions::HookName;
use crate::protocol::version::ProtocolVersion;

/// Errors raised by the hook manager.
#[derive(Debug, Error)]
pub enum HookError {
    // --- Discovery-fatal ---
    /// The shared socket directory could not be listed.
    #[error("Failed to read hook socket directory {dir}: {source}")]
    ReadSocketDir {
        /// Directory that was scanned.
        dir: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The Info call failed after the socket accepted a connection.
    #[error("Info call to hook sidecar {socket} failed: {source}")]
    Info {
        /// Socket that answered the connection.
        socket: PathBuf,
        /// Transport-level failure.
        #[source]
        source: Box<HookError>,
    },

    /// The plugin advertised no revision the manager understands.
    #[error(
        "Hook sidecar '{plugin}' at {socket} does not expose a supported version. \
         Exposed versions: {advertised:?}, supported versions: {supported:?}"
    )]
    UnsupportedVersion {
        /// Plugin name from its Info answer.
        plugin: String,
        /// Socket of the plugin.
        socket: PathBuf,
        /// Versions the plugin advertised.
        advertised: Vec<String>,
        /// Versions the manager supports, newest first.
        supported: Vec<String>,
    },

    /// Fewer sockets than expected became connectable before the deadline.
    #[error(
        "Failed to collect all expected sidecar hook sockets within {timeout:?}: \
         {resolved} of {expected} resolved"
    )]
    CollectTimeout {
        /// Number of sidecars requested.
        expected: usize,
        /// Number of sidecars resolved before the deadline.
        resolved: usize,
        /// Overall discovery deadline.
        timeout: Duration,
    },

    // --- Invocation-fatal ---
    /// Connecting to a resolved plugin failed.
    #[error("Failed to connect to hook sidecar socket {socket}: {source}")]
    Dial {
        /// Socket of the plugin.
        socket: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The RPC did not complete within its deadline.
    #[error("{method} on {socket} timed out after {timeout:?}")]
    CallTimeout {
        /// Socket of the plugin.
        socket: PathBuf,
        /// Method that timed out.
        method: String,
        /// Per-call deadline.
        timeout: Duration,
    },

    /// The plugin answered with a JSON-RPC error object.
    #[error("{method} on {socket} failed with code {code}: {message}")]
    Rpc {
        /// Socket of the plugin.
        socket: PathBuf,
        /// Method that failed.
        method: String,
        /// JSON-RPC error code.
        code: i32,
        /// Error message reported by the plugin.
        message: String,
    },

    /// A frame could not be written, read, or decoded.
    #[error("Malformed exchange with hook sidecar {socket}: {message}")]
    Protocol {
        /// Socket of the plugin.
        socket: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// First-boot data came back in neither the canonical nor the legacy shape.
    #[error("Hook sidecar {socket} returned unusable first-boot data: {message}")]
    InvalidResponse {
        /// Socket of the plugin.
        socket: PathBuf,
        /// Why both shapes were rejected.
        message: String,
    },

    // --- Invariant violation ---
    /// A callback was requested from a revision that does not expose it.
    #[error("Protocol {version} does not expose the {callback} callback")]
    UnsupportedCallback {
        /// Negotiated revision of the plugin.
        version: ProtocolVersion,
        /// Requested callback.
        callback: HookName,
    },

    // --- Boundary ---
    /// The sidecar descriptor annotation is malformed.
    #[error("Invalid hook sidecar list: {0}")]
    SidecarList(String),

    /// Marshalling a payload failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<HookError> for AppError {
    fn from(err: HookError) -> Self {
        let kind = match &err {
            HookError::ReadSocketDir { .. } | HookError::Info { .. } => ErrorKind::Discovery,
            HookError::UnsupportedVersion { .. } => ErrorKind::Negotiation,
            HookError::CollectTimeout { .. } | HookError::CallTimeout { .. } => ErrorKind::Timeout,
            HookError::Dial { .. } | HookError::Protocol { .. } => ErrorKind::Transport,
            HookError::Rpc { .. } | HookError::InvalidResponse { .. } => ErrorKind::Callback,
            HookError::UnsupportedCallback { .. } => ErrorKind::Invariant,
            HookError::SidecarList(_) => ErrorKind::Validation,
            HookError::Serialization(_) => ErrorKind::Serialization,
        };
        AppError::with_source(kind, err.to_string(), err)
    }
}
