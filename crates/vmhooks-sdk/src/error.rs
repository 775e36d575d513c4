//! Sidecar-side errors.

use std::path::PathBuf;

use thiserror::Error;
use vmhooks_core::error::{AppError, ErrorKind};

/// Errors raised while serving the hook protocol.
#[derive(Debug, Error)]
pub enum SidecarError {
    /// The socket could not be bound.
    #[error("Failed to bind hook socket {path}: {source}")]
    Bind {
        /// Socket path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Accepting or serving a connection failed.
    #[error("Hook server error: {0}")]
    Serve(#[from] std::io::Error),

    /// A callback implementation refused the request.
    #[error("Callback failed: {0}")]
    Callback(String),

    /// A payload could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SidecarError {
    /// Convenience constructor for callback failures.
    pub fn callback(message: impl Into<String>) -> Self {
        Self::Callback(message.into())
    }
}

impl From<SidecarError> for AppError {
    fn from(err: SidecarError) -> Self {
        let kind = match &err {
            SidecarError::Bind { .. } | SidecarError::Serve(_) => ErrorKind::Transport,
            SidecarError::Callback(_) => ErrorKind::Callback,
            SidecarError::Serialization(_) => ErrorKind::Serialization,
        };
        AppError::with_source(kind, err.to_string(), err)
    }
}
