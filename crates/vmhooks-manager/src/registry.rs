//! Resolved plugins: one per sidecar socket, built once during discovery.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::HookCallbacks;
use crate::hooks::definitions::HookPoint;
use crate::protocol::version::ProtocolVersion;

/// A sidecar that answered Info and agreed on a protocol revision.
///
/// Read-only after discovery.
#[derive(Debug, Clone)]
pub struct ResolvedPlugin {
    name: String,
    socket_path: PathBuf,
    version: ProtocolVersion,
    hook_points: Vec<HookPoint>,
    discovered_at: DateTime<Utc>,
    callbacks: Arc<dyn HookCallbacks>,
}

impl ResolvedPlugin {
    /// Creates a resolved plugin. `callbacks` must speak `version`.
    pub fn new(
        name: impl Into<String>,
        socket_path: impl Into<PathBuf>,
        hook_points: Vec<HookPoint>,
        callbacks: Arc<dyn HookCallbacks>,
    ) -> Self {
        Self {
            name: name.into(),
            socket_path: socket_path.into(),
            version: callbacks.version(),
            hook_points,
            discovered_at: Utc::now(),
            callbacks,
        }
    }

    /// Plugin name from its Info answer.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Socket the plugin listens on.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Negotiated protocol revision.
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Hook points the plugin declared, as reported.
    pub fn hook_points(&self) -> &[HookPoint] {
        &self.hook_points
    }

    /// When discovery resolved this plugin.
    pub fn discovered_at(&self) -> DateTime<Utc> {
        self.discovered_at
    }

    /// Client for the negotiated revision.
    pub fn callbacks(&self) -> &Arc<dyn HookCallbacks> {
        &self.callbacks
    }

    /// Serializable snapshot for reporting.
    pub fn summary(&self) -> PluginSummary {
        PluginSummary {
            name: self.name.clone(),
            socket: self.socket_path.clone(),
            version: self.version,
            hook_points: self.hook_points.clone(),
            discovered_at: self.discovered_at,
        }
    }
}

/// Metadata about a resolved plugin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginSummary {
    /// Plugin name.
    pub name: String,
    /// Socket path.
    pub socket: PathBuf,
    /// Negotiated revision.
    pub version: ProtocolVersion,
    /// Declared hook points.
    pub hook_points: Vec<HookPoint>,
    /// Discovery time.
    pub discovered_at: DateTime<Utc>,
}
