//! Sidecar (plugin-side) configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::hooks::default_socket_dir;

/// Where a sidecar built on the SDK binds its socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SidecarConfig {
    /// Shared directory the manager scans.
    #[serde(default = "default_socket_dir")]
    pub socket_dir: PathBuf,
    /// Socket file name. Defaults to `<plugin name>.sock` when unset.
    #[serde(default)]
    pub socket_name: Option<String>,
}

impl SidecarConfig {
    /// Full socket path for a plugin with the given name.
    pub fn socket_path(&self, plugin_name: &str) -> PathBuf {
        match &self.socket_name {
            Some(name) => self.socket_dir.join(name),
            None => self.socket_dir.join(format!("{plugin_name}.sock")),
        }
    }
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            socket_dir: default_socket_dir(),
            socket_name: None,
        }
    }
}
