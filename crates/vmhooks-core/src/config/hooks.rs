//! Hook manager configuration: discovery deadlines and callback timeouts.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Default shared directory holding one socket per hook sidecar.
pub const DEFAULT_SOCKET_DIR: &str = "/var/run/kubevirt-hooks";

/// Settings for sidecar discovery and callback invocation.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct HooksConfig {
    /// Shared directory scanned for sidecar sockets.
    #[serde(default = "default_socket_dir")]
    pub socket_dir: PathBuf,

    /// Number of sidecars discovery waits for.
    #[serde(default)]
    pub expected_sidecars: usize,

    /// Overall discovery deadline in seconds.
    #[serde(default = "default_collect_timeout")]
    #[validate(range(min = 1, max = 3600))]
    pub collect_timeout_seconds: u64,

    /// Sleep between two directory scans in milliseconds.
    #[serde(default = "default_scan_interval")]
    #[validate(range(min = 10, max = 60000))]
    pub scan_interval_ms: u64,

    /// Bound on a single socket connection attempt in milliseconds.
    #[serde(default = "default_dial_timeout")]
    #[validate(range(min = 10, max = 60000))]
    pub dial_timeout_ms: u64,

    /// Deadline for the Info call in seconds.
    #[serde(default = "default_info_timeout")]
    #[validate(range(min = 1, max = 600))]
    pub info_timeout_seconds: u64,

    /// Deadline for each callback RPC in seconds.
    #[serde(default = "default_callback_timeout")]
    #[validate(range(min = 1, max = 3600))]
    pub callback_timeout_seconds: u64,
}

impl HooksConfig {
    /// Overall discovery deadline.
    pub fn collect_timeout(&self) -> Duration {
        Duration::from_secs(self.collect_timeout_seconds)
    }

    /// Sleep between directory scans.
    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }

    /// Bound on one connection attempt.
    pub fn dial_timeout(&self) -> Duration {
        Duration::from_millis(self.dial_timeout_ms)
    }

    /// Deadline for the Info call.
    pub fn info_timeout(&self) -> Duration {
        Duration::from_secs(self.info_timeout_seconds)
    }

    /// Deadline for each callback RPC.
    pub fn callback_timeout(&self) -> Duration {
        Duration::from_secs(self.callback_timeout_seconds)
    }
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            socket_dir: default_socket_dir(),
            expected_sidecars: 0,
            collect_timeout_seconds: default_collect_timeout(),
            scan_interval_ms: default_scan_interval(),
            dial_timeout_ms: default_dial_timeout(),
            info_timeout_seconds: default_info_timeout(),
            callback_timeout_seconds: default_callback_timeout(),
        }
    }
}

pub(crate) fn default_socket_dir() -> PathBuf {
    PathBuf::from(DEFAULT_SOCKET_DIR)
}

fn default_collect_timeout() -> u64 {
    30
}

fn default_scan_interval() -> u64 {
    1000
}

fn default_dial_timeout() -> u64 {
    1000
}

fn default_info_timeout() -> u64 {
    10
}

fn default_callback_timeout() -> u64 {
    60
}
