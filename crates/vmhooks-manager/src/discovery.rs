//! Socket discovery with readiness tolerance.
//!
//! The scanner polls one shared directory. A socket that refuses the
//! connection belongs to a sidecar whose listener is not up yet and is
//! retried on the next pass. A socket that accepts must answer Info and agree
//! on a protocol revision, otherwise discovery fails outright.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};
use vmhooks_core::config::HooksConfig;

use crate::client::{CallbackTransport, client_for};
use crate::error::HookError;
use crate::hooks::registry::OrderingIndex;
use crate::protocol::INFO_METHOD;
use crate::protocol::messages::{InfoParams, InfoResult};
use crate::protocol::version::negotiate;
use crate::registry::ResolvedPlugin;
use crate::transport::RpcConnection;

/// Polls the shared socket directory until the expected sidecars answer.
#[derive(Debug, Clone)]
pub struct SocketScanner {
    socket_dir: PathBuf,
    scan_interval: Duration,
    dial_timeout: Duration,
    info_timeout: Duration,
    callback_timeout: Duration,
}

impl SocketScanner {
    /// Creates a scanner for `socket_dir` with default timings.
    pub fn new(socket_dir: impl Into<PathBuf>) -> Self {
        let defaults = HooksConfig::default();
        Self {
            socket_dir: socket_dir.into(),
            ..Self::from_config(&defaults)
        }
    }

    /// Creates a scanner from the hooks configuration section.
    pub fn from_config(config: &HooksConfig) -> Self {
        Self {
            socket_dir: config.socket_dir.clone(),
            scan_interval: config.scan_interval(),
            dial_timeout: config.dial_timeout(),
            info_timeout: config.info_timeout(),
            callback_timeout: config.callback_timeout(),
        }
    }

    /// Sets the sleep between two directory scans.
    pub fn with_scan_interval(mut self, interval: Duration) -> Self {
        self.scan_interval = interval;
        self
    }

    /// Sets the bound on one connection attempt.
    pub fn with_dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout = timeout;
        self
    }

    /// Sets the deadline for the Info call.
    pub fn with_info_timeout(mut self, timeout: Duration) -> Self {
        self.info_timeout = timeout;
        self
    }

    /// Sets the deadline used by resolved plugins for every callback.
    pub fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout = timeout;
        self
    }

    /// Directory being scanned.
    pub fn socket_dir(&self) -> &Path {
        &self.socket_dir
    }

    /// Resolves `expected` sidecars within `timeout` and builds the ordering
    /// index from all of them.
    pub async fn discover(&self, expected: usize, timeout: Duration) -> Result<OrderingIndex, HookError> {
        let plugins = self.resolve_all(expected, timeout).await?;
        Ok(OrderingIndex::build(plugins))
    }

    /// Resolves sidecars until at least `expected` distinct sockets answered.
    ///
    /// A pass that reaches the count still finishes, so the result may hold
    /// more than `expected` plugins.
    pub async fn resolve_all(&self, expected: usize, timeout: Duration) -> Result<Vec<ResolvedPlugin>, HookError> {
        if expected == 0 {
            debug!("No hook sidecars expected, skipping discovery");
            return Ok(Vec::new());
        }

        info!(
            dir = %self.socket_dir.display(),
            expected = expected,
            timeout_secs = timeout.as_secs_f64(),
            "Collecting hook sidecar sockets"
        );

        let deadline = Instant::now() + timeout;
        let mut resolved: BTreeMap<String, ResolvedPlugin> = BTreeMap::new();

        loop {
            for (file_name, path) in self.list_entries().await? {
                if resolved.contains_key(&file_name) {
                    continue;
                }

                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    break;
                }

                match self.probe(&path, remaining).await {
                    Ok(Some(plugin)) => {
                        info!(
                            plugin = %plugin.name(),
                            socket = %path.display(),
                            version = %plugin.version(),
                            "Hook sidecar resolved"
                        );
                        resolved.insert(file_name, plugin);
                    }
                    Ok(None) => {}
                    Err(HookError::Info { socket, source })
                        if matches!(*source, HookError::CallTimeout { .. }) && Instant::now() >= deadline =>
                    {
                        warn!(
                            socket = %socket.display(),
                            expected = expected,
                            resolved = resolved.len(),
                            "Info call outlived the discovery deadline"
                        );
                        return Err(HookError::CollectTimeout {
                            expected,
                            resolved: resolved.len(),
                            timeout,
                        });
                    }
                    Err(e) => return Err(e),
                }
            }

            if resolved.len() >= expected {
                break;
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!(
                    expected = expected,
                    resolved = resolved.len(),
                    "Timed out waiting for hook sidecars"
                );
                return Err(HookError::CollectTimeout {
                    expected,
                    resolved: resolved.len(),
                    timeout,
                });
            }

            tokio::time::sleep(self.scan_interval.min(remaining)).await;
        }

        info!(count = resolved.len(), "Hook sidecar discovery complete");
        Ok(resolved.into_values().collect())
    }

    /// Connects to one socket and resolves it. Neither the connection attempt
    /// nor the Info call waits longer than `remaining`.
    ///
    /// Returns `Ok(None)` when the listener is not accepting yet.
    pub async fn probe(&self, path: &Path, remaining: Duration) -> Result<Option<ResolvedPlugin>, HookError> {
        let started = Instant::now();
        let mut conn = match RpcConnection::dial(path, self.dial_timeout.min(remaining)).await {
            Ok(conn) => conn,
            Err(e) => {
                debug!(socket = %path.display(), error = %e, "Socket not ready yet");
                return Ok(None);
            }
        };

        let info_timeout = self
            .info_timeout
            .min(remaining.saturating_sub(started.elapsed()));
        let info: InfoResult = conn
            .call(INFO_METHOD, &InfoParams::default(), info_timeout)
            .await
            .map_err(|e| HookError::Info {
                socket: path.to_path_buf(),
                source: Box::new(e),
            })?;

        let version = negotiate(&info, path)?;
        let transport = CallbackTransport::new(path, self.dial_timeout, self.callback_timeout);

        Ok(Some(ResolvedPlugin::new(
            info.name,
            path,
            info.hook_points,
            client_for(version, transport),
        )))
    }

    async fn list_entries(&self) -> Result<Vec<(String, PathBuf)>, HookError> {
        let read_error = |source| HookError::ReadSocketDir {
            dir: self.socket_dir.clone(),
            source,
        };

        let mut dir = tokio::fs::read_dir(&self.socket_dir).await.map_err(read_error)?;
        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(read_error)? {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            entries.push((file_name, entry.path()));
        }
        entries.sort();
        Ok(entries)
    }
}
