//! Shared test helpers for integration tests.
//!
//! Sidecars are real SDK servers bound in a temporary directory and driven by
//! the manager over their sockets.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use vmhooks_manager::SocketScanner;
use vmhooks_sdk::prelude::*;

/// Scan interval used by every test scanner.
pub const SCAN_INTERVAL: Duration = Duration::from_millis(20);

/// Creates an empty socket directory.
pub fn socket_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create socket dir")
}

/// Scanner with short timings for `dir`.
pub fn scanner(dir: &Path) -> SocketScanner {
    SocketScanner::new(dir)
        .with_scan_interval(SCAN_INTERVAL)
        .with_dial_timeout(Duration::from_millis(200))
        .with_info_timeout(Duration::from_secs(2))
        .with_callback_timeout(Duration::from_secs(5))
}

/// A sidecar served on a background task.
pub struct TestSidecar {
    /// Socket path.
    pub socket: PathBuf,
    stop: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<Result<(), SidecarError>>>,
}

impl TestSidecar {
    /// Binds `file` in `dir` and starts serving.
    pub async fn spawn(dir: &Path, file: &str, info: InfoResult, callbacks: Arc<dyn SidecarCallbacks>) -> Self {
        let bound = SidecarServer::new(info, callbacks)
            .bind(dir.join(file))
            .await
            .expect("Failed to bind sidecar");
        let socket = bound.socket_path().to_path_buf();

        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(bound.serve_until(async move {
            let _ = rx.await;
        }));

        Self {
            socket,
            stop: Some(tx),
            handle: Some(handle),
        }
    }

    /// Waits for the server loop to exit on its own.
    pub async fn finished(mut self, timeout: Duration) -> Result<(), SidecarError> {
        let handle = self.handle.take().expect("Sidecar already awaited");
        tokio::time::timeout(timeout, handle)
            .await
            .expect("Sidecar did not stop in time")
            .expect("Sidecar task panicked")
    }

    /// Returns whether the server loop is still running.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for TestSidecar {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

/// Info answer for a plugin speaking `versions` at `hooks`.
pub fn info(name: &str, versions: &[ProtocolVersion], hooks: &[(HookName, i32)]) -> InfoResult {
    let info = versions
        .iter()
        .fold(InfoResult::new(name), |info, v| info.with_version(*v));
    hooks
        .iter()
        .fold(info, |info, (hook, priority)| info.with_hook_point(*hook, *priority))
}

/// How a scripted sidecar answers `PreCloudInitIso`.
#[derive(Debug, Clone, Default)]
pub enum CloudMode {
    /// Echo both shapes back.
    #[default]
    PassThrough,
    /// Append to user data in the canonical shape.
    AppendUserData(String),
    /// Answer only in the legacy shape with base64 user data.
    LegacyBase64(String),
}

/// Sidecar callbacks with scripted behaviour and a call counter.
#[derive(Debug, Default)]
pub struct Scripted {
    /// Appended to every domain definition.
    pub suffix: String,
    /// Refuse every domain definition.
    pub fail: bool,
    /// First-boot behaviour.
    pub cloud: CloudMode,
    /// Number of callbacks served.
    pub calls: Arc<AtomicUsize>,
}

impl Scripted {
    /// Appends `suffix` to domain definitions.
    pub fn appending(suffix: &str) -> Self {
        Self {
            suffix: suffix.to_string(),
            ..Self::default()
        }
    }

    /// Refuses domain definitions.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Uses `cloud` for first-boot data.
    pub fn cloud(cloud: CloudMode) -> Self {
        Self {
            cloud,
            ..Self::default()
        }
    }

    /// Shares the call counter.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl SidecarCallbacks for Scripted {
    async fn on_define_domain(&self, params: OnDefineDomainParams) -> Result<OnDefineDomainResult, SidecarError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SidecarError::callback("definition refused"));
        }
        let mut domain_xml = params.domain_xml;
        domain_xml.extend_from_slice(self.suffix.as_bytes());
        Ok(OnDefineDomainResult { domain_xml })
    }

    async fn pre_cloud_init_iso(
        &self,
        params: PreCloudInitIsoParams,
    ) -> Result<PreCloudInitIsoResult, SidecarError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.cloud {
            CloudMode::PassThrough => Ok(PreCloudInitIsoResult {
                cloud_init_data: params.cloud_init_data,
                cloud_init_no_cloud_source: params.cloud_init_no_cloud_source,
            }),
            CloudMode::AppendUserData(extra) => {
                let mut data: CloudInitData = serde_json::from_slice(&params.cloud_init_data)?;
                data.user_data.push_str(extra);
                Ok(PreCloudInitIsoResult {
                    cloud_init_data: serde_json::to_vec(&data)?,
                    cloud_init_no_cloud_source: Vec::new(),
                })
            }
            CloudMode::LegacyBase64(encoded) => Ok(PreCloudInitIsoResult {
                cloud_init_data: Vec::new(),
                cloud_init_no_cloud_source: serde_json::to_vec(&serde_json::json!({
                    "userDataBase64": encoded,
                }))?,
            }),
        }
    }

    async fn shutdown(&self) -> Result<(), SidecarError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
