//! Hook manager: owns the ordering index and runs the callback chains.
//!
//! Constructed once by whatever component defines VMs, after discovery, and
//! passed by reference from then on. The index is read-only after
//! construction, so chain calls need no locking.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{debug, info};
use vmhooks_core::config::HooksConfig;

use crate::cloudinit::{CloudInitData, LegacyNoCloudSource, resolve_response};
use crate::discovery::SocketScanner;
use crate::error::HookError;
use crate::hooks::definitions::HookName;
use crate::hooks::dispatcher::HookDispatcher;
use crate::hooks::registry::OrderingIndex;
use crate::protocol::messages::PreCloudInitIsoParams;

/// Runs VM definition events through the discovered sidecars.
#[derive(Debug)]
pub struct HookManager {
    index: OrderingIndex,
    shutdown_sent: AtomicBool,
}

impl HookManager {
    /// Wraps an already built ordering index.
    pub fn new(index: OrderingIndex) -> Self {
        Self {
            index,
            shutdown_sent: AtomicBool::new(false),
        }
    }

    /// Manager with no sidecars; every chain is the identity.
    pub fn empty() -> Self {
        Self::new(OrderingIndex::new())
    }

    /// Discovers `config.expected_sidecars` sidecars and builds the manager.
    pub async fn collect(config: &HooksConfig) -> Result<Self, HookError> {
        let index = SocketScanner::from_config(config)
            .discover(config.expected_sidecars, config.collect_timeout())
            .await?;
        Ok(Self::new(index))
    }

    /// The ordering index.
    pub fn index(&self) -> &OrderingIndex {
        &self.index
    }

    /// Runs the hardware definition through every `OnDefineDomain` plugin.
    ///
    /// The VM descriptor is serialized once and sent unchanged to each plugin.
    /// The first failure aborts the chain and is returned.
    pub async fn on_define_domain<V>(&self, domain_xml: &[u8], vmi: &V) -> Result<Vec<u8>, HookError>
    where
        V: Serialize + ?Sized,
    {
        let dispatcher = HookDispatcher::new(&self.index, HookName::OnDefineDomain);
        if dispatcher.is_empty() {
            return Ok(domain_xml.to_vec());
        }

        let vmi = serde_json::to_vec(vmi)?;
        let vmi = vmi.as_slice();

        dispatcher
            .fold(domain_xml.to_vec(), |plugin, current| async move {
                let next = plugin.callbacks().on_define_domain(&current, vmi).await?;
                debug!(
                    plugin = %plugin.name(),
                    before = current.len(),
                    after = next.len(),
                    "Domain definition rewritten"
                );
                Ok::<_, HookError>(next)
            })
            .await
    }

    /// Runs first-boot data through every `PreCloudInitIso` plugin.
    ///
    /// Each plugin receives the canonical document and the derived legacy
    /// shape. Its answer is read canonically when usable, otherwise rebuilt
    /// from the legacy shape.
    pub async fn pre_cloud_init_iso<V>(&self, data: CloudInitData, vmi: &V) -> Result<CloudInitData, HookError>
    where
        V: Serialize + ?Sized,
    {
        let dispatcher = HookDispatcher::new(&self.index, HookName::PreCloudInitIso);
        if dispatcher.is_empty() {
            return Ok(data);
        }

        let vmi = serde_json::to_vec(vmi)?;
        let vmi = vmi.as_slice();

        dispatcher
            .fold(data, |plugin, current| async move {
                let params = PreCloudInitIsoParams {
                    cloud_init_data: current.to_vec()?,
                    cloud_init_no_cloud_source: serde_json::to_vec(&LegacyNoCloudSource::from_cloud_init(
                        &current,
                    ))?,
                    vmi: vmi.to_vec(),
                };
                let response = plugin.callbacks().pre_cloud_init_iso(&params).await?;
                resolve_response(&current, &response).map_err(|message| HookError::InvalidResponse {
                    socket: plugin.socket_path().to_path_buf(),
                    message,
                })
            })
            .await
    }

    /// Asks every `Shutdown` plugin to terminate.
    ///
    /// Sent at most once per manager; later calls are no-ops. Every plugin is
    /// notified even if an earlier one fails, and the first failure is
    /// returned.
    pub async fn shutdown(&self) -> Result<(), HookError> {
        if self.shutdown_sent.swap(true, Ordering::SeqCst) {
            debug!("Shutdown already sent to hook sidecars");
            return Ok(());
        }

        let dispatcher = HookDispatcher::new(&self.index, HookName::Shutdown);
        info!(plugins = dispatcher.len(), "Shutting down hook sidecars");

        dispatcher
            .fan_out(|plugin| async move { plugin.callbacks().shutdown().await })
            .await
    }
}
