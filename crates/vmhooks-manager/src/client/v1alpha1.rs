//! Client for sidecars resolved to `v1alpha1`: `OnDefineDomain` only.

use async_trait::async_trait;

use super::{CallbackTransport, HookCallbacks, unsupported};
use crate::error::HookError;
use crate::hooks::definitions::HookName;
use crate::protocol::messages::{PreCloudInitIsoParams, PreCloudInitIsoResult};
use crate::protocol::version::ProtocolVersion;

/// `v1alpha1` callbacks.
#[derive(Debug, Clone)]
pub struct V1Alpha1Client {
    transport: CallbackTransport,
}

impl V1Alpha1Client {
    /// Wraps a transport.
    pub fn new(transport: CallbackTransport) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl HookCallbacks for V1Alpha1Client {
    fn version(&self) -> ProtocolVersion {
        ProtocolVersion::V1Alpha1
    }

    async fn on_define_domain(&self, domain_xml: &[u8], vmi: &[u8]) -> Result<Vec<u8>, HookError> {
        self.transport
            .on_define_domain(self.version(), domain_xml, vmi)
            .await
    }

    async fn pre_cloud_init_iso(
        &self,
        _params: &PreCloudInitIsoParams,
    ) -> Result<PreCloudInitIsoResult, HookError> {
        Err(unsupported(self.version(), HookName::PreCloudInitIso))
    }

    async fn shutdown(&self) -> Result<(), HookError> {
        Err(unsupported(self.version(), HookName::Shutdown))
    }
}
