//! Client for sidecars resolved to `v1alpha2`: adds `PreCloudInitIso`.

use async_trait::async_trait;

use super::{CallbackTransport, HookCallbacks, unsupported};
use crate::error::HookError;
use crate::hooks::definitions::HookName;
use crate::protocol::messages::{PreCloudInitIsoParams, PreCloudInitIsoResult};
use crate::protocol::version::ProtocolVersion;

/// `v1alpha2` callbacks.
#[derive(Debug, Clone)]
pub struct V1Alpha2Client {
    transport: CallbackTransport,
}

impl V1Alpha2Client {
    /// Wraps a transport.
    pub fn new(transport: CallbackTransport) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl HookCallbacks for V1Alpha2Client {
    fn version(&self) -> ProtocolVersion {
        ProtocolVersion::V1Alpha2
    }

    async fn on_define_domain(&self, domain_xml: &[u8], vmi: &[u8]) -> Result<Vec<u8>, HookError> {
        self.transport
            .on_define_domain(self.version(), domain_xml, vmi)
            .await
    }

    async fn pre_cloud_init_iso(
        &self,
        params: &PreCloudInitIsoParams,
    ) -> Result<PreCloudInitIsoResult, HookError> {
        self.transport
            .pre_cloud_init_iso(self.version(), params)
            .await
    }

    async fn shutdown(&self) -> Result<(), HookError> {
        Err(unsupported(self.version(), HookName::Shutdown))
    }
}
