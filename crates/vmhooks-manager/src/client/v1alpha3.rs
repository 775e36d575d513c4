//! Client for sidecars resolved to `v1alpha3`: adds graceful `Shutdown`.

use async_trait::async_trait;

use super::{CallbackTransport, HookCallbacks};
use crate::error::HookError;
use crate::protocol::messages::{PreCloudInitIsoParams, PreCloudInitIsoResult};
use crate::protocol::version::ProtocolVersion;

/// `v1alpha3` callbacks.
#[derive(Debug, Clone)]
pub struct V1Alpha3Client {
    transport: CallbackTransport,
}

impl V1Alpha3Client {
    /// Wraps a transport.
    pub fn new(transport: CallbackTransport) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl HookCallbacks for V1Alpha3Client {
    fn version(&self) -> ProtocolVersion {
        ProtocolVersion::V1Alpha3
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
        self.transport.shutdown(self.version()).await
    }
}
