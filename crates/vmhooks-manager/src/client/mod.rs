//! Version-agnostic callback clients.
//!
//! Negotiation yields exactly one [`HookCallbacks`] implementation per plugin,
//! one struct per supported revision. Chain code only talks to the trait.

pub mod v1alpha1;
pub mod v1alpha2;
pub mod v1alpha3;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::HookError;
use crate::hooks::definitions::HookName;
use crate::protocol::callback_method;
use crate::protocol::messages::{
    OnDefineDomainParams, OnDefineDomainResult, PreCloudInitIsoParams, PreCloudInitIsoResult,
    ShutdownParams, ShutdownResult,
};
use crate::protocol::version::ProtocolVersion;
use crate::transport::RpcConnection;

pub use v1alpha1::V1Alpha1Client;
pub use v1alpha2::V1Alpha2Client;
pub use v1alpha3::V1Alpha3Client;

/// Uniform capability interface over every protocol revision.
#[async_trait]
pub trait HookCallbacks: Send + Sync + fmt::Debug {
    /// Negotiated revision behind this client.
    fn version(&self) -> ProtocolVersion;

    /// Returns a replacement hardware definition.
    async fn on_define_domain(&self, domain_xml: &[u8], vmi: &[u8]) -> Result<Vec<u8>, HookError>;

    /// Returns replacement first-boot data in canonical and/or legacy shape.
    async fn pre_cloud_init_iso(
        &self,
        params: &PreCloudInitIsoParams,
    ) -> Result<PreCloudInitIsoResult, HookError>;

    /// Asks the sidecar to terminate.
    async fn shutdown(&self) -> Result<(), HookError>;
}

/// Per-call connection settings for one plugin socket.
///
/// Every call opens a fresh connection; nothing is reused across calls.
#[derive(Debug, Clone)]
pub struct CallbackTransport {
    socket: PathBuf,
    dial_timeout: Duration,
    call_timeout: Duration,
}

impl CallbackTransport {
    /// Creates a transport for `socket`.
    pub fn new(socket: impl Into<PathBuf>, dial_timeout: Duration, call_timeout: Duration) -> Self {
        Self {
            socket: socket.into(),
            dial_timeout,
            call_timeout,
        }
    }

    /// Socket this transport dials.
    pub fn socket(&self) -> &Path {
        &self.socket
    }

    async fn invoke<P, R>(&self, version: ProtocolVersion, hook: HookName, params: &P) -> Result<R, HookError>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        let mut conn = RpcConnection::dial(&self.socket, self.dial_timeout).await?;
        conn.call(&callback_method(version, hook), params, self.call_timeout)
            .await
    }

    pub(crate) async fn on_define_domain(
        &self,
        version: ProtocolVersion,
        domain_xml: &[u8],
        vmi: &[u8],
    ) -> Result<Vec<u8>, HookError> {
        let params = OnDefineDomainParams {
            domain_xml: domain_xml.to_vec(),
            vmi: vmi.to_vec(),
        };
        let result: OnDefineDomainResult = self
            .invoke(version, HookName::OnDefineDomain, &params)
            .await?;
        Ok(result.domain_xml)
    }

    pub(crate) async fn pre_cloud_init_iso(
        &self,
        version: ProtocolVersion,
        params: &PreCloudInitIsoParams,
    ) -> Result<PreCloudInitIsoResult, HookError> {
        self.invoke(version, HookName::PreCloudInitIso, params).await
    }

    pub(crate) async fn shutdown(&self, version: ProtocolVersion) -> Result<(), HookError> {
        let _: ShutdownResult = self
            .invoke(version, HookName::Shutdown, &ShutdownParams {})
            .await?;
        Ok(())
    }
}

/// Builds the client for a negotiated revision.
pub fn client_for(version: ProtocolVersion, transport: CallbackTransport) -> Arc<dyn HookCallbacks> {
    match version {
        ProtocolVersion::V1Alpha1 => Arc::new(V1Alpha1Client::new(transport)),
        ProtocolVersion::V1Alpha2 => Arc::new(V1Alpha2Client::new(transport)),
        ProtocolVersion::V1Alpha3 => Arc::new(V1Alpha3Client::new(transport)),
    }
}

pub(crate) fn unsupported(version: ProtocolVersion, callback: HookName) -> HookError {
    tracing::error!(
        version = %version,
        callback = %callback,
        "Callback invoked on a revision that does not expose it"
    );
    HookError::UnsupportedCallback { version, callback }
}
