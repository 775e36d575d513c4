//! Callback traits implemented by sidecars.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use vmhooks_manager::protocol::messages::{
    OnDefineDomainParams, OnDefineDomainResult, PreCloudInitIsoParams, PreCloudInitIsoResult,
};

use crate::error::SidecarError;

/// Callbacks served by a sidecar.
///
/// Every method defaults to a pass-through, so a sidecar only overrides the
/// hook points it declares.
#[async_trait]
pub trait SidecarCallbacks: Send + Sync + fmt::Debug + 'static {
    /// Rewrites the hardware definition.
    async fn on_define_domain(
        &self,
        params: OnDefineDomainParams,
    ) -> Result<OnDefineDomainResult, SidecarError> {
        Ok(OnDefineDomainResult {
            domain_xml: params.domain_xml,
        })
    }

    /// Rewrites first-boot data.
    async fn pre_cloud_init_iso(
        &self,
        params: PreCloudInitIsoParams,
    ) -> Result<PreCloudInitIsoResult, SidecarError> {
        Ok(PreCloudInitIsoResult {
            cloud_init_data: params.cloud_init_data,
            cloud_init_no_cloud_source: params.cloud_init_no_cloud_source,
        })
    }

    /// Called before the sidecar stops serving.
    async fn shutdown(&self) -> Result<(), SidecarError> {
        Ok(())
    }
}

/// Pass-through callbacks, for sidecars that only need to be discovered.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCallbacks;

impl SidecarCallbacks for NoopCallbacks {}

/// Simplified hardware-definition mutator.
///
/// Works on the definition as text and the VM descriptor as parsed JSON.
pub trait DomainHook: Send + Sync + fmt::Debug + 'static {
    /// Returns the replacement definition.
    fn mutate(&self, domain_xml: &str, vmi: &Value) -> Result<String, String>;
}

/// Adapts a [`DomainHook`] to [`SidecarCallbacks`].
#[derive(Debug)]
pub struct DomainHookAdapter {
    inner: Arc<dyn DomainHook>,
}

impl DomainHookAdapter {
    /// Creates a new adapter wrapping a domain hook.
    pub fn new(hook: Arc<dyn DomainHook>) -> Self {
        Self { inner: hook }
    }

    /// Wraps a domain hook into an `Arc<dyn SidecarCallbacks>`.
    pub fn wrap(hook: Arc<dyn DomainHook>) -> Arc<dyn SidecarCallbacks> {
        Arc::new(Self::new(hook))
    }
}

#[async_trait]
impl SidecarCallbacks for DomainHookAdapter {
    async fn on_define_domain(
        &self,
        params: OnDefineDomainParams,
    ) -> Result<OnDefineDomainResult, SidecarError> {
        let domain_xml = String::from_utf8(params.domain_xml)
            .map_err(|e| SidecarError::callback(format!("domain definition is not UTF-8: {e}")))?;
        let vmi: Value = if params.vmi.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&params.vmi)?
        };

        let mutated = self
            .inner
            .mutate(&domain_xml, &vmi)
            .map_err(SidecarError::Callback)?;

        Ok(OnDefineDomainResult {
            domain_xml: mutated.into_bytes(),
        })
    }
}
