//! # vmhooks-sdk
//!
//! SDK for writing hook sidecars.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vmhooks_sdk::prelude::*;
//!
//! #[derive(Debug)]
//! struct Smbios;
//!
//! impl DomainHook for Smbios {
//!     fn mutate(&self, domain_xml: &str, _vmi: &serde_json::Value) -> Result<String, String> {
//!         Ok(domain_xml.replace("<sysinfo type='smbios'/>", "<sysinfo type='smbios'>...</sysinfo>"))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), SidecarError> {
//!     let info = InfoResult::new("smbios")
//!         .with_version(ProtocolVersion::V1Alpha2)
//!         .with_version(ProtocolVersion::V1Alpha1)
//!         .with_hook_point(HookName::OnDefineDomain, 0);
//!
//!     SidecarServer::new(info, DomainHookAdapter::wrap(std::sync::Arc::new(Smbios)))
//!         .bind_in(&SidecarConfig::default())
//!         .await?
//!         .run()
//!         .await
//! }
//! ```

pub mod error;
pub mod server;
pub mod traits;

pub use error::SidecarError;
pub use server::{BoundSidecar, SidecarServer, shutdown_signal};

/// Prelude for convenient imports.
pub mod prelude {
    pub use async_trait::async_trait;
    pub use vmhooks_core::config::SidecarConfig;
    pub use vmhooks_manager::hooks::{HookName, HookPoint};
    pub use vmhooks_manager::protocol::messages::{
        InfoResult, OnDefineDomainParams, OnDefineDomainResult, PreCloudInitIsoParams,
        PreCloudInitIsoResult,
    };
    pub use vmhooks_manager::protocol::version::ProtocolVersion;
    pub use vmhooks_manager::{CloudInitData, DataSource, LegacyNoCloudSource};

    pub use crate::error::SidecarError;
    pub use crate::server::{BoundSidecar, SidecarServer};
    pub use crate::traits::{DomainHook, DomainHookAdapter, NoopCallbacks, SidecarCallbacks};
}
