//! # vmhooks-manager
//!
//! Hook orchestration for the VM launch pipeline. Provides:
//!
//! - Socket discovery in a shared directory, tolerant of sidecars whose
//!   listener is not accepting yet
//! - Protocol revision negotiation against the `Info` answer of each sidecar
//! - An ordering index: per hook point, plugins sorted by priority
//!   (descending) then name (ascending)
//! - Fail-fast callback chains for `OnDefineDomain` and `PreCloudInitIso`,
//!   plus a one-shot `Shutdown` fan-out
//! - The sidecar descriptor list carried by the VM annotation

pub mod client;
pub mod cloudinit;
pub mod discovery;
pub mod error;
pub mod hooks;
pub mod manager;
pub mod protocol;
pub mod registry;
pub mod sidecar;
pub mod transport;

#[cfg(test)]
mod testing;

pub use cloudinit::{CloudInitData, DataSource, LegacyNoCloudSource};
pub use discovery::SocketScanner;
pub use error::HookError;
pub use hooks::definitions::{HookName, HookPoint};
pub use hooks::registry::{HookEntry, OrderingIndex};
pub use manager::HookManager;
pub use protocol::version::ProtocolVersion;
pub use registry::ResolvedPlugin;
pub use sidecar::{SidecarDescriptor, SidecarList};
