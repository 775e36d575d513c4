//! Parameter and result payloads for each RPC.
//!
//! Byte payloads are opaque to the manager and travel as standard base64.

use serde::{Deserialize, Serialize};

use crate::hooks::definitions::{HookName, HookPoint};
use crate::protocol::version::ProtocolVersion;

/// Answer to `Info.Info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResult {
    /// Plugin name, used as the ordering tie-break.
    pub name: String,
    /// Protocol revisions the plugin can speak.
    #[serde(default)]
    pub versions: Vec<String>,
    /// Hook points the plugin subscribes to.
    #[serde(default)]
    pub hook_points: Vec<HookPoint>,
}

impl InfoResult {
    /// Creates an Info answer with no versions or hook points.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            versions: Vec::new(),
            hook_points: Vec::new(),
        }
    }

    /// Advertises a protocol revision.
    pub fn with_version(mut self, version: ProtocolVersion) -> Self {
        self.versions.push(version.as_str().to_string());
        self
    }

    /// Advertises a raw version string, known to the manager or not.
    pub fn with_version_name(mut self, version: impl Into<String>) -> Self {
        self.versions.push(version.into());
        self
    }

    /// Subscribes to a hook point.
    pub fn with_hook_point(mut self, hook: HookName, priority: i32) -> Self {
        self.hook_points.push(HookPoint::new(hook, priority));
        self
    }
}

/// Params of `Info.Info`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InfoParams {}

/// Params of `OnDefineDomain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnDefineDomainParams {
    /// Serialized hardware definition.
    #[serde(rename = "domainXML", with = "base64_bytes")]
    pub domain_xml: Vec<u8>,
    /// Serialized VM descriptor.
    #[serde(with = "base64_bytes")]
    pub vmi: Vec<u8>,
}

/// Result of `OnDefineDomain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnDefineDomainResult {
    /// Replacement hardware definition.
    #[serde(rename = "domainXML", with = "base64_bytes")]
    pub domain_xml: Vec<u8>,
}

/// Params of `PreCloudInitIso`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreCloudInitIsoParams {
    /// Canonical first-boot data (JSON `CloudInitData`).
    #[serde(with = "base64_bytes")]
    pub cloud_init_data: Vec<u8>,
    /// Legacy no-cloud shape (JSON `LegacyNoCloudSource`).
    #[serde(with = "base64_bytes")]
    pub cloud_init_no_cloud_source: Vec<u8>,
    /// Serialized VM descriptor.
    #[serde(with = "base64_bytes")]
    pub vmi: Vec<u8>,
}

/// Result of `PreCloudInitIso`. Either shape may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreCloudInitIsoResult {
    /// Canonical first-boot data.
    #[serde(default, with = "base64_bytes")]
    pub cloud_init_data: Vec<u8>,
    /// Legacy no-cloud shape.
    #[serde(default, with = "base64_bytes")]
    pub cloud_init_no_cloud_source: Vec<u8>,
}

/// Params of `Shutdown`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShutdownParams {}

/// Result of `Shutdown`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShutdownResult {}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
