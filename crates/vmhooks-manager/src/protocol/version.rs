//! Protocol revisions and capability negotiation.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HookError;
use crate::hooks::definitions::HookName;
use crate::protocol::messages::InfoResult;

/// Callback protocol revisions this manager speaks.
///
/// Each revision is a superset of the previous one: `v1alpha2` adds
/// `PreCloudInitIso`, `v1alpha3` adds `Shutdown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProtocolVersion {
    /// `OnDefineDomain` only.
    #[serde(rename = "v1alpha1")]
    V1Alpha1,
    /// Adds `PreCloudInitIso`.
    #[serde(rename = "v1alpha2")]
    V1Alpha2,
    /// Adds `Shutdown`.
    #[serde(rename = "v1alpha3")]
    V1Alpha3,
}

/// Manager preference order, newest first.
pub const SUPPORTED_VERSIONS: [ProtocolVersion; 3] = [
    ProtocolVersion::V1Alpha3,
    ProtocolVersion::V1Alpha2,
    ProtocolVersion::V1Alpha1,
];

impl ProtocolVersion {
    /// Returns the wire name of this revision.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1Alpha1 => "v1alpha1",
            Self::V1Alpha2 => "v1alpha2",
            Self::V1Alpha3 => "v1alpha3",
        }
    }

    /// Whether this revision exposes the callback behind a hook point.
    pub fn supports(&self, hook: HookName) -> bool {
        match hook {
            HookName::OnDefineDomain => true,
            HookName::PreCloudInitIso => *self >= Self::V1Alpha2,
            HookName::Shutdown => *self >= Self::V1Alpha3,
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtocolVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SUPPORTED_VERSIONS
            .into_iter()
            .find(|version| version.as_str() == s)
            .ok_or_else(|| format!("unknown protocol version '{s}'"))
    }
}

/// Wire names of [`SUPPORTED_VERSIONS`], newest first.
pub fn supported_version_names() -> Vec<String> {
    SUPPORTED_VERSIONS
        .iter()
        .map(|version| version.as_str().to_string())
        .collect()
}

/// Picks the newest manager-preferred revision the plugin advertises.
pub fn select(advertised: &[String]) -> Option<ProtocolVersion> {
    SUPPORTED_VERSIONS
        .into_iter()
        .find(|version| advertised.iter().any(|v| v == version.as_str()))
}

/// Turns an Info answer into a single resolved revision.
///
/// Fails when none of the advertised revisions is known; the error names both
/// the plugin's set and the manager's set.
pub fn negotiate(info: &InfoResult, socket: &Path) -> Result<ProtocolVersion, HookError> {
    select(&info.versions).ok_or_else(|| HookError::UnsupportedVersion {
        plugin: info.name.clone(),
        socket: socket.to_path_buf(),
        advertised: info.versions.clone(),
        supported: supported_version_names(),
    })
}
