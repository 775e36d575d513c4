//! Hook sidecar descriptors carried by a VM annotation.
//!
//! The annotation value is a JSON array of container descriptors. Its length
//! is the number of sockets discovery waits for.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::HookError;

/// Annotation holding the sidecar descriptor list.
pub const SIDECAR_LIST_ANNOTATION: &str = "hooks.kubevirt.io/hookSidecars";

/// Image pull policy of a sidecar container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PullPolicy {
    /// Always pull.
    Always,
    /// Pull only when the image is absent.
    IfNotPresent,
    /// Never pull.
    Never,
}

impl fmt::Display for PullPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Always => "Always",
            Self::IfNotPresent => "IfNotPresent",
            Self::Never => "Never",
        };
        f.write_str(s)
    }
}

/// One sidecar container to run next to the VM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SidecarDescriptor {
    /// Container image.
    pub image: String,
    /// Pull policy, left to the runtime when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pull_policy: Option<PullPolicy>,
    /// Entrypoint override.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    /// Argument override.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

/// Parsed sidecar descriptor list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SidecarList(Vec<SidecarDescriptor>);

impl SidecarList {
    /// Reads the list from a VM's annotations. A missing annotation is an
    /// empty list.
    pub fn from_annotations(annotations: &HashMap<String, String>) -> Result<Self, HookError> {
        match annotations.get(SIDECAR_LIST_ANNOTATION) {
            Some(raw) => Self::from_json(raw),
            None => Ok(Self::default()),
        }
    }

    /// Parses the annotation value.
    pub fn from_json(raw: &str) -> Result<Self, HookError> {
        let list: Self = serde_json::from_str(raw).map_err(|e| HookError::SidecarList(e.to_string()))?;

        if let Some(position) = list.0.iter().position(|d| d.image.trim().is_empty()) {
            return Err(HookError::SidecarList(format!(
                "entry {position} has an empty image"
            )));
        }

        Ok(list)
    }

    /// Number of sidecars, i.e. the number of sockets to wait for.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the descriptors.
    pub fn iter(&self) -> impl Iterator<Item = &SidecarDescriptor> {
        self.0.iter()
    }

    /// Consumes the list.
    pub fn into_inner(self) -> Vec<SidecarDescriptor> {
        self.0
    }
}
