//! Hook point vocabulary shared by the manager and every sidecar.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Well-known extension points in the VM definition pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HookName {
    /// Fired with the serialized hardware definition before the domain is
    /// defined. Sidecars return a replacement definition.
    OnDefineDomain,
    /// Fired with the first-boot configuration before the image is packaged.
    PreCloudInitIso,
    /// Fired once at launcher teardown.
    Shutdown,
}

impl HookName {
    /// All hook points, in pipeline order.
    pub const ALL: [HookName; 3] = [Self::OnDefineDomain, Self::PreCloudInitIso, Self::Shutdown];

    /// Returns the wire name of this hook point.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnDefineDomain => "OnDefineDomain",
            Self::PreCloudInitIso => "PreCloudInitIso",
            Self::Shutdown => "Shutdown",
        }
    }

    /// Resolves a wire name. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|hook| hook.as_str() == name)
    }
}

impl fmt::Display for HookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One extension point a plugin participates in, with its precedence.
///
/// Higher priority runs earlier. The name stays a plain string on the wire so
/// sidecars built against newer vocabularies still parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HookPoint {
    /// Hook point name, e.g. `"OnDefineDomain"`.
    pub name: String,
    /// Relative precedence; higher runs first.
    pub priority: i32,
}

impl HookPoint {
    /// Creates a hook point for a known hook name.
    pub fn new(hook: HookName, priority: i32) -> Self {
        Self {
            name: hook.as_str().to_string(),
            priority,
        }
    }

    /// Returns the known hook this point refers to, if any.
    pub fn hook(&self) -> Option<HookName> {
        HookName::parse(&self.name)
    }
}
