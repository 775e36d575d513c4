//! In-memory callback doubles for unit tests.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::client::HookCallbacks;
use crate::cloudinit::CloudInitData;
use crate::error::HookError;
use crate::hooks::definitions::{HookName, HookPoint};
use crate::protocol::messages::{PreCloudInitIsoParams, PreCloudInitIsoResult};
use crate::protocol::version::ProtocolVersion;
use crate::registry::ResolvedPlugin;

/// Shared record of which stub answered, in call order.
pub(crate) type Journal = Arc<Mutex<Vec<String>>>;

/// How a stub answers `PreCloudInitIso`.
#[derive(Debug, Clone)]
pub(crate) enum CloudReply {
    /// Returns the canonical input unchanged.
    Echo,
    /// Appends to user data in the canonical shape.
    AppendUserData(String),
    /// Answers only in the legacy shape with this user data.
    LegacyOnly(String),
}

#[derive(Debug)]
pub(crate) struct StubCallbacks {
    name: String,
    version: ProtocolVersion,
    suffix: String,
    fail: bool,
    cloud_reply: CloudReply,
    journal: Journal,
    shutdowns: Arc<AtomicUsize>,
}

impl StubCallbacks {
    pub(crate) fn new(name: &str, version: ProtocolVersion) -> Self {
        Self {
            name: name.to_string(),
            version,
            suffix: String::new(),
            fail: false,
            cloud_reply: CloudReply::Echo,
            journal: Journal::default(),
            shutdowns: Arc::default(),
        }
    }

    /// Stub that returns every input unchanged.
    pub(crate) fn identity(version: ProtocolVersion) -> Arc<dyn HookCallbacks> {
        Arc::new(Self::new("identity", version))
    }

    pub(crate) fn appending(mut self, suffix: &str) -> Self {
        self.suffix = suffix.to_string();
        self
    }

    pub(crate) fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub(crate) fn replying(mut self, reply: CloudReply) -> Self {
        self.cloud_reply = reply;
        self
    }

    pub(crate) fn journal(mut self, journal: &Journal) -> Self {
        self.journal = Arc::clone(journal);
        self
    }

    pub(crate) fn counting(mut self, shutdowns: &Arc<AtomicUsize>) -> Self {
        self.shutdowns = Arc::clone(shutdowns);
        self
    }

    fn record(&self, hook: HookName) -> Result<(), HookError> {
        self.journal
            .lock()
            .expect("journal lock")
            .push(format!("{}:{hook}", self.name));
        if self.fail {
            return Err(HookError::Rpc {
                socket: PathBuf::from(format!("/hooks/{}.sock", self.name)),
                method: hook.to_string(),
                code: -32000,
                message: format!("{} refused", self.name),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl HookCallbacks for StubCallbacks {
    fn version(&self) -> ProtocolVersion {
        self.version
    }

    async fn on_define_domain(&self, domain_xml: &[u8], _vmi: &[u8]) -> Result<Vec<u8>, HookError> {
        self.record(HookName::OnDefineDomain)?;
        let mut out = domain_xml.to_vec();
        out.extend_from_slice(self.suffix.as_bytes());
        Ok(out)
    }

    async fn pre_cloud_init_iso(
        &self,
        params: &PreCloudInitIsoParams,
    ) -> Result<PreCloudInitIsoResult, HookError> {
        self.record(HookName::PreCloudInitIso)?;
        match &self.cloud_reply {
            CloudReply::Echo => Ok(PreCloudInitIsoResult {
                cloud_init_data: params.cloud_init_data.clone(),
                cloud_init_no_cloud_source: Vec::new(),
            }),
            CloudReply::AppendUserData(extra) => {
                let mut data = CloudInitData::from_slice(&params.cloud_init_data)?;
                data.user_data.push_str(extra);
                Ok(PreCloudInitIsoResult {
                    cloud_init_data: data.to_vec()?,
                    cloud_init_no_cloud_source: Vec::new(),
                })
            }
            CloudReply::LegacyOnly(user_data) => Ok(PreCloudInitIsoResult {
                cloud_init_data: Vec::new(),
                cloud_init_no_cloud_source: serde_json::to_vec(
                    &serde_json::json!({ "userData": user_data }),
                )?,
            }),
        }
    }

    async fn shutdown(&self) -> Result<(), HookError> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        self.record(HookName::Shutdown)
    }
}

/// Resolved plugin backed by an identity stub.
pub(crate) fn plugin(name: &str, version: ProtocolVersion, points: &[(HookName, i32)]) -> ResolvedPlugin {
    resolved(StubCallbacks::new(name, version), points)
}

/// Resolved plugin backed by `stub`.
pub(crate) fn resolved(stub: StubCallbacks, points: &[(HookName, i32)]) -> ResolvedPlugin {
    let name = stub.name.clone();
    ResolvedPlugin::new(
        name.clone(),
        format!("/hooks/{name}.sock"),
        points
            .iter()
            .map(|(hook, priority)| HookPoint::new(*hook, *priority))
            .collect(),
        Arc::new(stub),
    )
}
