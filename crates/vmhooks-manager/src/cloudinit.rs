//! First-boot configuration data in its canonical and legacy shapes.
//!
//! The manager sends both shapes to every `PreCloudInitIso` plugin. On the
//! way back, the canonical shape wins when it decodes and keeps the request's
//! data source; otherwise user and network data are read from the legacy
//! shape and folded into a copy of the request.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::protocol::messages::PreCloudInitIsoResult;

/// Where the guest looks for its first-boot data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataSource {
    /// NoCloud seed image.
    NoCloud,
    /// OpenStack-style config drive.
    ConfigDrive,
}

/// Data-source independent first-boot configuration.
///
/// Metadata and device data are carried opaquely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudInitData {
    /// Data source the image is generated for.
    pub data_source: DataSource,
    /// NoCloud metadata document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_cloud_meta_data: Option<Value>,
    /// Config-drive metadata document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_drive_meta_data: Option<Value>,
    /// User data.
    #[serde(default)]
    pub user_data: String,
    /// Network data.
    #[serde(default)]
    pub network_data: String,
    /// Device metadata entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devices_data: Option<Value>,
    /// Volume the data was sourced from.
    #[serde(default)]
    pub volume_name: String,
}

impl CloudInitData {
    /// Creates an empty document for `data_source`.
    pub fn new(data_source: DataSource) -> Self {
        Self {
            data_source,
            no_cloud_meta_data: None,
            config_drive_meta_data: None,
            user_data: String::new(),
            network_data: String::new(),
            devices_data: None,
            volume_name: String::new(),
        }
    }

    /// Sets the user data.
    pub fn with_user_data(mut self, user_data: impl Into<String>) -> Self {
        self.user_data = user_data.into();
        self
    }

    /// Sets the network data.
    pub fn with_network_data(mut self, network_data: impl Into<String>) -> Self {
        self.network_data = network_data.into();
        self
    }

    /// Parses a canonical document.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Serializes to the canonical wire shape.
    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Narrower shape understood by plugins written against the earlier contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyNoCloudSource {
    /// Inline user data.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_data: String,
    /// Base64-encoded user data.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_data_base64: String,
    /// Inline network data.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub network_data: String,
    /// Base64-encoded network data.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub network_data_base64: String,
}

impl LegacyNoCloudSource {
    /// Derives the legacy shape from canonical data.
    pub fn from_cloud_init(data: &CloudInitData) -> Self {
        Self {
            user_data: data.user_data.clone(),
            network_data: data.network_data.clone(),
            ..Self::default()
        }
    }

    /// Effective user data: the inline field, else the decoded base64 field.
    pub fn resolved_user_data(&self) -> Result<String, String> {
        resolve_field("userData", &self.user_data, &self.user_data_base64)
    }

    /// Effective network data: the inline field, else the decoded base64 field.
    pub fn resolved_network_data(&self) -> Result<String, String> {
        resolve_field("networkData", &self.network_data, &self.network_data_base64)
    }
}

fn resolve_field(field: &str, plain: &str, encoded: &str) -> Result<String, String> {
    if !plain.is_empty() || encoded.is_empty() {
        return Ok(plain.to_string());
    }
    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|e| format!("{field}Base64 is not valid base64: {e}"))?;
    String::from_utf8(decoded).map_err(|e| format!("{field}Base64 is not valid UTF-8: {e}"))
}

/// Returns the canonical document in `bytes` if it is usable for `expected`.
///
/// Usable means it decodes and keeps the data source of the request.
pub fn validate_response(expected: DataSource, bytes: &[u8]) -> Option<CloudInitData> {
    if bytes.is_empty() {
        return None;
    }
    match CloudInitData::from_slice(bytes) {
        Ok(data) if data.data_source == expected => Some(data),
        Ok(data) => {
            tracing::debug!(
                expected = ?expected,
                returned = ?data.data_source,
                "Canonical first-boot data changed its data source"
            );
            None
        }
        Err(e) => {
            tracing::debug!(error = %e, "Canonical first-boot data did not decode");
            None
        }
    }
}

/// Resolves a plugin's answer into the next canonical document.
///
/// The legacy fallback keeps everything from `request` except user and
/// network data, and needs at least one of them.
pub fn resolve_response(
    request: &CloudInitData,
    response: &PreCloudInitIsoResult,
) -> Result<CloudInitData, String> {
    if let Some(data) = validate_response(request.data_source, &response.cloud_init_data) {
        return Ok(data);
    }

    if response.cloud_init_no_cloud_source.is_empty() {
        return Err("response carries neither a usable canonical document nor a legacy source".to_string());
    }

    let legacy: LegacyNoCloudSource = serde_json::from_slice(&response.cloud_init_no_cloud_source)
        .map_err(|e| format!("legacy source did not decode: {e}"))?;

    let user_data = legacy.resolved_user_data()?;
    let network_data = legacy.resolved_network_data()?;
    if user_data.is_empty() && network_data.is_empty() {
        return Err(
            "userDataBase64, userData, networkDataBase64 or networkData is required in the legacy source"
                .to_string(),
        );
    }

    tracing::debug!("Reconstructing first-boot data from the legacy source");

    Ok(CloudInitData {
        user_data,
        network_data,
        ..request.clone()
    })
}
