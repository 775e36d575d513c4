//! Wire protocol between the manager and hook sidecars.
//!
//! Newline-delimited JSON-RPC 2.0 frames over a Unix stream socket. The
//! `Info.Info` method is version independent; callbacks are namespaced by
//! protocol revision, e.g. `v1alpha2.Callbacks.PreCloudInitIso`.

pub mod messages;
pub mod version;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::hooks::definitions::HookName;
use self::version::ProtocolVersion;

/// Version-independent capability query.
pub const INFO_METHOD: &str = "Info.Info";

/// Upper bound on one frame; domain definitions travel base64-encoded.
pub const MAX_FRAME_BYTES: usize = 64 * 1024 * 1024;

const CALLBACKS_SERVICE: &str = "Callbacks";

/// Builds the method name of a versioned callback.
pub fn callback_method(version: ProtocolVersion, hook: HookName) -> String {
    format!("{}.{}.{}", version.as_str(), CALLBACKS_SERVICE, hook.as_str())
}

/// Splits a versioned callback method name. Unknown revisions or hooks yield `None`.
pub fn parse_callback_method(method: &str) -> Option<(ProtocolVersion, HookName)> {
    let mut parts = method.split('.');
    let version = parts.next()?.parse().ok()?;
    if parts.next()? != CALLBACKS_SERVICE {
        return None;
    }
    let hook = HookName::parse(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some((version, hook))
}

/// One request frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Always `"2.0"`.
    pub jsonrpc: String,
    /// `Info.Info` or a versioned callback method.
    pub method: String,
    /// Method payload; absent params decode as `null`.
    #[serde(default)]
    pub params: Value,
    /// Correlates the response with this request.
    pub id: Value,
}

impl JsonRpcRequest {
    /// Builds a request carrying `id`.
    pub fn with_id(method: impl Into<String>, params: Value, id: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params,
            id,
        }
    }
}

/// One response frame. Exactly one of `result` and `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Always `"2.0"`.
    pub jsonrpc: String,
    /// Method result on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure reported by the sidecar.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    /// Id of the request being answered, `null` if it could not be read.
    pub id: Value,
}

impl JsonRpcResponse {
    /// Answers `id` with `result`.
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Answers `id` with an error object.
    pub fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
            id,
        }
    }
}

/// Error object of a failed call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// One of [`error_codes`].
    pub code: i32,
    /// Human-readable reason.
    pub message: String,
}

/// Error codes used on the hook sockets.
pub mod error_codes {
    /// The frame is not valid JSON.
    pub const PARSE_ERROR: i32 = -32700;
    /// The frame is JSON but not a 2.0 request.
    pub const INVALID_REQUEST: i32 = -32600;
    /// Unknown method, or a callback the advertised revisions do not expose.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Params do not decode into the method's payload.
    pub const INVALID_PARAMS: i32 = -32602;
    /// The result could not be encoded.
    pub const INTERNAL_ERROR: i32 = -32603;

    /// The sidecar's callback implementation returned an error.
    pub const CALLBACK_FAILED: i32 = -32000;
}
