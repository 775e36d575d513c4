//! JSON-RPC client over one Unix socket connection.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::net::UnixStream;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::trace;
use uuid::Uuid;

use crate::error::HookError;
use crate::protocol::{JsonRpcRequest, JsonRpcResponse, MAX_FRAME_BYTES};

/// An open connection to a sidecar socket.
#[derive(Debug)]
pub struct RpcConnection {
    socket: PathBuf,
    framed: Framed<UnixStream, LinesCodec>,
}

impl RpcConnection {
    /// Connects to `socket`, giving up after `timeout`.
    pub async fn dial(socket: &Path, timeout: Duration) -> Result<Self, HookError> {
        let stream = match tokio::time::timeout(timeout, UnixStream::connect(socket)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(HookError::Dial {
                    socket: socket.to_path_buf(),
                    source,
                });
            }
            Err(_) => {
                return Err(HookError::Dial {
                    socket: socket.to_path_buf(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        format!("connect timed out after {timeout:?}"),
                    ),
                });
            }
        };

        Ok(Self {
            socket: socket.to_path_buf(),
            framed: Framed::new(stream, LinesCodec::new_with_max_length(MAX_FRAME_BYTES)),
        })
    }

    /// Socket this connection talks to.
    pub fn socket(&self) -> &Path {
        &self.socket
    }

    /// Sends one request and waits for its response, bounded by `timeout`.
    pub async fn call<P, R>(&mut self, method: &str, params: &P, timeout: Duration) -> Result<R, HookError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let id = Value::String(Uuid::new_v4().to_string());
        let request = JsonRpcRequest::with_id(method, serde_json::to_value(params)?, id.clone());
        let frame = serde_json::to_string(&request)?;

        trace!(socket = %self.socket.display(), method = %method, "Sending request");

        let response = match tokio::time::timeout(timeout, self.exchange(frame)).await {
            Ok(response) => response?,
            Err(_) => {
                return Err(HookError::CallTimeout {
                    socket: self.socket.clone(),
                    method: method.to_string(),
                    timeout,
                });
            }
        };

        if response.id != id {
            return Err(self.protocol_error(format!(
                "response id {} does not match request id {}",
                response.id, id
            )));
        }

        if let Some(error) = response.error {
            return Err(HookError::Rpc {
                socket: self.socket.clone(),
                method: method.to_string(),
                code: error.code,
                message: error.message,
            });
        }

        let result = response
            .result
            .ok_or_else(|| self.protocol_error(format!("{method} returned neither result nor error")))?;

        serde_json::from_value(result)
            .map_err(|e| self.protocol_error(format!("cannot decode {method} result: {e}")))
    }

    async fn exchange(&mut self, frame: String) -> Result<JsonRpcResponse, HookError> {
        self.framed
            .send(frame)
            .await
            .map_err(|e| self.protocol_error(format!("write failed: {e}")))?;

        let line = match self.framed.next().await {
            Some(Ok(line)) => line,
            Some(Err(e)) => return Err(self.protocol_error(format!("read failed: {e}"))),
            None => return Err(self.protocol_error("connection closed before response")),
        };

        serde_json::from_str(&line).map_err(|e| self.protocol_error(format!("invalid frame: {e}")))
    }

    fn protocol_error(&self, message: impl Into<String>) -> HookError {
        HookError::Protocol {
            socket: self.socket.clone(),
            message: message.into(),
        }
    }
}
