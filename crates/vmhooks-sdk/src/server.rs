//! Sidecar server loop.
//!
//! Binds one socket in the shared hook directory and serves the protocol
//! until a termination signal, a fatal accept error, or a `Shutdown` call,
//! whichever comes first. The socket file is removed on the way out.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::net::{UnixListener, UnixStream};
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use vmhooks_core::config::SidecarConfig;
use vmhooks_manager::hooks::HookName;
use vmhooks_manager::protocol::messages::{
    InfoResult, OnDefineDomainParams, PreCloudInitIsoParams, ShutdownResult,
};
use vmhooks_manager::protocol::version::ProtocolVersion;
use vmhooks_manager::protocol::{
    INFO_METHOD, JsonRpcRequest, JsonRpcResponse, MAX_FRAME_BYTES, error_codes,
    parse_callback_method,
};

use crate::error::SidecarError;
use crate::traits::SidecarCallbacks;

/// A sidecar ready to bind.
#[derive(Debug)]
pub struct SidecarServer {
    info: InfoResult,
    callbacks: Arc<dyn SidecarCallbacks>,
}

impl SidecarServer {
    /// Creates a server answering Info with `info` and dispatching callbacks
    /// to `callbacks`.
    pub fn new(info: InfoResult, callbacks: Arc<dyn SidecarCallbacks>) -> Self {
        Self { info, callbacks }
    }

    /// Binds `socket_path`, creating its directory and replacing a stale file.
    pub async fn bind(self, socket_path: impl AsRef<Path>) -> Result<BoundSidecar, SidecarError> {
        let path = socket_path.as_ref().to_path_buf();
        let bind_error = |source| SidecarError::Bind {
            path: path.clone(),
            source,
        };

        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await.map_err(bind_error)?;
        }

        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!(socket = %path.display(), "Removed stale socket file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(bind_error(e)),
        }

        let listener = UnixListener::bind(&path).map_err(bind_error)?;

        info!(
            plugin = %self.info.name,
            socket = %path.display(),
            versions = ?self.info.versions,
            "Hook sidecar listening"
        );

        let stop = CancellationToken::new();
        Ok(BoundSidecar {
            listener,
            socket_path: path,
            handler: Arc::new(ConnectionHandler {
                info: self.info,
                callbacks: self.callbacks,
                stop: stop.clone(),
            }),
            stop,
        })
    }

    /// Binds the socket named by the sidecar configuration.
    pub async fn bind_in(self, config: &SidecarConfig) -> Result<BoundSidecar, SidecarError> {
        let path = config.socket_path(&self.info.name);
        self.bind(path).await
    }
}

/// A bound sidecar socket.
#[derive(Debug)]
pub struct BoundSidecar {
    listener: UnixListener,
    socket_path: PathBuf,
    handler: Arc<ConnectionHandler>,
    stop: CancellationToken,
}

impl BoundSidecar {
    /// Path of the bound socket.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Token cancelled when the manager sends `Shutdown`. Cancelling it also
    /// stops the server.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Serves until `signal` resolves, `Shutdown` is received, or accepting
    /// fails.
    pub async fn serve_until<F>(self, signal: F) -> Result<(), SidecarError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(signal);

        let result = loop {
            tokio::select! {
                _ = &mut signal => {
                    info!("Termination signal received, stopping hook sidecar");
                    break Ok(());
                }
                _ = self.stop.cancelled() => {
                    info!("Shutdown requested, stopping hook sidecar");
                    break Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, _)) => {
                        let handler = Arc::clone(&self.handler);
                        tokio::spawn(async move {
                            if let Err(e) = handler.serve_connection(stream).await {
                                debug!(error = %e, "Hook connection closed with error");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to accept hook connection");
                        break Err(SidecarError::Serve(e));
                    }
                },
            }
        };

        drop(self.listener);
        if let Err(e) = tokio::fs::remove_file(&self.socket_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(socket = %self.socket_path.display(), error = %e, "Failed to remove socket file");
            }
        }

        result
    }

    /// Serves until SIGINT/SIGTERM or `Shutdown`.
    pub async fn run(self) -> Result<(), SidecarError> {
        self.serve_until(shutdown_signal()).await
    }
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Per-server request dispatcher, shared by every connection.
#[derive(Debug)]
struct ConnectionHandler {
    info: InfoResult,
    callbacks: Arc<dyn SidecarCallbacks>,
    stop: CancellationToken,
}

impl ConnectionHandler {
    async fn serve_connection(&self, stream: UnixStream) -> Result<(), SidecarError> {
        let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_FRAME_BYTES));

        while let Some(line) = framed.next().await {
            let line = line.map_err(codec_error)?;
            if line.trim().is_empty() {
                continue;
            }

            let (response, stop_after) = self.process_line(&line).await;
            framed
                .send(serde_json::to_string(&response)?)
                .await
                .map_err(codec_error)?;

            if stop_after {
                self.stop.cancel();
            }
        }

        Ok(())
    }

    /// Returns the response and whether the server should stop after sending it.
    async fn process_line(&self, line: &str) -> (JsonRpcResponse, bool) {
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                return (
                    JsonRpcResponse::error(Value::Null, error_codes::PARSE_ERROR, format!("Parse error: {e}")),
                    false,
                );
            }
        };

        if request.jsonrpc != "2.0" {
            return (
                JsonRpcResponse::error(request.id, error_codes::INVALID_REQUEST, "Invalid JSON-RPC version"),
                false,
            );
        }

        debug!(method = %request.method, "Hook request");

        if request.method == INFO_METHOD {
            return (respond(request.id, &self.info), false);
        }

        let Some((version, hook)) = self.resolve_method(&request.method) else {
            return (
                JsonRpcResponse::error(
                    request.id,
                    error_codes::METHOD_NOT_FOUND,
                    format!("Method not found: {}", request.method),
                ),
                false,
            );
        };

        let id = request.id;
        let params = match request.params {
            Value::Null => Value::Object(Default::default()),
            params => params,
        };

        match hook {
            HookName::OnDefineDomain => {
                let params: OnDefineDomainParams = match decode(params) {
                    Ok(p) => p,
                    Err(message) => return (invalid_params(id, message), false),
                };
                match self.callbacks.on_define_domain(params).await {
                    Ok(result) => (respond(id, &result), false),
                    Err(e) => (callback_failed(id, hook, version, e), false),
                }
            }
            HookName::PreCloudInitIso => {
                let params: PreCloudInitIsoParams = match decode(params) {
                    Ok(p) => p,
                    Err(message) => return (invalid_params(id, message), false),
                };
                match self.callbacks.pre_cloud_init_iso(params).await {
                    Ok(result) => (respond(id, &result), false),
                    Err(e) => (callback_failed(id, hook, version, e), false),
                }
            }
            HookName::Shutdown => match self.callbacks.shutdown().await {
                Ok(()) => (respond(id, &ShutdownResult::default()), true),
                Err(e) => (callback_failed(id, hook, version, e), false),
            },
        }
    }

    /// Accepts a callback only for a revision this sidecar advertises and
    /// that exposes the hook.
    fn resolve_method(&self, method: &str) -> Option<(ProtocolVersion, HookName)> {
        let (version, hook) = parse_callback_method(method)?;
        let advertised = self.info.versions.iter().any(|v| v == version.as_str());
        (advertised && version.supports(hook)).then_some((version, hook))
    }
}

fn decode<P: DeserializeOwned>(params: Value) -> Result<P, String> {
    serde_json::from_value(params).map_err(|e| format!("Invalid params: {e}"))
}

fn respond<R: Serialize>(id: Value, result: &R) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, error_codes::INTERNAL_ERROR, format!("Internal error: {e}")),
    }
}

fn invalid_params(id: Value, message: String) -> JsonRpcResponse {
    JsonRpcResponse::error(id, error_codes::INVALID_PARAMS, message)
}

fn callback_failed(id: Value, hook: HookName, version: ProtocolVersion, err: SidecarError) -> JsonRpcResponse {
    warn!(hook = %hook, version = %version, error = %err, "Hook callback failed");
    JsonRpcResponse::error(id, error_codes::CALLBACK_FAILED, err.to_string())
}

fn codec_error(err: LinesCodecError) -> SidecarError {
    match err {
        LinesCodecError::Io(e) => SidecarError::Serve(e),
        other => SidecarError::Serve(std::io::Error::new(std::io::ErrorKind::InvalidData, other)),
    }
}
