//! Request dispatch loop.
//!
//! # Data Flow
//! ```text
//! reader → FrameReader → parse → route → kwargs → spawn handler task
//!                                   │
//!                                   └─ rejected → error response
//! JoinSet (settled tasks) → response → writer
//! ```
//!
//! # Design Decisions
//! - One `select!` loop owns both halves of the stream, so responses are
//!   written whole and never interleave
//! - Responses go out in settlement order, not request order
//! - End of input or shutdown stops reading; in-flight tasks are drained

use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::DispatcherConfig;
use crate::nem::NodeFacade;
use crate::observability::metrics;
use crate::rpc::frame::{Frame, FrameReader};
use crate::rpc::registry::HandlerRegistry;
use crate::rpc::types::{JsonRpcRequest, JsonRpcResponse, RpcError};

/// Counters reported when `serve` returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServeSummary {
    /// Non-blank frames read.
    pub frames: u64,
    /// Responses written.
    pub responses: u64,
}

/// Routes request frames to registered handlers.
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    facade: Arc<dyn NodeFacade>,
    max_frame_bytes: usize,
}

impl Dispatcher {
    pub fn new(registry: HandlerRegistry, facade: Arc<dyn NodeFacade>, config: &DispatcherConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            facade,
            max_frame_bytes: config.max_frame_bytes,
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Serve frames from `reader` until end of input or shutdown.
    ///
    /// Returns once every accepted request has been answered. Fails only
    /// when the writer fails.
    pub async fn serve<R, W>(
        &self,
        reader: R,
        mut writer: W,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<ServeSummary, RpcError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut frames = FrameReader::new(reader, self.max_frame_bytes);
        let mut in_flight: JoinSet<JsonRpcResponse> = JoinSet::new();
        let mut summary = ServeSummary::default();
        let mut reading = true;
        // Cleared when the shutdown sender is gone.
        let mut listening = true;

        loop {
            tokio::select! {
                frame = frames.next_frame(), if reading => match frame {
                    Ok(Some(frame)) => {
                        summary.frames += 1;
                        if let Some(response) = self.accept(frame, &mut in_flight) {
                            write_response(&mut writer, &response).await?;
                            summary.responses += 1;
                        }
                    }
                    Ok(None) => {
                        tracing::debug!(in_flight = in_flight.len(), "End of input");
                        reading = false;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to read input, draining");
                        reading = false;
                    }
                },
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    let response = joined.unwrap_or_else(|e| {
                        tracing::error!(error = %e, "Request task failed");
                        RpcError::Internal("request task failed".to_string()).into_response(Value::Null)
                    });
                    write_response(&mut writer, &response).await?;
                    summary.responses += 1;
                }
                signal = shutdown.recv(), if reading && listening => match signal {
                    Err(broadcast::error::RecvError::Closed) => listening = false,
                    _ => {
                        tracing::info!(in_flight = in_flight.len(), "Shutdown requested, draining");
                        reading = false;
                    }
                },
                else => break,
            }
        }

        tracing::info!(frames = summary.frames, responses = summary.responses, "Dispatcher stopped");
        Ok(summary)
    }

    /// Route one frame: either spawn its handler or answer immediately.
    fn accept(&self, frame: Frame, in_flight: &mut JoinSet<JsonRpcResponse>) -> Option<JsonRpcResponse> {
        let bytes = match frame {
            Frame::Data(bytes) => bytes,
            Frame::Oversized { len } => {
                tracing::warn!(len, limit = self.max_frame_bytes, "Frame too large");
                metrics::record_frame_error("oversized");
                return Some(
                    RpcError::InvalidRequest(format!(
                        "frame of {} bytes exceeds limit of {}",
                        len, self.max_frame_bytes
                    ))
                    .into_response(Value::Null),
                );
            }
        };

        let (id, request) = match parse_request(&bytes) {
            Ok(parsed) => parsed,
            Err((id, e)) => {
                tracing::warn!(error = %e, "Rejected frame");
                metrics::record_frame_error(e.kind());
                return Some(e.into_response(id));
            }
        };

        let handler = match self.registry.get(&request.method) {
            Some(handler) => handler,
            None => {
                let e = RpcError::MethodNotFound(request.method);
                tracing::warn!(error = %e, id = %id, "Unknown method");
                metrics::record_frame_error(e.kind());
                return Some(e.into_response(id));
            }
        };

        let kwargs = match unwrap_kwargs(request.params) {
            Ok(kwargs) => kwargs,
            Err(e) => {
                tracing::warn!(method = %request.method, error = %e, "Rejected params");
                metrics::record_request(&request.method, e.kind(), Instant::now());
                return Some(e.into_response(id));
            }
        };

        let method = request.method;
        let fut = handler.call(kwargs, Arc::clone(&self.facade));
        let span = tracing::info_span!("rpc", method = %method, request_id = %Uuid::new_v4());

        in_flight.spawn(
            async move {
                let start = Instant::now();
                tracing::debug!(id = %id, "Request started");
                match fut.await {
                    Ok(result) => {
                        metrics::record_request(&method, "success", start);
                        tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, "Request completed");
                        JsonRpcResponse::success(id, result)
                    }
                    Err(e) => {
                        metrics::record_request(&method, e.kind(), start);
                        match &e {
                            RpcError::Facade(_) => tracing::error!(id = %id, error = %e, "Facade call failed"),
                            _ => tracing::warn!(id = %id, error = %e, "Request failed"),
                        }
                        e.into_response(id)
                    }
                }
            }
            .instrument(span),
        );

        None
    }
}

/// Parse a frame into a request, keeping the id for error replies.
fn parse_request(bytes: &[u8]) -> Result<(Value, JsonRpcRequest), (Value, RpcError)> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| (Value::Null, RpcError::Parse(e.to_string())))?;

    let id = match &value {
        Value::Object(map) => map.get("id").cloned().unwrap_or(Value::Null),
        Value::Array(_) => {
            return Err((
                Value::Null,
                RpcError::InvalidRequest("batch requests are not supported".to_string()),
            ))
        }
        _ => {
            return Err((
                Value::Null,
                RpcError::InvalidRequest("request must be a JSON object".to_string()),
            ))
        }
    };

    let request: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => return Err((id, RpcError::InvalidRequest(e.to_string()))),
    };

    if let Some(version) = request.jsonrpc.as_deref() {
        if version != "2.0" {
            return Err((
                id,
                RpcError::InvalidRequest(format!("unsupported jsonrpc version '{}'", version)),
            ));
        }
    }

    Ok((id, request))
}

/// Extract `params.kwargs`; absent `params` or `kwargs` is `{}`.
fn unwrap_kwargs(params: Option<Value>) -> Result<Value, RpcError> {
    let mut params = match params {
        None | Some(Value::Null) => return Ok(json!({})),
        Some(Value::Object(map)) => map,
        Some(_) => return Err(RpcError::InvalidParams("params must be an object".to_string())),
    };

    match params.remove("kwargs") {
        None | Some(Value::Null) => Ok(json!({})),
        Some(kwargs @ Value::Object(_)) => Ok(kwargs),
        Some(_) => Err(RpcError::InvalidParams("kwargs must be an object".to_string())),
    }
}

/// Write one response frame: a single write of the JSON plus `\n`, then flush.
async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &JsonRpcResponse) -> Result<(), RpcError> {
    let mut line = match serde_json::to_vec(response) {
        Ok(line) => line,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response");
            let fallback = RpcError::Internal("failed to serialize response".to_string())
                .into_response(response.id.clone());
            serde_json::to_vec(&fallback).map_err(|e| RpcError::Internal(e.to_string()))?
        }
    };
    line.push(b'\n');

    writer.write_all(&line).await?;
    writer.flush().await?;
    Ok(())
}
