//! JSON-RPC 2.0 wire types and error mapping.
//!
//! Request:
//! ```json
//! {"jsonrpc":"2.0","method":"pubkey-to-address","params":{"kwargs":{"pubkey":"..."}},"id":1}
//! ```
//!
//! Error response:
//! ```json
//! {"jsonrpc":"2.0","error":{"code":-32601,"message":"method not found: foo"},"id":1}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::nem::NemError;

/// JSON-RPC error codes used by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum JsonRpcErrorCode {
    /// Invalid JSON was received.
    ParseError = -32700,
    /// The JSON sent is not a valid Request object.
    InvalidRequest = -32600,
    /// The method does not exist.
    MethodNotFound = -32601,
    /// Invalid method parameter(s).
    InvalidParams = -32602,
    /// Internal JSON-RPC error.
    InternalError = -32603,
    // Server-defined errors (-32000 to -32099)
    /// The node or the connection to it failed.
    NodeError = -32000,
}

/// JSON-RPC 2.0 request object.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version; tolerated when absent.
    #[serde(default)]
    pub jsonrpc: Option<String>,
    /// Method name to invoke.
    pub method: String,
    /// `{"kwargs": {...}, "args": [...]}`; only `kwargs` is read.
    #[serde(default)]
    pub params: Option<Value>,
    /// Correlation id, echoed verbatim.
    #[serde(default)]
    pub id: Value,
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    #[serde(default)]
    pub id: Value,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: JsonRpcErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code as i32,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Errors raised while serving RPC frames.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("method not found: {0}")]
    MethodNotFound(String),

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error(transparent)]
    Facade(#[from] NemError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("method already registered: {0}")]
    DuplicateMethod(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RpcError {
    /// Error code this failure is reported with.
    pub fn code(&self) -> JsonRpcErrorCode {
        match self {
            RpcError::Parse(_) => JsonRpcErrorCode::ParseError,
            RpcError::InvalidRequest(_) => JsonRpcErrorCode::InvalidRequest,
            RpcError::MethodNotFound(_) => JsonRpcErrorCode::MethodNotFound,
            RpcError::InvalidParams(_) => JsonRpcErrorCode::InvalidParams,
            RpcError::Facade(e) if e.is_input_error() => JsonRpcErrorCode::InvalidParams,
            RpcError::Facade(_) => JsonRpcErrorCode::NodeError,
            RpcError::Internal(_) | RpcError::DuplicateMethod(_) | RpcError::Io(_) => {
                JsonRpcErrorCode::InternalError
            }
        }
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RpcError::Parse(_) => "parse",
            RpcError::InvalidRequest(_) => "invalid_request",
            RpcError::MethodNotFound(_) => "method_not_found",
            RpcError::InvalidParams(_) => "invalid_params",
            RpcError::Facade(e) if e.is_input_error() => "invalid_params",
            RpcError::Facade(_) => "node_error",
            RpcError::Internal(_) | RpcError::DuplicateMethod(_) | RpcError::Io(_) => "internal",
        }
    }

    /// JSON-RPC error object; node errors carry the node's body as `data`.
    pub fn to_error_object(&self) -> JsonRpcError {
        let error = JsonRpcError::new(self.code(), self.to_string());
        match self {
            RpcError::Facade(NemError::Node {
                body: Some(body), ..
            }) => error.with_data(body.clone()),
            _ => error,
        }
    }

    pub fn into_response(self, id: Value) -> JsonRpcResponse {
        JsonRpcResponse::error(id, self.to_error_object())
    }
}
