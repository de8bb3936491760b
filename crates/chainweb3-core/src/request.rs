//! JSON-RPC 2.0 wire types.
//!
//! Requests always carry a numeric id allocated by the
//! [`RequestManager`](crate::manager::RequestManager). Responses accept any
//! id shape a node may echo back (nodes answer parse errors with `null`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransportError;

/// JSON-RPC response ID: string, number, or null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcId {
    Number(u64),
    String(String),
    Null,
}

impl RpcId {
    pub fn number(n: u64) -> Self {
        Self::Number(n)
    }

    /// The numeric id, if the node echoed one.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::String(s) => s.parse().ok(),
            Self::Null => None,
        }
    }
}

impl Default for RpcId {
    fn default() -> Self {
        Self::Null
    }
}

impl std::fmt::Display for RpcId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Null => write!(f, "null"),
        }
    }
}

/// A single JSON-RPC parameter value.
pub type RpcParam = Value;

/// A JSON-RPC 2.0 request.
///
/// Field order matches the wire layout:
/// `{"jsonrpc":"2.0","method":..,"params":[..],"id":..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<RpcParam>,
    pub id: u64,
}

impl JsonRpcRequest {
    /// Create a new JSON-RPC 2.0 request.
    pub fn new(id: u64, method: impl Into<String>, params: Vec<RpcParam>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            method: method.into(),
            params,
            id,
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

/// A JSON-RPC 2.0 response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: RpcId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Build a successful response.
    pub fn success(id: u64, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id: RpcId::Number(id),
            result: Some(result),
            error: None,
        }
    }

    /// Build an error response.
    pub fn failure(id: u64, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id: RpcId::Number(id),
            result: None,
            error: Some(error),
        }
    }

    /// Returns `true` if this response carries no error object.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Unwrap the result value or return the error object.
    ///
    /// A `"result": null` reply is a success carrying `Value::Null`.
    pub fn into_result(self) -> Result<Value, JsonRpcError> {
        if let Some(err) = self.error {
            Err(err)
        } else {
            Ok(self.result.unwrap_or(Value::Null))
        }
    }
}

/// What a node sent back for a batch message.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchReply {
    /// One response object per request, in any order.
    Responses(Vec<JsonRpcResponse>),
    /// The node rejected the whole batch with a single error object.
    Rejected(JsonRpcError),
}

/// Parse the body of a single-request reply.
pub fn decode_response(raw: &[u8]) -> Result<JsonRpcResponse, TransportError> {
    Ok(serde_json::from_slice(raw)?)
}

/// Parse the body of a batch reply.
pub fn decode_batch(raw: &[u8]) -> Result<BatchReply, TransportError> {
    let value: Value = serde_json::from_slice(raw)?;
    match value {
        Value::Array(_) => Ok(BatchReply::Responses(serde_json::from_value(value)?)),
        Value::Object(_) => {
            let resp: JsonRpcResponse = serde_json::from_value(value)?;
            match resp.error {
                Some(err) => Ok(BatchReply::Rejected(err)),
                None => Err(TransportError::Malformed(
                    "expected an array of responses for a batch request".into(),
                )),
            }
        }
        other => Err(TransportError::Malformed(format!(
            "unexpected batch reply: {other}"
        ))),
    }
}
