//! Error taxonomy for the dispatch layer.
//!
//! Local errors (`Validation`, `UnsupportedMethod`, `InvalidArgument`,
//! `State`) are raised before anything reaches the transport. `Transport`
//! and `Rpc` errors are delivered to the caller's callback or future.

use thiserror::Error;

use crate::request::JsonRpcError;

/// Errors raised by an [`RpcTransport`](crate::transport::RpcTransport).
///
/// `Clone` so a single failed dispatch can be reported to every pending
/// callback that rode on it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    /// HTTP request failed (connection refused, reset, etc.).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The endpoint answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Request timed out after the configured duration.
    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// The reply body was not a valid JSON-RPC message.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// An unexpected error.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Returns `true` if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Malformed(_) | Self::Other(_) => false,
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}

/// Errors surfaced to callers of the request manager and method registry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Web3Error {
    /// Network or transport failure. Not retried at this layer.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The node answered with a JSON-RPC error object.
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Rpc(JsonRpcError),

    /// A parameter failed its validator; nothing was sent.
    #[error("Invalid value for parameter {index} ({param}) of {method}")]
    Validation {
        method: String,
        index: usize,
        param: String,
    },

    /// The method is not in the namespace allow-list.
    #[error("Unallowed rpc method: {method}")]
    UnsupportedMethod { method: String },

    /// Malformed argument, callback, or formatter input.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation not valid in the manager's current state.
    #[error("Invalid state: {0}")]
    State(String),

    /// A batch reply did not contain an answer for this request id.
    #[error("No response for request id {id}")]
    MissingResponse { id: u64 },
}

impl Web3Error {
    /// Returns `true` for errors raised locally, before any network activity.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::UnsupportedMethod { .. }
                | Self::InvalidArgument(_)
                | Self::State(_)
        )
    }

    /// The node's error object, if this is an RPC error.
    pub fn rpc_error(&self) -> Option<&JsonRpcError> {
        match self {
            Self::Rpc(err) => Some(err),
            _ => None,
        }
    }
}

impl From<JsonRpcError> for Web3Error {
    fn from(err: JsonRpcError) -> Self {
        Self::Rpc(err)
    }
}
