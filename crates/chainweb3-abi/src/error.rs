//! Error types for the ABI codec and contract bindings.

use chainweb3_core::Web3Error;
use thiserror::Error;

/// Errors raised while parsing types or encoding/decoding ABI data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AbiError {
    #[error("Invalid type '{ty}': {reason}")]
    TypeParse { ty: String, reason: String },

    #[error("ABI codec error: {0}")]
    Codec(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Rpc(#[from] Web3Error),
}

impl AbiError {
    pub(crate) fn type_parse(ty: &str, reason: impl Into<String>) -> Self {
        Self::TypeParse {
            ty: ty.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<hex::FromHexError> for AbiError {
    fn from(e: hex::FromHexError) -> Self {
        Self::Codec(format!("invalid hex: {e}"))
    }
}
