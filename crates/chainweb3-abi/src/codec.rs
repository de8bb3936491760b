//! `AbiCodec`: the string-typed front door to the encoder and decoder,
//! plus function selectors and event topics.
//!
//! Selectors and topics are computed from canonical signatures:
//!   transfer(address,uint256)          → 0xa9059cbb
//!   Transfer(address,address,uint256)  → 0xddf252ad…b3ef

use serde_json::Value;
use tracing::debug;

use crate::decoder;
use crate::encoder;
use crate::error::AbiError;
use crate::hash::{HashProvider, Keccak256};
use crate::types::{split_components, type_token, SolidityType};
use crate::value::{decode_hex, AbiValue};

/// Encodes and decodes parameter lists described by type strings.
#[derive(Debug, Clone, Default)]
pub struct AbiCodec<H: HashProvider = Keccak256> {
    hasher: H,
}

impl AbiCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<H: HashProvider> AbiCodec<H> {
    /// Use a custom hash provider for selectors and topics.
    pub fn with_hasher(hasher: H) -> Self {
        Self { hasher }
    }

    pub fn parse_types(&self, types: &[&str]) -> Result<Vec<SolidityType>, AbiError> {
        types.iter().map(|t| SolidityType::parse(t)).collect()
    }

    /// Parse type names that arrive as untyped JSON. Anything but a string
    /// is an invalid argument.
    pub fn parse_json_types(&self, types: &[Value]) -> Result<Vec<SolidityType>, AbiError> {
        types
            .iter()
            .map(|t| match t {
                Value::String(s) => SolidityType::parse(s),
                other => Err(AbiError::InvalidArgument(format!(
                    "type must be a string, got {other}"
                ))),
            })
            .collect()
    }

    pub fn encode_parameters(&self, types: &[&str], values: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
        let types = self.parse_types(types)?;
        encoder::encode(&types, values)
    }

    /// Encode loose JSON values against JSON type names.
    pub fn encode_json(&self, types: &[Value], values: &[Value]) -> Result<Vec<u8>, AbiError> {
        let types = self.parse_json_types(types)?;
        if types.len() != values.len() {
            return Err(AbiError::InvalidArgument(format!(
                "expected {} values, got {}",
                types.len(),
                values.len()
            )));
        }
        let values = types
            .iter()
            .zip(values)
            .map(|(ty, v)| AbiValue::from_json(ty, v))
            .collect::<Result<Vec<_>, _>>()?;
        encoder::encode(&types, &values)
    }

    pub fn encode_parameter(&self, ty: &str, value: &AbiValue) -> Result<Vec<u8>, AbiError> {
        encoder::encode_single(&SolidityType::parse(ty)?, value)
    }

    pub fn decode_parameters(&self, types: &[&str], data: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
        let types = self.parse_types(types)?;
        decoder::decode(&types, data)
    }

    /// Decode `0x`-prefixed hex, as returned by `eth_call`.
    pub fn decode_hex_parameters(&self, types: &[&str], data: &str) -> Result<Vec<AbiValue>, AbiError> {
        self.decode_parameters(types, &decode_hex(data)?)
    }

    pub fn decode_parameter(&self, ty: &str, data: &[u8]) -> Result<AbiValue, AbiError> {
        decoder::decode_single(&SolidityType::parse(ty)?, data)
    }

    /// Canonical form of `name(type, ...)`: parameter names dropped, aliases
    /// such as `uint` expanded, whitespace removed.
    pub fn canonical_signature(&self, signature: &str) -> Result<String, AbiError> {
        let signature = signature.trim();
        let malformed = || AbiError::InvalidArgument(format!("malformed signature: {signature}"));
        let open = signature.find('(').ok_or_else(malformed)?;
        let name = signature[..open].trim();
        let inner = signature[open + 1..].strip_suffix(')').ok_or_else(malformed)?;
        if name.is_empty() {
            return Err(malformed());
        }
        let types = split_components(inner)
            .ok_or_else(malformed)?
            .into_iter()
            .map(|decl| SolidityType::parse(type_token(decl)).map(|t| t.to_string()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(format!("{name}({})", types.join(",")))
    }

    /// First four bytes of the signature hash, as `0x` + 8 hex chars.
    pub fn function_selector(&self, signature: &str) -> Result<String, AbiError> {
        Ok(format!("0x{}", hex::encode(self.selector_bytes(signature)?)))
    }

    pub fn selector_bytes(&self, signature: &str) -> Result<[u8; 4], AbiError> {
        let canonical = self.canonical_signature(signature)?;
        let hash = self.hasher.hash(canonical.as_bytes());
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&hash[..4]);
        debug!(signature = %canonical, selector = %hex::encode(selector), "computed selector");
        Ok(selector)
    }

    /// Full signature hash, as `0x` + 64 hex chars.
    pub fn event_topic(&self, signature: &str) -> Result<String, AbiError> {
        let canonical = self.canonical_signature(signature)?;
        let topic = format!("0x{}", hex::encode(self.hasher.hash(canonical.as_bytes())));
        debug!(signature = %canonical, %topic, "computed event topic");
        Ok(topic)
    }
}
