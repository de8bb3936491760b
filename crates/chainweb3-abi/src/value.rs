//! ABI values and their JSON representation.
//!
//! JSON is the loose input format used by the CLI and by contract calls:
//! integers as numbers or decimal/`0x` strings, byte strings as `0x` hex,
//! arrays and tuples as JSON arrays.

use std::str::FromStr;

use alloy_primitives::{Address, I256, U256};
use serde_json::Value;

use crate::error::AbiError;
use crate::types::{ArrayDim, BaseType, SolidityType};

/// A typed value that can be ABI-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Uint(U256),
    Int(I256),
    Address(Address),
    Bool(bool),
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
    Array(Vec<AbiValue>),
    Tuple(Vec<AbiValue>),
}

impl AbiValue {
    /// Build a value of type `ty` from loose JSON input.
    pub fn from_json(ty: &SolidityType, value: &Value) -> Result<Self, AbiError> {
        if let Some(dim) = ty.outer_dim() {
            let Value::Array(items) = value else {
                return Err(mismatch(ty, value));
            };
            if let ArrayDim::Fixed(n) = dim {
                if items.len() != n {
                    return Err(AbiError::InvalidArgument(format!(
                        "{ty} expects {n} elements, got {}",
                        items.len()
                    )));
                }
            }
            let element = ty.element_type().ok_or_else(|| mismatch(ty, value))?;
            return items
                .iter()
                .map(|item| Self::from_json(&element, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Array);
        }

        match (&ty.base, value) {
            (BaseType::Uint(bits), _) => {
                let n = parse_uint(value).ok_or_else(|| mismatch(ty, value))?;
                if n.bit_len() > *bits {
                    return Err(out_of_range(ty, value));
                }
                Ok(Self::Uint(n))
            }
            (BaseType::Int(bits), _) => {
                let n = parse_int(value).ok_or_else(|| mismatch(ty, value))?;
                if !int_fits(n, *bits) {
                    return Err(out_of_range(ty, value));
                }
                Ok(Self::Int(n))
            }
            (BaseType::Address, Value::String(s)) => Address::from_str(s)
                .map(Self::Address)
                .map_err(|_| mismatch(ty, value)),
            (BaseType::Bool, Value::Bool(b)) => Ok(Self::Bool(*b)),
            (BaseType::FixedBytes(n), Value::String(s)) => {
                let bytes = decode_hex(s)?;
                if bytes.len() != *n {
                    return Err(AbiError::InvalidArgument(format!(
                        "{ty} expects exactly {n} bytes, got {}",
                        bytes.len()
                    )));
                }
                Ok(Self::FixedBytes(bytes))
            }
            (BaseType::Bytes, Value::String(s)) => Ok(Self::Bytes(decode_hex(s)?)),
            (BaseType::String, Value::String(s)) => Ok(Self::String(s.clone())),
            (BaseType::Tuple(components), Value::Array(items)) => {
                if items.len() != components.len() {
                    return Err(AbiError::InvalidArgument(format!(
                        "{ty} expects {} components, got {}",
                        components.len(),
                        items.len()
                    )));
                }
                components
                    .iter()
                    .zip(items)
                    .map(|(c, item)| Self::from_json(c, item))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Self::Tuple)
            }
            _ => Err(mismatch(ty, value)),
        }
    }

    /// JSON rendering: integers as decimal strings, addresses and bytes as
    /// lower-case `0x` hex.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Uint(n) => Value::String(n.to_string()),
            Self::Int(n) => Value::String(n.to_string()),
            Self::Address(a) => Value::String(format!("{a:#x}")),
            Self::Bool(b) => Value::Bool(*b),
            Self::FixedBytes(b) | Self::Bytes(b) => Value::String(format!("0x{}", hex::encode(b))),
            Self::String(s) => Value::String(s.clone()),
            Self::Array(items) | Self::Tuple(items) => {
                Value::Array(items.iter().map(Self::to_json).collect())
            }
        }
    }
}

impl From<bool> for AbiValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<U256> for AbiValue {
    fn from(n: U256) -> Self {
        Self::Uint(n)
    }
}

impl From<u64> for AbiValue {
    fn from(n: u64) -> Self {
        Self::Uint(U256::from(n))
    }
}

impl From<I256> for AbiValue {
    fn from(n: I256) -> Self {
        Self::Int(n)
    }
}

impl From<Address> for AbiValue {
    fn from(a: Address) -> Self {
        Self::Address(a)
    }
}

impl From<&str> for AbiValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<Vec<AbiValue>> for AbiValue {
    fn from(items: Vec<AbiValue>) -> Self {
        Self::Array(items)
    }
}

/// Decode `0x`-prefixed (or bare) hex.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, AbiError> {
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    Ok(hex::decode(digits)?)
}

/// `true` if `n` is representable as a two's-complement integer of `bits`.
pub(crate) fn int_fits(n: I256, bits: usize) -> bool {
    if bits >= 256 {
        return true;
    }
    let word = n.to_be_bytes::<32>();
    let width = bits / 8;
    let sign = if n.is_negative() { 0xff } else { 0x00 };
    let high_bit_set = word[32 - width] & 0x80 != 0;
    word[..32 - width].iter().all(|b| *b == sign) && high_bit_set == n.is_negative()
}

fn parse_uint(value: &Value) -> Option<U256> {
    match value {
        Value::Number(n) => n.as_u64().map(U256::from),
        Value::String(s) => U256::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn parse_int(value: &Value) -> Option<I256> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|i| I256::try_from(i).ok()),
        Value::String(s) => {
            let s = s.trim();
            if s.starts_with("0x") || s.starts_with("-0x") {
                I256::from_hex_str(s).ok()
            } else {
                I256::from_dec_str(s).ok()
            }
        }
        _ => None,
    }
}

fn mismatch(ty: &SolidityType, value: &Value) -> AbiError {
    AbiError::InvalidArgument(format!("{value} is not a valid {ty}"))
}

fn out_of_range(ty: &SolidityType, value: &Value) -> AbiError {
    AbiError::InvalidArgument(format!("{value} is out of range for {ty}"))
}
