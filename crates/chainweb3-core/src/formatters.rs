//! Input and output formatters applied around a dispatch.
//!
//! Input formatters run after validation and normalise caller values into
//! the shapes nodes expect (hex quantities, lower-cased addresses). Output
//! formatters run on successful results before they reach the caller.

use alloy_primitives::U256;
use serde_json::{Map, Value};

use crate::error::{TransportError, Web3Error};
use crate::validators::{is_decimal, BLOCK_TAGS};

/// Normalises one request parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFormatter {
    #[default]
    Raw,
    Quantity,
    Address,
    BlockTag,
    Hex,
    Boolean,
    Transaction,
    Filter,
    Post,
}

impl InputFormatter {
    pub fn apply(self, value: Value) -> Result<Value, Web3Error> {
        match self {
            Self::Raw => Ok(value),
            Self::Quantity => to_quantity(&value).map(Value::String),
            Self::Address => Ok(lowercase(value)),
            Self::BlockTag => match &value {
                Value::String(s) if BLOCK_TAGS.contains(&s.as_str()) => Ok(value),
                _ => to_quantity(&value).map(Value::String),
            },
            Self::Hex => to_hex(&value).map(Value::String),
            Self::Boolean => match &value {
                Value::Bool(_) => Ok(value),
                Value::String(s) if s == "true" || s == "false" => Ok(Value::Bool(s == "true")),
                _ => Err(invalid("boolean", &value)),
            },
            Self::Transaction => format_object(value, |key, v| match key {
                "gas" | "gasPrice" | "value" | "nonce" => to_quantity(&v).map(Value::String),
                "from" | "to" => Ok(lowercase(v)),
                _ => Ok(v),
            }),
            Self::Filter => format_object(value, |key, v| match key {
                "fromBlock" | "toBlock" => Self::BlockTag.apply(v),
                "address" => Ok(match v {
                    Value::Array(items) => Value::Array(items.into_iter().map(lowercase).collect()),
                    other => lowercase(other),
                }),
                _ => Ok(v),
            }),
            Self::Post => format_object(value, |key, v| match key {
                "priority" | "ttl" => to_quantity(&v).map(Value::String),
                _ => Ok(v),
            }),
        }
    }
}

/// Post-processes a successful result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormatter {
    #[default]
    Raw,
    /// Hex quantity → JSON number (decimal string when wider than `u64`).
    Quantity,
    /// JSON boolean, or a `0x0`/`0x1` quantity.
    Boolean,
}

impl OutputFormatter {
    pub fn apply(self, value: Value) -> Result<Value, Web3Error> {
        match self {
            Self::Raw => Ok(value),
            Self::Quantity => match &value {
                Value::Number(_) => Ok(value),
                Value::String(s) => parse_quantity(s).ok_or_else(|| malformed("quantity", &value)),
                _ => Err(malformed("quantity", &value)),
            },
            Self::Boolean => match &value {
                Value::Bool(_) => Ok(value),
                Value::String(s) if s == "0x0" => Ok(Value::Bool(false)),
                Value::String(s) if s == "0x1" => Ok(Value::Bool(true)),
                _ => Err(malformed("boolean", &value)),
            },
        }
    }
}

fn malformed(expected: &str, got: &Value) -> Web3Error {
    TransportError::Malformed(format!("expected {expected} result, got {got}")).into()
}

fn invalid(what: &str, got: &Value) -> Web3Error {
    Web3Error::InvalidArgument(format!("cannot format {got} as {what}"))
}

fn lowercase(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.to_ascii_lowercase()),
        other => other,
    }
}

fn format_object(
    value: Value,
    field: impl Fn(&str, Value) -> Result<Value, Web3Error>,
) -> Result<Value, Web3Error> {
    let Value::Object(map) = value else {
        return Err(invalid("object", &value));
    };
    let mut out = Map::with_capacity(map.len());
    for (key, v) in map {
        let formatted = field(&key, v)?;
        out.insert(key, formatted);
    }
    Ok(Value::Object(out))
}

/// `0x`/`0X` prefixed digits.
fn hex_digits(s: &str) -> Option<&str> {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
}

/// Numbers and decimal strings (up to 256 bits) become `0x` hex; hex strings
/// are lower-cased.
fn to_quantity(value: &Value) -> Result<String, Web3Error> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(|n| format!("{n:#x}"))
            .ok_or_else(|| invalid("quantity", value)),
        Value::String(s) if hex_digits(s).is_some() => Ok(s.to_ascii_lowercase()),
        Value::String(s) if is_decimal(s) => U256::from_str_radix(s, 10)
            .map(|n| format!("0x{n:x}"))
            .map_err(|_| invalid("quantity", value)),
        _ => Err(invalid("quantity", value)),
    }
}

/// Hex strings pass through with a `0x` prefix; any other string is
/// hex-encoded as UTF-8.
fn to_hex(value: &Value) -> Result<String, Web3Error> {
    match value {
        Value::String(s) => Ok(match hex_digits(s) {
            Some(digits) => format!("0x{digits}"),
            None => format!("0x{}", hex::encode(s.as_bytes())),
        }),
        Value::Number(n) => n
            .as_u64()
            .map(|n| format!("{n:#x}"))
            .ok_or_else(|| invalid("hex", value)),
        Value::Bool(b) => Ok(if *b { "0x1" } else { "0x0" }.to_string()),
        _ => Err(invalid("hex", value)),
    }
}

/// Parses a hex quantity of up to 256 bits into a JSON number, or a decimal
/// string past `u64`.
fn parse_quantity(s: &str) -> Option<Value> {
    let digits = hex_digits(s)?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let n = U256::from_str_radix(digits, 16).ok()?;
    Some(match u64::try_from(n) {
        Ok(small) => Value::from(small),
        Err(_) => Value::String(n.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quantity_input() {
        assert_eq!(InputFormatter::Quantity.apply(json!(255)).unwrap(), json!("0xff"));
        assert_eq!(InputFormatter::Quantity.apply(json!("1000")).unwrap(), json!("0x3e8"));
        assert_eq!(InputFormatter::Quantity.apply(json!("0xAB")).unwrap(), json!("0xab"));
        assert_eq!(InputFormatter::Quantity.apply(json!("0XAB")).unwrap(), json!("0xab"));
        assert_eq!(
            InputFormatter::Quantity
                .apply(json!("340282366920938463463374607431768211456"))
                .unwrap(),
            json!("0x100000000000000000000000000000000")
        );
        assert!(InputFormatter::Quantity.apply(json!("abc")).is_err());
    }

    #[test]
    fn block_tag_input_keeps_reserved_tags() {
        assert_eq!(InputFormatter::BlockTag.apply(json!("latest")).unwrap(), json!("latest"));
        assert_eq!(InputFormatter::BlockTag.apply(json!(16)).unwrap(), json!("0x10"));
    }

    #[test]
    fn hex_input_encodes_text() {
        assert_eq!(InputFormatter::Hex.apply(json!("hello")).unwrap(), json!("0x68656c6c6f"));
        assert_eq!(InputFormatter::Hex.apply(json!("0x00")).unwrap(), json!("0x00"));
    }

    #[test]
    fn transaction_input() {
        let tx = json!({
            "from": "0xABCDEF0000000000000000000000000000000001",
            "gas": 21000,
            "value": "1000000000000000000",
            "data": "0x",
        });
        let out = InputFormatter::Transaction.apply(tx).unwrap();
        assert_eq!(out["from"], "0xabcdef0000000000000000000000000000000001");
        assert_eq!(out["gas"], "0x5208");
        assert_eq!(out["value"], "0xde0b6b3a7640000");
        assert_eq!(out["data"], "0x");
    }

    #[test]
    fn filter_input() {
        let filter = json!({
            "fromBlock": 1,
            "toBlock": "latest",
            "address": ["0xAA00000000000000000000000000000000000000"],
        });
        let out = InputFormatter::Filter.apply(filter).unwrap();
        assert_eq!(out["fromBlock"], "0x1");
        assert_eq!(out["toBlock"], "latest");
        assert_eq!(out["address"][0], "0xaa00000000000000000000000000000000000000");
    }

    #[test]
    fn quantity_output() {
        assert_eq!(OutputFormatter::Quantity.apply(json!("0x2")).unwrap(), json!(2));
        assert_eq!(OutputFormatter::Quantity.apply(json!("0x0")).unwrap(), json!(0));
        assert_eq!(
            OutputFormatter::Quantity.apply(json!("0x10000000000000000")).unwrap(),
            json!("18446744073709551616")
        );
        assert!(OutputFormatter::Quantity.apply(json!(true)).is_err());
        assert!(OutputFormatter::Quantity.apply(json!("0x")).is_err());
        assert!(OutputFormatter::Quantity.apply(json!("0xzz")).is_err());
    }

    #[test]
    fn quantity_output_covers_256_bits() {
        let max = format!("0x{}", "f".repeat(64));
        assert_eq!(
            OutputFormatter::Quantity.apply(json!(max)).unwrap(),
            json!("115792089237316195423570985008687907853269984665640564039457584007913129639935")
        );
        let big = format!("0x1{}", "0".repeat(50));
        assert_eq!(
            OutputFormatter::Quantity.apply(json!(big)).unwrap(),
            json!("1606938044258990275541962092341162602522202993782792835301376")
        );
        assert!(OutputFormatter::Quantity.apply(json!(format!("0x1{}", "0".repeat(64)))).is_err());
    }

    #[test]
    fn boolean_output() {
        assert_eq!(OutputFormatter::Boolean.apply(json!(true)).unwrap(), json!(true));
        assert_eq!(OutputFormatter::Boolean.apply(json!("0x0")).unwrap(), json!(false));
        assert!(OutputFormatter::Boolean.apply(json!("yes")).is_err());
    }
}
