//! Call-shape validators.
//!
//! Every validator is a pure predicate over a raw `serde_json::Value`: it
//! returns `false` for anything that is not a JSON object, `false` if a
//! present field fails its per-field check, and never fails because an
//! optional field is absent.

use serde_json::{Map, Value};

/// Reserved block tags accepted wherever a block number is.
pub const BLOCK_TAGS: [&str; 3] = ["latest", "earliest", "pending"];

/// A stateless structure validator.
pub trait Validator {
    fn validate(value: &Value) -> bool;
}

// ─── Field predicates ─────────────────────────────────────────────────────────

/// `0x`-prefixed hex byte string. `"0x"` (empty data) is accepted.
pub fn is_hex(s: &str) -> bool {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(digits) => digits.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

/// `0x`-prefixed, non-empty hex string.
fn is_prefixed_hex(s: &str) -> bool {
    is_hex(s) && s.len() > 2
}

/// 20-byte hex address with `0x` prefix.
pub fn is_address(s: &str) -> bool {
    is_hex(s) && s.len() == 42
}

/// 32-byte hex hash with `0x` prefix.
pub fn is_hash(s: &str) -> bool {
    is_hex(s) && s.len() == 66
}

/// Arbitrary-length hex identity (whisper keys, filter ids).
pub fn is_identity(s: &str) -> bool {
    is_prefixed_hex(s)
}

/// Unsigned decimal digits, e.g. `"1000000000000000000"`.
pub fn is_decimal(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Hex or decimal quantity string, or a non-negative JSON integer.
pub fn is_quantity(value: &Value) -> bool {
    match value {
        Value::String(s) => is_prefixed_hex(s) || is_decimal(s),
        Value::Number(n) => n.is_u64(),
        _ => false,
    }
}

/// A quantity or one of the reserved block tags.
pub fn is_block_tag(value: &Value) -> bool {
    match value {
        Value::String(s) if BLOCK_TAGS.contains(&s.as_str()) => true,
        other => is_quantity(other),
    }
}

fn str_matches(value: &Value, pred: fn(&str) -> bool) -> bool {
    value.as_str().map(pred).unwrap_or(false)
}

/// Absent fields pass; present fields must satisfy `pred`.
fn optional(map: &Map<String, Value>, key: &str, pred: impl Fn(&Value) -> bool) -> bool {
    map.get(key).map(pred).unwrap_or(true)
}

fn required(map: &Map<String, Value>, key: &str, pred: impl Fn(&Value) -> bool) -> bool {
    map.get(key).map(pred).unwrap_or(false)
}

/// Topic lists: each entry is `null`, a hex string, or an array of those.
fn is_topic_list(value: &Value) -> bool {
    let Some(entries) = value.as_array() else {
        return false;
    };
    entries.iter().all(|entry| match entry {
        Value::Null => true,
        Value::String(s) => is_hex(s),
        Value::Array(alts) => alts.iter().all(|alt| match alt {
            Value::Null => true,
            Value::String(s) => is_hex(s),
            _ => false,
        }),
        _ => false,
    })
}

/// Shared numeric/data fields of calls and transactions.
fn tx_fields_valid(map: &Map<String, Value>) -> bool {
    ["gas", "gasPrice", "value", "nonce"]
        .iter()
        .all(|key| optional(map, key, is_quantity))
        && optional(map, "data", |v| str_matches(v, is_hex))
}

// ─── Structure validators ─────────────────────────────────────────────────────

/// `eth_call` / `eth_estimateGas` objects: `to` required.
pub struct CallValidator;

impl Validator for CallValidator {
    fn validate(value: &Value) -> bool {
        let Some(map) = value.as_object() else {
            return false;
        };
        required(map, "to", |v| str_matches(v, is_address))
            && optional(map, "from", |v| str_matches(v, is_address))
            && tx_fields_valid(map)
    }
}

/// `eth_sendTransaction` objects: `from` required, `to` optional.
pub struct TransactionValidator;

impl Validator for TransactionValidator {
    fn validate(value: &Value) -> bool {
        let Some(map) = value.as_object() else {
            return false;
        };
        required(map, "from", |v| str_matches(v, is_address))
            && optional(map, "to", |v| str_matches(v, is_address))
            && tx_fields_valid(map)
    }
}

/// Log filter objects for `eth_newFilter` / `eth_getLogs`.
pub struct FilterValidator;

impl Validator for FilterValidator {
    fn validate(value: &Value) -> bool {
        let Some(map) = value.as_object() else {
            return false;
        };
        let address_ok = optional(map, "address", |v| match v {
            Value::String(s) => is_address(s),
            Value::Array(items) => items.iter().all(|a| str_matches(a, is_address)),
            _ => false,
        });
        optional(map, "fromBlock", is_block_tag)
            && optional(map, "toBlock", is_block_tag)
            && address_ok
            && optional(map, "topics", is_topic_list)
            && optional(map, "blockHash", |v| str_matches(v, is_hash))
    }
}

/// Whisper `shh_post` messages.
pub struct PostValidator;

impl Validator for PostValidator {
    fn validate(value: &Value) -> bool {
        let Some(map) = value.as_object() else {
            return false;
        };
        let topics_ok = required(map, "topics", |v| {
            v.as_array()
                .map(|items| items.iter().all(|t| str_matches(t, is_hex)))
                .unwrap_or(false)
        });
        topics_ok
            && optional(map, "from", |v| str_matches(v, is_identity))
            && optional(map, "to", |v| str_matches(v, is_identity))
            && optional(map, "payload", |v| str_matches(v, is_hex))
            && optional(map, "priority", is_quantity)
            && optional(map, "ttl", is_quantity)
    }
}

/// Whisper `shh_newFilter` objects.
pub struct ShhFilterValidator;

impl Validator for ShhFilterValidator {
    fn validate(value: &Value) -> bool {
        let Some(map) = value.as_object() else {
            return false;
        };
        optional(map, "topics", is_topic_list) && optional(map, "to", |v| str_matches(v, is_identity))
    }
}

// ─── Parameter validators ─────────────────────────────────────────────────────

/// Per-parameter check used by the method tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamValidator {
    Address,
    Quantity,
    BlockTag,
    Hex,
    Hash,
    Identity,
    Boolean,
    Text,
    Call,
    Transaction,
    Filter,
    Post,
    ShhFilter,
}

impl ParamValidator {
    pub fn check(self, value: &Value) -> bool {
        match self {
            Self::Address => str_matches(value, is_address),
            Self::Quantity => is_quantity(value),
            Self::BlockTag => is_block_tag(value),
            Self::Hex => str_matches(value, is_hex),
            Self::Hash => str_matches(value, is_hash),
            Self::Identity => str_matches(value, is_identity),
            Self::Boolean => value.is_boolean(),
            Self::Text => value.is_string(),
            Self::Call => CallValidator::validate(value),
            Self::Transaction => TransactionValidator::validate(value),
            Self::Filter => FilterValidator::validate(value),
            Self::Post => PostValidator::validate(value),
            Self::ShhFilter => ShhFilterValidator::validate(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const IDENTITY: &str = "0x04f96a5e25610293e42a73908e93ccc8c4d4dc0edcfa9fa872f50cb214e08ebf61a03e245533f97284d442460f2998cd41858798ddfd4d661997d3940272b717b1";

    fn addr(byte: &str) -> String {
        format!("0x{}", byte.repeat(20))
    }

    #[test]
    fn call_validator() {
        assert!(CallValidator::validate(&json!({ "to": addr("00") })));
        assert!(!CallValidator::validate(&json!({ "to": "not-an-address" })));
        assert!(!CallValidator::validate(&json!("not-a-map")));
        assert!(!CallValidator::validate(&json!({})));
        assert!(CallValidator::validate(&json!({
            "to": addr("01"),
            "from": addr("02"),
            "gas": "0x5208",
            "gasPrice": 1000,
            "value": "0x0",
            "data": "0x",
        })));
        assert!(!CallValidator::validate(&json!({ "to": addr("01"), "data": "zz" })));
    }

    #[test]
    fn transaction_validator() {
        assert!(!TransactionValidator::validate(&json!({})));
        assert!(TransactionValidator::validate(&json!({ "from": addr("11") })));
        assert!(!TransactionValidator::validate(&json!({ "from": "invalid" })));
        assert!(!TransactionValidator::validate(&json!({
            "from": addr("11"),
            "to": "invalid_address",
        })));
        for field in ["gas", "gasPrice", "value", "nonce", "data"] {
            let mut tx = json!({ "from": addr("11") });
            tx[field] = json!("invalid");
            assert!(!TransactionValidator::validate(&tx), "{field} should be checked");
        }
        assert!(TransactionValidator::validate(&json!({
            "from": addr("11"),
            "to": addr("22"),
            "gas": "0x5208",
            "gasPrice": "0x9184e72a000",
            "value": "0xde0b6b3a7640000",
            "data": "0x608060405234801561001057600080fd5b5060",
            "nonce": "0x1",
        })));
    }

    #[test]
    fn filter_validator() {
        assert!(FilterValidator::validate(&json!({
            "fromBlock": "0x1",
            "toBlock": "latest",
            "address": "0x742d35Cc6839C6B87C5982456b6A6E5b9c0E1234",
            "topics": ["0x123456"],
        })));
        assert!(!FilterValidator::validate(&json!("not an array")));
        assert!(!FilterValidator::validate(&json!({ "fromBlock": "invalid" })));
        assert!(!FilterValidator::validate(&json!({ "toBlock": "invalid" })));
        assert!(FilterValidator::validate(&json!({
            "address": [
                "0x742d35Cc6839C6B87C5982456b6A6E5b9c0E1234",
                "0x742d35Cc6839C6B87C5982456b6A6E5b9c0E5678",
            ]
        })));
        assert!(!FilterValidator::validate(&json!({
            "address": ["0x742d35Cc6839C6B87C5982456b6A6E5b9c0E1234", "invalid_address"]
        })));
        assert!(!FilterValidator::validate(&json!({ "address": "invalid_address" })));
        assert!(FilterValidator::validate(&json!({
            "topics": [["0x123456", "0x789abc"], "0xdef012", null, [null, "0x01"]]
        })));
        assert!(!FilterValidator::validate(&json!({ "topics": [["0x123456", "invalid_hex"]] })));
        assert!(!FilterValidator::validate(&json!({ "topics": ["invalid_hex"] })));
        assert!(!FilterValidator::validate(&json!({ "topics": [[["0x01"]]] })));
    }

    #[test]
    fn post_validator() {
        assert!(PostValidator::validate(&json!({
            "from": IDENTITY,
            "to": IDENTITY,
            "topics": [IDENTITY],
            "payload": "0x123456",
            "priority": "0x1",
            "ttl": "0x100",
        })));
        assert!(PostValidator::validate(&json!({ "topics": ["0x01"] })));
        assert!(!PostValidator::validate(&json!("not an array")));
        assert!(!PostValidator::validate(&json!({ "payload": "0x123456" })));
        assert!(!PostValidator::validate(&json!({ "topics": "not an array" })));
        assert!(!PostValidator::validate(&json!({ "topics": ["invalid_identity"] })));
        assert!(!PostValidator::validate(&json!({ "topics": [IDENTITY], "from": "invalid" })));
        assert!(!PostValidator::validate(&json!({ "topics": [IDENTITY], "to": "invalid" })));
        assert!(!PostValidator::validate(&json!({ "topics": [IDENTITY], "payload": "invalid_hex" })));
        assert!(!PostValidator::validate(&json!({ "topics": [IDENTITY], "priority": "invalid" })));
        assert!(!PostValidator::validate(&json!({ "topics": [IDENTITY], "ttl": "invalid" })));
    }

    #[test]
    fn shh_filter_validator() {
        assert!(ShhFilterValidator::validate(&json!({ "topics": ["0x1234"] })));
        assert!(ShhFilterValidator::validate(&json!({
            "to": "0x1234567890abcdef",
            "topics": ["0x1234"],
        })));
        assert!(ShhFilterValidator::validate(&json!({})));
        assert!(!ShhFilterValidator::validate(&json!("invalid")));
        assert!(!ShhFilterValidator::validate(&json!({ "topics": "not an array" })));
        assert!(!ShhFilterValidator::validate(&json!({ "to": "invalid_identity", "topics": ["0x1234"] })));
        assert!(ShhFilterValidator::validate(&json!({ "topics": [["0x123456", "0x789abc"]] })));
        assert!(!ShhFilterValidator::validate(&json!({ "topics": [["0x123456", "invalid_hex"]] })));
        assert!(ShhFilterValidator::validate(&json!({ "topics": [null] })));
    }

    #[test]
    fn param_validators() {
        assert!(ParamValidator::BlockTag.check(&json!("pending")));
        assert!(ParamValidator::BlockTag.check(&json!(12)));
        assert!(!ParamValidator::BlockTag.check(&json!("newest")));
        assert!(!ParamValidator::Quantity.check(&json!(-1)));
        assert!(!ParamValidator::Quantity.check(&json!("0x")));
        assert!(ParamValidator::Quantity.check(&json!("0XAB")));
        assert!(ParamValidator::Quantity.check(&json!("1000")));
        assert!(!ParamValidator::Quantity.check(&json!("")));
        assert!(!ParamValidator::Quantity.check(&json!("12e3")));
        assert!(ParamValidator::Hash.check(&json!(format!("0x{}", "ab".repeat(32)))));
        assert!(!ParamValidator::Hash.check(&json!("0xab")));
        assert!(ParamValidator::Boolean.check(&json!(true)));
        assert!(!ParamValidator::Text.check(&json!(1)));
    }
}
