//! ABI encoder: head/tail layout.
//!
//! Static values are written in place. Each dynamic value takes one head
//! word holding the byte offset of its encoding, measured from the start of
//! the enclosing sequence, and its encoding is appended to the tail. Arrays
//! and tuples recurse with offsets local to their own sub-sequence.

use alloy_primitives::U256;

use crate::error::AbiError;
use crate::types::{ArrayDim, BaseType, SolidityType, WORD};
use crate::value::{int_fits, AbiValue};

/// Encode `values` as the parameter list `types`.
pub fn encode(types: &[SolidityType], values: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
    if types.len() != values.len() {
        return Err(AbiError::InvalidArgument(format!(
            "expected {} values, got {}",
            types.len(),
            values.len()
        )));
    }
    let items: Vec<_> = types.iter().zip(values).collect();
    encode_sequence(&items)
}

/// Encode a single value as a one-element parameter list.
pub fn encode_single(ty: &SolidityType, value: &AbiValue) -> Result<Vec<u8>, AbiError> {
    encode_sequence(&[(ty, value)])
}

fn encode_sequence(items: &[(&SolidityType, &AbiValue)]) -> Result<Vec<u8>, AbiError> {
    let head_len: usize = items.iter().map(|(ty, _)| ty.head_words()).sum::<usize>() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();
    let mut offsets = Vec::new();

    for (ty, value) in items {
        if ty.is_dynamic() {
            offsets.push((head.len(), tail.len()));
            head.extend_from_slice(&[0u8; WORD]);
            tail.extend(encode_value(ty, value)?);
        } else {
            head.extend(encode_value(ty, value)?);
        }
    }
    debug_assert_eq!(head.len(), head_len);

    for (slot, tail_pos) in offsets {
        head[slot..slot + WORD].copy_from_slice(&usize_word(head_len + tail_pos));
    }
    head.extend(tail);
    Ok(head)
}

fn encode_value(ty: &SolidityType, value: &AbiValue) -> Result<Vec<u8>, AbiError> {
    if let Some(dim) = ty.outer_dim() {
        let (AbiValue::Array(items), Some(element)) = (value, ty.element_type()) else {
            return Err(mismatch(ty, value));
        };
        let elements: Vec<_> = items.iter().map(|item| (&element, item)).collect();
        return match dim {
            ArrayDim::Fixed(n) if n != items.len() => Err(AbiError::InvalidArgument(format!(
                "{ty} expects {n} elements, got {}",
                items.len()
            ))),
            ArrayDim::Fixed(_) => encode_sequence(&elements),
            ArrayDim::Dynamic => {
                let mut out = usize_word(items.len()).to_vec();
                out.extend(encode_sequence(&elements)?);
                Ok(out)
            }
        };
    }

    match (&ty.base, value) {
        (BaseType::Uint(bits), AbiValue::Uint(n)) => {
            if n.bit_len() > *bits {
                return Err(out_of_range(ty, value));
            }
            Ok(n.to_be_bytes::<32>().to_vec())
        }
        (BaseType::Int(bits), AbiValue::Int(n)) => {
            if !int_fits(*n, *bits) {
                return Err(out_of_range(ty, value));
            }
            Ok(n.to_be_bytes::<32>().to_vec())
        }
        (BaseType::Address, AbiValue::Address(a)) => {
            let mut word = vec![0u8; WORD];
            word[12..].copy_from_slice(a.as_slice());
            Ok(word)
        }
        (BaseType::Bool, AbiValue::Bool(b)) => Ok(usize_word(usize::from(*b)).to_vec()),
        (BaseType::FixedBytes(n), AbiValue::FixedBytes(bytes)) => {
            if bytes.len() != *n {
                return Err(AbiError::InvalidArgument(format!(
                    "{ty} expects exactly {n} bytes, got {}",
                    bytes.len()
                )));
            }
            Ok(pad_right(bytes))
        }
        (BaseType::Bytes, AbiValue::Bytes(bytes)) => Ok(encode_bytes(bytes)),
        (BaseType::String, AbiValue::String(s)) => Ok(encode_bytes(s.as_bytes())),
        (BaseType::Tuple(components), AbiValue::Tuple(fields)) => {
            if components.len() != fields.len() {
                return Err(AbiError::InvalidArgument(format!(
                    "{ty} expects {} components, got {}",
                    components.len(),
                    fields.len()
                )));
            }
            let items: Vec<_> = components.iter().zip(fields).collect();
            encode_sequence(&items)
        }
        _ => Err(mismatch(ty, value)),
    }
}

fn encode_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = usize_word(bytes.len()).to_vec();
    out.extend(pad_right(bytes));
    out
}

fn pad_right(bytes: &[u8]) -> Vec<u8> {
    let padded = bytes.len().div_ceil(WORD) * WORD;
    let mut out = bytes.to_vec();
    out.resize(padded, 0);
    out
}

pub(crate) fn usize_word(n: usize) -> [u8; 32] {
    U256::from(n).to_be_bytes::<32>()
}

fn mismatch(ty: &SolidityType, value: &AbiValue) -> AbiError {
    AbiError::InvalidArgument(format!("cannot encode {value:?} as {ty}"))
}

fn out_of_range(ty: &SolidityType, value: &AbiValue) -> AbiError {
    AbiError::InvalidArgument(format!("{value:?} is out of range for {ty}"))
}
