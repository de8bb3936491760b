//! ABI decoder: the mirror of [`encoder`](crate::encoder).
//!
//! Heads are read positionally; offset words are followed into the tail and
//! resolved relative to the start of the enclosing sequence. Every read is
//! bounds-checked, so truncated or hostile input yields `AbiError::Codec`
//! rather than a panic.
//!
//! Offsets may alias, so one tail can be reached many times. Decoding is
//! therefore metered: every scalar, byte string and offset-reached value
//! spends one unit of a budget equal to the number of words in the input.
//! A well-formed encoding never needs more than that.

use alloy_primitives::{Address, I256, U256};

use crate::error::AbiError;
use crate::types::{head_size, ArrayDim, BaseType, SolidityType, WORD};
use crate::value::{int_fits, AbiValue};

/// Decode `data` as the parameter list `types`.
pub fn decode(types: &[SolidityType], data: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
    let min = head_size(types);
    if data.len() < min {
        return Err(AbiError::Codec(format!(
            "data too short: need at least {min} bytes, got {}",
            data.len()
        )));
    }
    let refs: Vec<_> = types.iter().collect();
    let mut budget = data.len() / WORD;
    decode_sequence(&refs, data, &mut budget)
}

/// Decode `data` as a single value of type `ty`.
pub fn decode_single(ty: &SolidityType, data: &[u8]) -> Result<AbiValue, AbiError> {
    let mut values = decode(std::slice::from_ref(ty), data)?;
    values
        .pop()
        .ok_or_else(|| AbiError::Codec("no value decoded".into()))
}

fn decode_sequence(
    types: &[&SolidityType],
    data: &[u8],
    budget: &mut usize,
) -> Result<Vec<AbiValue>, AbiError> {
    let mut values = Vec::with_capacity(types.len());
    let mut cursor = 0usize;
    for ty in types {
        if ty.is_dynamic() {
            spend(budget, 1)?;
            let offset = read_usize(data, cursor)?;
            let tail = data.get(offset..).ok_or_else(|| {
                AbiError::Codec(format!("offset {offset} points past the end of the data"))
            })?;
            values.push(decode_value(ty, tail, budget)?);
            cursor += WORD;
        } else {
            let at = data.get(cursor..).ok_or_else(|| eof(cursor))?;
            values.push(decode_value(ty, at, budget)?);
            cursor += ty.head_words() * WORD;
        }
    }
    Ok(values)
}

fn decode_value(ty: &SolidityType, data: &[u8], budget: &mut usize) -> Result<AbiValue, AbiError> {
    if let (Some(dim), Some(element)) = (ty.outer_dim(), ty.element_type()) {
        let (len, body) = match dim {
            ArrayDim::Fixed(n) => (n, data),
            ArrayDim::Dynamic => {
                let len = read_usize(data, 0)?;
                (len, &data[WORD..])
            }
        };
        let needed = len.checked_mul(element.head_words() * WORD);
        // Every element spends at least one unit, so `len` is also bounded
        // by the budget even when the element takes no head space.
        if needed.map_or(true, |n| n > body.len()) || len > *budget {
            return Err(AbiError::Codec(format!(
                "{ty} claims {len} elements but only {} bytes remain",
                body.len()
            )));
        }
        let elements = vec![&element; len];
        return decode_sequence(&elements, body, budget).map(AbiValue::Array);
    }

    let spends = match &ty.base {
        BaseType::Tuple(components) => components.is_empty(),
        _ => true,
    };
    if spends {
        spend(budget, 1)?;
    }

    match &ty.base {
        BaseType::Uint(bits) => {
            let n = U256::from_be_bytes(read_word(data, 0)?);
            if n.bit_len() > *bits {
                return Err(AbiError::Codec(format!("value does not fit {ty}")));
            }
            Ok(AbiValue::Uint(n))
        }
        BaseType::Int(bits) => {
            let n = I256::from_be_bytes(read_word(data, 0)?);
            if !int_fits(n, *bits) {
                return Err(AbiError::Codec(format!("value does not fit {ty}")));
            }
            Ok(AbiValue::Int(n))
        }
        BaseType::Address => {
            let word = read_word(data, 0)?;
            if word[..12].iter().any(|b| *b != 0) {
                return Err(AbiError::Codec("address has non-zero padding".into()));
            }
            Ok(AbiValue::Address(Address::from_slice(&word[12..])))
        }
        BaseType::Bool => match read_word(data, 0)? {
            w if w[..31].iter().all(|b| *b == 0) && w[31] <= 1 => Ok(AbiValue::Bool(w[31] == 1)),
            _ => Err(AbiError::Codec("bool must be 0 or 1".into())),
        },
        BaseType::FixedBytes(n) => Ok(AbiValue::FixedBytes(read_word(data, 0)?[..*n].to_vec())),
        BaseType::Bytes => read_bytes(data).map(AbiValue::Bytes),
        BaseType::String => String::from_utf8(read_bytes(data)?)
            .map(AbiValue::String)
            .map_err(|_| AbiError::Codec("string is not valid UTF-8".into())),
        BaseType::Tuple(components) => {
            let refs: Vec<_> = components.iter().collect();
            decode_sequence(&refs, data, budget).map(AbiValue::Tuple)
        }
    }
}

fn spend(budget: &mut usize, units: usize) -> Result<(), AbiError> {
    *budget = budget.checked_sub(units).ok_or_else(|| {
        AbiError::Codec("data expands to more values than it has words".into())
    })?;
    Ok(())
}

fn read_bytes(data: &[u8]) -> Result<Vec<u8>, AbiError> {
    let len = read_usize(data, 0)?;
    WORD.checked_add(len)
        .and_then(|end| data.get(WORD..end))
        .map(<[u8]>::to_vec)
        .ok_or_else(|| {
            AbiError::Codec(format!(
                "byte string of length {len} overruns the data ({} bytes)",
                data.len()
            ))
        })
}

fn read_word(data: &[u8], at: usize) -> Result<[u8; 32], AbiError> {
    at.checked_add(WORD)
        .and_then(|end| data.get(at..end))
        .and_then(|slice| <[u8; 32]>::try_from(slice).ok())
        .ok_or_else(|| eof(at))
}

/// Read a length or offset word; anything beyond `u64` is rejected.
fn read_usize(data: &[u8], at: usize) -> Result<usize, AbiError> {
    let word = read_word(data, at)?;
    if word[..24].iter().any(|b| *b != 0) {
        return Err(AbiError::Codec(format!("offset or length at byte {at} is too large")));
    }
    let mut low = [0u8; 8];
    low.copy_from_slice(&word[24..]);
    usize::try_from(u64::from_be_bytes(low))
        .map_err(|_| AbiError::Codec(format!("offset or length at byte {at} is too large")))
}

fn eof(at: usize) -> AbiError {
    AbiError::Codec(format!("unexpected end of data at byte {at}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{encode, encode_single};

    fn ty(s: &str) -> SolidityType {
        SolidityType::parse(s).unwrap()
    }

    #[test]
    fn short_data_is_codec_error() {
        let err = decode(&[ty("uint256"), ty("address")], &[0u8; 40]).unwrap_err();
        assert!(matches!(err, AbiError::Codec(_)));
    }

    #[test]
    fn empty_list_decodes_empty() {
        assert!(decode(&[], &[]).unwrap().is_empty());
    }

    #[test]
    fn string_and_array_round_trip() {
        let types = [ty("string"), ty("uint16[]"), ty("bytes32")];
        let values = vec![
            AbiValue::from("gm"),
            AbiValue::Array(vec![AbiValue::from(1u64), AbiValue::from(65535u64)]),
            AbiValue::FixedBytes(vec![0xab; 32]),
        ];
        let data = encode(&types, &values).unwrap();
        assert_eq!(decode(&types, &data).unwrap(), values);
    }

    #[test]
    fn nested_tuple_round_trip() {
        let t = ty("(address,(string,int24)[])");
        let value = AbiValue::Tuple(vec![
            AbiValue::Address(Address::repeat_byte(0x42)),
            AbiValue::Array(vec![AbiValue::Tuple(vec![
                AbiValue::from("tick"),
                AbiValue::Int(I256::try_from(-887272i64).unwrap()),
            ])]),
        ]);
        let data = encode_single(&t, &value).unwrap();
        assert_eq!(decode_single(&t, &data).unwrap(), value);
    }

    #[test]
    fn out_of_bounds_offset_rejected() {
        let mut data = encode_single(&ty("bytes"), &AbiValue::Bytes(vec![1, 2, 3])).unwrap();
        data[31] = 0xff;
        assert!(matches!(decode_single(&ty("bytes"), &data), Err(AbiError::Codec(_))));
    }

    #[test]
    fn absurd_array_length_rejected() {
        let mut data = encode_single(&ty("uint256[]"), &AbiValue::Array(vec![])).unwrap();
        data[32..64].copy_from_slice(&[0xff; 32]);
        assert!(matches!(decode_single(&ty("uint256[]"), &data), Err(AbiError::Codec(_))));
    }

    #[test]
    fn zero_width_elements_cannot_claim_huge_lengths() {
        let unit_array = SolidityType {
            base: BaseType::Tuple(vec![]),
            dims: vec![ArrayDim::Dynamic],
        };
        let mut data = vec![0u8; 64];
        data[31] = 0x20;
        data[56] = 0x20;
        let err = decode_single(&unit_array, &data).unwrap_err();
        assert!(matches!(err, AbiError::Codec(_)));
    }

    #[test]
    fn aliased_offsets_cannot_amplify_output() {
        // uint256[][]: n outer offsets that all point at one n-element array.
        let n = 64usize;
        let word = |v: usize| {
            let mut w = [0u8; 32];
            w[24..].copy_from_slice(&(v as u64).to_be_bytes());
            w
        };
        let mut data = Vec::new();
        data.extend(word(0x20));
        data.extend(word(n));
        for _ in 0..n {
            data.extend(word(n * WORD));
        }
        data.extend(word(n));
        for i in 0..n {
            data.extend(word(i));
        }

        let err = decode_single(&ty("uint256[][]"), &data).unwrap_err();
        assert!(matches!(err, AbiError::Codec(_)));

        // The same inner array referenced once decodes fine.
        let value = AbiValue::Array(vec![AbiValue::Array(
            (0..n as u64).map(AbiValue::from).collect(),
        )]);
        let once = encode_single(&ty("uint256[][]"), &value).unwrap();
        assert_eq!(decode_single(&ty("uint256[][]"), &once).unwrap(), value);
    }

    #[test]
    fn non_canonical_scalars_rejected() {
        let mut word = [0u8; 32];
        word[31] = 2;
        assert!(decode_single(&ty("bool"), &word).is_err());
        word[31] = 0;
        word[0] = 1;
        assert!(decode_single(&ty("address"), &word).is_err());
        assert!(decode_single(&ty("uint8"), &word).is_err());
    }
}
