//! chainweb3-abi: Solidity ABI codec and contract bindings for ChainWeb3.
//!
//! # Overview
//!
//! - [`SolidityType`]: parsed type descriptors (`uint256`, `bytes32[]`, `(address,uint)[2]`)
//! - [`AbiValue`]: typed values, convertible from and to loose JSON
//! - [`AbiCodec`]: head/tail encoding and decoding, function selectors, event topics
//! - [`HashProvider`]: pluggable 32-byte hash; [`Keccak256`] by default
//! - [`Contract`]: JSON ABI model with call data, deployment data and `eth_call` round trips

pub mod codec;
pub mod contract;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod hash;
pub mod types;
pub mod value;

pub use codec::AbiCodec;
pub use contract::{AbiEntry, AbiParam, Contract, EntryKind};
pub use decoder::{decode, decode_single};
pub use encoder::{encode, encode_single};
pub use error::AbiError;
pub use hash::{keccak256, HashProvider, Keccak256};
pub use types::{head_size, ArrayDim, BaseType, SolidityType, WORD};
pub use value::{decode_hex, AbiValue};
