//! Hash providers for selectors and event topics.
//!
//! The keccak256 of a canonical signature string, e.g.:
//!   keccak256("Transfer(address,address,uint256)")
//!   → 0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef

use tiny_keccak::{Hasher, Keccak};

/// A 32-byte cryptographic hash function.
pub trait HashProvider {
    fn hash(&self, data: &[u8]) -> [u8; 32];
}

/// Keccak-256, the hash Ethereum uses for signatures.
#[derive(Debug, Clone, Copy, Default)]
pub struct Keccak256;

impl HashProvider for Keccak256 {
    fn hash(&self, data: &[u8]) -> [u8; 32] {
        keccak256(data)
    }
}

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn erc20_transfer_event() {
        assert_eq!(
            hex::encode(Keccak256.hash(b"Transfer(address,address,uint256)")),
            "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }
}
