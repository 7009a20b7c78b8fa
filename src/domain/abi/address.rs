//! 20-byte account addresses and EIP-55 checksum casing

use alloy_primitives::keccak256;

use super::error::{AbiError, Result};
use super::uint256::strip_hex_prefix;

pub const NULL_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Formats a lowercase `0x`-prefixed address for display
pub type AddressFormatter = fn(&str) -> String;

/// Parse `0x` + 40 hex characters into raw bytes
pub fn parse_address(s: &str) -> Result<[u8; 20]> {
    let digits = strip_hex_prefix(s.trim());
    let bytes = hex::decode(digits)
        .map_err(|e| AbiError::InvalidFormat(format!("invalid address {:?}: {}", s, e)))?;
    bytes
        .try_into()
        .map_err(|v: Vec<u8>| {
            AbiError::TypeMismatch(format!("expected 20-byte address, got {} bytes", v.len()))
        })
}

pub fn is_valid_address(s: &str) -> bool {
    parse_address(s).is_ok()
}

/// EIP-55 mixed-case checksum of a `0x`-prefixed or bare hex address
///
/// Input that is not 40 hex characters is returned lowercased and
/// `0x`-prefixed without casing applied.
pub fn to_checksum_address(address: &str) -> String {
    let addr = strip_hex_prefix(address.trim()).to_lowercase();
    if addr.len() != 40 || !addr.chars().all(|c| c.is_ascii_hexdigit()) {
        return format!("0x{}", addr);
    }

    let hash = keccak256(addr.as_bytes());
    let mut result = String::with_capacity(42);
    result.push_str("0x");
    for (i, c) in addr.chars().enumerate() {
        let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
        if nibble >= 8 {
            result.push(c.to_ascii_uppercase());
        } else {
            result.push(c);
        }
    }
    result
}
