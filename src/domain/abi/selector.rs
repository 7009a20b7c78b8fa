//! Function selectors: the first 4 bytes of a signature hash
//!
//! The hash is injected through [`SignatureHasher`]; the default is keccak256.
//! Computed selectors are memoized per exact signature string in a
//! [`SelectorCache`] owned by whoever builds encoders.

use std::collections::HashMap;
use std::sync::RwLock;

use alloy_primitives::keccak256;

use super::error::{AbiError, Result};
use super::uint256::strip_hex_prefix;

pub type Selector = [u8; 4];

/// Hash used to derive selectors from UTF-8 signatures
pub trait SignatureHasher: Send + Sync {
    fn hash(&self, data: &[u8]) -> [u8; 32];
}

/// keccak256, as used by Ethereum
#[derive(Debug, Default, Clone, Copy)]
pub struct Keccak256;

impl SignatureHasher for Keccak256 {
    fn hash(&self, data: &[u8]) -> [u8; 32] {
        keccak256(data).0
    }
}

/// A method given either as a signature or as a raw selector
#[derive(Debug, Clone, Copy)]
pub enum MethodRef<'a> {
    /// `name(type,...)` or `0x` + 8 hex characters
    Text(&'a str),
    Bytes(&'a [u8]),
}

impl<'a> From<&'a str> for MethodRef<'a> {
    fn from(value: &'a str) -> Self {
        MethodRef::Text(value)
    }
}

impl<'a> From<&'a String> for MethodRef<'a> {
    fn from(value: &'a String) -> Self {
        MethodRef::Text(value.as_str())
    }
}

impl<'a> From<&'a [u8]> for MethodRef<'a> {
    fn from(value: &'a [u8]) -> Self {
        MethodRef::Bytes(value)
    }
}

impl<'a> From<&'a Selector> for MethodRef<'a> {
    fn from(value: &'a Selector) -> Self {
        MethodRef::Bytes(value)
    }
}

/// Thread-safe memo of signature -> selector
pub struct SelectorCache {
    hasher: Box<dyn SignatureHasher>,
    entries: RwLock<HashMap<String, Selector>>,
}

impl SelectorCache {
    pub fn new() -> Self {
        Self::with_hasher(Keccak256)
    }

    pub fn with_hasher(hasher: impl SignatureHasher + 'static) -> Self {
        Self {
            hasher: Box::new(hasher),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve a signature or validate a raw selector
    pub fn selector<'a>(&self, method: impl Into<MethodRef<'a>>) -> Result<Selector> {
        match method.into() {
            MethodRef::Text(s) if s.contains('(') => Ok(self.signature_selector(s)),
            MethodRef::Text(s) => selector_from_hex(s),
            MethodRef::Bytes(v) => v.try_into().map_err(|_| {
                AbiError::TypeMismatch(format!("selector must be 4 bytes, got {}", v.len()))
            }),
        }
    }

    /// Selector as `0x` + 8 hex characters; valid hex selectors pass through
    pub fn selector_hex<'a>(&self, method: impl Into<MethodRef<'a>>) -> Result<String> {
        Ok(format!("0x{}", hex::encode(self.selector(method)?)))
    }

    fn signature_selector(&self, signature: &str) -> Selector {
        if let Some(hit) = self
            .entries
            .read()
            .ok()
            .and_then(|entries| entries.get(signature).copied())
        {
            tracing::trace!(signature, "selector cache hit");
            return hit;
        }
        let hash = self.hasher.hash(signature.as_bytes());
        let selector = [hash[0], hash[1], hash[2], hash[3]];
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(signature.to_string(), selector);
        }
        selector
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }
}

impl Default for SelectorCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SelectorCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectorCache")
            .field("entries", &self.len())
            .finish()
    }
}

fn selector_from_hex(s: &str) -> Result<Selector> {
    let invalid = || {
        AbiError::InvalidFormat(format!(
            "method {:?} should be a signature or 8-char hex",
            s
        ))
    };
    let digits = strip_hex_prefix(s);
    if digits.len() != 8 {
        return Err(invalid());
    }
    let bytes = hex::decode(digits).map_err(|_| invalid())?;
    bytes.try_into().map_err(|_| invalid())
}

/// `0x` + 8 hex for `method`, passing hex selectors through unchanged
pub fn hex_from_method(cache: &SelectorCache, method: &str) -> Result<String> {
    if !method.contains('(') {
        selector_from_hex(method)?;
        return Ok(method.to_string());
    }
    cache.selector_hex(method)
}

/// Strip whitespace and any `returns (...)` clause from a signature
pub fn normalize_signature(sig: &str) -> String {
    let sig = match sig.find("returns") {
        Some(pos) => sig[..pos].trim(),
        None => sig.trim(),
    };
    sig.split_whitespace().collect()
}
