//! Signature registry - known function signatures by selector

use std::collections::HashMap;

use super::error::Result;
use super::param::{parse_signature, ParamKind};
use super::selector::{Selector, SelectorCache};
use super::uint256::strip_hex_prefix;

/// Signatures every registry starts with
pub const COMMON_SIGNATURES: &[&str] = &[
    "transfer(address,uint256)",
    "transferFrom(address,address,uint256)",
    "approve(address,uint256)",
    "balanceOf(address)",
    "allowance(address,address)",
    "totalSupply()",
    "decimals()",
    "symbol()",
    "name()",
    "ownerOf(uint256)",
    "tokenURI(uint256)",
    "uri(uint256)",
    "balanceOf(address,uint256)",
    "supportsInterface(bytes4)",
    "getAmountsOut(uint256,address[])",
];

/// A function signature with its parsed parameters
#[derive(Debug, Clone)]
pub struct FunctionSignature {
    /// 4-byte function selector
    pub selector: Selector,
    /// Function name
    pub name: String,
    /// Canonical signature (e.g., "transfer(address,uint256)")
    pub signature: String,
    /// Input parameter kinds
    pub inputs: Vec<ParamKind>,
}

impl FunctionSignature {
    pub fn parse(cache: &SelectorCache, signature: &str) -> Result<Self> {
        let (signature, inputs) = parse_signature(signature)?;
        let selector = cache.selector(signature.as_str())?;
        let name = signature
            .split('(')
            .next()
            .unwrap_or_default()
            .to_string();
        Ok(Self {
            selector,
            name,
            signature,
            inputs,
        })
    }

    /// Get selector as hex string
    pub fn selector_hex(&self) -> String {
        format!("0x{}", hex::encode(self.selector))
    }
}

/// Registry of function signatures indexed by selector
#[derive(Debug, Default, Clone)]
pub struct SignatureRegistry {
    functions: HashMap<Selector, FunctionSignature>,
}

impl SignatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with [`COMMON_SIGNATURES`]
    pub fn with_common(cache: &SelectorCache) -> Result<Self> {
        let mut registry = Self::new();
        for sig in COMMON_SIGNATURES {
            registry.insert(FunctionSignature::parse(cache, sig)?);
        }
        Ok(registry)
    }

    /// Insert a function signature
    ///
    /// Note: First function for a given selector wins (no overwrite)
    pub fn insert(&mut self, function: FunctionSignature) {
        self.functions.entry(function.selector).or_insert(function);
    }

    pub fn lookup(&self, selector: Selector) -> Option<&FunctionSignature> {
        self.functions.get(&selector)
    }

    /// Look up by selector hex string (e.g., "0xa9059cbb")
    pub fn lookup_hex(&self, selector_hex: &str) -> Option<&FunctionSignature> {
        let normalized = strip_hex_prefix(selector_hex);
        if normalized.len() != 8 {
            return None;
        }
        let selector: Selector = hex::decode(normalized).ok()?.try_into().ok()?;
        self.lookup(selector)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
