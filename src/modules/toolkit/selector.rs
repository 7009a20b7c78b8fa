//! Function selector calculation

use anyhow::bail;

use super::{ToolContext, ToolResult};
use crate::domain::abi::{hex_from_method, normalize_signature, parse_signature};

/// Compute the selector of a signature, or validate a hex selector
pub fn selector(ctx: &ToolContext, input: &str) -> anyhow::Result<ToolResult> {
    let input = input.trim();
    if input.is_empty() {
        bail!("usage: selector transfer(address,uint256)");
    }

    // Canonical form when every parameter type is understood, raw otherwise
    let signature = parse_signature(input)
        .map(|(canonical, _)| canonical)
        .unwrap_or_else(|_| normalize_signature(input));
    let selector = hex_from_method(&ctx.selectors, &signature)?;

    let mut result = ToolResult::new("Selector");
    if signature.contains('(') {
        result = result.add("signature", &signature);
    }
    result = result.add("selector", &selector);
    if let Some(known) = ctx.registry.lookup_hex(&selector) {
        result = result.add("known", &known.signature);
    }
    Ok(result)
}
