//! ABI decode commands for return data and function calldata

use anyhow::{bail, Context};

use super::{ToolContext, ToolResult};
use crate::domain::abi::{
    decode_tokens, parse_signature, AbiDecoder, AbiPayload, ParamKind, Token,
};

/// Decode return data (or bare parameters) against a type list
pub fn decode(ctx: &ToolContext, types: &str, data: &str) -> anyhow::Result<ToolResult> {
    let kinds = ParamKind::parse_list(types)
        .with_context(|| format!("invalid type list {:?}", types))?;
    let payload = AbiPayload::from_hex(data).context("invalid hex data")?;
    let tokens = decode_tokens(&kinds, &mut payload.decoder())
        .with_context(|| format!("failed to decode {} bytes as {}", payload.len(), types))?;

    let mut result = ToolResult::new("ABI Decode");
    for (kind, token) in kinds.iter().zip(&tokens) {
        result = result.add(kind.to_string(), token.render(ctx.checksum_addresses));
    }
    Ok(result)
}

/// Decode function calldata, looking the selector up when no signature is given
pub fn decode_calldata(
    ctx: &ToolContext,
    calldata: &str,
    signature: Option<&str>,
) -> anyhow::Result<ToolResult> {
    let payload = AbiPayload::from_hex(calldata).context("invalid hex calldata")?;
    let bytes = payload.as_bytes();
    if bytes.len() < 4 {
        bail!("calldata too short: must be at least 4 bytes (8 hex chars)");
    }
    let selector: [u8; 4] = [bytes[0], bytes[1], bytes[2], bytes[3]];

    let (signature, kinds) = match signature {
        Some(sig) => {
            let (canonical, kinds) = parse_signature(sig)
                .with_context(|| format!("invalid function signature {:?}", sig))?;
            let expected = ctx.selectors.selector(canonical.as_str())?;
            if expected != selector {
                bail!(
                    "selector mismatch: calldata has 0x{}, {} is 0x{}",
                    hex::encode(selector),
                    canonical,
                    hex::encode(expected)
                );
            }
            (canonical, kinds)
        }
        None => {
            let known = ctx.registry.lookup(selector).with_context(|| {
                format!(
                    "unknown selector 0x{}; pass the function signature",
                    hex::encode(selector)
                )
            })?;
            (known.signature.clone(), known.inputs.clone())
        }
    };

    let data = &bytes[4..];
    if kinds.is_empty() && !data.is_empty() {
        bail!(
            "function {} has no parameters but calldata has {} extra bytes",
            signature,
            data.len()
        );
    }
    let tokens = decode_tokens(&kinds, &mut AbiDecoder::new(data))
        .with_context(|| format!("failed to decode arguments of {}", signature))?;

    Ok(ToolResult::new("ABI Decode")
        .add("signature", &signature)
        .add("decoded", format_tokens(&tokens, ctx.checksum_addresses)))
}

fn format_tokens(tokens: &[Token], checksum: bool) -> String {
    let items: Vec<String> = tokens.iter().map(|t| t.render(checksum)).collect();
    format!("({})", items.join(", "))
}
