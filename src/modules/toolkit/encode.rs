//! ABI encode command for encoding function calldata

use anyhow::{bail, Context};

use super::{ToolContext, ToolResult};
use crate::domain::abi::{encode_tokens, parse_signature, Encoded, Token};

/// Encode function call data from signature and arguments
pub fn encode(
    ctx: &ToolContext,
    signature: &str,
    args: &[String],
    dump: bool,
) -> anyhow::Result<ToolResult> {
    let (signature, encoded) = encode_calldata(ctx, signature, args)?;
    let mut result = ToolResult::new("ABI Encode")
        .add("signature", &signature)
        .add("calldata", encoded.hex());
    if dump {
        for (i, line) in encoded.dump().lines().enumerate() {
            result = result.add(format!("[{}]", i), line);
        }
    }
    Ok(result)
}

/// Parse `signature`, convert each argument and encode the call
pub fn encode_calldata(
    ctx: &ToolContext,
    signature: &str,
    args: &[String],
) -> anyhow::Result<(String, Encoded)> {
    let (signature, kinds) = parse_signature(signature)
        .with_context(|| format!("invalid function signature {:?}", signature))?;

    if args.len() != kinds.len() {
        bail!(
            "argument count mismatch: expected {} arguments, got {}",
            kinds.len(),
            args.len()
        );
    }

    let tokens = kinds
        .iter()
        .zip(args)
        .enumerate()
        .map(|(i, (kind, arg))| {
            Token::parse(kind, arg)
                .with_context(|| format!("argument {} ({}): cannot parse {:?}", i, kind, arg))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut enc = ctx.encoder(&signature)?;
    encode_tokens(&mut enc, &tokens).context("failed to encode arguments")?;
    Ok((signature, enc.finish()))
}
