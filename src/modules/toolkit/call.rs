//! Contract call command (read-only)

use std::sync::Arc;

use anyhow::{bail, Context};

use super::encode::encode_calldata;
use super::{ToolContext, ToolResult};
use crate::domain::abi::{decode_tokens, is_valid_address, ParamKind};
use crate::infrastructure::ethereum::{eth_call, Contract, JsonRpcProvider};

/// Request for [`call`]
#[derive(Debug, Clone, Default)]
pub struct CallRequest {
    pub to: String,
    /// `name(type,...)`, optionally followed by `returns (type,...)`
    pub signature: String,
    pub args: Vec<String>,
    /// Return types; taken from the signature's `returns` clause when absent
    pub returns: Option<String>,
    /// Block tag; the configured default when absent
    pub block: Option<String>,
}

/// Encode, `eth_call` and decode a read-only contract method
pub async fn call<P>(
    ctx: &ToolContext,
    provider: &P,
    request: &CallRequest,
) -> anyhow::Result<ToolResult>
where
    P: JsonRpcProvider + ?Sized,
{
    if !is_valid_address(&request.to) {
        bail!("invalid contract address {:?}", request.to);
    }
    let (signature, calldata) = encode_calldata(ctx, &request.signature, &request.args)?;
    let block = request.block.as_deref().unwrap_or(&ctx.block_tag);

    let payload = eth_call(provider, &request.to, &calldata, block)
        .await
        .with_context(|| format!("{} on {} at {}", signature, request.to, block))?;

    let mut result = ToolResult::new("Contract Call")
        .add("to", &request.to)
        .add("function", &signature)
        .add("block", block);

    let returns = request
        .returns
        .clone()
        .or_else(|| returns_clause(&request.signature));
    match returns {
        Some(types) => {
            let kinds = ParamKind::parse_list(&types)
                .with_context(|| format!("invalid return types {:?}", types))?;
            let tokens = decode_tokens(&kinds, &mut payload.decoder()).with_context(|| {
                format!("failed to decode {} bytes of return data", payload.len())
            })?;
            for (kind, token) in kinds.iter().zip(&tokens) {
                result = result.add(kind.to_string(), token.render(ctx.checksum_addresses));
            }
        }
        None => {
            result = result.add("raw", format!("0x{}", hex::encode(payload.as_bytes())));
        }
    }
    Ok(result)
}

/// ERC-165 support of each interface (signature or `0x` selector)
pub async fn supports<P>(
    ctx: &ToolContext,
    provider: Arc<P>,
    address: &str,
    interfaces: &[String],
) -> anyhow::Result<ToolResult>
where
    P: JsonRpcProvider + ?Sized,
{
    let contract = Contract::new(provider, Arc::clone(&ctx.selectors), address)
        .with_context(|| format!("invalid contract address {:?}", address))?;
    if !contract.is_contract().await {
        bail!("no contract code at {}", contract);
    }

    let methods: Vec<&str> = interfaces.iter().map(String::as_str).collect();
    let supported = contract
        .supports_interfaces(&methods)
        .await
        .with_context(|| format!("supportsInterface on {}", contract))?;

    let mut result = ToolResult::new("Interfaces").add("contract", contract.address());
    for (method, ok) in methods.iter().zip(supported) {
        result = result.add(*method, if ok { "supported" } else { "not supported" });
    }
    Ok(result)
}

/// Types listed in a trailing `returns (...)` clause
fn returns_clause(signature: &str) -> Option<String> {
    let pos = signature.find("returns")?;
    let types = signature[pos + "returns".len()..].trim();
    Some(types.to_string()).filter(|t| !t.is_empty())
}
