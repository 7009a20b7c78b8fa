//! Contract calls over a [`JsonRpcProvider`]
//!
//! `eth_call` sends finished call data and returns the raw response as an
//! [`AbiPayload`]; reverts, provider failures and undecodable responses
//! come back as distinct [`CallError`] variants.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::RwLock;

use super::provider::{JsonRpcProvider, RpcError, CODE_SERVER_ERROR};
use crate::domain::abi::{
    to_checksum_address, AbiEncoder, AbiError, AbiPayload, Encoded, MethodRef, Selector,
    SelectorCache,
};

pub const LATEST: &str = "latest";

const SUPPORTS_INTERFACE: &str = "supportsInterface(bytes4)";

#[derive(Debug, Error)]
pub enum CallError {
    /// The contract rejected the call
    #[error("execution reverted: {message}")]
    Reverted { message: String, data: Option<Value> },

    #[error(transparent)]
    Rpc(RpcError),

    /// Call data could not be built
    #[error("failed to encode call: {0}")]
    Encode(AbiError),

    /// The provider returned something that is not valid call output
    #[error("invalid call response: {0}")]
    Decode(#[from] AbiError),
}

impl From<RpcError> for CallError {
    fn from(err: RpcError) -> Self {
        if err.is_revert() {
            if let RpcError::Rpc { message, data, .. } = err {
                return CallError::Reverted { message, data };
            }
        }
        CallError::Rpc(err)
    }
}

impl CallError {
    pub fn is_revert(&self) -> bool {
        matches!(self, CallError::Reverted { .. })
    }
}

/// `eth_call` against `to` at block `tag`
pub async fn eth_call<P>(
    provider: &P,
    to: &str,
    data: &Encoded,
    tag: &str,
) -> Result<AbiPayload, CallError>
where
    P: JsonRpcProvider + ?Sized,
{
    tracing::debug!(to, tag, calldata_len = data.len(), "eth_call");
    let params = json!([{ "to": to, "data": data.hex() }, tag]);
    let result = provider.request("eth_call", params).await.map_err(|err| {
        let err = CallError::from(err);
        if err.is_revert() {
            tracing::debug!(to, error = %err, "eth_call reverted");
        }
        err
    })?;
    let hex = result.as_str().ok_or_else(|| {
        AbiError::InvalidFormat(format!("expected hex string, got {}", result))
    })?;
    Ok(AbiPayload::from_hex(hex)?)
}

/// True when `address` has deployed code; any failure counts as false
pub async fn is_contract<P>(provider: &P, address: &str) -> bool
where
    P: JsonRpcProvider + ?Sized,
{
    match provider
        .request("eth_getCode", json!([address, LATEST]))
        .await
    {
        Ok(code) => code.as_str().map(|c| c.len() > 2).unwrap_or(false),
        Err(err) => {
            tracing::debug!(address, error = %err, "eth_getCode failed");
            false
        }
    }
}

/// ERC-165 `supportsInterface(bytes4)`; contracts that revert or return
/// nothing do not support it
pub async fn supports_interface<P>(
    provider: &P,
    selectors: &SelectorCache,
    contract: &str,
    interface: Selector,
) -> Result<bool, CallError>
where
    P: JsonRpcProvider + ?Sized,
{
    let mut enc = AbiEncoder::method(selectors, SUPPORTS_INTERFACE).map_err(CallError::Encode)?;
    enc.write_fixed_bytes(&interface);
    match eth_call(provider, contract, &enc.finish(), LATEST).await {
        Ok(payload) if payload.is_empty() => Ok(false),
        Ok(payload) => Ok(payload.decoder().read_bool()?),
        Err(CallError::Reverted { .. }) => Ok(false),
        Err(CallError::Rpc(err)) if err.code() == Some(CODE_SERVER_ERROR) => Ok(false),
        Err(err) => Err(err),
    }
}

/// A deployed contract with memoized interface checks
pub struct Contract<P: JsonRpcProvider + ?Sized> {
    provider: Arc<P>,
    selectors: Arc<SelectorCache>,
    address: String,
    interfaces: RwLock<HashMap<Selector, bool>>,
}

impl<P: JsonRpcProvider + ?Sized> Contract<P> {
    pub fn new(
        provider: Arc<P>,
        selectors: Arc<SelectorCache>,
        address: &str,
    ) -> Result<Self, AbiError> {
        crate::domain::abi::parse_address(address)?;
        Ok(Self {
            provider,
            selectors,
            address: to_checksum_address(address),
            interfaces: RwLock::new(HashMap::new()),
        })
    }

    /// Checksummed address
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Encoder preloaded with the selector of `method`
    pub fn method<'a>(&self, method: impl Into<MethodRef<'a>>) -> Result<AbiEncoder, AbiError> {
        AbiEncoder::method(&self.selectors, method)
    }

    /// Finish `enc` and `eth_call` it at `latest`
    pub async fn call(&self, enc: AbiEncoder) -> Result<AbiPayload, CallError> {
        self.call_at(enc, LATEST).await
    }

    pub async fn call_at(&self, enc: AbiEncoder, tag: &str) -> Result<AbiPayload, CallError> {
        eth_call(self.provider.as_ref(), &self.address, &enc.finish(), tag).await
    }

    pub async fn is_contract(&self) -> bool {
        is_contract(self.provider.as_ref(), &self.address).await
    }

    /// ERC-165 check, answered from cache after the first call per selector
    pub async fn supports_interface<'a>(
        &self,
        method: impl Into<MethodRef<'a>>,
    ) -> Result<bool, CallError> {
        let interface = self.selectors.selector(method).map_err(CallError::Encode)?;
        if let Some(&known) = self.interfaces.read().await.get(&interface) {
            tracing::trace!(
                contract = %self.address,
                interface = %hex::encode(interface),
                "interface cache hit"
            );
            return Ok(known);
        }
        let supported = supports_interface(
            self.provider.as_ref(),
            &self.selectors,
            &self.address,
            interface,
        )
        .await?;
        self.interfaces.write().await.insert(interface, supported);
        Ok(supported)
    }

    /// Check several interfaces concurrently
    pub async fn supports_interfaces(&self, methods: &[&str]) -> Result<Vec<bool>, CallError> {
        futures::future::try_join_all(methods.iter().map(|&m| self.supports_interface(m))).await
    }
}

impl<P: JsonRpcProvider + ?Sized> fmt::Display for Contract<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

impl<P: JsonRpcProvider + ?Sized> fmt::Debug for Contract<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contract")
            .field("address", &self.address)
            .field("endpoint", &self.provider.endpoint_name())
            .finish()
    }
}
