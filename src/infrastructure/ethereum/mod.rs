//! Ethereum JSON-RPC access - provider and contract calls

mod call;
mod provider;

pub use call::{eth_call, is_contract, supports_interface, CallError, Contract, LATEST};
pub use provider::{
    HttpProvider, JsonRpcProvider, ProviderConfig, RpcError, CODE_EXECUTION_ERROR,
    CODE_SERVER_ERROR,
};
