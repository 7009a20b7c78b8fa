//! Contract ABI codec and JSON-RPC call helpers
//!
//! - [`domain::abi`]: 256-bit integers, the head/tail encoder and decoder,
//!   selectors and typed parameter dispatch
//! - [`infrastructure::ethereum`]: JSON-RPC providers, `eth_call` and
//!   ERC-165 interface checks
//! - [`modules::toolkit`]: the commands behind the `abiwire` binary

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod modules;

pub use domain::abi::{
    AbiDecoder, AbiEncoder, AbiError, AbiPayload, Encoded, SelectorCache, Uint256,
};
pub use infrastructure::ethereum::{
    eth_call, CallError, Contract, HttpProvider, JsonRpcProvider, RpcError,
};
