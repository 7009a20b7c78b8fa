//! Infrastructure layer - network-facing collaborators
//!
//! Everything that talks to a node lives here; the codec in
//! [`crate::domain`] never performs I/O.

pub mod ethereum;

pub use ethereum::{CallError, Contract, HttpProvider, JsonRpcProvider, ProviderConfig, RpcError};
