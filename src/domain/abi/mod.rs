//! Contract ABI codec
//!
//! - [`Uint256`]: 32-byte big-endian integer
//! - [`AbiEncoder`]: head/tail call-data builder
//! - [`AbiDecoder`]: zero-copy reader over a response buffer
//! - [`SelectorCache`]: memoized function selectors

mod address;
mod decoder;
mod encoder;
mod error;
mod param;
mod registry;
mod selector;
mod uint256;

pub use address::{
    is_valid_address, parse_address, to_checksum_address, AddressFormatter, NULL_ADDRESS,
};
pub use decoder::{AbiDecoder, AbiPayload};
pub use encoder::{AbiEncoder, Encoded};
pub use error::{AbiError, Result};
pub use param::{decode_tokens, encode_tokens, parse_signature, ParamKind, Token};
pub use registry::{FunctionSignature, SignatureRegistry, COMMON_SIGNATURES};
pub use selector::{
    hex_from_method, normalize_signature, Keccak256, MethodRef, Selector, SelectorCache,
    SignatureHasher,
};
pub use uint256::{unsigned_from_bytes, Uint256, UintArg, MAX_SAFE_INTEGER};
