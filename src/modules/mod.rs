//! Command modules
//!
//! - toolkit: selector, encode, decode, checksum, convert and call commands

pub mod toolkit;
