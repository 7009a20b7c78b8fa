//! Domain layer - pure codec types with no I/O

pub mod abi;
