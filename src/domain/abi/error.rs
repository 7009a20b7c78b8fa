//! Codec error kinds

use thiserror::Error;

/// Errors raised by the ABI codec
///
/// Construction overflow (too many decimal digits, oversized byte input)
/// wraps silently to the low-order 32 bytes and is not an error; only
/// extraction into a host integer reports [`AbiError::Overflow`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    /// Wrong kind of input passed to a constructor or setter
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Numeric argument or bit index outside its valid bounds
    #[error("out of range: {0}")]
    Range(String),

    /// A read would run past the end of the buffer
    #[error("buffer overflow: need {needed} bytes at position {position}, buffer has {len}")]
    Bounds {
        position: usize,
        needed: usize,
        len: usize,
    },

    /// Structurally invalid field or malformed hex
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Value cannot be represented by the requested host type
    #[error("overflow: {0}")]
    Overflow(String),
}

impl AbiError {
    pub(crate) fn bounds(position: usize, needed: usize, len: usize) -> Self {
        AbiError::Bounds {
            position,
            needed,
            len,
        }
    }

    /// True for truncated-payload errors
    pub fn is_bounds(&self) -> bool {
        matches!(self, AbiError::Bounds { .. })
    }
}

pub type Result<T> = std::result::Result<T, AbiError>;
