//! Fixed-width 256-bit big-endian integer
//!
//! All arithmetic is modulo 2^256. Mutating operations work in place and
//! return `&mut Self` so calls can be chained; clone first when the
//! original value must survive.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::{AbiError, Result};

/// Largest integer a double can hold exactly (2^53 - 1)
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

const DIGIT_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// 32-byte big-endian unsigned integer, two's-complement when read as signed
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Uint256([u8; 32]);

impl Uint256 {
    pub const ZERO: Self = Self([0u8; 32]);

    /// Wrap a raw 32-byte buffer without copying
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn zero() -> Self {
        Self::ZERO
    }

    /// Build from a signed machine integer in the safe-integer range
    pub fn from_number(i: i64) -> Result<Self> {
        let mut value = Self::zero();
        value.set_number(i)?;
        Ok(value)
    }

    /// Build from a float that must hold an exact safe integer
    pub fn from_f64(x: f64) -> Result<Self> {
        if !x.is_finite() || x.fract() != 0.0 {
            return Err(AbiError::TypeMismatch(format!("expected integer: {}", x)));
        }
        if x.abs() > MAX_SAFE_INTEGER as f64 {
            return Err(AbiError::Range(format!("expected safe integer: {}", x)));
        }
        Self::from_number(x as i64)
    }

    /// Left-pad or left-truncate to 32 bytes; always copies
    pub fn from_bytes(v: &[u8]) -> Self {
        let mut bytes = [0u8; 32];
        if v.len() >= 32 {
            bytes.copy_from_slice(&v[v.len() - 32..]);
        } else {
            bytes[32 - v.len()..].copy_from_slice(v);
        }
        Self(bytes)
    }

    /// Parse hex digits, with or without a `0x` prefix
    ///
    /// Odd-length input is treated as having an implicit leading zero, so
    /// the output of [`Uint256::min_hex`] parses back.
    pub fn from_hex(s: &str) -> Result<Self> {
        let digits = strip_hex_prefix(s);
        let decoded = if digits.len() % 2 == 1 {
            hex::decode(format!("0{}", digits))
        } else {
            hex::decode(digits)
        };
        let bytes =
            decoded.map_err(|e| AbiError::InvalidFormat(format!("invalid hex {:?}: {}", s, e)))?;
        Ok(Self::from_bytes(&bytes))
    }

    /// Parse decimal digits; values wider than 256 bits keep their low-order bytes
    pub fn from_dec(s: &str) -> Result<Self> {
        if s.is_empty() || !s.bytes().all(|c| c.is_ascii_digit()) {
            return Err(AbiError::TypeMismatch(format!(
                "expected decimal digits: {:?}",
                s
            )));
        }
        // little-endian base-256 accumulator
        let mut acc: Vec<u8> = Vec::with_capacity(32.max(s.len() / 2));
        for c in s.bytes() {
            let mut carry = u32::from(c - b'0');
            for byte in acc.iter_mut() {
                carry += u32::from(*byte) * 10;
                *byte = carry as u8;
                carry >>= 8;
            }
            while carry > 0 {
                acc.push(carry as u8);
                carry >>= 8;
            }
        }
        Ok(Self::from_le_accumulator(&acc))
    }

    /// Keep the low 32 bytes of a little-endian accumulator, big-endian
    fn from_le_accumulator(acc: &[u8]) -> Self {
        let mut bytes = [0u8; 32];
        for (i, byte) in acc.iter().take(32).enumerate() {
            bytes[31 - i] = *byte;
        }
        Self(bytes)
    }

    pub fn bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn bytes_mut(&mut self) -> &mut [u8; 32] {
        &mut self.0
    }

    pub fn into_bytes(self) -> [u8; 32] {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Overwrite with a signed machine integer; negatives are stored two's-complement
    pub fn set_number(&mut self, i: i64) -> Result<&mut Self> {
        if i.unsigned_abs() > MAX_SAFE_INTEGER {
            return Err(AbiError::Range(format!("expected safe integer: {}", i)));
        }
        let (mut rest, invert) = if i < 0 {
            ((-(i + 1)) as u64, true)
        } else {
            (i as u64, false)
        };
        for byte in self.0.iter_mut().rev() {
            let low = (rest & 0xFF) as u8;
            *byte = if invert { !low } else { low };
            rest >>= 8;
        }
        Ok(self)
    }

    /// Wrapping addition, carry runs from the last byte to the first
    pub fn add(&mut self, other: &Uint256) -> &mut Self {
        let mut carry = 0u16;
        for i in (0..32).rev() {
            let sum = u16::from(self.0[i]) + u16::from(other.0[i]) + carry;
            self.0[i] = sum as u8;
            carry = sum >> 8;
        }
        self
    }

    fn apply_bytewise(&mut self, other: &Uint256, op: impl Fn(u8, u8) -> u8) -> &mut Self {
        for (a, b) in self.0.iter_mut().zip(other.0.iter()) {
            *a = op(*a, *b);
        }
        self
    }

    pub fn and(&mut self, other: &Uint256) -> &mut Self {
        self.apply_bytewise(other, |a, b| a & b)
    }

    pub fn or(&mut self, other: &Uint256) -> &mut Self {
        self.apply_bytewise(other, |a, b| a | b)
    }

    pub fn xor(&mut self, other: &Uint256) -> &mut Self {
        self.apply_bytewise(other, |a, b| a ^ b)
    }

    pub fn not(&mut self) -> &mut Self {
        for byte in self.0.iter_mut() {
            *byte = !*byte;
        }
        self
    }

    /// Set every byte to `value`
    pub fn fill(&mut self, value: u8) -> &mut Self {
        self.0.fill(value);
        self
    }

    /// Set or clear a bit.
    ///
    /// Indexing quirk: `i >= 0` counts from the least-significant bit
    /// (`0` is the low bit of the last byte); `i < 0` counts `!i` from the
    /// most-significant bit (`-1` is the high bit of the first byte).
    pub fn set_bit(&mut self, i: i32, value: bool) -> Result<&mut Self> {
        let (index, mask) = index_mask_from_bit(i)?;
        if value {
            self.0[index] |= mask;
        } else {
            self.0[index] &= !mask;
        }
        Ok(self)
    }

    /// Toggle a bit, same indexing as [`Uint256::set_bit`]
    pub fn flip_bit(&mut self, i: i32) -> Result<&mut Self> {
        let (index, mask) = index_mask_from_bit(i)?;
        self.0[index] ^= mask;
        Ok(self)
    }

    /// Read a bit, same indexing as [`Uint256::set_bit`]
    pub fn test_bit(&self, i: i32) -> Result<bool> {
        let (index, mask) = index_mask_from_bit(i)?;
        Ok(self.0[index] & mask != 0)
    }

    /// Value as a host integer; fails above 2^53 - 1
    pub fn unsigned(&self) -> Result<u64> {
        unsigned_from_bytes(&self.0)
    }

    /// Two's-complement signed value; fails outside ±(2^53 - 1)
    pub fn number(&self) -> Result<i64> {
        if self.0[0] & 0x80 != 0 {
            let mut inverted = *self;
            inverted.not();
            let magnitude = inverted.unsigned()?;
            Ok(-1 - magnitude as i64)
        } else {
            Ok(self.unsigned()? as i64)
        }
    }

    /// Digits in `base`, most significant first; zero is `[0]`
    pub fn digits(&self, base: u32) -> Result<Vec<u32>> {
        if base < 2 {
            return Err(AbiError::Range(format!("base must be 2 or more: {}", base)));
        }
        let base = u64::from(base);
        // least-significant digit first while accumulating
        let mut digits: Vec<u32> = vec![0];
        for &byte in self.0.iter() {
            let mut carry = u64::from(byte);
            for digit in digits.iter_mut() {
                let wide = (u64::from(*digit) << 8) | carry;
                *digit = (wide % base) as u32;
                carry = wide / base;
            }
            while carry > 0 {
                digits.push((carry % base) as u32);
                carry /= base;
            }
        }
        digits.reverse();
        Ok(digits)
    }

    /// Digits rendered through `0-9a-z`
    pub fn digit_str(&self, base: u32) -> Result<String> {
        if base as usize > DIGIT_ALPHABET.len() {
            return Err(AbiError::Range(format!(
                "radix larger than alphabet: {}",
                base
            )));
        }
        Ok(self
            .digits(base)?
            .into_iter()
            .map(|d| DIGIT_ALPHABET[d as usize] as char)
            .collect())
    }

    /// Overwrite with `Σ digit × base^position`, most significant digit first.
    /// Values wider than 256 bits keep their low-order bytes.
    pub fn set_digits(&mut self, base: u32, digits: &[u32]) -> Result<&mut Self> {
        if base < 2 {
            return Err(AbiError::Range(format!("base must be 2 or more: {}", base)));
        }
        let mut acc: Vec<u8> = Vec::new();
        for &digit in digits {
            if digit >= base {
                return Err(AbiError::Range(format!(
                    "expected base {} digit: {}",
                    base, digit
                )));
            }
            let mut carry = u64::from(digit);
            for byte in acc.iter_mut() {
                carry += u64::from(*byte) * u64::from(base);
                *byte = carry as u8;
                carry >>= 8;
            }
            while carry > 0 {
                acc.push(carry as u8);
                carry >>= 8;
            }
        }
        *self = Self::from_le_accumulator(&acc);
        Ok(self)
    }

    /// Approximate `Σ digit[i] × base^(i + exp)`, `i` counted from the low digit
    pub fn as_float(&self, exp: i32, base: u32) -> Result<f64> {
        let digits = self.digits(base)?;
        let b = f64::from(base);
        Ok(digits
            .iter()
            .rev()
            .enumerate()
            .filter(|&(_, &d)| d != 0)
            .map(|(i, &d)| {
                let e = (i as i64 + i64::from(exp))
                    .clamp(i64::from(i32::MIN), i64::from(i32::MAX));
                f64::from(d) * b.powi(e as i32)
            })
            .sum())
    }

    /// Value scaled by 10^-9
    pub fn gwei(&self) -> f64 {
        self.as_float(-9, 10).unwrap_or_default()
    }

    /// Value scaled by 10^-18
    pub fn ether(&self) -> f64 {
        self.as_float(-18, 10).unwrap_or_default()
    }

    /// `0x` followed by all 64 hex digits
    pub fn hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// `0x` followed by hex digits without leading zeros
    pub fn min_hex(&self) -> String {
        format!("0x{}", self.radix_string(16))
    }

    pub fn bin(&self) -> String {
        format!("0b{}", self.radix_string(2))
    }

    pub fn dec(&self) -> String {
        self.radix_string(10)
    }

    // bases 2..=36 never fail
    fn radix_string(&self, base: u32) -> String {
        self.digit_str(base).unwrap_or_default()
    }
}

impl Ord for Uint256 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for Uint256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<[u8; 32]> for Uint256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<u32> for Uint256 {
    fn from(value: u32) -> Self {
        Self::from_bytes(&value.to_be_bytes())
    }
}

impl FromStr for Uint256 {
    type Err = AbiError;

    /// `0x` prefix selects hex, anything else is decimal
    fn from_str(s: &str) -> Result<Self> {
        if s.starts_with("0x") || s.starts_with("0X") {
            Self::from_hex(s)
        } else {
            Self::from_dec(s)
        }
    }
}

impl fmt::Display for Uint256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uint256({})", self.min_hex())
    }
}

impl fmt::Debug for Uint256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uint256({})", self.hex())
    }
}

impl Serialize for Uint256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.min_hex())
    }
}

impl<'de> Deserialize<'de> for Uint256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Anything the encoder accepts where a 256-bit integer is expected
#[derive(Debug, Clone, Copy)]
pub enum UintArg<'a> {
    Uint(Uint256),
    Number(i64),
    Bytes(&'a [u8]),
    Str(&'a str),
}

impl UintArg<'_> {
    pub fn to_uint(&self) -> Result<Uint256> {
        match *self {
            UintArg::Uint(value) => Ok(value),
            UintArg::Number(i) => Uint256::from_number(i),
            UintArg::Bytes(v) => Ok(Uint256::from_bytes(v)),
            UintArg::Str(s) => s.parse(),
        }
    }
}

impl From<Uint256> for UintArg<'_> {
    fn from(value: Uint256) -> Self {
        UintArg::Uint(value)
    }
}

impl From<&Uint256> for UintArg<'_> {
    fn from(value: &Uint256) -> Self {
        UintArg::Uint(*value)
    }
}

impl From<i64> for UintArg<'_> {
    fn from(value: i64) -> Self {
        UintArg::Number(value)
    }
}

impl From<u32> for UintArg<'_> {
    fn from(value: u32) -> Self {
        UintArg::Number(i64::from(value))
    }
}

impl<'a> From<&'a [u8]> for UintArg<'a> {
    fn from(value: &'a [u8]) -> Self {
        UintArg::Bytes(value)
    }
}

impl<'a> From<&'a str> for UintArg<'a> {
    fn from(value: &'a str) -> Self {
        UintArg::Str(value)
    }
}

fn index_mask_from_bit(i: i32) -> Result<(usize, u8)> {
    let index = if i < 0 { !i } else { 255 - i };
    if !(0..256).contains(&index) {
        return Err(AbiError::Range(format!("invalid bit index: {}", i)));
    }
    Ok(((index >> 3) as usize, 0x80u8 >> (index & 7)))
}

/// Big-endian bytes as a host integer. Only the low 7 bytes may be non-zero
/// and the result must fit in 2^53 - 1.
pub fn unsigned_from_bytes(v: &[u8]) -> Result<u64> {
    let v = if v.len() > 7 {
        let (high, low) = v.split_at(v.len() - 7);
        if high.iter().any(|&b| b != 0) {
            return Err(AbiError::Overflow(
                "value exceeds safe integer range".to_string(),
            ));
        }
        low
    } else {
        v
    };
    let n = v.iter().fold(0u64, |n, &b| (n << 8) | u64::from(b));
    if n > MAX_SAFE_INTEGER {
        return Err(AbiError::Overflow(format!(
            "value exceeds safe integer range: {}",
            n
        )));
    }
    Ok(n)
}

pub(crate) fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}
