//! ABI encoder: static head words written in place, dynamic tails deferred
//!
//! Each dynamic write reserves a 32-byte head slot and records a fully
//! built tail block. [`AbiEncoder::finish`] consumes the builder, appends
//! the tails in recorded order and patches every slot with the tail's
//! offset relative to the encoder's base (the bytes before the base, such
//! as a 4-byte selector or an array's length word, do not count).

use super::address::parse_address;
use super::error::Result;
use super::selector::{MethodRef, SelectorCache};
use super::uint256::{Uint256, UintArg};

const DEFAULT_CAPACITY: usize = 256;

/// Round up to the next multiple of 32
fn padded_len(n: usize) -> usize {
    (n + 31) & !31
}

#[derive(Debug, Clone)]
pub struct AbiEncoder {
    buf: Vec<u8>,
    pos: usize,
    base: usize,
    tails: Vec<(usize, Vec<u8>)>,
}

impl AbiEncoder {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_prefix(&[], capacity)
    }

    /// `prefix` is written first and excluded from tail offsets, so the
    /// cursor never sits before the base
    fn with_prefix(prefix: &[u8], capacity: usize) -> Self {
        let mut enc = Self {
            buf: vec![0u8; capacity.max(prefix.len()).max(1)],
            pos: 0,
            base: prefix.len(),
            tails: Vec::new(),
        };
        enc.write_raw(prefix);
        enc
    }

    /// Encoder that starts with a function selector
    pub fn method<'a>(cache: &SelectorCache, method: impl Into<MethodRef<'a>>) -> Result<Self> {
        let selector = cache.selector(method)?;
        Ok(Self::for_selector(selector))
    }

    pub fn for_selector(selector: [u8; 4]) -> Self {
        Self::for_selector_with_capacity(selector, DEFAULT_CAPACITY)
    }

    pub fn for_selector_with_capacity(selector: [u8; 4], capacity: usize) -> Self {
        Self::with_prefix(&selector, capacity)
    }

    /// Clear everything written after the base; a selector prefix survives
    pub fn reset(&mut self) -> &mut Self {
        self.buf[self.base..].fill(0);
        self.tails.clear();
        self.pos = self.base;
        self
    }

    /// Head bytes written so far
    pub fn head_len(&self) -> usize {
        self.pos
    }

    /// Writable view of `n` fresh zeroed bytes at the cursor
    pub fn alloc(&mut self, n: usize) -> &mut [u8] {
        let start = self.pos;
        let end = start + n;
        if end > self.buf.len() {
            let bigger = end.max(self.buf.len() << 1);
            self.buf.resize(bigger, 0);
        }
        self.pos = end;
        &mut self.buf[start..end]
    }

    /// Bytes copied as-is with no padding
    pub fn write_raw(&mut self, v: &[u8]) -> &mut Self {
        self.alloc(v.len()).copy_from_slice(v);
        self
    }

    /// Bytes right-padded to a multiple of 32
    pub fn write_fixed_bytes(&mut self, v: &[u8]) -> &mut Self {
        self.alloc(padded_len(v.len()))[..v.len()].copy_from_slice(v);
        self
    }

    /// Selector of `method` as a right-padded `bytes4` word
    pub fn write_selector<'a>(
        &mut self,
        cache: &SelectorCache,
        method: impl Into<MethodRef<'a>>,
    ) -> Result<&mut Self> {
        let selector = cache.selector(method)?;
        Ok(self.write_fixed_bytes(&selector))
    }

    pub fn write_u256(&mut self, value: &Uint256) -> &mut Self {
        self.alloc(32).copy_from_slice(value.bytes());
        self
    }

    pub fn write_uint<'a>(&mut self, value: impl Into<UintArg<'a>>) -> Result<&mut Self> {
        let value = value.into().to_uint()?;
        Ok(self.write_u256(&value))
    }

    pub fn write_bool(&mut self, value: bool) -> &mut Self {
        self.alloc(32)[31] = u8::from(value);
        self
    }

    pub fn write_address_bytes(&mut self, addr: &[u8; 20]) -> &mut Self {
        self.alloc(32)[12..].copy_from_slice(addr);
        self
    }

    /// `0x` + 40 hex characters, left-padded to a word
    pub fn write_address(&mut self, addr: &str) -> Result<&mut Self> {
        let bytes = parse_address(addr)?;
        Ok(self.write_address_bytes(&bytes))
    }

    /// Dynamic `address[]`
    pub fn write_addresses<S: AsRef<str>>(&mut self, addrs: &[S]) -> Result<&mut Self> {
        self.write_array(addrs, |enc, addr| {
            enc.write_address(AsRef::<str>::as_ref(addr))?;
            Ok(())
        })
    }

    pub fn write_text(&mut self, s: &str) -> &mut Self {
        self.write_dynamic_bytes(s.as_bytes())
    }

    /// Dynamic `bytes`: a head slot now, a length-prefixed padded tail later
    pub fn write_dynamic_bytes(&mut self, v: &[u8]) -> &mut Self {
        let mut tail = vec![0u8; 32 + padded_len(v.len())];
        tail[..32].copy_from_slice(Uint256::from_bytes(&(v.len() as u64).to_be_bytes()).bytes());
        tail[32..32 + v.len()].copy_from_slice(v);
        self.push_tail(tail);
        self
    }

    /// Dynamic array: a child encoder holds the count followed by each
    /// element, and its finished bytes become one tail block here
    pub fn write_array<T, F>(&mut self, items: &[T], mut element: F) -> Result<&mut Self>
    where
        F: FnMut(&mut AbiEncoder, &T) -> Result<()>,
    {
        let count = Uint256::from_bytes(&(items.len() as u64).to_be_bytes());
        let mut child = AbiEncoder::with_prefix(count.bytes(), 32 * (items.len() + 1));
        for item in items {
            element(&mut child, item)?;
        }
        self.push_tail(child.finish().into_bytes());
        Ok(self)
    }

    fn push_tail(&mut self, block: Vec<u8>) {
        let slot = self.pos;
        self.alloc(32);
        self.tails.push((slot, block));
    }

    /// Lay out all tails after the head and patch their offsets
    pub fn finish(mut self) -> Encoded {
        let total: usize = self.tails.iter().map(|(_, block)| block.len()).sum();
        tracing::trace!(
            head = self.pos,
            tails = self.tails.len(),
            tail_bytes = total,
            "finishing abi encoding"
        );
        if total > 0 {
            let mut pos = self.pos;
            self.alloc(total);
            let tails = std::mem::take(&mut self.tails);
            for (slot, block) in tails {
                let offset = (pos - self.base) as u64;
                self.buf[slot..slot + 32]
                    .copy_from_slice(Uint256::from_bytes(&offset.to_be_bytes()).bytes());
                self.buf[pos..pos + block.len()].copy_from_slice(&block);
                pos += block.len();
            }
        }
        self.buf.truncate(self.pos);
        Encoded { bytes: self.buf }
    }
}

impl Default for AbiEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Finished payload, ready to send as call data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    bytes: Vec<u8>,
}

impl Encoded {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `0x`-prefixed lowercase hex
    pub fn hex(&self) -> String {
        format!("0x{}", hex::encode(&self.bytes))
    }

    /// Selector on the first line, then one 32-byte word per line
    pub fn dump(&self) -> String {
        let (selector, words) = if self.bytes.len() % 32 == 4 {
            self.bytes.split_at(4)
        } else {
            self.bytes.split_at(0)
        };
        let mut lines = Vec::with_capacity(words.len() / 32 + 1);
        if !selector.is_empty() {
            lines.push(format!("Method: 0x{}", hex::encode(selector)));
        }
        lines.extend(words.chunks(32).map(hex::encode));
        lines.join("\n")
    }
}

impl AsRef<[u8]> for Encoded {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::abi::AbiDecoder;

    #[test]
    fn test_alloc_grows() {
        let mut enc = AbiEncoder::with_capacity(1);
        enc.alloc(3).copy_from_slice(&[1, 2, 3]);
        enc.alloc(1)[0] = 4;
        assert_eq!(enc.finish().as_bytes(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_fixed_bytes_padding() {
        let mut enc = AbiEncoder::new();
        enc.write_fixed_bytes(&[0xaa, 0xbb]);
        let out = enc.finish();
        assert_eq!(out.len(), 32);
        assert_eq!(&out.as_bytes()[..2], &[0xaa, 0xbb]);
        assert!(out.as_bytes()[2..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_write_text_layout() {
        let mut enc = AbiEncoder::new();
        enc.write_text("hi");
        let out = enc.finish().into_bytes();
        assert_eq!(out.len(), 96);
        assert_eq!(out[31], 0x20);
        assert_eq!(out[63], 2);
        assert_eq!(&out[64..66], b"hi");
    }

    #[test]
    fn test_empty_text_has_no_data_words() {
        let mut enc = AbiEncoder::new();
        enc.write_text("");
        let out = enc.finish().into_bytes();
        assert_eq!(out.len(), 64);
        assert!(out[32..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_offsets_exclude_selector() {
        let mut enc = AbiEncoder::for_selector([1, 2, 3, 4]);
        enc.write_text("x");
        let out = enc.finish().into_bytes();
        assert_eq!(out.len(), 4 + 96);
        // tail starts 32 bytes after the selector
        assert_eq!(out[4 + 31], 0x20);
    }

    #[test]
    fn test_write_bool_and_address() {
        let mut enc = AbiEncoder::new();
        enc.write_bool(true);
        enc.write_address("0x0000000000000000000000000000000000000001").unwrap();
        let out = enc.finish().into_bytes();
        assert_eq!(out[31], 1);
        assert_eq!(out[63], 1);
        assert!(AbiEncoder::new().write_address("0x1234").is_err());
    }

    #[test]
    fn test_reset() {
        let mut enc = AbiEncoder::new();
        enc.write_text("gone").write_bool(true);
        enc.reset();
        enc.write_bool(false);
        assert_eq!(enc.finish().len(), 32);
    }

    #[test]
    fn test_reset_keeps_selector() {
        let mut enc = AbiEncoder::for_selector([1, 2, 3, 4]);
        enc.write_text("gone");
        enc.reset();
        enc.write_text("x");
        let out = enc.finish().into_bytes();
        assert_eq!(&out[..4], &[1, 2, 3, 4]);
        assert_eq!(out.len(), 4 + 96);
        assert_eq!(AbiDecoder::new(&out[4..]).read_text().unwrap(), "x");
    }

    #[test]
    fn test_selector_with_small_capacity() {
        let mut enc = AbiEncoder::for_selector_with_capacity([0xaa; 4], 0);
        enc.write_dynamic_bytes(&[1, 2, 3]);
        let out = enc.finish().into_bytes();
        assert_eq!(&out[..4], &[0xaa; 4]);
        // offset counts from the end of the selector
        assert_eq!(out[4 + 31], 0x20);
        assert_eq!(AbiDecoder::new(&out[4..]).read_dynamic().unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn test_dump() {
        let mut enc = AbiEncoder::for_selector([0xa9, 0x05, 0x9c, 0xbb]);
        enc.write_uint(1000i64).unwrap();
        let dump = enc.finish().dump();
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines[0], "Method: 0xa9059cbb");
        assert!(lines[1].ends_with("03e8"));
    }
}
