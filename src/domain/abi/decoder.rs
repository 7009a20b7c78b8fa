//! ABI decoder: a forward-only cursor over a borrowed byte buffer
//!
//! Dynamic fields hold an offset measured from the decoder's origin. The
//! top-level decoder's origin is the start of the buffer; a decoder spawned
//! by [`AbiDecoder::read_array`] has its origin just past the array's length
//! word, so nested dynamic elements resolve against the array itself.

use super::address::{to_checksum_address, AddressFormatter};
use super::error::{AbiError, Result};
use super::uint256::{strip_hex_prefix, unsigned_from_bytes, Uint256};

/// Owned response bytes, e.g. the hex result of an `eth_call`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbiPayload {
    bytes: Vec<u8>,
}

impl AbiPayload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Parse `0x`-prefixed (or bare) hex
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(strip_hex_prefix(s))
            .map_err(|e| AbiError::InvalidFormat(format!("invalid hex payload: {}", e)))?;
        Ok(Self { bytes })
    }

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

    pub fn decoder(&self) -> AbiDecoder<'_> {
        AbiDecoder::new(&self.bytes)
    }
}

#[derive(Debug, Clone)]
pub struct AbiDecoder<'a> {
    buf: &'a [u8],
    origin: usize,
    pos: usize,
    formatter: AddressFormatter,
}

impl<'a> AbiDecoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            origin: 0,
            pos: 0,
            formatter: to_checksum_address,
        }
    }

    /// Replace the checksum collaborator used by [`AbiDecoder::read_address`]
    pub fn with_address_formatter(mut self, formatter: AddressFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    fn child(&self, origin: usize) -> Self {
        Self {
            buf: self.buf,
            origin,
            pos: origin,
            formatter: self.formatter,
        }
    }

    /// Absolute cursor position in the underlying buffer
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    fn slice(&self, start: usize, n: usize) -> Result<&'a [u8]> {
        let end = start
            .checked_add(n)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| AbiError::bounds(start, n, self.buf.len()))?;
        Ok(&self.buf[start..end])
    }

    /// Next `n` bytes without copying
    pub fn read_fixed(&mut self, n: usize) -> Result<&'a [u8]> {
        let v = self.slice(self.pos, n)?;
        self.pos += n;
        Ok(v)
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        Ok(self.read_fixed(1)?[0])
    }

    /// Byte at `offset` from the cursor, without advancing
    pub fn peek_byte(&self, offset: isize) -> Result<u8> {
        let at = self
            .pos
            .checked_add_signed(offset)
            .filter(|&at| at < self.buf.len())
            .ok_or_else(|| AbiError::Range(format!("invalid offset: {}", offset)))?;
        Ok(self.buf[at])
    }

    /// Follow an offset field to a length-prefixed byte string, without copying.
    /// The cursor only moves past the 32-byte offset field.
    pub fn read_dynamic(&mut self) -> Result<&'a [u8]> {
        let start = self.read_offset()?;
        let len = self.span_at(start)?;
        self.slice(start + 32, len)
    }

    fn read_offset(&mut self) -> Result<usize> {
        let offset = self.span_at(self.pos)?;
        self.pos += 32;
        self.origin
            .checked_add(offset)
            .ok_or_else(|| AbiError::bounds(self.origin, offset, self.buf.len()))
    }

    /// Offset or length word at `at`; one too large to index the buffer is
    /// a bounds error, not an overflow
    fn span_at(&self, at: usize) -> Result<usize> {
        let word = self.slice(at, 32)?;
        unsigned_from_bytes(word)
            .map(|n| n as usize)
            .map_err(|_| AbiError::bounds(at, usize::MAX, self.buf.len()))
    }

    /// Owned copy of a dynamic field
    pub fn read_bytes_copy(&mut self) -> Result<Vec<u8>> {
        Ok(self.read_dynamic()?.to_vec())
    }

    /// Dynamic field decoded as UTF-8
    pub fn read_text(&mut self) -> Result<String> {
        let v = self.read_dynamic()?;
        std::str::from_utf8(v)
            .map(str::to_string)
            .map_err(|e| AbiError::InvalidFormat(format!("invalid utf-8 text: {}", e)))
    }

    /// The 20 address bytes of a 32-byte word whose first 12 bytes must be zero
    pub fn read_address_bytes(&mut self) -> Result<&'a [u8]> {
        if self.read_fixed(12)?.iter().any(|&b| b != 0) {
            return Err(AbiError::InvalidFormat(
                "invalid address: expected zero padding".to_string(),
            ));
        }
        self.read_fixed(20)
    }

    /// `0x`-prefixed address, checksummed unless `checksum` is false
    pub fn read_address(&mut self, checksum: bool) -> Result<String> {
        let addr = format!("0x{}", hex::encode(self.read_address_bytes()?));
        Ok(if checksum { (self.formatter)(&addr) } else { addr })
    }

    /// Next `n` bytes as an integer
    pub fn read_uint(&mut self, n: usize) -> Result<Uint256> {
        Ok(Uint256::from_bytes(self.read_fixed(n)?))
    }

    pub fn read_uint256(&mut self) -> Result<Uint256> {
        self.read_uint(32)
    }

    /// Next word as a host integer
    pub fn read_number(&mut self) -> Result<u64> {
        self.read_uint256()?.unsigned()
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(!self.read_uint256()?.is_zero())
    }

    /// Follow an offset field to a length-prefixed array and call
    /// `element` once per item against a child decoder
    pub fn read_array<T, F>(&mut self, mut element: F) -> Result<Vec<T>>
    where
        F: FnMut(&mut AbiDecoder<'a>, usize) -> Result<T>,
    {
        let start = self.read_offset()?;
        let mut header = self.child(start);
        let len = header.read_number()?;
        if len > u64::from(u32::MAX) {
            return Err(AbiError::Overflow(format!("array length too large: {}", len)));
        }
        let len = len as usize;
        let mut dec = self.child(header.position());
        let mut out = Vec::with_capacity(len.min(dec.remaining() / 32));
        for i in 0..len {
            out.push(element(&mut dec, i)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(n: u8) -> [u8; 32] {
        let mut w = [0u8; 32];
        w[31] = n;
        w
    }

    #[test]
    fn test_read_fixed_bounds() {
        let buf = [1u8, 2, 3];
        let mut dec = AbiDecoder::new(&buf);
        assert_eq!(dec.read_fixed(2).unwrap(), &[1, 2]);
        assert_eq!(
            dec.read_fixed(2),
            Err(AbiError::Bounds {
                position: 2,
                needed: 2,
                len: 3
            })
        );
    }

    #[test]
    fn test_read_dynamic() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&word(32));
        buf.extend_from_slice(&word(3));
        let mut data = [0u8; 32];
        data[..3].copy_from_slice(b"abc");
        buf.extend_from_slice(&data);

        let mut dec = AbiDecoder::new(&buf);
        assert_eq!(dec.read_dynamic().unwrap(), b"abc");
        assert_eq!(dec.position(), 32);
    }

    #[test]
    fn test_truncated_dynamic_fails() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&word(32));
        buf.extend_from_slice(&word(40));
        buf.extend_from_slice(&[0u8; 32]);

        let mut dec = AbiDecoder::new(&buf);
        assert!(dec.read_dynamic().unwrap_err().is_bounds());
    }

    #[test]
    fn test_read_address() {
        let mut buf = [0u8; 32];
        let addr = hex::decode("4976fb03c32e5b8cfe2b6ccb31c09ba78ebaba41").unwrap();
        buf[12..].copy_from_slice(&addr);
        assert_eq!(
            AbiDecoder::new(&buf).read_address(true).unwrap(),
            "0x4976fb03C32e5B8cfe2b6cCB31c09Ba78EBaBa41"
        );
        assert_eq!(
            AbiDecoder::new(&buf).read_address(false).unwrap(),
            "0x4976fb03c32e5b8cfe2b6ccb31c09ba78ebaba41"
        );

        buf[0] = 1;
        assert!(matches!(
            AbiDecoder::new(&buf).read_address(true),
            Err(AbiError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_custom_formatter() {
        let buf = [0u8; 32];
        let mut dec = AbiDecoder::new(&buf).with_address_formatter(|s| s.to_uppercase());
        assert_eq!(dec.read_address(true).unwrap(), format!("0X{}", "0".repeat(40)));
    }

    #[test]
    fn test_read_bool_and_number() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&word(1));
        buf.extend_from_slice(&word(0));
        buf.extend_from_slice(&word(200));
        let mut dec = AbiDecoder::new(&buf);
        assert!(dec.read_bool().unwrap());
        assert!(!dec.read_bool().unwrap());
        assert_eq!(dec.read_number().unwrap(), 200);
        assert_eq!(dec.remaining(), 0);
    }

    #[test]
    fn test_peek_and_read_byte() {
        let buf = [9u8, 8, 7];
        let mut dec = AbiDecoder::new(&buf);
        assert_eq!(dec.read_byte().unwrap(), 9);
        assert_eq!(dec.peek_byte(0).unwrap(), 8);
        assert_eq!(dec.peek_byte(-1).unwrap(), 9);
        assert!(matches!(dec.peek_byte(2), Err(AbiError::Range(_))));
    }

    #[test]
    fn test_read_array_of_words() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&word(32));
        buf.extend_from_slice(&word(2));
        buf.extend_from_slice(&word(7));
        buf.extend_from_slice(&word(9));
        let mut dec = AbiDecoder::new(&buf);
        let items = dec.read_array(|d, _| d.read_number()).unwrap();
        assert_eq!(items, vec![7, 9]);
    }

    #[test]
    fn test_array_length_past_buffer() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&word(32));
        buf.extend_from_slice(&word(3));
        buf.extend_from_slice(&word(7));
        let mut dec = AbiDecoder::new(&buf);
        assert!(dec.read_array(|d, _| d.read_number()).unwrap_err().is_bounds());
    }

    #[test]
    fn test_oversized_offset_is_bounds_error() {
        let mut huge = [0u8; 32];
        huge[0] = 1;
        let err = AbiDecoder::new(&huge).read_dynamic().unwrap_err();
        assert!(err.is_bounds(), "unexpected error: {:?}", err);

        let mut buf = word(32).to_vec();
        buf.extend_from_slice(&[0xff; 32]);
        let err = AbiDecoder::new(&buf).read_text().unwrap_err();
        assert!(err.is_bounds(), "unexpected error: {:?}", err);

        let err = AbiDecoder::new(&huge).read_array(|d, _| d.read_number()).unwrap_err();
        assert!(err.is_bounds(), "unexpected error: {:?}", err);
    }

    #[test]
    fn test_payload_from_hex() {
        let payload = AbiPayload::from_hex("0x00ff").unwrap();
        assert_eq!(payload.as_bytes(), &[0x00, 0xff]);
        assert!(matches!(AbiPayload::from_hex("0xabc"), Err(AbiError::InvalidFormat(_))));
    }
}
