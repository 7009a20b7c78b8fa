//! Typed parameters: map a signature's parameter list onto the codec
//!
//! Supports `address`, `bool`, `string`, `bytes`, `bytesN`, `uintN`, `intN`
//! and dynamic arrays `T[]` of any of those. Fixed-size arrays and tuples
//! are not handled.

use std::fmt;

use super::address::{parse_address, to_checksum_address};
use super::decoder::AbiDecoder;
use super::encoder::AbiEncoder;
use super::error::{AbiError, Result};
use super::selector::normalize_signature;
use super::uint256::{strip_hex_prefix, Uint256};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    Address,
    Bool,
    String,
    Bytes,
    FixedBytes(usize),
    Uint(usize),
    Int(usize),
    Array(Box<ParamKind>),
}

impl ParamKind {
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(inner) = s.strip_suffix("[]") {
            return Ok(ParamKind::Array(Box::new(Self::parse(inner)?)));
        }
        match s {
            "address" => return Ok(ParamKind::Address),
            "bool" => return Ok(ParamKind::Bool),
            "string" => return Ok(ParamKind::String),
            "bytes" => return Ok(ParamKind::Bytes),
            "uint" => return Ok(ParamKind::Uint(256)),
            "int" => return Ok(ParamKind::Int(256)),
            _ => {}
        }
        let unsupported = || AbiError::TypeMismatch(format!("unsupported type: {:?}", s));
        if let Some(size) = s.strip_prefix("bytes") {
            let n: usize = size.parse().map_err(|_| unsupported())?;
            if !(1..=32).contains(&n) {
                return Err(AbiError::Range(format!("invalid bytes size: {}", n)));
            }
            return Ok(ParamKind::FixedBytes(n));
        }
        let (bits, signed) = if let Some(bits) = s.strip_prefix("uint") {
            (bits, false)
        } else if let Some(bits) = s.strip_prefix("int") {
            (bits, true)
        } else {
            return Err(unsupported());
        };
        let bits: usize = bits.parse().map_err(|_| unsupported())?;
        if bits == 0 || bits > 256 || bits % 8 != 0 {
            return Err(AbiError::Range(format!("invalid integer size: {}", bits)));
        }
        Ok(if signed {
            ParamKind::Int(bits)
        } else {
            ParamKind::Uint(bits)
        })
    }

    /// Comma-separated list, optionally wrapped in parentheses
    pub fn parse_list(s: &str) -> Result<Vec<Self>> {
        let s = s.trim();
        let s = s
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(s);
        if s.trim().is_empty() {
            return Ok(Vec::new());
        }
        s.split(',').map(Self::parse).collect()
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(
            self,
            ParamKind::String | ParamKind::Bytes | ParamKind::Array(_)
        )
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Address => write!(f, "address"),
            ParamKind::Bool => write!(f, "bool"),
            ParamKind::String => write!(f, "string"),
            ParamKind::Bytes => write!(f, "bytes"),
            ParamKind::FixedBytes(n) => write!(f, "bytes{}", n),
            ParamKind::Uint(bits) => write!(f, "uint{}", bits),
            ParamKind::Int(bits) => write!(f, "int{}", bits),
            ParamKind::Array(inner) => write!(f, "{}[]", inner),
        }
    }
}

/// Split `name(type,...)` into its canonical signature and parameter kinds
pub fn parse_signature(signature: &str) -> Result<(String, Vec<ParamKind>)> {
    let normalized = normalize_signature(signature);
    let open = normalized.find('(').ok_or_else(|| {
        AbiError::InvalidFormat(format!(
            "invalid function signature: missing '(' in {:?}",
            signature
        ))
    })?;
    let close = normalized
        .rfind(')')
        .filter(|&close| close > open)
        .ok_or_else(|| {
            AbiError::InvalidFormat(format!(
                "invalid function signature: malformed parentheses in {:?}",
                signature
            ))
        })?;
    let kinds = ParamKind::parse_list(&normalized[open + 1..close])?;
    let canonical = format!(
        "{}({})",
        &normalized[..open],
        kinds.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
    );
    Ok((canonical, kinds))
}

/// A decoded or to-be-encoded value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Lowercase `0x` + 40 hex
    Address(String),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    FixedBytes(Vec<u8>),
    Uint(Uint256),
    /// Two's-complement word
    Int(Uint256),
    Array(Vec<Token>),
}

impl Token {
    /// Parse a command-line argument as `kind`
    pub fn parse(kind: &ParamKind, arg: &str) -> Result<Self> {
        let arg = arg.trim();
        match kind {
            ParamKind::Address => {
                let bytes = parse_address(arg)?;
                Ok(Token::Address(format!("0x{}", hex::encode(bytes))))
            }
            ParamKind::Bool => match arg.to_lowercase().as_str() {
                "true" | "1" => Ok(Token::Bool(true)),
                "false" | "0" => Ok(Token::Bool(false)),
                _ => Err(AbiError::TypeMismatch(format!(
                    "invalid bool: expected true/false, got {:?}",
                    arg
                ))),
            },
            ParamKind::String => Ok(Token::String(unquote(arg).to_string())),
            ParamKind::Bytes => Ok(Token::Bytes(parse_hex_bytes(arg)?)),
            ParamKind::FixedBytes(n) => {
                let bytes = parse_hex_bytes(arg)?;
                if bytes.len() != *n {
                    return Err(AbiError::TypeMismatch(format!(
                        "expected {} bytes, got {}",
                        n,
                        bytes.len()
                    )));
                }
                Ok(Token::FixedBytes(bytes))
            }
            ParamKind::Uint(bits) => {
                let value: Uint256 = arg.parse()?;
                check_width(&value, *bits)?;
                Ok(Token::Uint(value))
            }
            ParamKind::Int(bits) => {
                let (negative, value) = match arg.strip_prefix('-') {
                    Some(magnitude) => {
                        let magnitude: Uint256 = magnitude.parse()?;
                        (!magnitude.is_zero(), negate(magnitude))
                    }
                    None => (false, arg.parse()?),
                };
                check_signed_width(&value, *bits, negative, arg)?;
                Ok(Token::Int(value))
            }
            ParamKind::Array(inner) => {
                let body = arg
                    .strip_prefix('[')
                    .and_then(|rest| rest.strip_suffix(']'))
                    .ok_or_else(|| {
                        AbiError::InvalidFormat(
                            "array must be enclosed in brackets: [a,b,...]".to_string(),
                        )
                    })?;
                split_top_level(body)
                    .into_iter()
                    .map(|item| Token::parse(inner, item))
                    .collect::<Result<Vec<_>>>()
                    .map(Token::Array)
            }
        }
    }

    pub fn encode(&self, enc: &mut AbiEncoder) -> Result<()> {
        match self {
            Token::Address(addr) => {
                enc.write_address(addr)?;
            }
            Token::Bool(b) => {
                enc.write_bool(*b);
            }
            Token::String(s) => {
                enc.write_text(s);
            }
            Token::Bytes(v) => {
                enc.write_dynamic_bytes(v);
            }
            Token::FixedBytes(v) => {
                enc.write_fixed_bytes(v);
            }
            Token::Uint(value) | Token::Int(value) => {
                enc.write_u256(value);
            }
            Token::Array(items) => {
                enc.write_array(items, |child, item| item.encode(child))?;
            }
        }
        Ok(())
    }

    pub fn decode(kind: &ParamKind, dec: &mut AbiDecoder<'_>) -> Result<Self> {
        Ok(match kind {
            ParamKind::Address => Token::Address(dec.read_address(false)?),
            ParamKind::Bool => Token::Bool(dec.read_bool()?),
            ParamKind::String => Token::String(dec.read_text()?),
            ParamKind::Bytes => Token::Bytes(dec.read_bytes_copy()?),
            ParamKind::FixedBytes(n) => Token::FixedBytes(dec.read_fixed(32)?[..*n].to_vec()),
            ParamKind::Uint(_) => Token::Uint(dec.read_uint256()?),
            ParamKind::Int(_) => Token::Int(dec.read_uint256()?),
            ParamKind::Array(inner) => {
                Token::Array(dec.read_array(|child, _| Token::decode(inner, child))?)
            }
        })
    }
}

impl Token {
    /// Human-readable form; addresses stay lowercase unless `checksum_addresses`
    pub fn render(&self, checksum_addresses: bool) -> String {
        match self {
            Token::Address(addr) if checksum_addresses => to_checksum_address(addr),
            Token::Address(addr) => addr.clone(),
            Token::Bool(b) => b.to_string(),
            Token::String(s) => format!("{:?}", s),
            Token::Bytes(v) | Token::FixedBytes(v) => format!("0x{}", hex::encode(v)),
            Token::Uint(value) => value.dec(),
            Token::Int(value) if value.bytes()[0] & 0x80 != 0 => {
                format!("-{}", negate(*value).dec())
            }
            Token::Int(value) => value.dec(),
            Token::Array(items) => {
                let items: Vec<String> =
                    items.iter().map(|item| item.render(checksum_addresses)).collect();
                format!("[{}]", items.join(", "))
            }
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(true))
    }
}

/// Encode tokens in order onto `enc`
pub fn encode_tokens(enc: &mut AbiEncoder, tokens: &[Token]) -> Result<()> {
    tokens.iter().try_for_each(|token| token.encode(enc))
}

/// Decode one token per kind, in order
pub fn decode_tokens(kinds: &[ParamKind], dec: &mut AbiDecoder<'_>) -> Result<Vec<Token>> {
    kinds.iter().map(|kind| Token::decode(kind, dec)).collect()
}

/// Two's-complement negation
fn negate(mut value: Uint256) -> Uint256 {
    value.not().add(&Uint256::from(1u32));
    value
}

fn check_width(value: &Uint256, bits: usize) -> Result<()> {
    let high_bytes = (256 - bits) / 8;
    if value.bytes()[..high_bytes].iter().any(|&b| b != 0) {
        return Err(AbiError::Range(format!(
            "value {} does not fit in uint{}",
            value.dec(),
            bits
        )));
    }
    Ok(())
}

/// Two's-complement `value` fits in `bits` when every bit from the sign bit
/// up is a copy of the sign
fn check_signed_width(value: &Uint256, bits: usize, negative: bool, arg: &str) -> Result<()> {
    let sign_extended =
        (bits - 1..256).all(|i| matches!(value.test_bit(i as i32), Ok(b) if b == negative));
    if !sign_extended {
        return Err(AbiError::Range(format!("value {} does not fit in int{}", arg, bits)));
    }
    Ok(())
}

fn parse_hex_bytes(arg: &str) -> Result<Vec<u8>> {
    hex::decode(strip_hex_prefix(arg))
        .map_err(|e| AbiError::InvalidFormat(format!("invalid hex {:?}: {}", arg, e)))
}

fn unquote(s: &str) -> &str {
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Split on commas that are not inside nested brackets
fn split_top_level(s: &str) -> Vec<&str> {
    if s.trim().is_empty() {
        return Vec::new();
    }
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(s[start..].trim());
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kinds() {
        assert_eq!(ParamKind::parse("uint256").unwrap(), ParamKind::Uint(256));
        assert_eq!(ParamKind::parse("uint").unwrap(), ParamKind::Uint(256));
        assert_eq!(ParamKind::parse("bytes4").unwrap(), ParamKind::FixedBytes(4));
        assert_eq!(
            ParamKind::parse("string[][]").unwrap(),
            ParamKind::Array(Box::new(ParamKind::Array(Box::new(ParamKind::String))))
        );
        assert!(matches!(ParamKind::parse("uint7"), Err(AbiError::Range(_))));
        assert!(matches!(ParamKind::parse("bytes33"), Err(AbiError::Range(_))));
        assert!(matches!(ParamKind::parse("tuple"), Err(AbiError::TypeMismatch(_))));
    }

    #[test]
    fn test_parse_signature() {
        let (sig, kinds) = parse_signature("getAmountsOut(uint, address[])").unwrap();
        assert_eq!(sig, "getAmountsOut(uint256,address[])");
        assert_eq!(kinds.len(), 2);
        assert!(kinds[1].is_dynamic());

        let (sig, kinds) = parse_signature("totalSupply()").unwrap();
        assert_eq!(sig, "totalSupply()");
        assert!(kinds.is_empty());

        assert!(parse_signature("broken").is_err());
    }

    #[test]
    fn test_token_roundtrip_through_codec() {
        let kinds = ParamKind::parse_list("(string,address[],int256,bytes2)").unwrap();
        let args = [
            "\"hello\"",
            "[0x0000000000000000000000000000000000000001,0x0000000000000000000000000000000000000002]",
            "-42",
            "0xbeef",
        ];
        let tokens: Vec<Token> = kinds
            .iter()
            .zip(args.iter())
            .map(|(kind, arg)| Token::parse(kind, arg).unwrap())
            .collect();

        let mut enc = AbiEncoder::new();
        encode_tokens(&mut enc, &tokens).unwrap();
        let encoded = enc.finish();

        let mut dec = AbiDecoder::new(encoded.as_bytes());
        let decoded = decode_tokens(&kinds, &mut dec).unwrap();
        assert_eq!(decoded, tokens);
        assert_eq!(decoded[2].to_string(), "-42");
        assert_eq!(decoded[3].to_string(), "0xbeef");
    }

    #[test]
    fn test_uint_width_check() {
        assert!(Token::parse(&ParamKind::Uint(8), "255").is_ok());
        assert!(matches!(
            Token::parse(&ParamKind::Uint(8), "256"),
            Err(AbiError::Range(_))
        ));
    }

    #[test]
    fn test_int_width_check() {
        let int8 = ParamKind::Int(8);
        for ok in ["127", "-128", "0", "-0", "-1"] {
            assert!(Token::parse(&int8, ok).is_ok(), "{} should fit in int8", ok);
        }
        for bad in ["128", "-129", "1000", "255"] {
            assert!(
                matches!(Token::parse(&int8, bad), Err(AbiError::Range(_))),
                "{} should not fit in int8",
                bad
            );
        }

        let int256 = ParamKind::Int(256);
        let min = format!("0x8{}", "0".repeat(63));
        assert!(matches!(Token::parse(&int256, &min), Err(AbiError::Range(_))));
        assert_eq!(
            Token::parse(&int256, &format!("-{}", min)).unwrap().to_string(),
            "-57896044618658097711785492504343953926634992332820282019728792003956564819968"
        );
        assert!(Token::parse(&int256, &format!("0x7{}", "f".repeat(63))).is_ok());
    }

    #[test]
    fn test_string_array_keeps_quoted_commas() {
        let kind = ParamKind::parse("string[]").unwrap();
        let token = Token::parse(&kind, r#"["a,b","c", 'd]e']"#).unwrap();
        assert_eq!(
            token,
            Token::Array(vec![
                Token::String("a,b".to_string()),
                Token::String("c".to_string()),
                Token::String("d]e".to_string()),
            ])
        );
    }

    #[test]
    fn test_nested_array_arg() {
        let kind = ParamKind::parse("uint8[][]").unwrap();
        let token = Token::parse(&kind, "[[1,2],[],[3]]").unwrap();
        assert_eq!(token.to_string(), "[[1, 2], [], [3]]");
    }

    #[test]
    fn test_render_address_case() {
        let token = Token::parse(
            &ParamKind::Address,
            "0x4976fb03c32e5b8cfe2b6ccb31c09ba78ebaba41",
        )
        .unwrap();
        assert_eq!(token.render(false), "0x4976fb03c32e5b8cfe2b6ccb31c09ba78ebaba41");
        assert_eq!(token.to_string(), "0x4976fb03C32e5B8cfe2b6cCB31c09Ba78EBaBa41");
    }
}
