//! Wire-format tests for the encoder, decoder and Uint256
//!
//! Layouts are cross-checked against alloy-dyn-abi's reference encoder.

use abiwire::domain::abi::{
    AbiDecoder, AbiEncoder, AbiError, AbiPayload, SelectorCache, Uint256, NULL_ADDRESS,
};
use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, U256};

const ALICE: &str = "0x4976fb03c32e5b8cfe2b6ccb31c09ba78ebaba41";
const BOB: &str = "0x742d35cc6634c0532925a3b844bc9e7595f0beb0";

fn address(s: &str) -> Address {
    s.parse().unwrap()
}

fn word(hex: &str) -> String {
    format!("{:0>64}", hex)
}

#[test]
fn test_transfer_call_data() {
    let cache = SelectorCache::new();
    let mut enc = AbiEncoder::method(&cache, "transfer(address,uint256)").unwrap();
    enc.write_address(ALICE).unwrap();
    enc.write_uint(1000i64).unwrap();
    let encoded = enc.finish();

    let expected = format!("0xa9059cbb{}{}", word(&ALICE[2..]), word("3e8"));
    assert_eq!(encoded.hex(), expected);
    assert_eq!(encoded.len(), 4 + 64);
}

#[test]
fn test_static_fields_then_string_array_matches_reference() {
    let mut enc = AbiEncoder::new();
    enc.write_uint(7i64).unwrap();
    enc.write_bool(true);
    enc.write_array(&["a", "bb"], |child, s| {
        child.write_text(s);
        Ok(())
    })
    .unwrap();
    let encoded = enc.finish();

    let reference = DynSolValue::Tuple(vec![
        DynSolValue::Uint(U256::from(7u64), 256),
        DynSolValue::Bool(true),
        DynSolValue::Array(vec![
            DynSolValue::String("a".to_string()),
            DynSolValue::String("bb".to_string()),
        ]),
    ])
    .abi_encode_params();
    assert_eq!(encoded.as_bytes(), reference.as_slice());

    // array offset sits after the two static words
    assert_eq!(encoded.as_bytes()[64 + 31], 0x60);
}

#[test]
fn test_selector_prefixed_call_matches_reference() {
    let cache = SelectorCache::new();
    let mut enc = AbiEncoder::method(&cache, "getAmountsOut(uint256,address[])").unwrap();
    enc.write_uint("0xde0b6b3a7640000").unwrap();
    enc.write_addresses(&[ALICE, BOB]).unwrap();
    let encoded = enc.finish();

    let mut reference = cache.selector("getAmountsOut(uint256,address[])").unwrap().to_vec();
    reference.extend(
        DynSolValue::Tuple(vec![
            DynSolValue::Uint(U256::from(1_000_000_000_000_000_000u64), 256),
            DynSolValue::Array(vec![
                DynSolValue::Address(address(ALICE)),
                DynSolValue::Address(address(BOB)),
            ]),
        ])
        .abi_encode_params(),
    );
    assert_eq!(encoded.as_bytes(), reference.as_slice());
}

#[test]
fn test_nested_arrays_match_reference() {
    let groups: Vec<Vec<&str>> = vec![vec!["x"], vec![], vec!["yy", "zzz"]];
    let mut enc = AbiEncoder::new();
    enc.write_array(&groups, |child, group| {
        child.write_array(group, |grandchild, s| {
            grandchild.write_text(s);
            Ok(())
        })?;
        Ok(())
    })
    .unwrap();
    let encoded = enc.finish();

    let reference = DynSolValue::Tuple(vec![DynSolValue::Array(
        groups
            .iter()
            .map(|group| {
                DynSolValue::Array(
                    group
                        .iter()
                        .map(|s| DynSolValue::String(s.to_string()))
                        .collect(),
                )
            })
            .collect(),
    )])
    .abi_encode_params();
    assert_eq!(encoded.as_bytes(), reference.as_slice());

    let mut dec = AbiDecoder::new(encoded.as_bytes());
    let decoded = dec
        .read_array(|child, _| child.read_array(|grandchild, _| grandchild.read_text()))
        .unwrap();
    assert_eq!(decoded, vec![vec!["x"], vec![], vec!["yy", "zzz"]]);
}

#[test]
fn test_reference_output_decodes() {
    let reference = DynSolValue::Tuple(vec![
        DynSolValue::Address(address(BOB)),
        DynSolValue::Bytes(vec![0xde, 0xad, 0xbe, 0xef, 0x01]),
        DynSolValue::Uint(U256::from(42u64), 256),
        DynSolValue::String("hello world".to_string()),
    ])
    .abi_encode_params();

    let mut dec = AbiDecoder::new(&reference);
    assert_eq!(dec.read_address(false).unwrap(), BOB);
    assert_eq!(dec.read_dynamic().unwrap(), &[0xde, 0xad, 0xbe, 0xef, 0x01]);
    assert_eq!(dec.read_number().unwrap(), 42);
    assert_eq!(dec.read_text().unwrap(), "hello world");
    assert_eq!(dec.remaining(), reference.len() - 4 * 32);
}

#[test]
fn test_address_array_and_text_round_trip() {
    let addrs = [ALICE, BOB, NULL_ADDRESS];
    for (list, text) in [(&addrs[..], "abiwire"), (&addrs[..0], "")] {
        let mut enc = AbiEncoder::new();
        enc.write_addresses(list).unwrap();
        enc.write_text(text);
        let encoded = enc.finish();

        let payload = AbiPayload::from_hex(&encoded.hex()).unwrap();
        let mut dec = payload.decoder();
        let decoded = dec.read_array(|child, _| child.read_address(false)).unwrap();
        assert_eq!(decoded, list);
        assert_eq!(dec.read_text().unwrap(), text);
    }
}

#[test]
fn test_truncated_dynamic_is_bounds_error() {
    let mut enc = AbiEncoder::new();
    enc.write_text("this text will be cut short");
    let encoded = enc.finish();
    let truncated = &encoded.as_bytes()[..encoded.len() - 32];

    let err = AbiDecoder::new(truncated).read_text().unwrap_err();
    assert!(err.is_bounds(), "unexpected error: {:?}", err);

    let err = AbiDecoder::new(&[0u8; 31]).read_uint256().unwrap_err();
    assert!(matches!(err, AbiError::Bounds { needed: 32, len: 31, .. }));
}

#[test]
fn test_uint_add_is_associative_mod_2_256() {
    let a = Uint256::from_hex(&"ff".repeat(32)).unwrap();
    let b = Uint256::from_dec("123456789012345678901234567890").unwrap();
    let c = Uint256::from_hex("0x8000000000000000000000000000000000000000000000000000000000000001")
        .unwrap();

    let mut left = a;
    left.add(&b).add(&c);
    let mut bc = b;
    bc.add(&c);
    let mut right = a;
    right.add(&bc);
    assert_eq!(left, right);

    // max + 1 wraps to zero
    let mut wrapped = a;
    wrapped.add(&Uint256::from(1u32));
    assert!(wrapped.is_zero());
}

#[test]
fn test_uint_bit_indexing() {
    let mut v = Uint256::zero();
    v.set_bit(0, true).unwrap();
    assert_eq!(v.number().unwrap(), 1);
    assert!(v.test_bit(0).unwrap());
    // negative indices count from the most significant bit
    assert!(v.test_bit(-256).unwrap());

    let mut top = Uint256::zero();
    top.set_bit(-1, true).unwrap();
    assert!(top.test_bit(255).unwrap());
    assert_eq!(top.bytes()[0], 0x80);

    top.flip_bit(255).unwrap();
    assert!(top.is_zero());
    assert!(top.set_bit(256, true).is_err());
}

#[test]
fn test_uint_round_trips() {
    let bytes = [0x12u8, 0x34, 0x56];
    let v = Uint256::from_bytes(&bytes);
    assert_eq!(&v.bytes()[29..], &bytes);
    assert_eq!(v.min_hex(), "0x123456");
    assert_eq!(Uint256::from_hex(&v.min_hex()).unwrap(), v);

    let dec = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
    let max = Uint256::from_dec(dec).unwrap();
    assert_eq!(max.dec(), dec);
    assert_eq!(max.bytes(), &[0xff; 32]);

    let reference: U256 = dec.parse().unwrap();
    assert_eq!(max.bytes(), &reference.to_be_bytes::<32>());
}
