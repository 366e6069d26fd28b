//! Cross-module round-trip tests: values built through the public API must
//! survive encode/decode unchanged, and canonical encoding must be
//! idempotent.

use cbor_bignum::{
    decode, BigInt, CborMap, CborValue, DecodeOptions, ExtendedDecimal, ExtendedFloat,
    ExtendedRational, PrecisionContext, Rounding,
};
use rand::random;

fn roundtrip(v: &CborValue) {
    let bytes = v.to_bytes();
    let back = decode(&bytes, &DecodeOptions::canonical()).expect("canonical decode");
    assert_eq!(&back, v, "bytes {:02x?}", bytes);
    // canonical encode is idempotent
    assert_eq!(back.to_bytes(), bytes);
}

fn random_scalar(depth: usize) -> CborValue {
    match random::<u8>() % 12 {
        0 => CborValue::UInt(random()),
        1 => CborValue::NInt(random()),
        2 => CborValue::Bytes((0..random::<usize>() % 12).map(|_| random()).collect()),
        3 => CborValue::Text(
            (0..random::<usize>() % 8)
                .map(|_| (b'a' + random::<u8>() % 26) as char)
                .collect(),
        ),
        4 => CborValue::Bool(random()),
        5 => CborValue::Null,
        6 => CborValue::Undefined,
        7 => {
            let f = f64::from_bits(random());
            CborValue::Float(if f.is_nan() { f64::NAN } else { f })
        }
        8 => {
            let m = BigInt::from(random::<i64>());
            let e = BigInt::from(random::<i32>() % 40 - 20);
            CborValue::Decimal(ExtendedDecimal::from_parts(m, e))
        }
        9 => {
            let m = BigInt::from(random::<i64>());
            let e = BigInt::from(random::<i32>() % 40 - 20);
            CborValue::BigFloat(ExtendedFloat::from_parts(m, e))
        }
        10 => {
            let n = BigInt::from(random::<i64>());
            let d = BigInt::from(random::<u32>() as i64 + 1);
            CborValue::Rational(ExtendedRational::new(n, d).unwrap())
        }
        _ if depth < 3 => {
            let items = (0..random::<usize>() % 4)
                .map(|_| random_scalar(depth + 1))
                .collect();
            CborValue::Array(items)
        }
        _ => CborValue::UInt(random::<u64>() % 1000),
    }
}

#[test]
fn integer_headers_match_rfc() {
    assert_eq!(CborValue::UInt(23).to_bytes(), vec![0x17]);
    assert_eq!(CborValue::UInt(24).to_bytes(), vec![0x18, 0x18]);
    // NInt(0) is the encoding of -1
    assert_eq!(CborValue::NInt(0).to_bytes(), vec![0x20]);
}

#[test]
fn bignum_two_pow_64() {
    // tag 2 wrapping h'010000000000000000' decodes to 2^64 and re-encodes
    // to the identical bytes
    let mut bytes = vec![0xC2, 0x49, 0x01];
    bytes.extend_from_slice(&[0u8; 8]);
    let v = decode(&bytes, &DecodeOptions::canonical()).unwrap();
    let expect = BigInt::from(u64::MAX) + BigInt::from(1);
    assert_eq!(v.as_integer().unwrap(), expect);
    assert_eq!(v.to_bytes(), bytes);
}

#[test]
fn numeric_tags_roundtrip() {
    roundtrip(&CborValue::Decimal(ExtendedDecimal::from_string("273.15").unwrap()));
    roundtrip(&CborValue::Decimal(ExtendedDecimal::from_string("-0.001").unwrap()));
    roundtrip(&CborValue::BigFloat(ExtendedFloat::from_parts(
        BigInt::from(3),
        BigInt::from(-1),
    )));
    roundtrip(&CborValue::Rational(
        ExtendedRational::new(BigInt::from(-22), BigInt::from(7)).unwrap(),
    ));

    // a mantissa beyond 64 bits goes through nested bignums
    let big = BigInt::from_string("123456789012345678901234567890").unwrap();
    roundtrip(&CborValue::Decimal(ExtendedDecimal::from_parts(
        big,
        BigInt::from(-5),
    )));
}

#[test]
fn float_widths_and_nan() {
    roundtrip(&CborValue::Float(0.0));
    roundtrip(&CborValue::Float(-0.0));
    roundtrip(&CborValue::Float(1.0));
    roundtrip(&CborValue::Float(100_000.0));
    roundtrip(&CborValue::Float(1.1));
    roundtrip(&CborValue::Float(f64::INFINITY));
    roundtrip(&CborValue::Float(f64::NEG_INFINITY));
    roundtrip(&CborValue::Float(f64::NAN));
    roundtrip(&CborValue::Float(5e-324));

    // -0.0 and 0.0 stay distinct through the codec
    assert_ne!(
        CborValue::Float(0.0).to_bytes(),
        CborValue::Float(-0.0).to_bytes()
    );
}

#[test]
fn containers_roundtrip() {
    let mut map = CborMap::new();
    map.insert(CborValue::Text("unit".into()), CborValue::Text("K".into()));
    map.insert(
        CborValue::UInt(1),
        CborValue::Decimal(ExtendedDecimal::from_string("273.15").unwrap()),
    );
    let v = CborValue::Array(vec![
        CborValue::Map(map),
        CborValue::Bytes(vec![0xDE, 0xAD]),
        CborValue::Tagged(1, Box::new(CborValue::UInt(1_700_000_000))),
        CborValue::Null,
    ]);
    roundtrip(&v);
}

#[test]
fn computed_values_roundtrip() {
    let mut ctx = PrecisionContext::for_precision_and_rounding(30, Rounding::HalfEven);
    let pi = ExtendedDecimal::pi(&mut ctx).unwrap();
    roundtrip(&CborValue::Decimal(pi));

    let third = ExtendedDecimal::from_string("1")
        .unwrap()
        .divide(&ExtendedDecimal::from_string("3").unwrap(), &mut ctx)
        .unwrap();
    roundtrip(&CborValue::Decimal(third));

    let root = ExtendedFloat::from(2i64)
        .square_root(&mut PrecisionContext::binary64())
        .unwrap();
    roundtrip(&CborValue::BigFloat(root));
}

#[test]
fn random_values_roundtrip() {
    for _ in 0..500 {
        roundtrip(&random_scalar(0));
    }
}

#[test]
fn random_integers_through_bignum_tags() {
    for _ in 0..200 {
        let mut v = BigInt::from(random::<i64>());
        for _ in 0..random::<usize>() % 3 {
            v = &v * &BigInt::from(random::<i64>());
        }
        roundtrip(&CborValue::from_int(&v));
    }
}

#[test]
fn decimal_string_formats_survive() {
    for s in [
        "0", "-0", "1", "-1.5", "0.001", "1E+10", "1.23E-15", "98765.4321",
    ] {
        let d = ExtendedDecimal::from_string(s).unwrap();
        assert_eq!(ExtendedDecimal::from_string(&d.to_string()).unwrap(), d);
        roundtrip(&CborValue::Decimal(d));
    }
}

#[test]
fn half_precision_decode_is_lossless() {
    // every half value decodes to a float that re-encodes as the same half
    for h in [0x0000u16, 0x8000, 0x3C00, 0x7BFF, 0x0001, 0x7C00, 0xFC00] {
        let mut bytes = vec![0xF9];
        bytes.extend_from_slice(&h.to_be_bytes());
        let v = decode(&bytes, &DecodeOptions::canonical()).unwrap();
        assert_eq!(v.to_bytes(), bytes);
    }
}
