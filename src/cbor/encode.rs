//! Canonical CBOR encoder.
//!
//! Every argument takes the smallest width that preserves its value, map
//! entries are already in canonical key order, and floats narrow to the
//! shortest bit-exact width. The result is the unique canonical encoding
//! of a value.

use crate::bigint::BigInt;
use crate::cbor::half;
use crate::cbor::CborValue;
use crate::dec::ExtendedDecimal;
use crate::float::ExtendedFloat;

const MAJOR_UNSIGNED: u8 = 0;
const MAJOR_NEGATIVE: u8 = 1;
const MAJOR_BYTES: u8 = 2;
const MAJOR_TEXT: u8 = 3;
const MAJOR_ARRAY: u8 = 4;
const MAJOR_MAP: u8 = 5;
const MAJOR_TAG: u8 = 6;
const MAJOR_SIMPLE: u8 = 7;

/// Writes a header byte and its minimum-length argument.
pub(crate) fn write_header(out: &mut Vec<u8>, major: u8, arg: u64) {
    let mt = major << 5;
    if arg < 24 {
        out.push(mt | arg as u8);
    } else if arg <= 0xFF {
        out.push(mt | 24);
        out.push(arg as u8);
    } else if arg <= 0xFFFF {
        out.push(mt | 25);
        out.extend_from_slice(&(arg as u16).to_be_bytes());
    } else if arg <= 0xFFFF_FFFF {
        out.push(mt | 26);
        out.extend_from_slice(&(arg as u32).to_be_bytes());
    } else {
        out.push(mt | 27);
        out.extend_from_slice(&arg.to_be_bytes());
    }
}

// The magnitude as big-endian bytes with no leading zeros, as used by the
// bignum tags.
fn unsigned_magnitude_be(v: &BigInt) -> Vec<u8> {
    let bytes = v.abs().to_bytes(false);
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
    bytes[start..].to_vec()
}

/// Writes an arbitrary integer: the 64-bit majors when the value fits,
/// tag 2 or 3 with a magnitude byte string otherwise.
pub(crate) fn write_integer(out: &mut Vec<u8>, v: &BigInt) {
    if v.signum() >= 0 {
        if let Ok(u) = v.to_u64() {
            write_header(out, MAJOR_UNSIGNED, u);
            return;
        }
        write_header(out, MAJOR_TAG, 2);
        let mag = unsigned_magnitude_be(v);
        write_header(out, MAJOR_BYTES, mag.len() as u64);
        out.extend_from_slice(&mag);
    } else {
        let arg = -(v + &BigInt::from(1));
        if let Ok(u) = arg.to_u64() {
            write_header(out, MAJOR_NEGATIVE, u);
            return;
        }
        write_header(out, MAJOR_TAG, 3);
        let mag = unsigned_magnitude_be(&arg);
        write_header(out, MAJOR_BYTES, mag.len() as u64);
        out.extend_from_slice(&mag);
    }
}

// The shortest float encoding preserving the bit pattern.
fn write_float(out: &mut Vec<u8>, v: f64) {
    let single = v as f32;
    if single as f64 == v || (v.is_nan() && (single as f64).to_bits() == v.to_bits()) {
        if let Some(h) = half::f32_to_f16_bits(single) {
            out.push((MAJOR_SIMPLE << 5) | 25);
            out.extend_from_slice(&h.to_be_bytes());
            return;
        }
        if (single as f64).to_bits() == v.to_bits() {
            out.push((MAJOR_SIMPLE << 5) | 26);
            out.extend_from_slice(&single.to_bits().to_be_bytes());
            return;
        }
    }
    out.push((MAJOR_SIMPLE << 5) | 27);
    out.extend_from_slice(&v.to_bits().to_be_bytes());
}

fn write_decimal(out: &mut Vec<u8>, v: &ExtendedDecimal) {
    if !v.is_finite() {
        // non-finite decimals have no tag 4 form and fall back to floats
        write_float(out, v.to_f64());
        return;
    }
    write_header(out, MAJOR_TAG, 4);
    write_header(out, MAJOR_ARRAY, 2);
    write_integer(out, v.exponent());
    write_integer(out, &v.mantissa());
}

fn write_bigfloat(out: &mut Vec<u8>, v: &ExtendedFloat) {
    if !v.is_finite() {
        write_float(out, v.to_f64());
        return;
    }
    write_header(out, MAJOR_TAG, 5);
    write_header(out, MAJOR_ARRAY, 2);
    write_integer(out, v.exponent());
    write_integer(out, &v.mantissa());
}

/// Appends the canonical encoding of `v`.
pub(crate) fn write_value(out: &mut Vec<u8>, v: &CborValue) {
    match v {
        CborValue::UInt(u) => write_header(out, MAJOR_UNSIGNED, *u),
        CborValue::NInt(u) => write_header(out, MAJOR_NEGATIVE, *u),
        CborValue::Integer(n) => write_integer(out, n),
        CborValue::Bytes(b) => {
            write_header(out, MAJOR_BYTES, b.len() as u64);
            out.extend_from_slice(b);
        }
        CborValue::Text(s) => {
            write_header(out, MAJOR_TEXT, s.len() as u64);
            out.extend_from_slice(s.as_bytes());
        }
        CborValue::Array(items) => {
            write_header(out, MAJOR_ARRAY, items.len() as u64);
            for item in items {
                write_value(out, item);
            }
        }
        CborValue::Map(m) => {
            write_header(out, MAJOR_MAP, m.len() as u64);
            for (k, val) in m.iter() {
                write_value(out, k);
                write_value(out, val);
            }
        }
        CborValue::Tagged(tag, inner) => {
            write_header(out, MAJOR_TAG, *tag);
            write_value(out, inner);
        }
        CborValue::Simple(s) => {
            if *s < 24 {
                out.push((MAJOR_SIMPLE << 5) | s);
            } else {
                out.push((MAJOR_SIMPLE << 5) | 24);
                out.push(*s);
            }
        }
        CborValue::Bool(false) => out.push((MAJOR_SIMPLE << 5) | 20),
        CborValue::Bool(true) => out.push((MAJOR_SIMPLE << 5) | 21),
        CborValue::Null => out.push((MAJOR_SIMPLE << 5) | 22),
        CborValue::Undefined => out.push((MAJOR_SIMPLE << 5) | 23),
        CborValue::Float(f) => write_float(out, *f),
        CborValue::Decimal(d) => write_decimal(out, d),
        CborValue::BigFloat(bf) => write_bigfloat(out, bf),
        CborValue::Rational(r) => {
            write_header(out, MAJOR_TAG, 30);
            write_header(out, MAJOR_ARRAY, 2);
            write_integer(out, r.numerator());
            write_integer(out, r.denominator());
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::rational::ExtendedRational;

    fn enc(v: &CborValue) -> Vec<u8> {
        v.to_bytes()
    }

    #[test]
    fn test_integer_headers() {
        assert_eq!(enc(&CborValue::UInt(0)), vec![0x00]);
        assert_eq!(enc(&CborValue::UInt(23)), vec![0x17]);
        assert_eq!(enc(&CborValue::UInt(24)), vec![0x18, 0x18]);
        assert_eq!(enc(&CborValue::UInt(255)), vec![0x18, 0xFF]);
        assert_eq!(enc(&CborValue::UInt(256)), vec![0x19, 0x01, 0x00]);
        assert_eq!(enc(&CborValue::UInt(65536)), vec![0x1A, 0x00, 0x01, 0x00, 0x00]);
        assert_eq!(
            enc(&CborValue::UInt(u64::MAX)),
            vec![0x1B, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
        );

        // NInt(0) encodes -1
        assert_eq!(enc(&CborValue::NInt(0)), vec![0x20]);
        assert_eq!(enc(&CborValue::NInt(9)), vec![0x29]);
        assert_eq!(enc(&CborValue::NInt(99)), vec![0x38, 0x63]);
    }

    #[test]
    fn test_bignum() {
        // 2^64 takes tag 2 with nine magnitude bytes
        let v = BigInt::from(u64::MAX) + BigInt::from(1);
        let mut expect = vec![0xC2, 0x49, 0x01];
        expect.extend_from_slice(&[0; 8]);
        assert_eq!(enc(&CborValue::Integer(v)), expect);

        // -2^64 - 1 takes tag 3 with the magnitude of -1 - n = 2^64
        let v = -(BigInt::from(u64::MAX) + BigInt::from(2));
        let mut expect = vec![0xC3, 0x49, 0x01];
        expect.extend_from_slice(&[0; 8]);
        assert_eq!(enc(&CborValue::Integer(v)), expect);
    }

    #[test]
    fn test_strings_and_containers() {
        assert_eq!(enc(&CborValue::Bytes(vec![1, 2, 3])), vec![0x43, 1, 2, 3]);
        assert_eq!(enc(&CborValue::Text("IETF".into())), vec![0x64, b'I', b'E', b'T', b'F']);
        assert_eq!(
            enc(&CborValue::Array(vec![CborValue::UInt(1), CborValue::UInt(2)])),
            vec![0x82, 0x01, 0x02]
        );
        assert_eq!(enc(&CborValue::Array(vec![])), vec![0x80]);
    }

    #[test]
    fn test_simple_and_float() {
        assert_eq!(enc(&CborValue::Bool(false)), vec![0xF4]);
        assert_eq!(enc(&CborValue::Bool(true)), vec![0xF5]);
        assert_eq!(enc(&CborValue::Null), vec![0xF6]);
        assert_eq!(enc(&CborValue::Undefined), vec![0xF7]);
        assert_eq!(enc(&CborValue::Simple(16)), vec![0xF0]);
        assert_eq!(enc(&CborValue::Simple(255)), vec![0xF8, 0xFF]);

        // 1.0 fits a half
        assert_eq!(enc(&CborValue::Float(1.0)), vec![0xF9, 0x3C, 0x00]);
        assert_eq!(enc(&CborValue::Float(-0.0)), vec![0xF9, 0x80, 0x00]);
        // 100000.0 needs a single
        assert_eq!(
            enc(&CborValue::Float(100_000.0)),
            vec![0xFA, 0x47, 0xC3, 0x50, 0x00]
        );
        // 1.1 needs a double
        assert_eq!(
            enc(&CborValue::Float(1.1)),
            vec![0xFB, 0x3F, 0xF1, 0x99, 0x99, 0x99, 0x99, 0x99, 0x9A]
        );
        // the canonical NaN is the half NaN
        assert_eq!(enc(&CborValue::Float(f64::NAN)), vec![0xF9, 0x7E, 0x00]);
        assert_eq!(enc(&CborValue::Float(f64::INFINITY)), vec![0xF9, 0x7C, 0x00]);
    }

    #[test]
    fn test_number_tags() {
        // 273.15 as a decimal fraction: tag 4 [-2, 27315]
        let d = ExtendedDecimal::from_string("273.15").unwrap();
        assert_eq!(
            enc(&CborValue::Decimal(d)),
            vec![0xC4, 0x82, 0x21, 0x19, 0x6A, 0xB3]
        );

        // 1.5 as a bigfloat: tag 5 [-1, 3]
        let bf = ExtendedFloat::from_parts(BigInt::from(3), BigInt::from(-1));
        assert_eq!(enc(&CborValue::BigFloat(bf)), vec![0xC5, 0x82, 0x20, 0x03]);

        // 1/3 as a rational: tag 30 [1, 3]
        let r = ExtendedRational::new(BigInt::from(1), BigInt::from(3)).unwrap();
        assert_eq!(enc(&CborValue::Rational(r)), vec![0xD8, 0x1E, 0x82, 0x01, 0x03]);
    }

    #[test]
    fn test_tagged_and_map() {
        let v = CborValue::Tagged(1, Box::new(CborValue::UInt(1_363_896_240)));
        assert_eq!(enc(&v), vec![0xC1, 0x1A, 0x51, 0x4B, 0x67, 0xB0]);

        let mut m = crate::cbor::CborMap::new();
        m.insert(CborValue::Text("b".into()), CborValue::UInt(2));
        m.insert(CborValue::UInt(1), CborValue::UInt(1));
        // the integer key encodes shorter and sorts first
        assert_eq!(
            enc(&CborValue::Map(m)),
            vec![0xA2, 0x01, 0x01, 0x61, b'b', 0x02]
        );
    }
}
