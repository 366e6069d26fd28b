//! Tag handler registry.
//!
//! The registry is a plain value handed to the decoder, so tests and
//! embedders can install their own handlers without global state. Each
//! handler declares a type filter over the inner value and a validator
//! that may replace the decoded value with a normalised one.

use std::collections::BTreeMap;

use crate::bigint::BigInt;
use crate::cbor::CborValue;
use crate::dec::ExtendedDecimal;
use crate::float::ExtendedFloat;
use crate::rational::ExtendedRational;

/// A predicate over the shape of a tagged item's inner value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CborTypeFilter {
    /// Any value passes.
    Any,

    /// A byte string.
    ByteString,

    /// A text string.
    TextString,

    /// Any integer variant.
    Integer,

    /// An array of exactly `len` elements.
    Array {
        /// Required element count.
        len: usize,
    },

    /// An array of exactly `len` integers.
    IntegerArray {
        /// Required element count.
        len: usize,
    },
}

impl CborTypeFilter {
    /// Tests the inner value against the filter.
    pub fn accepts(&self, v: &CborValue) -> bool {
        match self {
            CborTypeFilter::Any => true,
            CborTypeFilter::ByteString => matches!(v, CborValue::Bytes(_)),
            CborTypeFilter::TextString => matches!(v, CborValue::Text(_)),
            CborTypeFilter::Integer => v.is_integer(),
            CborTypeFilter::Array { len } => {
                matches!(v, CborValue::Array(items) if items.len() == *len)
            }
            CborTypeFilter::IntegerArray { len } => match v {
                CborValue::Array(items) => {
                    items.len() == *len && items.iter().all(|i| i.is_integer())
                }
                _ => false,
            },
        }
    }
}

/// Validates and normalises the payload of one tag number.
pub trait TagHandler {
    /// The shapes of inner values this handler accepts. Values outside the
    /// filter fail validation before `validate` runs.
    fn filter(&self) -> CborTypeFilter;

    /// Validates the decoded inner value, possibly transforming it. On
    /// failure the raw payload is handed back so a lenient decoder can
    /// retain it.
    fn validate(&self, value: CborValue) -> Result<CborValue, CborValue>;
}

/// Mapping from tag numbers to handlers.
pub struct TagRegistry {
    handlers: BTreeMap<u64, Box<dyn TagHandler + Send + Sync>>,
}

impl TagRegistry {
    /// An empty registry: every tag decodes as a raw tagged value.
    pub fn new() -> Self {
        TagRegistry { handlers: BTreeMap::new() }
    }

    /// Installs a handler, replacing any previous one for the tag.
    pub fn register(&mut self, tag: u64, handler: Box<dyn TagHandler + Send + Sync>) {
        self.handlers.insert(tag, handler);
    }

    /// The handler for a tag, if any.
    pub fn get(&self, tag: u64) -> Option<&(dyn TagHandler + Send + Sync)> {
        self.handlers.get(&tag).map(|h| h.as_ref())
    }
}

impl Default for TagRegistry {
    /// The registry with the well-known numeric tags installed: 2 and 3
    /// (bignums), 4 (decimal fraction), 5 (bigfloat), and 30 (rational).
    fn default() -> Self {
        let mut r = TagRegistry::new();
        r.register(2, Box::new(BignumHandler { negative: false }));
        r.register(3, Box::new(BignumHandler { negative: true }));
        r.register(4, Box::new(DecimalFractionHandler));
        r.register(5, Box::new(BigFloatHandler));
        r.register(30, Box::new(RationalHandler));
        r
    }
}

// The payload bytes of tags 2/3 are an unsigned big-endian magnitude.
fn bignum_from_bytes(bytes: &[u8]) -> BigInt {
    let mut unsigned = Vec::with_capacity(bytes.len() + 1);
    unsigned.push(0);
    unsigned.extend_from_slice(bytes);
    BigInt::from_bytes(&unsigned, false)
}

struct BignumHandler {
    negative: bool,
}

impl TagHandler for BignumHandler {
    fn filter(&self) -> CborTypeFilter {
        CborTypeFilter::ByteString
    }

    fn validate(&self, value: CborValue) -> Result<CborValue, CborValue> {
        let bytes = match &value {
            CborValue::Bytes(b) => b,
            _ => return Err(value),
        };
        let magnitude = bignum_from_bytes(bytes);
        let n = if self.negative {
            -(magnitude + BigInt::from(1))
        } else {
            magnitude
        };
        Ok(CborValue::from_int(&n))
    }
}

// [exponent, mantissa] pairs shared by tags 4 and 5.
fn exponent_mantissa(value: &CborValue) -> Option<(BigInt, BigInt)> {
    match value {
        CborValue::Array(items) if items.len() == 2 => {
            let exponent = items[0].as_integer()?;
            let mantissa = items[1].as_integer()?;
            Some((exponent, mantissa))
        }
        _ => None,
    }
}

struct DecimalFractionHandler;

impl TagHandler for DecimalFractionHandler {
    fn filter(&self) -> CborTypeFilter {
        CborTypeFilter::IntegerArray { len: 2 }
    }

    fn validate(&self, value: CborValue) -> Result<CborValue, CborValue> {
        match exponent_mantissa(&value) {
            Some((exponent, mantissa)) => Ok(CborValue::Decimal(ExtendedDecimal::from_parts(
                mantissa, exponent,
            ))),
            None => Err(value),
        }
    }
}

struct BigFloatHandler;

impl TagHandler for BigFloatHandler {
    fn filter(&self) -> CborTypeFilter {
        CborTypeFilter::IntegerArray { len: 2 }
    }

    fn validate(&self, value: CborValue) -> Result<CborValue, CborValue> {
        match exponent_mantissa(&value) {
            Some((exponent, mantissa)) => Ok(CborValue::BigFloat(ExtendedFloat::from_parts(
                mantissa, exponent,
            ))),
            None => Err(value),
        }
    }
}

struct RationalHandler;

impl TagHandler for RationalHandler {
    fn filter(&self) -> CborTypeFilter {
        CborTypeFilter::IntegerArray { len: 2 }
    }

    fn validate(&self, value: CborValue) -> Result<CborValue, CborValue> {
        let parts = match value {
            CborValue::Array(ref items) if items.len() == 2 => {
                match (items[0].as_integer(), items[1].as_integer()) {
                    (Some(n), Some(d)) => Some((n, d)),
                    _ => None,
                }
            }
            _ => None,
        };
        match parts {
            // the denominator must be positive
            Some((n, d)) if d.signum() > 0 => match ExtendedRational::new(n, d) {
                Ok(r) => Ok(CborValue::Rational(r)),
                Err(_) => Err(value),
            },
            _ => Err(value),
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_filters() {
        assert!(CborTypeFilter::Any.accepts(&CborValue::Null));
        assert!(CborTypeFilter::ByteString.accepts(&CborValue::Bytes(vec![])));
        assert!(!CborTypeFilter::ByteString.accepts(&CborValue::Text("x".into())));
        assert!(CborTypeFilter::Integer.accepts(&CborValue::NInt(3)));
        assert!(CborTypeFilter::Array { len: 2 }
            .accepts(&CborValue::Array(vec![CborValue::Null, CborValue::Null])));
        assert!(!CborTypeFilter::Array { len: 2 }.accepts(&CborValue::Array(vec![])));
        assert!(CborTypeFilter::IntegerArray { len: 2 }
            .accepts(&CborValue::Array(vec![CborValue::UInt(1), CborValue::NInt(0)])));
        assert!(!CborTypeFilter::IntegerArray { len: 2 }
            .accepts(&CborValue::Array(vec![CborValue::UInt(1), CborValue::Null])));
    }

    #[test]
    fn test_bignum_handler() {
        let h = BignumHandler { negative: false };
        let v = h.validate(CborValue::Bytes(vec![0x01, 0x00])).unwrap();
        assert_eq!(v, CborValue::UInt(256));

        // top-bit-set magnitudes stay positive
        let v = h.validate(CborValue::Bytes(vec![0xFF])).unwrap();
        assert_eq!(v, CborValue::UInt(255));

        let h = BignumHandler { negative: true };
        let v = h.validate(CborValue::Bytes(vec![0x00])).unwrap();
        assert_eq!(v, CborValue::NInt(0));
        let v = h.validate(CborValue::Bytes(vec![0x63])).unwrap();
        assert_eq!(v, CborValue::NInt(99));
    }

    #[test]
    fn test_custom_registry() {
        struct Upper;
        impl TagHandler for Upper {
            fn filter(&self) -> CborTypeFilter {
                CborTypeFilter::TextString
            }
            fn validate(&self, value: CborValue) -> Result<CborValue, CborValue> {
                match value {
                    CborValue::Text(s) => Ok(CborValue::Text(s.to_ascii_uppercase())),
                    other => Err(other),
                }
            }
        }

        let mut reg = TagRegistry::new();
        reg.register(7000, Box::new(Upper));

        let data = [0xD9, 0x1B, 0x58, 0x62, b'h', b'i'];
        let v = crate::cbor::decode_with(&data, &reg, &crate::cbor::DecodeOptions::default())
            .unwrap();
        assert_eq!(v, CborValue::Text("HI".into()));

        // the default tags are absent from a fresh registry
        let data = [0xC2, 0x41, 0x05];
        let v = crate::cbor::decode_with(&data, &reg, &crate::cbor::DecodeOptions::default())
            .unwrap();
        assert_eq!(v, CborValue::Tagged(2, Box::new(CborValue::Bytes(vec![5]))));
    }
}
