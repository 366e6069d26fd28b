//! Deserialization of the numeric types.

use core::fmt::Formatter;

use serde::de::Error;
use serde::de::Visitor;
use serde::{Deserialize, Deserializer};

use crate::bigint::BigInt;
use crate::dec::ExtendedDecimal;

struct BigIntVisitor;

impl<'de> Deserialize<'de> for BigInt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(BigIntVisitor)
    }
}

impl<'de> Visitor<'de> for BigIntVisitor {
    type Value = BigInt;

    fn expecting(&self, formatter: &mut Formatter) -> core::fmt::Result {
        write!(formatter, "expecting `String` or integer `Number`")
    }

    fn visit_u64<E: Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(BigInt::from(v))
    }

    fn visit_i64<E: Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(BigInt::from(v))
    }

    fn visit_str<E: Error>(self, v: &str) -> Result<Self::Value, E> {
        BigInt::from_string(v).ok_or_else(|| Error::custom("malformed integer string"))
    }

    fn visit_string<E: Error>(self, v: String) -> Result<Self::Value, E> {
        self.visit_str(&v)
    }
}

struct ExtendedDecimalVisitor;

impl<'de> Deserialize<'de> for ExtendedDecimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ExtendedDecimalVisitor)
    }
}

impl<'de> Visitor<'de> for ExtendedDecimalVisitor {
    type Value = ExtendedDecimal;

    fn expecting(&self, formatter: &mut Formatter) -> core::fmt::Result {
        write!(formatter, "expecting `String` or `Number`")
    }

    fn visit_u64<E: Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(ExtendedDecimal::from_parts(BigInt::from(v), BigInt::default()))
    }

    fn visit_i64<E: Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(ExtendedDecimal::from(v))
    }

    fn visit_f64<E: Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(ExtendedDecimal::from_f64(v))
    }

    fn visit_str<E: Error>(self, v: &str) -> Result<Self::Value, E> {
        ExtendedDecimal::from_string(v).ok_or_else(|| Error::custom("malformed decimal string"))
    }

    fn visit_string<E: Error>(self, v: String) -> Result<Self::Value, E> {
        self.visit_str(&v)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::from_str;

    use crate::bigint::BigInt;
    use crate::dec::ExtendedDecimal;

    #[test]
    fn from_json() {
        let v: BigInt = from_str("\"-42\"").unwrap();
        assert_eq!(v, BigInt::from(-42));
        let v: BigInt = from_str("42").unwrap();
        assert_eq!(v, BigInt::from(42));

        let v: ExtendedDecimal = from_str("\"1.5E+3\"").unwrap();
        assert_eq!(v.to_string(), "1.5E+3");
        let v: ExtendedDecimal = from_str("7").unwrap();
        assert_eq!(v.to_string(), "7");
    }
}
