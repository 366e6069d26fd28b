//! Serialization of the numeric types.
//! Serialization uses the decimal string forms.

use serde::{Serialize, Serializer};

use crate::bigint::BigInt;
use crate::dec::ExtendedDecimal;
use crate::float::ExtendedFloat;
use crate::rational::ExtendedRational;

impl Serialize for BigInt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl Serialize for ExtendedDecimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl Serialize for ExtendedFloat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl Serialize for ExtendedRational {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::to_string;

    use crate::bigint::BigInt;
    use crate::dec::ExtendedDecimal;

    #[test]
    fn to_json() {
        assert_eq!(to_string(&BigInt::from(-42)).unwrap(), "\"-42\"");
        assert_eq!(
            to_string(&ExtendedDecimal::from_string("1.5").unwrap()).unwrap(),
            "\"1.5\""
        );
        assert_eq!(
            to_string(&ExtendedDecimal::negative_infinity()).unwrap(),
            "\"-Infinity\""
        );
    }
}
