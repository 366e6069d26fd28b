//! Arbitrary-precision rational numbers.

use core::cmp::Ordering;

use crate::bigint::BigInt;
use crate::ctx::PrecisionContext;
use crate::dec::ExtendedDecimal;
use crate::defs::Error;
use crate::float::ExtendedFloat;

/// A ratio of two arbitrary-precision integers. The denominator is always
/// positive; the sign lives on the numerator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedRational {
    numerator: BigInt,
    denominator: BigInt,
}

impl ExtendedRational {
    /// Builds a rational from a numerator and a non-zero denominator. The
    /// denominator's sign is folded into the numerator.
    pub fn new(numerator: BigInt, denominator: BigInt) -> Result<Self, Error> {
        if denominator.is_zero() {
            return Err(Error::DivisionByZero);
        }
        if denominator.signum() < 0 {
            Ok(ExtendedRational { numerator: -numerator, denominator: -denominator })
        } else {
            Ok(ExtendedRational { numerator, denominator })
        }
    }

    /// The rational value of an integer.
    pub fn from_big_integer(v: BigInt) -> Self {
        ExtendedRational { numerator: v, denominator: BigInt::from(1) }
    }

    /// The numerator, carrying the sign.
    pub fn numerator(&self) -> &BigInt {
        &self.numerator
    }

    /// The denominator, always positive.
    pub fn denominator(&self) -> &BigInt {
        &self.denominator
    }

    /// True if the value is zero.
    pub fn is_zero(&self) -> bool {
        self.numerator.is_zero()
    }

    /// -1, 0, or 1.
    pub fn signum(&self) -> i32 {
        self.numerator.signum()
    }

    /// The same value in lowest terms.
    pub fn reduced(&self) -> Self {
        if self.numerator.is_zero() {
            return Self::from_big_integer(BigInt::default());
        }
        let g = self.numerator.gcd(&self.denominator);
        let numerator = self.numerator.checked_div(&g).unwrap_or_default();
        let denominator = self.denominator.checked_div(&g).unwrap_or_default();
        ExtendedRational { numerator, denominator }
    }

    /// Exact addition.
    pub fn add(&self, other: &Self) -> Self {
        let numerator =
            &(&self.numerator * &other.denominator) + &(&other.numerator * &self.denominator);
        let denominator = &self.denominator * &other.denominator;
        ExtendedRational { numerator, denominator }
    }

    /// Exact subtraction.
    pub fn subtract(&self, other: &Self) -> Self {
        self.add(&other.negate())
    }

    /// Exact multiplication.
    pub fn multiply(&self, other: &Self) -> Self {
        ExtendedRational {
            numerator: &self.numerator * &other.numerator,
            denominator: &self.denominator * &other.denominator,
        }
    }

    /// Exact division.
    pub fn divide(&self, other: &Self) -> Result<Self, Error> {
        if other.numerator.is_zero() {
            return Err(Error::DivisionByZero);
        }
        Self::new(
            &self.numerator * &other.denominator,
            &self.denominator * &other.numerator,
        )
    }

    /// Negation.
    pub fn negate(&self) -> Self {
        ExtendedRational {
            numerator: -self.numerator.clone(),
            denominator: self.denominator.clone(),
        }
    }

    /// Absolute value.
    pub fn abs(&self) -> Self {
        ExtendedRational {
            numerator: self.numerator.abs(),
            denominator: self.denominator.clone(),
        }
    }

    /// Numeric comparison by cross-multiplication.
    pub fn compare_to(&self, other: &Self) -> Ordering {
        let lhs = &self.numerator * &other.denominator;
        let rhs = &other.numerator * &self.denominator;
        lhs.cmp(&rhs)
    }

    /// The decimal value of the ratio under the context.
    pub fn to_extended_decimal(&self, ctx: &mut PrecisionContext) -> Result<ExtendedDecimal, Error> {
        let n = ExtendedDecimal::from_parts(self.numerator.clone(), BigInt::default());
        let d = ExtendedDecimal::from_parts(self.denominator.clone(), BigInt::default());
        n.divide(&d, ctx)
    }

    /// The binary value of the ratio under the context.
    pub fn to_extended_float(&self, ctx: &mut PrecisionContext) -> Result<ExtendedFloat, Error> {
        let n = ExtendedFloat::from_parts(self.numerator.clone(), BigInt::default());
        let d = ExtendedFloat::from_parts(self.denominator.clone(), BigInt::default());
        n.divide(&d, ctx)
    }

    /// The exact rational value of a finite decimal.
    pub fn from_extended_decimal(v: &ExtendedDecimal) -> Option<Self> {
        if !v.is_finite() {
            return None;
        }
        let e = v.exponent().to_i64().ok()?;
        if e >= 0 {
            let scale = BigInt::from(10).pow_big(v.exponent()).ok()?;
            Some(Self::from_big_integer(&v.mantissa() * &scale))
        } else {
            let den = BigInt::from(10).pow_big(&BigInt::from(-e)).ok()?;
            Self::new(v.mantissa(), den).ok()
        }
    }
}

impl core::fmt::Display for ExtendedRational {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::defs::Rounding;

    fn rat(n: i64, d: i64) -> ExtendedRational {
        ExtendedRational::new(BigInt::from(n), BigInt::from(d)).unwrap()
    }

    #[test]
    fn test_construction() {
        assert_eq!(
            ExtendedRational::new(BigInt::from(1), BigInt::default()),
            Err(Error::DivisionByZero)
        );
        // the sign normalises onto the numerator
        let r = rat(1, -2);
        assert_eq!(*r.numerator(), BigInt::from(-1));
        assert_eq!(*r.denominator(), BigInt::from(2));
        assert_eq!(r.signum(), -1);
    }

    #[test]
    fn test_arithmetic() {
        let r = rat(1, 2).add(&rat(1, 3));
        assert_eq!(r.reduced(), rat(5, 6));

        let r = rat(1, 2).subtract(&rat(1, 3));
        assert_eq!(r.reduced(), rat(1, 6));

        let r = rat(2, 3).multiply(&rat(3, 4));
        assert_eq!(r.reduced(), rat(1, 2));

        let r = rat(1, 2).divide(&rat(1, 4)).unwrap();
        assert_eq!(r.reduced(), rat(2, 1));

        assert_eq!(rat(1, 2).divide(&rat(0, 1)), Err(Error::DivisionByZero));
    }

    #[test]
    fn test_compare() {
        assert_eq!(rat(1, 2).compare_to(&rat(2, 4)), Ordering::Equal);
        assert_eq!(rat(1, 3).compare_to(&rat(1, 2)), Ordering::Less);
        assert_eq!(rat(-1, 3).compare_to(&rat(-1, 2)), Ordering::Greater);
    }

    #[test]
    fn test_decimal_conversion() {
        let mut ctx = PrecisionContext::for_precision_and_rounding(9, Rounding::HalfEven);
        let d = rat(1, 3).to_extended_decimal(&mut ctx).unwrap();
        assert_eq!(d.to_string(), "0.333333333");

        let mut unlimited = PrecisionContext::unlimited();
        let d = rat(3, 4).to_extended_decimal(&mut unlimited).unwrap();
        assert_eq!(d.to_string(), "0.75");

        let back = ExtendedRational::from_extended_decimal(&d).unwrap();
        assert_eq!(back.reduced(), rat(3, 4));
    }
}
