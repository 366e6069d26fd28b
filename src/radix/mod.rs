//! Generic arithmetic kernel over a radix.
//!
//! The kernel operates on [`RawFloat`], a sign-and-specials wrapper around
//! an unsigned mantissa and an exponent, both arbitrary precision. A
//! [`RadixHelper`] supplies the radix-specific pieces (digit counting,
//! scaling by radix powers, and the matching shift accumulator), and the
//! kernel is monomorphised per radix so no dispatch happens in inner loops.

use crate::accum::BitShiftAccumulator;
use crate::accum::DigitShiftAccumulator;
use crate::accum::ShiftAccumulator;
use crate::bigint::BigInt;

mod math;
mod round;
mod simple;
mod transcend;

pub(crate) use simple::SimpleRadixMath;

/// Sign bit of a [`RawFloat`].
pub(crate) const F_NEGATIVE: u8 = 1;

/// Infinity marker.
pub(crate) const F_INFINITY: u8 = 2;

/// Quiet NaN marker.
pub(crate) const F_QNAN: u8 = 4;

/// Signaling NaN marker.
pub(crate) const F_SNAN: u8 = 8;

const F_SPECIAL: u8 = F_INFINITY | F_QNAN | F_SNAN;

/// Internal representation shared by the decimal and binary kernels: an
/// unsigned mantissa, an exponent, and flag bits carrying the sign and the
/// mutually exclusive special markers. For NaN the mantissa holds the
/// diagnostic payload and the exponent is zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawFloat {
    pub flags: u8,
    pub mantissa: BigInt,
    pub exponent: BigInt,
}

impl RawFloat {
    pub fn finite(neg: bool, mantissa: BigInt, exponent: BigInt) -> Self {
        debug_assert!(mantissa.signum() >= 0);
        RawFloat {
            flags: if neg { F_NEGATIVE } else { 0 },
            mantissa,
            exponent,
        }
    }

    pub fn zero() -> Self {
        Self::finite(false, BigInt::default(), BigInt::default())
    }

    pub fn from_int(v: &BigInt) -> Self {
        Self::finite(v.signum() < 0, v.abs(), BigInt::default())
    }

    pub fn infinity(neg: bool) -> Self {
        RawFloat {
            flags: F_INFINITY | if neg { F_NEGATIVE } else { 0 },
            mantissa: BigInt::default(),
            exponent: BigInt::default(),
        }
    }

    pub fn quiet_nan(neg: bool, payload: BigInt) -> Self {
        RawFloat {
            flags: F_QNAN | if neg { F_NEGATIVE } else { 0 },
            mantissa: payload,
            exponent: BigInt::default(),
        }
    }

    pub fn signaling_nan(neg: bool, payload: BigInt) -> Self {
        RawFloat {
            flags: F_SNAN | if neg { F_NEGATIVE } else { 0 },
            mantissa: payload,
            exponent: BigInt::default(),
        }
    }

    pub fn is_negative(&self) -> bool {
        self.flags & F_NEGATIVE != 0
    }

    pub fn is_infinity(&self) -> bool {
        self.flags & F_INFINITY != 0
    }

    pub fn is_quiet_nan(&self) -> bool {
        self.flags & F_QNAN != 0
    }

    pub fn is_signaling_nan(&self) -> bool {
        self.flags & F_SNAN != 0
    }

    pub fn is_nan(&self) -> bool {
        self.flags & (F_QNAN | F_SNAN) != 0
    }

    pub fn is_special(&self) -> bool {
        self.flags & F_SPECIAL != 0
    }

    pub fn is_finite(&self) -> bool {
        !self.is_special()
    }

    pub fn is_zero(&self) -> bool {
        self.is_finite() && self.mantissa.is_zero()
    }

    /// -1, 0, or 1; NaN and -0 report 0 and -0 respectively by sign.
    pub fn signum(&self) -> i32 {
        if self.is_nan() || (self.is_finite() && self.mantissa.is_zero()) {
            0
        } else if self.is_negative() {
            -1
        } else {
            1
        }
    }

    pub fn negate(&self) -> Self {
        let mut r = self.clone();
        r.flags ^= F_NEGATIVE;
        r
    }

    pub fn abs_value(&self) -> Self {
        let mut r = self.clone();
        r.flags &= !F_NEGATIVE;
        r
    }

    /// The mantissa with the sign applied.
    pub fn signed_mantissa(&self) -> BigInt {
        if self.is_negative() {
            -self.mantissa.clone()
        } else {
            self.mantissa.clone()
        }
    }
}

/// Radix-specific services used by the kernel.
pub(crate) trait RadixHelper {
    /// The matching shift accumulator.
    type Acc: ShiftAccumulator;

    /// The radix, 2 or 10.
    const RADIX: u32;

    /// Digit length of a non-negative integer in this radix; 1 for zero.
    fn digit_count(m: &BigInt) -> u64;

    /// RADIX^p for a small power.
    fn radix_power(p: u64) -> BigInt;

    /// `m * RADIX^p` for an arbitrary non-negative power.
    fn multiply_by_radix_power(m: &BigInt, p: &BigInt) -> BigInt;
}

/// Radix-10 helper backing `ExtendedDecimal`.
pub(crate) struct DecimalHelper;

impl RadixHelper for DecimalHelper {
    type Acc = DigitShiftAccumulator;

    const RADIX: u32 = 10;

    fn digit_count(m: &BigInt) -> u64 {
        m.digit_count()
    }

    fn radix_power(p: u64) -> BigInt {
        BigInt::from(10).pow_big(&BigInt::from(p)).unwrap_or_default()
    }

    fn multiply_by_radix_power(m: &BigInt, p: &BigInt) -> BigInt {
        if m.is_zero() || p.is_zero() {
            return m.clone();
        }
        m * &BigInt::from(10).pow_big(p).unwrap_or_default()
    }
}

/// Radix-2 helper backing `ExtendedFloat`.
pub(crate) struct BinaryHelper;

impl RadixHelper for BinaryHelper {
    type Acc = BitShiftAccumulator;

    const RADIX: u32 = 2;

    fn digit_count(m: &BigInt) -> u64 {
        (m.unsigned_bit_length() as u64).max(1)
    }

    fn radix_power(p: u64) -> BigInt {
        BigInt::pow2(p as usize)
    }

    fn multiply_by_radix_power(m: &BigInt, p: &BigInt) -> BigInt {
        match p.to_i64() {
            Ok(v) => m.shift_left(v),
            Err(_) => m * &BigInt::from(2).pow_big(p).unwrap_or_default(),
        }
    }
}

/// The arithmetic kernel, monomorphised per radix helper.
pub(crate) struct RadixMath<H>(core::marker::PhantomData<H>);

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_rawfloat_basics() {
        let v = RawFloat::finite(true, BigInt::from(123), BigInt::from(-2));
        assert!(v.is_finite());
        assert!(v.is_negative());
        assert_eq!(v.signum(), -1);
        assert_eq!(v.negate().signum(), 1);
        assert_eq!(v.abs_value().signum(), 1);
        assert_eq!(v.signed_mantissa(), BigInt::from(-123));

        let z = RawFloat::zero();
        assert!(z.is_zero());
        assert_eq!(z.signum(), 0);
        assert!(!z.negate().is_negative() || z.negate().is_zero());

        let inf = RawFloat::infinity(false);
        assert!(inf.is_infinity() && !inf.is_nan() && !inf.is_finite());

        let nan = RawFloat::quiet_nan(false, BigInt::from(7));
        assert!(nan.is_nan() && nan.is_quiet_nan() && !nan.is_signaling_nan());
        assert_eq!(nan.signum(), 0);

        let snan = RawFloat::signaling_nan(true, BigInt::default());
        assert!(snan.is_signaling_nan() && snan.is_nan());
    }

    #[test]
    fn test_helpers() {
        assert_eq!(DecimalHelper::digit_count(&BigInt::from(999)), 3);
        assert_eq!(DecimalHelper::digit_count(&BigInt::default()), 1);
        assert_eq!(DecimalHelper::radix_power(4), BigInt::from(10_000));
        assert_eq!(
            DecimalHelper::multiply_by_radix_power(&BigInt::from(5), &BigInt::from(3)),
            BigInt::from(5000)
        );

        assert_eq!(BinaryHelper::digit_count(&BigInt::from(8)), 4);
        assert_eq!(BinaryHelper::digit_count(&BigInt::default()), 1);
        assert_eq!(BinaryHelper::radix_power(10), BigInt::from(1024));
        assert_eq!(
            BinaryHelper::multiply_by_radix_power(&BigInt::from(3), &BigInt::from(4)),
            BigInt::from(48)
        );
    }
}
