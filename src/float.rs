//! Arbitrary-precision binary floating point.

use core::cmp::Ordering;

use crate::bigint::BigInt;
use crate::ctx::PrecisionContext;
use crate::dec::ExtendedDecimal;
use crate::defs::Error;
use crate::defs::Rounding;
use crate::radix::BinaryHelper;
use crate::radix::RadixMath;
use crate::radix::RawFloat;
use crate::radix::SimpleRadixMath;

type Bm = RadixMath<BinaryHelper>;
type Sm = SimpleRadixMath<BinaryHelper>;

/// A binary floating-point number: an unsigned mantissa, a power-of-two
/// exponent, and flags carrying the sign and the special values. The
/// operation surface mirrors [`ExtendedDecimal`] with precision counted in
/// bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedFloat {
    raw: RawFloat,
}

impl ExtendedFloat {
    pub(crate) fn from_raw(raw: RawFloat) -> Self {
        ExtendedFloat { raw }
    }

    /// Builds a value from a signed mantissa and a binary exponent.
    pub fn from_parts(mantissa: BigInt, exponent: BigInt) -> Self {
        Self::from_raw(RawFloat::finite(mantissa.signum() < 0, mantissa.abs(), exponent))
    }

    /// Zero with a positive sign.
    pub fn zero() -> Self {
        Self::from_raw(RawFloat::zero())
    }

    /// Zero with a negative sign.
    pub fn negative_zero() -> Self {
        Self::from_raw(RawFloat::finite(true, BigInt::default(), BigInt::default()))
    }

    /// The value 1.
    pub fn one() -> Self {
        Self::from_parts(BigInt::from(1), BigInt::default())
    }

    /// Positive infinity.
    pub fn positive_infinity() -> Self {
        Self::from_raw(RawFloat::infinity(false))
    }

    /// Negative infinity.
    pub fn negative_infinity() -> Self {
        Self::from_raw(RawFloat::infinity(true))
    }

    /// A quiet NaN.
    pub fn nan() -> Self {
        Self::from_raw(RawFloat::quiet_nan(false, BigInt::default()))
    }

    /// A signaling NaN.
    pub fn signaling_nan() -> Self {
        Self::from_raw(RawFloat::signaling_nan(false, BigInt::default()))
    }

    /// The mantissa with the sign applied.
    pub fn mantissa(&self) -> BigInt {
        self.raw.signed_mantissa()
    }

    /// The mantissa magnitude; for NaN this is the diagnostic payload.
    pub fn unsigned_mantissa(&self) -> &BigInt {
        &self.raw.mantissa
    }

    /// The binary exponent.
    pub fn exponent(&self) -> &BigInt {
        &self.raw.exponent
    }

    /// True for negative values, including -0 and negative specials.
    pub fn is_negative(&self) -> bool {
        self.raw.is_negative()
    }

    /// The sign carried in the flags, meaningful even for zeros and NaNs.
    pub fn sign(&self) -> crate::defs::Sign {
        if self.raw.is_negative() {
            crate::defs::Sign::Neg
        } else {
            crate::defs::Sign::Pos
        }
    }

    /// True for either NaN kind.
    pub fn is_nan(&self) -> bool {
        self.raw.is_nan()
    }

    /// True for a quiet NaN.
    pub fn is_quiet_nan(&self) -> bool {
        self.raw.is_quiet_nan()
    }

    /// True for a signaling NaN.
    pub fn is_signaling_nan(&self) -> bool {
        self.raw.is_signaling_nan()
    }

    /// True for either infinity.
    pub fn is_infinity(&self) -> bool {
        self.raw.is_infinity()
    }

    /// True for finite values.
    pub fn is_finite(&self) -> bool {
        self.raw.is_finite()
    }

    /// True for a zero of either sign.
    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    /// -1, 0, or 1.
    pub fn signum(&self) -> i32 {
        self.raw.signum()
    }

    fn wrap1(
        op: fn(&RawFloat, &mut PrecisionContext) -> Result<RawFloat, Error>,
        v: &Self,
        ctx: &mut PrecisionContext,
        after_division: bool,
    ) -> Result<Self, Error> {
        let raw = if ctx.is_simplified() {
            Sm::unary(op, &v.raw, ctx, after_division)?
        } else {
            op(&v.raw, ctx)?
        };
        Ok(Self::from_raw(raw))
    }

    fn wrap2(
        op: fn(&RawFloat, &RawFloat, &mut PrecisionContext) -> Result<RawFloat, Error>,
        a: &Self,
        b: &Self,
        ctx: &mut PrecisionContext,
        after_division: bool,
    ) -> Result<Self, Error> {
        let raw = if ctx.is_simplified() {
            Sm::binary(op, &a.raw, &b.raw, ctx, after_division)?
        } else {
            op(&a.raw, &b.raw, ctx)?
        };
        Ok(Self::from_raw(raw))
    }

    /// Addition under the context.
    pub fn add(&self, other: &Self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap2(Bm::add, self, other, ctx, false)
    }

    /// Subtraction under the context.
    pub fn subtract(&self, other: &Self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap2(Bm::subtract, self, other, ctx, false)
    }

    /// Multiplication under the context.
    pub fn multiply(&self, other: &Self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap2(Bm::multiply, self, other, ctx, false)
    }

    /// `self * multiplicand + augend` with a single rounding.
    pub fn multiply_and_add(
        &self,
        multiplicand: &Self,
        augend: &Self,
        ctx: &mut PrecisionContext,
    ) -> Result<Self, Error> {
        if ctx.is_simplified() {
            return Ok(Self::from_raw(Sm::ternary(
                Bm::multiply_and_add,
                &self.raw,
                &multiplicand.raw,
                &augend.raw,
                ctx,
            )?));
        }
        Ok(Self::from_raw(Bm::multiply_and_add(
            &self.raw,
            &multiplicand.raw,
            &augend.raw,
            ctx,
        )?))
    }

    /// Division rounded to the context precision (in bits).
    pub fn divide(&self, divisor: &Self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap2(Bm::divide, self, divisor, ctx, true)
    }

    /// Division with the result exponent fixed by the caller.
    pub fn divide_to_exponent(
        &self,
        divisor: &Self,
        exponent: &BigInt,
        rounding: Rounding,
        ctx: &mut PrecisionContext,
    ) -> Result<Self, Error> {
        Ok(Self::from_raw(Bm::divide_to_exponent(
            &self.raw,
            &divisor.raw,
            exponent,
            rounding,
            ctx,
        )?))
    }

    /// Integer division preferring the natural exponent.
    pub fn divide_to_integer_natural_scale(
        &self,
        divisor: &Self,
        ctx: &mut PrecisionContext,
    ) -> Result<Self, Error> {
        Self::wrap2(Bm::divide_to_integer_natural_scale, self, divisor, ctx, true)
    }

    /// Integer division with the result exponent fixed at zero.
    pub fn divide_to_integer_zero_scale(
        &self,
        divisor: &Self,
        ctx: &mut PrecisionContext,
    ) -> Result<Self, Error> {
        Self::wrap2(Bm::divide_to_integer_zero_scale, self, divisor, ctx, true)
    }

    /// Remainder of truncating integer division.
    pub fn remainder(&self, divisor: &Self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap2(Bm::remainder, self, divisor, ctx, false)
    }

    /// Remainder with the quotient rounded half-even.
    pub fn remainder_near(&self, divisor: &Self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap2(Bm::remainder_near, self, divisor, ctx, false)
    }

    /// Absolute value, rounded into the context.
    pub fn abs(&self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        let v = Self::from_raw(self.raw.abs_value());
        Self::wrap1(Bm::round_to_precision, &v, ctx, false)
    }

    /// Negation, rounded into the context.
    pub fn negate(&self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        let v = Self::from_raw(self.raw.negate());
        Self::wrap1(Bm::round_to_precision, &v, ctx, false)
    }

    /// Rounds into the context; `-0` becomes `+0` except under floor
    /// rounding.
    pub fn plus(&self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap1(Bm::plus, self, ctx, false)
    }

    /// Rounds to the context's precision and exponent range.
    pub fn round_to_precision(&self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap1(Bm::round_to_precision, self, ctx, false)
    }

    /// Rescales to the exponent of `pattern`.
    pub fn quantize(&self, pattern: &Self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap2(Bm::quantize, self, pattern, ctx, false)
    }

    /// Rounds to the given exponent, signaling `Inexact` when non-zero
    /// bits are discarded.
    pub fn round_to_exponent_exact(
        &self,
        exponent: &BigInt,
        ctx: &mut PrecisionContext,
    ) -> Result<Self, Error> {
        Ok(Self::from_raw(Bm::round_to_exponent_exact(&self.raw, exponent, ctx)?))
    }

    /// Rounds to the given exponent only when bits must be discarded.
    pub fn round_to_exponent_simple(
        &self,
        exponent: &BigInt,
        ctx: &mut PrecisionContext,
    ) -> Result<Self, Error> {
        Ok(Self::from_raw(Bm::round_to_exponent_simple(&self.raw, exponent, ctx)?))
    }

    /// Rounds to the given exponent without raising the `Rounded` flag.
    pub fn round_to_exponent_no_rounded_flag(
        &self,
        exponent: &BigInt,
        ctx: &mut PrecisionContext,
    ) -> Result<Self, Error> {
        Ok(Self::from_raw(Bm::round_to_exponent_no_rounded_flag(
            &self.raw, exponent, ctx,
        )?))
    }

    /// Removes trailing zero bits from the mantissa.
    pub fn reduce(&self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap1(Bm::reduce, self, ctx, false)
    }

    /// The larger of two values.
    pub fn max(a: &Self, b: &Self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap2(Bm::max, a, b, ctx, false)
    }

    /// The smaller of two values.
    pub fn min(a: &Self, b: &Self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap2(Bm::min, a, b, ctx, false)
    }

    /// The value with the larger magnitude.
    pub fn max_magnitude(a: &Self, b: &Self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap2(Bm::max_magnitude, a, b, ctx, false)
    }

    /// The value with the smaller magnitude.
    pub fn min_magnitude(a: &Self, b: &Self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap2(Bm::min_magnitude, a, b, ctx, false)
    }

    /// `e` raised to this value.
    pub fn exp(&self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap1(Bm::exp, self, ctx, false)
    }

    /// Natural logarithm.
    pub fn ln(&self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap1(Bm::ln, self, ctx, false)
    }

    /// Base-10 logarithm.
    pub fn log10(&self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap1(Bm::log10, self, ctx, false)
    }

    /// The circle constant to the context precision.
    pub fn pi(ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Ok(Self::from_raw(Bm::pi(ctx)?))
    }

    /// This value raised to the given power.
    pub fn power(&self, exponent: &Self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap2(Bm::power, self, exponent, ctx, false)
    }

    /// Square root.
    pub fn square_root(&self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap1(Bm::square_root, self, ctx, true)
    }

    /// The least representable value greater than this one.
    pub fn next_plus(&self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Ok(Self::from_raw(Bm::next_plus(&self.raw, ctx)?))
    }

    /// The greatest representable value smaller than this one.
    pub fn next_minus(&self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Ok(Self::from_raw(Bm::next_minus(&self.raw, ctx)?))
    }

    /// The next representable value in the direction of `target`.
    pub fn next_toward(&self, target: &Self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Ok(Self::from_raw(Bm::next_toward(&self.raw, &target.raw, ctx)?))
    }

    /// Numeric comparison; NaNs order after every number.
    pub fn compare_to(&self, other: &Self) -> Ordering {
        match (self.is_nan(), other.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            _ => Bm::compare(&self.raw, &other.raw).unwrap_or(Ordering::Equal),
        }
    }

    /// Comparison as a number: -1, 0, or 1, with NaN propagation.
    pub fn compare_to_with_context(
        &self,
        other: &Self,
        ctx: &mut PrecisionContext,
    ) -> Result<Self, Error> {
        Ok(Self::from_raw(Bm::compare_with_context(&self.raw, &other.raw, ctx)?))
    }

    /// Exact conversion from an IEEE binary64 value, including NaN
    /// payloads, infinities, and signed zeros.
    pub fn from_f64(v: f64) -> Self {
        let bits = v.to_bits();
        let neg = bits >> 63 != 0;
        let biased = ((bits >> 52) & 0x7FF) as i64;
        let frac = bits & 0xF_FFFF_FFFF_FFFF;
        if biased == 0x7FF {
            if frac == 0 {
                return Self::from_raw(RawFloat::infinity(neg));
            }
            let quiet = frac & (1 << 51) != 0;
            let payload = BigInt::from(frac & ((1 << 51) - 1));
            return Self::from_raw(if quiet {
                RawFloat::quiet_nan(neg, payload)
            } else {
                RawFloat::signaling_nan(neg, payload)
            });
        }
        let (mantissa, exponent) = if biased == 0 {
            // subnormal
            (frac, -1074i64)
        } else {
            (frac | (1 << 52), biased - 1075)
        };
        if mantissa == 0 {
            return Self::from_raw(RawFloat::finite(neg, BigInt::default(), BigInt::default()));
        }
        Self::from_raw(RawFloat::finite(neg, BigInt::from(mantissa), BigInt::from(exponent)))
    }

    /// Exact conversion from an IEEE binary32 value.
    pub fn from_f32(v: f32) -> Self {
        Self::from_f64(v as f64)
    }

    /// Conversion to an IEEE binary64 value, rounding half-even; values
    /// out of range become infinities.
    pub fn to_f64(&self) -> f64 {
        if self.raw.is_nan() {
            let payload = self.raw.mantissa.to_u64().unwrap_or(0) & ((1 << 51) - 1);
            let mut bits = 0x7FF8_0000_0000_0000u64 | payload;
            if self.raw.is_negative() {
                bits |= 1 << 63;
            }
            return f64::from_bits(bits);
        }
        if self.raw.is_infinity() {
            return if self.raw.is_negative() { f64::NEG_INFINITY } else { f64::INFINITY };
        }
        let mut ctx = PrecisionContext::binary64();
        let rounded = match Bm::round_to_precision(&self.raw, &mut ctx) {
            Ok(v) => v,
            Err(_) => return f64::NAN,
        };
        if rounded.is_infinity() {
            return if rounded.is_negative() { f64::NEG_INFINITY } else { f64::INFINITY };
        }
        let neg = rounded.is_negative();
        if rounded.mantissa.is_zero() {
            return if neg { -0.0 } else { 0.0 };
        }
        // after binary64 rounding the value is exactly representable
        let m = rounded.mantissa.to_u64().unwrap_or(0) as f64;
        let e = rounded.exponent.to_i64().unwrap_or(0) as i32;
        let v = m * 2f64.powi(e);
        if neg {
            -v
        } else {
            v
        }
    }

    /// Conversion to an IEEE binary32 value.
    pub fn to_f32(&self) -> f32 {
        if self.raw.is_nan() {
            return if self.raw.is_negative() { -f32::NAN } else { f32::NAN };
        }
        if self.raw.is_infinity() {
            return if self.raw.is_negative() { f32::NEG_INFINITY } else { f32::INFINITY };
        }
        let mut ctx = PrecisionContext::binary32();
        let rounded = match Bm::round_to_precision(&self.raw, &mut ctx) {
            Ok(v) => v,
            Err(_) => return f32::NAN,
        };
        if rounded.is_infinity() {
            return if rounded.is_negative() { f32::NEG_INFINITY } else { f32::INFINITY };
        }
        let neg = rounded.is_negative();
        if rounded.mantissa.is_zero() {
            return if neg { -0.0 } else { 0.0 };
        }
        let m = rounded.mantissa.to_u64().unwrap_or(0) as f32;
        let e = rounded.exponent.to_i64().unwrap_or(0) as i32;
        let v = m * 2f32.powi(e);
        if neg {
            -v
        } else {
            v
        }
    }

    /// Exact conversion to decimal: `m * 2^e` is `m * 5^-e * 10^e` for a
    /// negative exponent and `(m << e) * 10^0` otherwise.
    pub fn to_extended_decimal_exact(&self) -> Option<ExtendedDecimal> {
        let raw = &self.raw;
        if raw.is_nan() {
            return Some(ExtendedDecimal::from_raw(raw.clone()));
        }
        if raw.is_infinity() {
            return Some(ExtendedDecimal::from_raw(raw.clone()));
        }
        let e = raw.exponent.to_i64().ok()?;
        let (m, exp10) = if e >= 0 {
            (raw.mantissa.shift_left(e), 0i64)
        } else {
            let five = BigInt::from(5).pow_big(&BigInt::from(-e)).ok()?;
            (&raw.mantissa * &five, e)
        };
        Some(ExtendedDecimal::from_raw(RawFloat::finite(
            raw.is_negative(),
            m,
            BigInt::from(exp10),
        )))
    }

    /// Exact conversion from decimal, when one exists.
    pub(crate) fn from_extended_decimal_exact(d: &ExtendedDecimal) -> Option<Self> {
        let raw = d.raw();
        if raw.is_nan() || raw.is_infinity() {
            return Some(Self::from_raw(raw.clone()));
        }
        let e = raw.exponent.to_i64().ok()?;
        if e >= 0 {
            // 10^e = 5^e * 2^e
            let five = BigInt::from(5).pow_big(&raw.exponent).ok()?;
            let m = &raw.mantissa * &five;
            return Some(Self::from_raw(RawFloat::finite(raw.is_negative(), m, raw.exponent.clone())));
        }
        // m / 10^-e must divide exactly
        let pow = BigInt::from(5).pow_big(&BigInt::from(-e)).ok()?;
        let (q, r) = raw.mantissa.div_rem(&pow).ok()?;
        if !r.is_zero() {
            return None;
        }
        Some(Self::from_raw(RawFloat::finite(raw.is_negative(), q, raw.exponent.clone())))
    }

    /// Correctly rounded conversion from decimal under the context.
    pub(crate) fn from_extended_decimal(
        d: &ExtendedDecimal,
        ctx: &mut PrecisionContext,
    ) -> Result<Self, Error> {
        let raw = d.raw();
        if raw.is_nan() {
            return Ok(Self::from_raw(Bm::propagate_nan(raw, None, ctx)?));
        }
        if raw.is_infinity() {
            return Ok(Self::from_raw(raw.clone()));
        }
        if let Some(exact) = Self::from_extended_decimal_exact(d) {
            return exact.round_to_precision(ctx);
        }
        // d = m * 10^e with e < 0: scale by 2^s so the quotient by 5^-e
        // keeps precision + 2 bits plus a sticky bit
        let e = raw.exponent.to_i64().map_err(|_| Error::NonTerminating)?;
        debug_assert!(e < 0);
        let pow5 = BigInt::from(5).pow_big(&BigInt::from(-e))?;
        let prec = ctx.precision().to_i64().unwrap_or(0);
        if prec == 0 {
            return Err(Error::NonTerminating);
        }
        let need = prec + 2 + pow5.unsigned_bit_length() as i64
            - raw.mantissa.unsigned_bit_length() as i64;
        let s = need.max(0);
        let num = raw.mantissa.shift_left(s);
        let (q, rem) = num.div_rem(&pow5)?;
        let bexp = BigInt::from(e - s);
        let out = RawFloat::finite(raw.is_negative(), q, bexp);
        Ok(Self::from_raw(Bm::round_finite(out, !rem.is_zero(), !0, ctx)?))
    }

    /// Parses a decimal string and rounds it into the context.
    pub fn from_string(s: &str, ctx: &mut PrecisionContext) -> Option<Self> {
        let d = ExtendedDecimal::from_string(s)?;
        Self::from_extended_decimal(&d, ctx).ok()
    }
}

impl core::fmt::Display for ExtendedFloat {
    /// Renders the exact decimal expansion of the value.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.to_extended_decimal_exact() {
            Some(d) => d.fmt(f),
            None => f.write_str("NaN"),
        }
    }
}

impl From<i64> for ExtendedFloat {
    fn from(v: i64) -> Self {
        Self::from_parts(BigInt::from(v), BigInt::default())
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::ctx::FLAG_INEXACT;
    use crate::ctx::FLAG_ROUNDED;
    use rand::random;

    #[test]
    fn test_f64_roundtrip() {
        for v in [
            0.0f64,
            -0.0,
            1.0,
            -1.5,
            0.1,
            f64::MIN_POSITIVE,
            f64::MAX,
            5e-324,
            f64::INFINITY,
            f64::NEG_INFINITY,
        ] {
            let ef = ExtendedFloat::from_f64(v);
            let back = ef.to_f64();
            assert_eq!(back.to_bits(), v.to_bits(), "value {}", v);
        }

        assert!(ExtendedFloat::from_f64(f64::NAN).is_nan());
        assert!(ExtendedFloat::from_f64(f64::NAN).to_f64().is_nan());

        for _ in 0..2000 {
            let v = f64::from_bits(random::<u64>());
            if v.is_nan() {
                continue;
            }
            let ef = ExtendedFloat::from_f64(v);
            assert_eq!(ef.to_f64().to_bits(), v.to_bits());
        }
    }

    #[test]
    fn test_signed_zero() {
        let z = ExtendedFloat::from_f64(-0.0);
        assert!(z.is_zero() && z.is_negative());
        assert_eq!(z.to_f64().to_bits(), (-0.0f64).to_bits());
    }

    #[test]
    fn test_binary64_addition() {
        // 0.1 + 0.2 rounds to the binary64 bit pattern 0x3FD3333333333334 * 2
        let mut ctx = PrecisionContext::binary64().with_blank_flags();
        let a = ExtendedFloat::from_string("0.1", &mut ctx.clone()).unwrap();
        let b = ExtendedFloat::from_string("0.2", &mut ctx.clone()).unwrap();
        let mut sum_ctx = PrecisionContext::binary64().with_blank_flags();
        let r = a.add(&b, &mut sum_ctx).unwrap();
        assert_eq!(r.to_f64().to_bits(), 0x3FD3_3333_3333_3334u64);
        assert_eq!(r.to_f64(), 0.30000000000000004);
        assert_ne!(sum_ctx.flags() & FLAG_INEXACT, 0);
        assert_ne!(sum_ctx.flags() & FLAG_ROUNDED, 0);
    }

    #[test]
    fn test_decimal_conversions() {
        // 0.75 = 3 * 2^-2 is exact both ways
        let ef = ExtendedFloat::from_parts(BigInt::from(3), BigInt::from(-2));
        let d = ef.to_extended_decimal_exact().unwrap();
        assert_eq!(d.to_string(), "0.75");
        let back = ExtendedFloat::from_extended_decimal_exact(&d).unwrap();
        assert_eq!(back.mantissa(), BigInt::from(3));
        assert_eq!(*back.exponent(), BigInt::from(-2));

        // 0.1 has no exact binary form
        let d = ExtendedDecimal::from_string("0.1").unwrap();
        assert!(ExtendedFloat::from_extended_decimal_exact(&d).is_none());
        let mut ctx = PrecisionContext::binary64();
        let ef = d.to_extended_float(&mut ctx).unwrap();
        assert_eq!(ef.to_f64(), 0.1);
    }

    #[test]
    fn test_arithmetic() {
        let mut ctx = PrecisionContext::for_precision_and_rounding(64, Rounding::HalfEven);
        let a = ExtendedFloat::from(3i64);
        let b = ExtendedFloat::from(4i64);
        let r = a.multiply(&b, &mut ctx).unwrap();
        assert_eq!(r.mantissa(), BigInt::from(12));

        let r = a.divide(&b, &mut ctx).unwrap();
        assert_eq!(r.to_f64(), 0.75);

        // 1/3 in binary is nonterminating
        let mut unlimited = PrecisionContext::unlimited();
        assert_eq!(
            ExtendedFloat::one().divide(&a, &mut unlimited),
            Err(Error::NonTerminating)
        );
        let r = ExtendedFloat::one().divide(&a, &mut ctx).unwrap();
        let expect = 1.0f64 / 3.0;
        assert!((r.to_f64() - expect).abs() < 1e-15);
    }

    #[test]
    fn test_sqrt_and_power() {
        let mut ctx = PrecisionContext::for_precision_and_rounding(53, Rounding::HalfEven);
        let r = ExtendedFloat::from(2i64).square_root(&mut ctx).unwrap();
        assert_eq!(r.to_f64(), std::f64::consts::SQRT_2);

        let r = ExtendedFloat::from(2i64)
            .power(&ExtendedFloat::from(10i64), &mut ctx)
            .unwrap();
        assert_eq!(r.to_f64(), 1024.0);

        let r = ExtendedFloat::from(1i64).exp(&mut ctx).unwrap();
        assert_eq!(r.to_f64(), std::f64::consts::E);

        let r = ExtendedFloat::from(2i64).ln(&mut ctx).unwrap();
        assert_eq!(r.to_f64(), std::f64::consts::LN_2);

        let r = ExtendedFloat::pi(&mut ctx).unwrap();
        assert_eq!(r.to_f64(), std::f64::consts::PI);
    }

    #[test]
    fn test_compare() {
        let a = ExtendedFloat::from_f64(1.5);
        let b = ExtendedFloat::from_f64(2.5);
        assert_eq!(a.compare_to(&b), Ordering::Less);
        assert_eq!(b.compare_to(&a), Ordering::Greater);
        // equal values in different forms
        let c = ExtendedFloat::from_parts(BigInt::from(3), BigInt::from(-1));
        assert_eq!(a.compare_to(&c), Ordering::Equal);
    }

    #[test]
    fn test_subnormal_binary64() {
        use crate::ctx::{FLAG_SUBNORMAL, FLAG_UNDERFLOW};
        // the smallest positive binary64 value is 2^-1074
        let mut ctx = PrecisionContext::binary64().with_blank_flags();
        let tiny = ExtendedFloat::from_parts(BigInt::from(1), BigInt::from(-1074));
        let r = tiny.round_to_precision(&mut ctx).unwrap();
        assert!(!r.is_zero());
        assert_ne!(ctx.flags() & FLAG_SUBNORMAL, 0);
        assert_eq!(r.to_f64(), 5e-324);

        // half of it rounds to zero
        let mut ctx = PrecisionContext::binary64().with_blank_flags();
        let tinier = ExtendedFloat::from_parts(BigInt::from(1), BigInt::from(-1076));
        let r = tinier.round_to_precision(&mut ctx).unwrap();
        assert!(r.is_zero());
        assert_ne!(ctx.flags() & FLAG_UNDERFLOW, 0);
    }
}
