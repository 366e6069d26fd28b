//! Arbitrary-precision decimal floating point.

use core::cmp::Ordering;

use crate::bigint::BigInt;
use crate::ctx::PrecisionContext;
use crate::defs::Error;
use crate::defs::Rounding;
use crate::float::ExtendedFloat;
use crate::radix::DecimalHelper;
use crate::radix::RadixMath;
use crate::radix::RawFloat;
use crate::radix::SimpleRadixMath;

type Dm = RadixMath<DecimalHelper>;
type Sm = SimpleRadixMath<DecimalHelper>;

/// A decimal floating-point number: an unsigned mantissa, a decimal
/// exponent, and flags carrying the sign and the special values (infinity,
/// quiet NaN, signaling NaN). `-0` is representable and distinct from `+0`.
///
/// Every operation takes a [`PrecisionContext`] controlling precision,
/// rounding, and exponent range; flags accumulate on contexts created with
/// `with_blank_flags`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedDecimal {
    raw: RawFloat,
}

impl ExtendedDecimal {
    pub(crate) fn from_raw(raw: RawFloat) -> Self {
        ExtendedDecimal { raw }
    }

    pub(crate) fn raw(&self) -> &RawFloat {
        &self.raw
    }

    /// Builds a value from a signed mantissa and an exponent.
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

    /// The value 10.
    pub fn ten() -> Self {
        Self::from_parts(BigInt::from(10), BigInt::default())
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

    /// The exponent.
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

    /// -1, 0, or 1. Both zeros and NaN report 0.
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
        Self::wrap2(Dm::add, self, other, ctx, false)
    }

    /// Subtraction under the context.
    pub fn subtract(&self, other: &Self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap2(Dm::subtract, self, other, ctx, false)
    }

    /// Multiplication under the context.
    pub fn multiply(&self, other: &Self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap2(Dm::multiply, self, other, ctx, false)
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
                Dm::multiply_and_add,
                &self.raw,
                &multiplicand.raw,
                &augend.raw,
                ctx,
            )?));
        }
        Ok(Self::from_raw(Dm::multiply_and_add(
            &self.raw,
            &multiplicand.raw,
            &augend.raw,
            ctx,
        )?))
    }

    /// Division rounded to the context precision.
    ///
    /// ## Errors
    ///
    /// - NonTerminating: the context has unlimited precision and the exact
    ///   quotient has no terminating decimal expansion.
    pub fn divide(&self, divisor: &Self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap2(Dm::divide, self, divisor, ctx, true)
    }

    /// Division with the result exponent fixed by the caller.
    pub fn divide_to_exponent(
        &self,
        divisor: &Self,
        exponent: &BigInt,
        rounding: Rounding,
        ctx: &mut PrecisionContext,
    ) -> Result<Self, Error> {
        Ok(Self::from_raw(Dm::divide_to_exponent(
            &self.raw,
            &divisor.raw,
            exponent,
            rounding,
            ctx,
        )?))
    }

    /// Integer division preferring the natural exponent
    /// `max(0, self.exponent - divisor.exponent)`.
    pub fn divide_to_integer_natural_scale(
        &self,
        divisor: &Self,
        ctx: &mut PrecisionContext,
    ) -> Result<Self, Error> {
        Self::wrap2(Dm::divide_to_integer_natural_scale, self, divisor, ctx, true)
    }

    /// Integer division with the result exponent fixed at zero.
    pub fn divide_to_integer_zero_scale(
        &self,
        divisor: &Self,
        ctx: &mut PrecisionContext,
    ) -> Result<Self, Error> {
        Self::wrap2(Dm::divide_to_integer_zero_scale, self, divisor, ctx, true)
    }

    /// Remainder of truncating integer division.
    pub fn remainder(&self, divisor: &Self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap2(Dm::remainder, self, divisor, ctx, false)
    }

    /// Remainder with the quotient rounded half-even, so the result
    /// magnitude is at most half the divisor.
    pub fn remainder_near(&self, divisor: &Self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap2(Dm::remainder_near, self, divisor, ctx, false)
    }

    /// Absolute value, rounded into the context.
    pub fn abs(&self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        let v = Self::from_raw(self.raw.abs_value());
        Self::wrap1(Dm::round_to_precision, &v, ctx, false)
    }

    /// Negation, rounded into the context.
    pub fn negate(&self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        let v = Self::from_raw(self.raw.negate());
        Self::wrap1(Dm::round_to_precision, &v, ctx, false)
    }

    /// Rounds into the context; `-0` becomes `+0` except under floor
    /// rounding.
    pub fn plus(&self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap1(Dm::plus, self, ctx, false)
    }

    /// Rounds to the context's precision and exponent range.
    pub fn round_to_precision(&self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap1(Dm::round_to_precision, self, ctx, false)
    }

    /// Rounds so the mantissa fits the context precision counted in bits.
    pub fn round_to_binary_precision(&self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Ok(Self::from_raw(Dm::round_to_binary_precision(&self.raw, ctx)?))
    }

    /// Rescales to the exponent of `pattern`. A zero result keeps the
    /// target exponent.
    pub fn quantize(&self, pattern: &Self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap2(Dm::quantize, self, pattern, ctx, false)
    }

    /// Rounds to the given exponent, signaling `Inexact` when non-zero
    /// digits are discarded.
    pub fn round_to_exponent_exact(
        &self,
        exponent: &BigInt,
        ctx: &mut PrecisionContext,
    ) -> Result<Self, Error> {
        Ok(Self::from_raw(Dm::round_to_exponent_exact(&self.raw, exponent, ctx)?))
    }

    /// Rounds to the given exponent only when digits must be discarded.
    pub fn round_to_exponent_simple(
        &self,
        exponent: &BigInt,
        ctx: &mut PrecisionContext,
    ) -> Result<Self, Error> {
        Ok(Self::from_raw(Dm::round_to_exponent_simple(&self.raw, exponent, ctx)?))
    }

    /// Rounds to the given exponent without raising the `Rounded` flag.
    pub fn round_to_exponent_no_rounded_flag(
        &self,
        exponent: &BigInt,
        ctx: &mut PrecisionContext,
    ) -> Result<Self, Error> {
        Ok(Self::from_raw(Dm::round_to_exponent_no_rounded_flag(
            &self.raw, exponent, ctx,
        )?))
    }

    /// Removes trailing zero digits from the mantissa.
    pub fn reduce(&self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap1(Dm::reduce, self, ctx, false)
    }

    /// The larger of two values.
    pub fn max(a: &Self, b: &Self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap2(Dm::max, a, b, ctx, false)
    }

    /// The smaller of two values.
    pub fn min(a: &Self, b: &Self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap2(Dm::min, a, b, ctx, false)
    }

    /// The value with the larger magnitude.
    pub fn max_magnitude(a: &Self, b: &Self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap2(Dm::max_magnitude, a, b, ctx, false)
    }

    /// The value with the smaller magnitude.
    pub fn min_magnitude(a: &Self, b: &Self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap2(Dm::min_magnitude, a, b, ctx, false)
    }

    /// `e` raised to this value.
    pub fn exp(&self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap1(Dm::exp, self, ctx, false)
    }

    /// Natural logarithm.
    pub fn ln(&self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap1(Dm::ln, self, ctx, false)
    }

    /// Base-10 logarithm.
    pub fn log10(&self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap1(Dm::log10, self, ctx, false)
    }

    /// The circle constant to the context precision.
    pub fn pi(ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Ok(Self::from_raw(Dm::pi(ctx)?))
    }

    /// This value raised to the given power.
    pub fn power(&self, exponent: &Self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap2(Dm::power, self, exponent, ctx, false)
    }

    /// Square root.
    pub fn square_root(&self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Self::wrap1(Dm::square_root, self, ctx, true)
    }

    /// The least representable value greater than this one.
    pub fn next_plus(&self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Ok(Self::from_raw(Dm::next_plus(&self.raw, ctx)?))
    }

    /// The greatest representable value smaller than this one.
    pub fn next_minus(&self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Ok(Self::from_raw(Dm::next_minus(&self.raw, ctx)?))
    }

    /// The next representable value in the direction of `target`.
    pub fn next_toward(&self, target: &Self, ctx: &mut PrecisionContext) -> Result<Self, Error> {
        Ok(Self::from_raw(Dm::next_toward(&self.raw, &target.raw, ctx)?))
    }

    /// Numeric comparison ignoring precision contexts. NaNs order after
    /// every number.
    pub fn compare_to(&self, other: &Self) -> Ordering {
        match (self.is_nan(), other.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            _ => Dm::compare(&self.raw, &other.raw).unwrap_or(Ordering::Equal),
        }
    }

    /// Comparison as a number: -1, 0, or 1, with NaN propagation.
    pub fn compare_to_with_context(
        &self,
        other: &Self,
        ctx: &mut PrecisionContext,
    ) -> Result<Self, Error> {
        Ok(Self::from_raw(Dm::compare_with_context(&self.raw, &other.raw, ctx)?))
    }

    /// The integer part, truncated toward zero.
    ///
    /// ## Errors
    ///
    /// - NotANumber: the value is a NaN.
    /// - Overflow: the value is infinite.
    pub fn to_big_integer(&self) -> Result<BigInt, Error> {
        if self.raw.is_nan() {
            return Err(Error::NotANumber);
        }
        if self.raw.is_infinity() {
            return Err(Error::Overflow);
        }
        use crate::radix::RadixHelper;
        let m = &self.raw.mantissa;
        let v = match self.raw.exponent.to_i64() {
            Ok(e) if e >= 0 => DecimalHelper::multiply_by_radix_power(m, &self.raw.exponent),
            Ok(e) => {
                let pow = BigInt::from(10).pow_big(&BigInt::from(-e))?;
                m.checked_div(&pow)?
            }
            Err(_) => {
                if self.raw.exponent.signum() > 0 {
                    return Err(Error::Overflow);
                }
                BigInt::default()
            }
        };
        Ok(if self.raw.is_negative() { -v } else { v })
    }

    /// Exact conversion to a binary float.
    pub fn to_extended_float_exact(&self) -> Option<ExtendedFloat> {
        ExtendedFloat::from_extended_decimal_exact(self)
    }

    /// Correctly rounded conversion to a binary float under the context.
    pub fn to_extended_float(&self, ctx: &mut PrecisionContext) -> Result<ExtendedFloat, Error> {
        ExtendedFloat::from_extended_decimal(self, ctx)
    }

    /// Conversion to an IEEE binary64 value, rounding half-even.
    pub fn to_f64(&self) -> f64 {
        match self.to_extended_float(&mut PrecisionContext::binary64()) {
            Ok(v) => v.to_f64(),
            Err(_) => f64::NAN,
        }
    }

    /// Exact conversion from an IEEE binary64 value.
    pub fn from_f64(v: f64) -> Self {
        match ExtendedFloat::from_f64(v).to_extended_decimal_exact() {
            Some(d) => d,
            None => Self::nan(),
        }
    }

    /// Parses the decimal string grammar
    /// `-? digits ('.' digits)? ([eE] [-+]? digits)?`, plus `Infinity`,
    /// `NaN`, and `sNaN` forms with optional payload digits.
    pub fn from_string(s: &str) -> Option<Self> {
        let (neg, rest) = match s.as_bytes().first()? {
            b'-' => (true, &s[1..]),
            b'+' => (false, &s[1..]),
            _ => (false, s),
        };
        let lower = rest.to_ascii_lowercase();
        if lower == "inf" || lower == "infinity" {
            return Some(Self::from_raw(RawFloat::infinity(neg)));
        }
        for (prefix, signaling) in [("snan", true), ("nan", false)] {
            if let Some(payload) = lower.strip_prefix(prefix) {
                let payload = if payload.is_empty() {
                    BigInt::default()
                } else {
                    BigInt::from_string(payload)?
                };
                return Some(Self::from_raw(if signaling {
                    RawFloat::signaling_nan(neg, payload)
                } else {
                    RawFloat::quiet_nan(neg, payload)
                }));
            }
        }

        let mut digits = String::new();
        let mut frac_len: i64 = 0;
        let mut seen_point = false;
        let mut seen_digit = false;
        let mut chars = rest.char_indices().peekable();
        let mut exp_part: i64 = 0;
        while let Some((i, c)) = chars.next() {
            match c {
                '0'..='9' => {
                    digits.push(c);
                    seen_digit = true;
                    if seen_point {
                        frac_len += 1;
                    }
                }
                '.' if !seen_point => {
                    seen_point = true;
                }
                'e' | 'E' if seen_digit => {
                    let tail = &rest[i + 1..];
                    if tail.is_empty() {
                        return None;
                    }
                    let (eneg, etail) = match tail.as_bytes()[0] {
                        b'-' => (true, &tail[1..]),
                        b'+' => (false, &tail[1..]),
                        _ => (false, tail),
                    };
                    if etail.is_empty() || !etail.bytes().all(|b| b.is_ascii_digit()) {
                        return None;
                    }
                    let mag: i64 = etail.parse().ok()?;
                    exp_part = if eneg { -mag } else { mag };
                    while chars.next().is_some() {}
                    break;
                }
                _ => return None,
            }
        }
        if !seen_digit {
            return None;
        }
        let mantissa = BigInt::from_string(&digits)?;
        let exponent = BigInt::from(exp_part) - BigInt::from(frac_len);
        Some(Self::from_raw(RawFloat::finite(neg, mantissa, exponent)))
    }
}

impl core::fmt::Display for ExtendedDecimal {
    /// Scientific notation when `exponent > 0` or the adjusted exponent is
    /// below -7; plain notation otherwise. Negative zero renders as `-0`.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.raw.is_nan() {
            if self.raw.is_negative() {
                f.write_str("-")?;
            }
            f.write_str(if self.raw.is_signaling_nan() { "sNaN" } else { "NaN" })?;
            if !self.raw.mantissa.is_zero() {
                write!(f, "{}", self.raw.mantissa)?;
            }
            return Ok(());
        }
        if self.raw.is_infinity() {
            return f.write_str(if self.raw.is_negative() { "-Infinity" } else { "Infinity" });
        }

        let digits = self.raw.mantissa.to_string();
        let len = digits.len() as i64;
        let exp = match self.raw.exponent.to_i64() {
            Ok(e) => e,
            Err(_) => i64::MAX, // forced scientific below
        };
        let sign = if self.raw.is_negative() { "-" } else { "" };
        let adjusted = exp.saturating_add(len - 1);

        if exp > 0 || adjusted < -6 {
            // scientific
            write!(f, "{}{}", sign, &digits[..1])?;
            if len > 1 {
                write!(f, ".{}", &digits[1..])?;
            }
            let adj = if exp == i64::MAX {
                self.raw.exponent.clone() + BigInt::from(len - 1)
            } else {
                BigInt::from(adjusted)
            };
            if adj.signum() >= 0 {
                write!(f, "E+{}", adj)
            } else {
                write!(f, "E{}", adj)
            }
        } else if exp == 0 {
            write!(f, "{}{}", sign, digits)
        } else {
            let point = len + exp;
            if point > 0 {
                write!(f, "{}{}.{}", sign, &digits[..point as usize], &digits[point as usize..])
            } else {
                write!(f, "{}0.", sign)?;
                for _ in 0..-point {
                    f.write_str("0")?;
                }
                f.write_str(&digits)
            }
        }
    }
}

impl From<i64> for ExtendedDecimal {
    fn from(v: i64) -> Self {
        Self::from_parts(BigInt::from(v), BigInt::default())
    }
}

impl From<&BigInt> for ExtendedDecimal {
    fn from(v: &BigInt) -> Self {
        Self::from_parts(v.clone(), BigInt::default())
    }
}
