//! Arithmetic, quantization, and comparison operations of the kernel.

use core::cmp::Ordering;

use crate::accum::ShiftAccumulator;
use crate::bigint::BigInt;
use crate::ctx::PrecisionContext;
use crate::ctx::FLAG_DIVIDE_BY_ZERO;
use crate::ctx::FLAG_INEXACT;
use crate::ctx::FLAG_ROUNDED;
use crate::defs::Error;
use crate::defs::Rounding;

use super::round::big;
use super::RadixHelper;
use super::RadixMath;
use super::RawFloat;

// Rounding evidence for a fractional part rem/div, encoded as the
// (last digit, sticky) pair the rounding decision expects.
fn fraction_state(rem: &BigInt, divisor: &BigInt, half_digit: u8) -> (u8, bool) {
    if rem.is_zero() {
        return (0, false);
    }
    let twice = rem.shift_left(1);
    match twice.cmp(divisor) {
        Ordering::Less => (0, true),
        Ordering::Equal => (half_digit, false),
        Ordering::Greater => (half_digit, true),
    }
}

impl<H: RadixHelper> RadixMath<H> {
    fn half_digit() -> u8 {
        (H::RADIX / 2) as u8
    }

    /// Addition.
    pub(crate) fn add(
        a: &RawFloat,
        b: &RawFloat,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        if a.is_nan() || b.is_nan() {
            return Self::propagate_nan(a, Some(b), ctx);
        }
        if a.is_infinity() {
            if b.is_infinity() && a.is_negative() != b.is_negative() {
                return Self::invalid(ctx);
            }
            return Ok(a.clone());
        }
        if b.is_infinity() {
            return Ok(b.clone());
        }

        let min_exp = a.exponent.clone().min(b.exponent.clone());
        if a.is_zero() && b.is_zero() {
            // the sign of an exact zero sum depends on the rounding mode
            let neg = if a.is_negative() == b.is_negative() {
                a.is_negative()
            } else {
                ctx.rounding() == Rounding::Floor
            };
            return Self::round_finite(RawFloat::finite(neg, BigInt::default(), min_exp), false, !0, ctx);
        }
        if a.is_zero() || b.is_zero() {
            let v = if a.is_zero() { b } else { a };
            return Self::rescale_toward(v, &min_exp, ctx);
        }

        // when the operands do not overlap within the precision window, the
        // smaller one only contributes a guard digit and sticky state
        if let Ok(prec) = ctx.precision().to_i64() {
            if prec > 0 {
                let da = H::digit_count(&a.mantissa) as i64;
                let db = H::digit_count(&b.mantissa) as i64;
                let top_a = &a.exponent + &big(da);
                let top_b = &b.exponent + &big(db);
                let (bigop, smallop, top_small) = if top_a > top_b {
                    (a, b, top_b)
                } else {
                    (b, a, top_a)
                };
                let gap = &bigop.exponent - &top_small;
                if gap > big(prec + 2) {
                    let extra = big(prec + 2);
                    let mut m = H::multiply_by_radix_power(&bigop.mantissa, &extra);
                    if bigop.is_negative() != smallop.is_negative() {
                        m = &m - &big(1);
                    }
                    let e = &bigop.exponent - &extra;
                    let r = RawFloat::finite(bigop.is_negative(), m, e);
                    return Self::round_finite(r, true, !0, ctx);
                }
            }
        }

        // full alignment to the smaller exponent
        let ma = H::multiply_by_radix_power(&a.mantissa, &(&a.exponent - &min_exp));
        let mb = H::multiply_by_radix_power(&b.mantissa, &(&b.exponent - &min_exp));
        let sa = if a.is_negative() { -ma } else { ma };
        let sb = if b.is_negative() { -mb } else { mb };
        let sum = &sa + &sb;
        if sum.is_zero() {
            let neg = ctx.rounding() == Rounding::Floor;
            return Self::round_finite(RawFloat::finite(neg, BigInt::default(), min_exp), false, !0, ctx);
        }
        let r = RawFloat::finite(sum.signum() < 0, sum.abs(), min_exp);
        Self::round_finite(r, false, !0, ctx)
    }

    /// Subtraction.
    pub(crate) fn subtract(
        a: &RawFloat,
        b: &RawFloat,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        if b.is_nan() {
            return Self::propagate_nan(a, Some(b), ctx);
        }
        Self::add(a, &b.negate(), ctx)
    }

    // Moves an exact value's exponent down toward `target` by padding the
    // mantissa with zeros, as far as the precision window allows, without
    // signaling.
    fn rescale_toward(
        v: &RawFloat,
        target: &BigInt,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        let mut target = target.clone();
        if target >= v.exponent {
            return Self::round_finite(v.clone(), false, !0, ctx);
        }
        if let Ok(prec) = ctx.precision().to_i64() {
            if prec > 0 && !v.mantissa.is_zero() {
                let digits = H::digit_count(&v.mantissa) as i64;
                let lowest = &v.exponent + &big(digits - prec);
                if target < lowest {
                    target = lowest.min(v.exponent.clone());
                }
            }
        }
        let pad = &v.exponent - &target;
        if pad.signum() <= 0 {
            return Self::round_finite(v.clone(), false, !0, ctx);
        }
        let m = H::multiply_by_radix_power(&v.mantissa, &pad);
        Self::round_finite(RawFloat::finite(v.is_negative(), m, target), false, !0, ctx)
    }

    /// Multiplication.
    pub(crate) fn multiply(
        a: &RawFloat,
        b: &RawFloat,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        if a.is_nan() || b.is_nan() {
            return Self::propagate_nan(a, Some(b), ctx);
        }
        let neg = a.is_negative() != b.is_negative();
        if a.is_infinity() || b.is_infinity() {
            if a.is_zero() || b.is_zero() {
                return Self::invalid(ctx);
            }
            return Ok(RawFloat::infinity(neg));
        }
        let m = &a.mantissa * &b.mantissa;
        let e = &a.exponent + &b.exponent;
        Self::round_finite(RawFloat::finite(neg, m, e), false, !0, ctx)
    }

    /// Fused multiply-add: `a * b + c` with a single rounding.
    pub(crate) fn multiply_and_add(
        a: &RawFloat,
        b: &RawFloat,
        c: &RawFloat,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        if a.is_nan() || b.is_nan() {
            return Self::propagate_nan(a, Some(b), ctx);
        }
        if c.is_nan() {
            return Self::propagate_nan(c, None, ctx);
        }
        if (a.is_infinity() && b.is_zero()) || (a.is_zero() && b.is_infinity()) {
            return Self::invalid(ctx);
        }
        let mut exact = ctx.with_no_flags().with_precision(0).with_unlimited_exponents();
        let product = Self::multiply(a, b, &mut exact)?;
        Self::add(&product, c, ctx)
    }

    /// Division rounded to the context precision.
    pub(crate) fn divide(
        a: &RawFloat,
        b: &RawFloat,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        if a.is_nan() || b.is_nan() {
            return Self::propagate_nan(a, Some(b), ctx);
        }
        let neg = a.is_negative() != b.is_negative();
        if a.is_infinity() {
            if b.is_infinity() {
                return Self::invalid(ctx);
            }
            return Ok(RawFloat::infinity(neg));
        }
        if b.is_infinity() {
            // a finite value divided by infinity collapses to zero at the
            // bottom of the exponent range
            let exp = if ctx.has_exponent_range() { ctx.e_tiny() } else { BigInt::default() };
            return Ok(RawFloat::finite(neg, BigInt::default(), exp));
        }
        if b.is_zero() {
            if a.is_zero() {
                return Self::invalid(ctx);
            }
            ctx.signal(FLAG_DIVIDE_BY_ZERO)?;
            return Ok(RawFloat::infinity(neg));
        }
        let ideal = &a.exponent - &b.exponent;
        if a.is_zero() {
            return Self::round_finite(RawFloat::finite(neg, BigInt::default(), ideal), false, !0, ctx);
        }

        let prec = ctx.precision().to_i64().unwrap_or(0);
        if prec == 0 {
            return Self::divide_exact(a, b, neg, ideal, ctx);
        }

        let da = H::digit_count(&a.mantissa) as i64;
        let db = H::digit_count(&b.mantissa) as i64;
        let shift = (db + prec + 2 - da).max(0);
        let num = H::multiply_by_radix_power(&a.mantissa, &big(shift));
        let (mut q, rem) = num.div_rem(&b.mantissa)?;
        let mut exp = &ideal - &big(shift);
        if rem.is_zero() {
            // exact: bring the exponent back toward the ideal one
            let radix = big(H::RADIX as i64);
            while exp < ideal && !q.is_zero() {
                let (q2, r2) = q.div_rem(&radix)?;
                if !r2.is_zero() {
                    break;
                }
                q = q2;
                exp = &exp + &big(1);
            }
            return Self::round_finite(RawFloat::finite(neg, q, exp), false, !0, ctx);
        }
        Self::round_finite(RawFloat::finite(neg, q, exp), true, !0, ctx)
    }

    // Division under unlimited precision: digit-by-digit until the
    // remainder clears, or the expansion is known not to terminate.
    fn divide_exact(
        a: &RawFloat,
        b: &RawFloat,
        neg: bool,
        ideal: BigInt,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        let radix = big(H::RADIX as i64);
        let (mut q, mut rem) = a.mantissa.div_rem(&b.mantissa)?;
        let mut s: i64 = 0;
        // a terminating expansion needs at most one digit per factor of
        // the radix in the divisor
        let limit = b.mantissa.unsigned_bit_length() as i64 + 1;
        while !rem.is_zero() {
            if s > limit {
                return Err(Error::NonTerminating);
            }
            rem = &rem * &radix;
            let (d, r2) = rem.div_rem(&b.mantissa)?;
            q = &(&q * &radix) + &d;
            rem = r2;
            s += 1;
        }
        let mut exp = &ideal - &big(s);
        // trim back toward the ideal exponent
        while exp < ideal && !q.is_zero() {
            let (q2, r2) = q.div_rem(&radix)?;
            if !r2.is_zero() {
                break;
            }
            q = q2;
            exp = &exp + &big(1);
        }
        Self::round_finite(RawFloat::finite(neg, q, exp), false, !0, ctx)
    }

    // Integer quotient of a/b rounded at exponent 0 in the given mode,
    // with the exact remainder evidence. Returns (quotient, inexact).
    fn integer_quotient(
        a: &RawFloat,
        b: &RawFloat,
        rounding: Rounding,
    ) -> Result<(BigInt, bool), Error> {
        // scale both mantissas to a common exponent
        let (na, nb) = if a.exponent >= b.exponent {
            (
                H::multiply_by_radix_power(&a.mantissa, &(&a.exponent - &b.exponent)),
                b.mantissa.clone(),
            )
        } else {
            (
                a.mantissa.clone(),
                H::multiply_by_radix_power(&b.mantissa, &(&b.exponent - &a.exponent)),
            )
        };
        let (mut q, rem) = na.div_rem(&nb)?;
        let neg = a.is_negative() != b.is_negative();
        let inexact = !rem.is_zero();
        let (last, sticky) = fraction_state(&rem, &nb, Self::half_digit());
        if Self::round_up_needed(rounding, neg, last, sticky, &q) {
            q = &q + &big(1);
        }
        Ok((q, inexact))
    }

    /// Division to a caller-fixed exponent.
    pub(crate) fn divide_to_exponent(
        a: &RawFloat,
        b: &RawFloat,
        desired: &BigInt,
        rounding: Rounding,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        if a.is_nan() || b.is_nan() {
            return Self::propagate_nan(a, Some(b), ctx);
        }
        let neg = a.is_negative() != b.is_negative();
        if a.is_infinity() || b.is_infinity() {
            if a.is_infinity() && b.is_infinity() {
                return Self::invalid(ctx);
            }
            if a.is_infinity() {
                return Ok(RawFloat::infinity(neg));
            }
            return Ok(RawFloat::finite(neg, BigInt::default(), desired.clone()));
        }
        if b.is_zero() {
            if a.is_zero() {
                return Self::invalid(ctx);
            }
            ctx.signal(FLAG_DIVIDE_BY_ZERO)?;
            return Ok(RawFloat::infinity(neg));
        }
        if a.is_zero() {
            return Ok(RawFloat::finite(neg, BigInt::default(), desired.clone()));
        }

        // result mantissa = round(ma * r^(ea - eb - desired) / mb)
        let s = &(&a.exponent - &b.exponent) - desired;
        let (num, den) = if s.signum() >= 0 {
            (H::multiply_by_radix_power(&a.mantissa, &s), b.mantissa.clone())
        } else {
            (a.mantissa.clone(), H::multiply_by_radix_power(&b.mantissa, &(-s)))
        };
        let (mut q, rem) = num.div_rem(&den)?;
        let mut fl = 0;
        if !rem.is_zero() {
            fl |= FLAG_INEXACT | FLAG_ROUNDED;
            let (last, sticky) = fraction_state(&rem, &den, Self::half_digit());
            if Self::round_up_needed(rounding, neg, last, sticky, &q) {
                q = &q + &big(1);
            }
        }
        let prec = ctx.precision().to_i64().unwrap_or(0);
        if prec > 0 && H::digit_count(&q) as i64 > prec {
            return Self::invalid(ctx);
        }
        ctx.signal(fl)?;
        Ok(RawFloat::finite(neg, q, desired.clone()))
    }

    /// Integer division; the result exponent moves up from zero toward
    /// `dividend exponent - divisor exponent` by trimming trailing zeros.
    pub(crate) fn divide_to_integer_natural_scale(
        a: &RawFloat,
        b: &RawFloat,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        if a.is_nan() || b.is_nan() {
            return Self::propagate_nan(a, Some(b), ctx);
        }
        let neg = a.is_negative() != b.is_negative();
        if a.is_infinity() || b.is_infinity() || b.is_zero() {
            return Self::divide_to_exponent(a, b, &BigInt::default(), Rounding::Down, ctx);
        }
        let desired = (&a.exponent - &b.exponent).max(BigInt::default());
        if a.is_zero() {
            return Ok(RawFloat::finite(neg, BigInt::default(), desired));
        }
        let (mut q, _) = Self::integer_quotient(a, b, Rounding::Down)?;
        let prec = ctx.precision().to_i64().unwrap_or(0);
        if prec > 0 && H::digit_count(&q) as i64 > prec {
            return Self::invalid(ctx);
        }
        let mut exp = BigInt::default();
        let radix = big(H::RADIX as i64);
        while exp < desired && !q.is_zero() {
            let (q2, r2) = q.div_rem(&radix)?;
            if !r2.is_zero() {
                break;
            }
            q = q2;
            exp = &exp + &big(1);
        }
        if q.is_zero() {
            exp = desired;
        }
        Ok(RawFloat::finite(neg, q, exp))
    }

    /// Integer division with the result exponent fixed at zero.
    pub(crate) fn divide_to_integer_zero_scale(
        a: &RawFloat,
        b: &RawFloat,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        Self::divide_to_exponent(a, b, &BigInt::default(), Rounding::Down, ctx)
    }

    /// Remainder: `a - b * divide_to_integer_zero_scale(a, b)`.
    pub(crate) fn remainder(
        a: &RawFloat,
        b: &RawFloat,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        if a.is_nan() || b.is_nan() {
            return Self::propagate_nan(a, Some(b), ctx);
        }
        if a.is_infinity() || b.is_zero() {
            return Self::invalid(ctx);
        }
        if b.is_infinity() {
            return Self::round_to_precision(a, ctx);
        }
        if a.is_zero() {
            return Self::round_to_precision(a, ctx);
        }
        let (q, _) = Self::integer_quotient(a, b, Rounding::Down)?;
        let prec = ctx.precision().to_i64().unwrap_or(0);
        if prec > 0 && H::digit_count(&q) as i64 > prec {
            // the intermediate integer quotient does not fit
            return Self::invalid(ctx);
        }
        Self::remainder_from_quotient(a, b, q, ctx)
    }

    /// Remainder with the quotient rounded to the nearest integer, ties to
    /// even, so the result magnitude is at most half the divisor.
    pub(crate) fn remainder_near(
        a: &RawFloat,
        b: &RawFloat,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        if a.is_nan() || b.is_nan() {
            return Self::propagate_nan(a, Some(b), ctx);
        }
        if a.is_infinity() || b.is_zero() {
            return Self::invalid(ctx);
        }
        if b.is_infinity() {
            return Self::round_to_precision(a, ctx);
        }
        if a.is_zero() {
            return Self::round_to_precision(a, ctx);
        }
        let (q, _) = Self::integer_quotient(a, b, Rounding::HalfEven)?;
        let prec = ctx.precision().to_i64().unwrap_or(0);
        if prec > 0 && H::digit_count(&q) as i64 > prec {
            return Self::invalid(ctx);
        }
        Self::remainder_from_quotient(a, b, q, ctx)
    }

    // a - b * q, computed exactly, then rounded. `q` is the unsigned
    // integer quotient magnitude.
    fn remainder_from_quotient(
        a: &RawFloat,
        b: &RawFloat,
        q: BigInt,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        let mut exact = ctx.with_no_flags().with_precision(0).with_unlimited_exponents();
        // the quotient sign cancels against b's so the product carries a's
        let qnum = RawFloat::finite(a.is_negative() != b.is_negative(), q, BigInt::default());
        let prod = Self::multiply(&qnum, b, &mut exact)?;
        let rem = Self::subtract(a, &prod, &mut exact)?;
        // an exact zero remainder keeps the dividend's sign
        let rem = if rem.is_zero() {
            RawFloat::finite(a.is_negative(), BigInt::default(), rem.exponent)
        } else {
            rem
        };
        Self::round_to_precision(&rem, ctx)
    }

    /// Reduce: round, then strip trailing zero digits.
    pub(crate) fn reduce(num: &RawFloat, ctx: &mut PrecisionContext) -> Result<RawFloat, Error> {
        let rounded = Self::round_to_precision(num, ctx)?;
        if rounded.is_special() {
            return Ok(rounded);
        }
        let mut m = rounded.mantissa;
        let mut e = rounded.exponent;
        if m.is_zero() {
            e = BigInt::default();
        } else {
            let radix = big(H::RADIX as i64);
            loop {
                let (q, r) = m.div_rem(&radix)?;
                if !r.is_zero() {
                    break;
                }
                m = q;
                e = &e + &big(1);
            }
        }
        Ok(RawFloat::finite(rounded.flags & super::F_NEGATIVE != 0, m, e))
    }

    /// Quantize: rescale to the exponent of `pattern`, rounding with the
    /// context mode. This is the one operation where a zero result keeps
    /// the target exponent.
    pub(crate) fn quantize(
        num: &RawFloat,
        pattern: &RawFloat,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        if num.is_nan() || pattern.is_nan() {
            return Self::propagate_nan(num, Some(pattern), ctx);
        }
        if num.is_infinity() || pattern.is_infinity() {
            if num.is_infinity() && pattern.is_infinity() {
                return Ok(num.clone());
            }
            return Self::invalid(ctx);
        }
        Self::rescale(num, &pattern.exponent, ctx.rounding(), ctx, !0)
    }

    /// Rounds to a given exponent, signaling `Inexact` when non-zero digits
    /// are discarded.
    pub(crate) fn round_to_exponent_exact(
        num: &RawFloat,
        exponent: &BigInt,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        if num.is_special() {
            return Self::round_to_precision(num, ctx);
        }
        Self::rescale(num, exponent, ctx.rounding(), ctx, !0)
    }

    /// Rounds to a given exponent only when digits must be discarded; a
    /// value with a higher exponent is returned unchanged rather than
    /// padded.
    pub(crate) fn round_to_exponent_simple(
        num: &RawFloat,
        exponent: &BigInt,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        if num.is_special() {
            return Self::round_to_precision(num, ctx);
        }
        if &num.exponent >= exponent {
            return Self::round_to_precision(num, ctx);
        }
        Self::rescale(num, exponent, ctx.rounding(), ctx, !0)
    }

    /// Like [`Self::round_to_exponent_exact`] with the `Rounded` flag
    /// suppressed.
    pub(crate) fn round_to_exponent_no_rounded_flag(
        num: &RawFloat,
        exponent: &BigInt,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        if num.is_special() {
            return Self::round_to_precision(num, ctx);
        }
        Self::rescale(num, exponent, ctx.rounding(), ctx, !FLAG_ROUNDED)
    }

    // Rescales a finite value to the target exponent.
    fn rescale(
        num: &RawFloat,
        target: &BigInt,
        rounding: Rounding,
        ctx: &mut PrecisionContext,
        flag_mask: u32,
    ) -> Result<RawFloat, Error> {
        if ctx.has_exponent_range() && !(*target <= ctx.e_max() && *target >= ctx.e_tiny()) {
            return Self::invalid(ctx);
        }
        let neg = num.is_negative();
        let prec = ctx.precision().to_i64().unwrap_or(0);
        let diff = &num.exponent - target;
        if num.is_zero() {
            return Ok(RawFloat::finite(neg, BigInt::default(), target.clone()));
        }
        if diff.signum() >= 0 {
            // pad with zeros; the digit count must stay within precision
            let m = H::multiply_by_radix_power(&num.mantissa, &diff);
            if prec > 0 && H::digit_count(&m) as i64 > prec {
                return Self::invalid(ctx);
            }
            return Ok(RawFloat::finite(neg, m, target.clone()));
        }

        let shift = -diff;
        let digits = H::digit_count(&num.mantissa) as i64;
        let d_eff = shift.to_i64().unwrap_or(i64::MAX).min(digits + 1);
        let mut acc = <H::Acc as crate::accum::ShiftAccumulator>::with_state(num.mantissa.clone(), 0, false);
        acc.shift_right(&crate::fastint::FastInt::from_i64(d_eff));
        let last = acc.last_digit();
        let sticky = acc.sticky();
        let mut m = acc.into_shifted_int();
        let mut fl = FLAG_ROUNDED;
        if last != 0 || sticky {
            fl |= FLAG_INEXACT;
            if Self::round_up_needed(rounding, neg, last, sticky, &m) {
                m = &m + &big(1);
            }
        }
        if prec > 0 && H::digit_count(&m) as i64 > prec {
            return Self::invalid(ctx);
        }
        ctx.signal(fl & flag_mask)?;
        Ok(RawFloat::finite(neg, m, target.clone()))
    }

    /// Rounds the mantissa so its length in **bits** fits the context
    /// precision, shifting in this radix's digits.
    pub(crate) fn round_to_binary_precision(
        num: &RawFloat,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        if num.is_special() {
            return Self::round_to_precision(num, ctx);
        }
        let prec = ctx.precision().to_i64().unwrap_or(0);
        if prec == 0 || (num.mantissa.unsigned_bit_length() as i64) <= prec {
            // already fits: only the exponent range applies
            let mut range_ctx = ctx.with_big_precision(BigInt::default()).with_blank_flags();
            let out = Self::round_finite(num.clone(), false, !0, &mut range_ctx)?;
            ctx.signal(range_ctx.flags())?;
            return Ok(out);
        }
        let neg = num.is_negative();
        let mut acc = <H::Acc as crate::accum::ShiftAccumulator>::with_state(num.mantissa.clone(), 0, false);
        let mut shifted: i64 = 0;
        while (acc.shifted_int().unsigned_bit_length() as i64) > prec {
            acc.shift_right(&crate::fastint::FastInt::new(1));
            shifted += 1;
        }
        let last = acc.last_digit();
        let sticky = acc.sticky();
        let mut m = acc.into_shifted_int();
        let mut fl = FLAG_ROUNDED;
        if last != 0 || sticky {
            fl |= FLAG_INEXACT;
            if Self::round_up_needed(ctx.rounding(), neg, last, sticky, &m) {
                m = &m + &big(1);
                if (m.unsigned_bit_length() as i64) > prec {
                    let radix = big(H::RADIX as i64);
                    m = m.checked_div(&radix)?;
                    shifted += 1;
                }
            }
        }
        ctx.signal(fl)?;
        let exp = &num.exponent + &big(shifted);
        // apply the exponent range without re-rounding digits
        let mut range_ctx = ctx.with_big_precision(BigInt::default()).with_blank_flags();
        let out = Self::round_finite(RawFloat::finite(neg, m, exp), false, !0, &mut range_ctx)?;
        ctx.signal(range_ctx.flags())?;
        Ok(out)
    }

    /// Numeric comparison of two finite-or-infinite values. `None` when a
    /// NaN is involved.
    pub(crate) fn compare(a: &RawFloat, b: &RawFloat) -> Option<Ordering> {
        if a.is_nan() || b.is_nan() {
            return None;
        }
        let sa = if a.is_infinity() { if a.is_negative() { -1 } else { 1 } } else { a.signum() };
        let sb = if b.is_infinity() { if b.is_negative() { -1 } else { 1 } } else { b.signum() };
        if sa != sb {
            return Some(sa.cmp(&sb));
        }
        if a.is_infinity() && b.is_infinity() {
            return Some(Ordering::Equal);
        }
        if a.is_infinity() {
            return Some(if a.is_negative() { Ordering::Less } else { Ordering::Greater });
        }
        if b.is_infinity() {
            return Some(if b.is_negative() { Ordering::Greater } else { Ordering::Less });
        }
        if sa == 0 {
            return Some(Ordering::Equal);
        }
        // same nonzero sign: compare adjusted exponents, then mantissas
        let da = H::digit_count(&a.mantissa) as i64;
        let db = H::digit_count(&b.mantissa) as i64;
        let adj_a = &a.exponent + &big(da);
        let adj_b = &b.exponent + &big(db);
        let mag = if adj_a != adj_b {
            adj_a.cmp(&adj_b)
        } else {
            let emin = a.exponent.clone().min(b.exponent.clone());
            let ma = H::multiply_by_radix_power(&a.mantissa, &(&a.exponent - &emin));
            let mb = H::multiply_by_radix_power(&b.mantissa, &(&b.exponent - &emin));
            ma.cmp(&mb)
        };
        Some(if sa < 0 { mag.reverse() } else { mag })
    }

    /// Comparison as a number: -1, 0, or 1, NaN-propagating.
    pub(crate) fn compare_with_context(
        a: &RawFloat,
        b: &RawFloat,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        if a.is_nan() || b.is_nan() {
            return Self::propagate_nan(a, Some(b), ctx);
        }
        let v = match Self::compare(a, b) {
            Some(Ordering::Less) => RawFloat::finite(true, BigInt::from(1), BigInt::default()),
            Some(Ordering::Greater) => RawFloat::finite(false, BigInt::from(1), BigInt::default()),
            _ => RawFloat::zero(),
        };
        Ok(v)
    }

    // Tie-break for min/max over numerically equal values: prefer by
    // exponent according to the sign.
    fn pick_by_exponent(a: &RawFloat, b: &RawFloat, want_larger_exp: bool) -> RawFloat {
        let a_wins = if want_larger_exp {
            a.exponent >= b.exponent
        } else {
            a.exponent <= b.exponent
        };
        if a_wins {
            a.clone()
        } else {
            b.clone()
        }
    }

    fn min_max(
        a: &RawFloat,
        b: &RawFloat,
        want_max: bool,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        if a.is_signaling_nan() || b.is_signaling_nan() {
            return Self::propagate_nan(a, Some(b), ctx);
        }
        // a single quiet NaN loses to the number
        match (a.is_quiet_nan(), b.is_quiet_nan()) {
            (true, true) => return Self::propagate_nan(a, Some(b), ctx),
            (true, false) => return Self::round_to_precision(b, ctx),
            (false, true) => return Self::round_to_precision(a, ctx),
            _ => {}
        }
        let ord = Self::compare(a, b).unwrap_or(Ordering::Equal);
        let chosen = match (ord, want_max) {
            (Ordering::Greater, true) | (Ordering::Less, false) => a.clone(),
            (Ordering::Less, true) | (Ordering::Greater, false) => b.clone(),
            (Ordering::Equal, _) => {
                // equal values: -0 vs +0 and exponent preferences
                if a.is_negative() != b.is_negative() {
                    let neg_first = if a.is_negative() { a } else { b };
                    let pos_first = if a.is_negative() { b } else { a };
                    if want_max {
                        pos_first.clone()
                    } else {
                        neg_first.clone()
                    }
                } else {
                    let positive = !a.is_negative();
                    Self::pick_by_exponent(a, b, positive == want_max)
                }
            }
        };
        Self::round_to_precision(&chosen, ctx)
    }

    /// Larger of two values.
    pub(crate) fn max(a: &RawFloat, b: &RawFloat, ctx: &mut PrecisionContext) -> Result<RawFloat, Error> {
        Self::min_max(a, b, true, ctx)
    }

    /// Smaller of two values.
    pub(crate) fn min(a: &RawFloat, b: &RawFloat, ctx: &mut PrecisionContext) -> Result<RawFloat, Error> {
        Self::min_max(a, b, false, ctx)
    }

    /// Value with the larger absolute value.
    pub(crate) fn max_magnitude(
        a: &RawFloat,
        b: &RawFloat,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        if a.is_nan() || b.is_nan() {
            return Self::min_max(a, b, true, ctx);
        }
        match Self::compare(&a.abs_value(), &b.abs_value()) {
            Some(Ordering::Greater) => Self::round_to_precision(a, ctx),
            Some(Ordering::Less) => Self::round_to_precision(b, ctx),
            _ => Self::min_max(a, b, true, ctx),
        }
    }

    /// Value with the smaller absolute value.
    pub(crate) fn min_magnitude(
        a: &RawFloat,
        b: &RawFloat,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        if a.is_nan() || b.is_nan() {
            return Self::min_max(a, b, false, ctx);
        }
        match Self::compare(&a.abs_value(), &b.abs_value()) {
            Some(Ordering::Less) => Self::round_to_precision(a, ctx),
            Some(Ordering::Greater) => Self::round_to_precision(b, ctx),
            _ => Self::min_max(a, b, false, ctx),
        }
    }

    /// Rounds to the context; a negative zero becomes positive unless the
    /// rounding mode is floor.
    pub(crate) fn plus(num: &RawFloat, ctx: &mut PrecisionContext) -> Result<RawFloat, Error> {
        let r = Self::round_to_precision(num, ctx)?;
        if r.is_zero() && r.is_negative() && ctx.rounding() != Rounding::Floor {
            return Ok(r.abs_value());
        }
        Ok(r)
    }

    /// The least value greater than the operand, in the context's format.
    pub(crate) fn next_plus(num: &RawFloat, ctx: &mut PrecisionContext) -> Result<RawFloat, Error> {
        Self::next_in_direction(num, false, ctx)
    }

    /// The greatest value smaller than the operand.
    pub(crate) fn next_minus(num: &RawFloat, ctx: &mut PrecisionContext) -> Result<RawFloat, Error> {
        Self::next_in_direction(num, true, ctx)
    }

    fn next_in_direction(
        num: &RawFloat,
        downward: bool,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        if num.is_nan() {
            return Self::propagate_nan(num, None, ctx);
        }
        let prec = ctx.precision().to_i64().unwrap_or(0);
        if prec == 0 || !ctx.has_exponent_range() {
            return Self::invalid(ctx);
        }
        if num.is_infinity() {
            if num.is_negative() != downward {
                // moving inward from infinity lands on the largest finite
                let mant = H::multiply_by_radix_power(&big(1), ctx.precision()) - big(1);
                let exp = ctx.e_max() + big(1) - big(prec);
                return Ok(RawFloat::finite(num.is_negative(), mant, exp));
            }
            return Ok(num.clone());
        }
        // one quantum well below the ulp, rounded directionally
        let adj = &num.exponent + &big(H::digit_count(&num.mantissa) as i64 - 1);
        let e_ulp = (adj - big(prec - 1)).max(ctx.e_tiny());
        let quantum = RawFloat::finite(downward, big(1), &e_ulp - &big(2));
        let rounding = if downward { Rounding::Floor } else { Rounding::Ceiling };
        let mut work = ctx.with_rounding(rounding).with_traps(0).with_no_flags();
        Self::add(num, &quantum, &mut work)
    }

    /// The next value after `num` in the direction of `target`.
    pub(crate) fn next_toward(
        num: &RawFloat,
        target: &RawFloat,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        if num.is_nan() || target.is_nan() {
            return Self::propagate_nan(num, Some(target), ctx);
        }
        match Self::compare(num, target) {
            Some(Ordering::Equal) => {
                // keep the value, take the direction's sign
                let mut r = Self::round_to_precision(num, ctx)?;
                if !r.is_nan() {
                    r.flags = (r.flags & !super::F_NEGATIVE)
                        | (target.flags & super::F_NEGATIVE);
                }
                Ok(r)
            }
            Some(Ordering::Less) => Self::next_plus(num, ctx),
            Some(Ordering::Greater) => Self::next_minus(num, ctx),
            None => Self::propagate_nan(num, Some(target), ctx),
        }
    }
}
