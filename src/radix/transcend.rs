//! Exponential, logarithmic, and power functions.
//!
//! Each routine computes at a working precision of `precision + guard`
//! digits through the kernel's own operations with a blank working context,
//! then rounds once into the caller's context with the sticky bit set, so
//! inexact results carry the `Inexact` and `Rounded` flags.

use core::cmp::Ordering;

use crate::bigint::BigInt;
use crate::ctx::PrecisionContext;
use crate::ctx::FLAG_DIVIDE_BY_ZERO;
use crate::defs::Error;
use crate::defs::Rounding;

use super::round::big;
use super::RadixHelper;
use super::RadixMath;
use super::RawFloat;

impl<H: RadixHelper> RadixMath<H> {
    fn small(v: i64) -> RawFloat {
        RawFloat::from_int(&big(v))
    }

    fn wctx(wp: i64) -> PrecisionContext {
        PrecisionContext::for_precision_and_rounding(wp.max(1) as u64, Rounding::HalfEven)
    }

    // Adjusted exponent (exponent of the leading digit); zero reports the
    // bare exponent.
    fn adjusted_exponent(v: &RawFloat) -> BigInt {
        if v.mantissa.is_zero() {
            v.exponent.clone()
        } else {
            &v.exponent + &big(H::digit_count(&v.mantissa) as i64 - 1)
        }
    }

    // True once the series term no longer moves the sum at the working
    // precision.
    fn negligible(term: &RawFloat, sum: &RawFloat, wp: i64) -> bool {
        if term.is_zero() {
            return true;
        }
        let adj_t = Self::adjusted_exponent(term);
        let adj_s = Self::adjusted_exponent(sum);
        adj_t < &adj_s - &big(wp + 2)
    }

    /// Square root by integer Newton iteration on a scaled mantissa.
    pub(crate) fn square_root(
        num: &RawFloat,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        if num.is_nan() {
            return Self::propagate_nan(num, None, ctx);
        }
        if num.is_infinity() {
            if num.is_negative() {
                return Self::invalid(ctx);
            }
            return Ok(num.clone());
        }
        if num.is_zero() {
            // the sign is kept and the exponent halves
            let exp = match num.exponent.to_i64() {
                Ok(e) => big(e.div_euclid(2)),
                Err(_) => num.exponent.shift_right(1),
            };
            return Ok(RawFloat::finite(num.is_negative(), BigInt::default(), exp));
        }
        if num.is_negative() {
            return Self::invalid(ctx);
        }

        let prec = ctx.precision().to_i64().unwrap_or(0);
        let digits = H::digit_count(&num.mantissa) as i64;
        let e = num.exponent.to_i64().map_err(|_| Error::NonTerminating)?;

        // scale so the radicand has at least 2(p+1) digits and an even
        // exponent
        let want = if prec > 0 { 2 * prec + 2 } else { digits + 2 };
        let mut t = (want - digits).max(0);
        if (e - t) % 2 != 0 {
            t += 1;
        }
        let m = H::multiply_by_radix_power(&num.mantissa, &big(t));
        let s = m.sqrt();
        let rem = &m - &(&s * &s);
        let exp = big((e - t) / 2);
        if rem.is_zero() {
            // exact root; trim back toward half the original exponent
            let ideal = big(e.div_euclid(2));
            let mut q = s;
            let mut exp = exp;
            let radix = big(H::RADIX as i64);
            while exp < ideal && !q.is_zero() {
                let (q2, r2) = q.div_rem(&radix)?;
                if !r2.is_zero() {
                    break;
                }
                q = q2;
                exp = &exp + &big(1);
            }
            return Self::round_finite(RawFloat::finite(false, q, exp), false, !0, ctx);
        }
        if prec == 0 {
            return Err(Error::NonTerminating);
        }
        Self::round_finite(RawFloat::finite(false, s, exp), true, !0, ctx)
    }

    /// `e` raised to the operand.
    pub(crate) fn exp(num: &RawFloat, ctx: &mut PrecisionContext) -> Result<RawFloat, Error> {
        if num.is_nan() {
            return Self::propagate_nan(num, None, ctx);
        }
        if num.is_infinity() {
            if num.is_negative() {
                return Ok(RawFloat::zero());
            }
            return Ok(num.clone());
        }
        if num.is_zero() {
            return Self::round_to_precision(&Self::small(1), ctx);
        }
        let prec = ctx.precision().to_i64().unwrap_or(0);
        if prec == 0 {
            return Err(Error::NonTerminating);
        }

        // halve the argument until it is below one half, then square the
        // series result back up
        let adj = Self::adjusted_exponent(num).to_i64().map_err(|_| Error::NonTerminating)?;
        let halvings = if adj >= 0 {
            // bits of the integer part plus one
            ((adj + 1) as f64 * (H::RADIX as f64).log2()) as i64 + 2
        } else {
            0
        };
        let wp = prec + 10 + halvings;
        let mut work = Self::wctx(wp);

        let x = num.abs_value();
        let scale = RawFloat::from_int(&BigInt::pow2(halvings as usize));
        let mut r = Self::divide(&x, &scale, &mut work)?;

        // Taylor series for exp(r), |r| < 1/2
        let mut sum = Self::small(1);
        let mut term = Self::small(1);
        let mut n: i64 = 1;
        loop {
            term = Self::multiply(&term, &r, &mut work)?;
            term = Self::divide(&term, &Self::small(n), &mut work)?;
            sum = Self::add(&sum, &term, &mut work)?;
            if Self::negligible(&term, &sum, wp) {
                break;
            }
            n += 1;
        }
        for _ in 0..halvings {
            sum = Self::multiply(&sum, &sum.clone(), &mut work)?;
        }
        if num.is_negative() {
            sum = Self::divide(&Self::small(1), &sum, &mut work)?;
        }
        r = sum;
        Self::round_finite(r, true, !0, ctx)
    }

    // ln of a value in [1, radix) by repeated square roots and the atanh
    // series.
    fn ln_reduced(y: &RawFloat, wp: i64, work: &mut PrecisionContext) -> Result<RawFloat, Error> {
        let one = Self::small(1);
        let mut y = y.clone();
        let mut j: i64 = 0;
        // bring y close to 1 so the series converges quickly
        let eighth = Self::divide(&one, &Self::small(8), work)?;
        loop {
            let dist = Self::subtract(&y, &one, work)?.abs_value();
            if Self::compare(&dist, &eighth) != Some(Ordering::Greater) {
                break;
            }
            y = Self::square_root(&y, work)?;
            j += 1;
        }
        // atanh series: ln y = 2 (t + t^3/3 + t^5/5 + ...)
        let t = {
            let n = Self::subtract(&y, &one, work)?;
            let d = Self::add(&y, &one, work)?;
            Self::divide(&n, &d, work)?
        };
        let t2 = Self::multiply(&t, &t.clone(), work)?;
        let mut pow = t.clone();
        let mut sum = t;
        let mut i: i64 = 1;
        loop {
            pow = Self::multiply(&pow, &t2, work)?;
            let term = Self::divide(&pow, &Self::small(2 * i + 1), work)?;
            sum = Self::add(&sum, &term, work)?;
            if Self::negligible(&term, &sum, wp) {
                break;
            }
            i += 1;
        }
        let mut r = Self::multiply(&sum, &Self::small(2), work)?;
        // undo the square-root reductions
        r = Self::multiply(&r, &RawFloat::from_int(&BigInt::pow2(j as usize)), work)?;
        Ok(r)
    }

    fn ln_radix(wp: i64, work: &mut PrecisionContext) -> Result<RawFloat, Error> {
        Self::ln_reduced(&Self::small(H::RADIX as i64), wp, work)
    }

    /// Natural logarithm.
    pub(crate) fn ln(num: &RawFloat, ctx: &mut PrecisionContext) -> Result<RawFloat, Error> {
        if num.is_nan() {
            return Self::propagate_nan(num, None, ctx);
        }
        if num.is_zero() {
            return Ok(RawFloat::infinity(true));
        }
        if num.is_negative() {
            return Self::invalid(ctx);
        }
        if num.is_infinity() {
            return Ok(num.clone());
        }
        let one = Self::small(1);
        if Self::compare(num, &one) == Some(Ordering::Equal) {
            return Self::round_to_precision(&RawFloat::zero(), ctx);
        }
        let prec = ctx.precision().to_i64().unwrap_or(0);
        if prec == 0 {
            return Err(Error::NonTerminating);
        }
        let adj = Self::adjusted_exponent(num);
        let adj_i = adj.to_i64().map_err(|_| Error::NonTerminating)?;
        let wp = prec + 12 + (adj_i.unsigned_abs().max(1) as f64).log10() as i64;
        let mut work = Self::wctx(wp);

        // normalise to y in [1, radix): value = y * radix^adj
        let y = RawFloat::finite(false, num.mantissa.clone(), &num.exponent - &adj);
        let mut r = Self::ln_reduced(&y, wp, &mut work)?;
        if adj_i != 0 {
            let lr = Self::ln_radix(wp, &mut work)?;
            let scaled = Self::multiply(&lr, &Self::small(adj_i), &mut work)?;
            r = Self::add(&r, &scaled, &mut work)?;
        }
        Self::round_finite(r, true, !0, ctx)
    }

    /// Base-10 logarithm.
    pub(crate) fn log10(num: &RawFloat, ctx: &mut PrecisionContext) -> Result<RawFloat, Error> {
        if num.is_nan() {
            return Self::propagate_nan(num, None, ctx);
        }
        if num.is_zero() {
            return Ok(RawFloat::infinity(true));
        }
        if num.is_negative() {
            return Self::invalid(ctx);
        }
        if num.is_infinity() {
            return Ok(num.clone());
        }
        if Self::compare(num, &Self::small(1)) == Some(Ordering::Equal) {
            return Self::round_to_precision(&RawFloat::zero(), ctx);
        }
        // powers of ten have an exact integer logarithm
        if H::RADIX == 10 && Self::is_power_of_radix(&num.mantissa) {
            let adj = Self::adjusted_exponent(num);
            return Self::round_to_precision(&RawFloat::from_int(&adj), ctx);
        }
        let prec = ctx.precision().to_i64().unwrap_or(0);
        if prec == 0 {
            return Err(Error::NonTerminating);
        }
        let wp = prec + 10;
        let mut work = Self::wctx(wp);
        let mut inner = Self::wctx(wp + 10);
        let a = Self::ln(num, &mut inner)?;
        let b = Self::ln(&Self::small(10), &mut inner)?;
        let r = Self::divide(&a, &b, &mut work)?;
        Self::round_finite(r, true, !0, ctx)
    }

    fn is_power_of_radix(m: &BigInt) -> bool {
        if m.is_zero() {
            return false;
        }
        let digits = H::digit_count(m);
        *m == H::radix_power(digits - 1)
    }

    /// The circle constant by Machin's formula,
    /// `pi = 16 atan(1/5) - 4 atan(1/239)`.
    pub(crate) fn pi(ctx: &mut PrecisionContext) -> Result<RawFloat, Error> {
        let prec = ctx.precision().to_i64().unwrap_or(0);
        if prec == 0 {
            return Err(Error::NonTerminating);
        }
        let wp = prec + 10;
        let mut work = Self::wctx(wp);
        let a = Self::atan_recip(5, wp, &mut work)?;
        let b = Self::atan_recip(239, wp, &mut work)?;
        let a16 = Self::multiply(&a, &Self::small(16), &mut work)?;
        let b4 = Self::multiply(&b, &Self::small(4), &mut work)?;
        let r = Self::subtract(&a16, &b4, &mut work)?;
        Self::round_finite(r, true, !0, ctx)
    }

    // atan(1/k) by its Taylor series.
    fn atan_recip(k: i64, wp: i64, work: &mut PrecisionContext) -> Result<RawFloat, Error> {
        let x = Self::divide(&Self::small(1), &Self::small(k), work)?;
        let x2 = Self::multiply(&x, &x.clone(), work)?;
        let mut pow = x.clone();
        let mut sum = x;
        let mut i: i64 = 1;
        loop {
            pow = Self::multiply(&pow, &x2, work)?;
            let term = Self::divide(&pow, &Self::small(2 * i + 1), work)?;
            sum = if i % 2 == 1 {
                Self::subtract(&sum, &term, work)?
            } else {
                Self::add(&sum, &term, work)?
            };
            if Self::negligible(&term, &sum, wp) {
                break;
            }
            i += 1;
        }
        Ok(sum)
    }

    // The operand as an exact integer, if it is one of a tractable size.
    fn as_integer(v: &RawFloat) -> Option<BigInt> {
        if !v.is_finite() {
            return None;
        }
        if v.mantissa.is_zero() {
            return Some(BigInt::default());
        }
        let e = v.exponent.to_i64().ok()?;
        if e >= 0 {
            if e > 32 {
                return None;
            }
            let m = H::multiply_by_radix_power(&v.mantissa, &v.exponent);
            Some(if v.is_negative() { -m } else { m })
        } else {
            let frac_digits = e.unsigned_abs();
            if frac_digits > H::digit_count(&v.mantissa) {
                return None;
            }
            let shift = H::radix_power(frac_digits);
            let (q, r) = v.mantissa.div_rem(&shift).ok()?;
            if r.is_zero() {
                Some(if v.is_negative() { -q } else { q })
            } else {
                None
            }
        }
    }

    /// `x` raised to the power `y`: square-and-multiply for integer
    /// exponents, `exp(y ln x)` otherwise.
    pub(crate) fn power(
        x: &RawFloat,
        y: &RawFloat,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        if x.is_nan() || y.is_nan() {
            return Self::propagate_nan(x, Some(y), ctx);
        }
        let one = Self::small(1);
        if y.is_infinity() {
            let mag = Self::compare(&x.abs_value(), &one);
            return match (mag, y.is_negative()) {
                (Some(Ordering::Equal), _) => Self::invalid(ctx),
                (Some(Ordering::Greater), false) | (Some(Ordering::Less), true) => {
                    Ok(RawFloat::infinity(false))
                }
                _ => Ok(RawFloat::zero()),
            };
        }
        if y.is_zero() {
            if x.is_zero() {
                return Self::invalid(ctx);
            }
            return Self::round_to_precision(&one, ctx);
        }
        let int_y = Self::as_integer(y);
        if x.is_zero() {
            return match (&int_y, y.is_negative()) {
                (_, true) => {
                    ctx.signal(FLAG_DIVIDE_BY_ZERO)?;
                    Ok(RawFloat::infinity(Self::odd_negative_base(x, &int_y)))
                }
                (_, false) => Ok(RawFloat::finite(
                    Self::odd_negative_base(x, &int_y),
                    BigInt::default(),
                    BigInt::default(),
                )),
            };
        }
        if x.is_infinity() {
            let neg_out = Self::odd_negative_base(x, &int_y);
            if y.is_negative() {
                return Ok(RawFloat::finite(neg_out, BigInt::default(), BigInt::default()));
            }
            return Ok(RawFloat::infinity(neg_out));
        }

        let prec = ctx.precision().to_i64().unwrap_or(0);
        if let Some(n) = int_y {
            return Self::power_int(x, &n, ctx);
        }
        if x.is_negative() {
            return Self::invalid(ctx);
        }
        if Self::compare(x, &one) == Some(Ordering::Equal) {
            return Self::round_to_precision(&one, ctx);
        }
        if prec == 0 {
            return Err(Error::NonTerminating);
        }
        // x^y = exp(y ln x), with extra working precision absorbing the
        // cancellation in the product
        let wp = prec + 12 + H::digit_count(&y.mantissa) as i64;
        let mut inner = Self::wctx(wp + 10);
        let lx = Self::ln(x, &mut inner)?;
        let mut work = Self::wctx(wp);
        let prod = Self::multiply(y, &lx, &mut work)?;
        let mut exp_ctx = Self::wctx(wp);
        let r = Self::exp(&prod, &mut exp_ctx)?;
        Self::round_finite(r, true, !0, ctx)
    }

    // Sign of the result for a negative base and an integer exponent.
    fn odd_negative_base(x: &RawFloat, n: &Option<BigInt>) -> bool {
        x.is_negative() && matches!(n, Some(v) if !v.is_even())
    }

    // Integer exponent: square-and-multiply. Small total digit counts are
    // computed exactly so an exact power raises no flags.
    fn power_int(x: &RawFloat, n: &BigInt, ctx: &mut PrecisionContext) -> Result<RawFloat, Error> {
        let prec = ctx.precision().to_i64().unwrap_or(0);
        let neg_exp = n.signum() < 0;
        let n_abs = n.abs();
        let n_small = n_abs.to_i64().unwrap_or(i64::MAX);

        let digits_x = H::digit_count(&x.mantissa) as i64;
        let exact_ok = n_small != i64::MAX
            && digits_x
                .checked_mul(n_small)
                .map(|total| prec == 0 || total <= prec + 24)
                .unwrap_or(false);

        let guard = 6 + 2 * (64 - n_small.leading_zeros() as i64);
        let work = if exact_ok {
            PrecisionContext::for_rounding(Rounding::HalfEven)
        } else {
            if prec == 0 {
                return Err(Error::NonTerminating);
            }
            Self::wctx(prec + guard)
        };

        let mut r = Self::small(1);
        let mut v = x.clone();
        let mut e = n_abs;
        let mut inexact = false;
        while !e.is_zero() {
            if e.test_bit(0) {
                let mut step = work.with_blank_flags();
                r = Self::multiply(&r, &v, &mut step)?;
                inexact |= step.flags() & crate::ctx::FLAG_INEXACT != 0;
            }
            e = e.shift_right(1);
            if !e.is_zero() {
                let mut step = work.with_blank_flags();
                v = Self::multiply(&v, &v.clone(), &mut step)?;
                inexact |= step.flags() & crate::ctx::FLAG_INEXACT != 0;
            }
        }
        if neg_exp {
            let mut step = work.with_blank_flags();
            match Self::divide(&Self::small(1), &r, &mut step) {
                Ok(v) => {
                    inexact |= step.flags() & crate::ctx::FLAG_INEXACT != 0;
                    r = v;
                }
                Err(Error::NonTerminating) => {
                    // the exact reciprocal does not terminate; round it
                    if prec == 0 {
                        return Err(Error::NonTerminating);
                    }
                    let mut step2 = Self::wctx(prec + guard);
                    r = Self::divide(&Self::small(1), &r, &mut step2)?;
                    inexact = true;
                }
                Err(e) => return Err(e),
            }
        }
        Self::round_finite(r, inexact, !0, ctx)
    }
}
