//! The rounding pipeline: shift to precision, apply the rounding mode,
//! propagate the carry, check the exponent range, clamp or go subnormal,
//! and record the flags.

use crate::accum::ShiftAccumulator;
use crate::bigint::BigInt;
use crate::ctx::PrecisionContext;
use crate::ctx::FLAG_CLAMPED;
use crate::ctx::FLAG_INEXACT;
use crate::ctx::FLAG_INVALID;
use crate::ctx::FLAG_OVERFLOW;
use crate::ctx::FLAG_ROUNDED;
use crate::ctx::FLAG_SUBNORMAL;
use crate::ctx::FLAG_UNDERFLOW;
use crate::defs::Error;
use crate::defs::Rounding;
use crate::fastint::FastInt;

use super::RadixHelper;
use super::RadixMath;
use super::RawFloat;

#[inline]
pub(super) fn big(v: i64) -> BigInt {
    BigInt::from(v)
}

impl<H: RadixHelper> RadixMath<H> {
    /// Signals `Invalid` and produces a quiet NaN.
    pub(super) fn invalid(ctx: &mut PrecisionContext) -> Result<RawFloat, Error> {
        ctx.signal(FLAG_INVALID)?;
        Ok(RawFloat::quiet_nan(false, BigInt::default()))
    }

    /// NaN propagation for one- and two-operand operations: a signaling
    /// NaN becomes quiet and signals `Invalid`; otherwise the first quiet
    /// NaN passes through with its payload.
    pub(crate) fn propagate_nan(
        a: &RawFloat,
        b: Option<&RawFloat>,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        for v in [Some(a), b].into_iter().flatten() {
            if v.is_signaling_nan() {
                ctx.signal(FLAG_INVALID)?;
                return Ok(RawFloat::quiet_nan(v.is_negative(), v.mantissa.clone()));
            }
        }
        for v in [Some(a), b].into_iter().flatten() {
            if v.is_quiet_nan() {
                return Ok(v.clone());
            }
        }
        debug_assert!(false, "no NaN operand");
        Ok(RawFloat::quiet_nan(false, BigInt::default()))
    }

    // The digit of the mantissa in the units position.
    fn low_digit(m: &BigInt) -> u8 {
        if H::RADIX == 2 {
            u8::from(m.test_bit(0))
        } else {
            m.checked_rem(&big(H::RADIX as i64))
                .ok()
                .and_then(|r| r.to_i32().ok())
                .unwrap_or(0) as u8
        }
    }

    // Whether the discarded state rounds the magnitude up.
    pub(super) fn round_up_needed(
        rounding: Rounding,
        neg: bool,
        last: u8,
        sticky: bool,
        mant: &BigInt,
    ) -> bool {
        if last == 0 && !sticky {
            return false;
        }
        let half = (H::RADIX / 2) as u8;
        match rounding {
            Rounding::Down => false,
            Rounding::Up => true,
            Rounding::Ceiling => !neg,
            Rounding::Floor => neg,
            Rounding::HalfUp => last >= half,
            Rounding::HalfDown => last > half || (last == half && sticky),
            Rounding::HalfEven => {
                if last > half || (last == half && sticky) {
                    true
                } else if last == half {
                    Self::low_digit(mant) & 1 != 0
                } else {
                    false
                }
            }
            Rounding::ZeroFiveUp => {
                let low = Self::low_digit(mant);
                low == 0 || (H::RADIX == 10 && low == 5)
            }
        }
    }

    // The result for an overflow: the rounding-mode-appropriate infinity,
    // or the largest finite value for truncating modes.
    fn overflow_result(
        ctx: &mut PrecisionContext,
        neg: bool,
    ) -> RawFloat {
        let to_largest = match ctx.rounding() {
            Rounding::Down | Rounding::ZeroFiveUp => true,
            Rounding::Ceiling => neg,
            Rounding::Floor => !neg,
            _ => false,
        };
        let prec = ctx.precision().clone();
        if to_largest && !prec.is_zero() {
            if let Ok(p) = prec.to_i64() {
                let mant = H::multiply_by_radix_power(&big(1), &prec) - big(1);
                let exp = ctx.e_max() + big(1) - big(p);
                return RawFloat::finite(neg, mant, exp);
            }
        }
        RawFloat::infinity(neg)
    }

    /// Rounds a finite value to the context's precision and exponent range.
    /// Specials pass through NaN propagation.
    pub(crate) fn round_to_precision(
        num: &RawFloat,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        if num.is_nan() {
            return Self::propagate_nan(num, None, ctx);
        }
        if num.is_infinity() {
            return Ok(num.clone());
        }
        Self::round_finite(num.clone(), false, !0, ctx)
    }

    /// The full rounding pipeline. `arg_sticky` injects inexactness known
    /// by the caller (digits already discarded below the mantissa);
    /// `flag_mask` filters which flags this operation may raise.
    pub(crate) fn round_finite(
        num: RawFloat,
        arg_sticky: bool,
        flag_mask: u32,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        debug_assert!(num.is_finite());
        let neg = num.is_negative();
        let prec = match ctx.precision().to_i64() {
            Ok(0) | Err(_) => None,
            Ok(p) => Some(p),
        };

        // plain zeros only move their exponent
        if num.mantissa.is_zero() && !arg_sticky {
            return Self::place_zero(num, ctx);
        }

        let mut mant = num.mantissa;
        let mut exp = num.exponent;
        let digits = H::digit_count(&mant) as i64;
        let mut fl: u32 = 0;

        // how many digits have to go: the precision bound and, within an
        // exponent range, the subnormal floor, in one rounding pass
        let mut discard = BigInt::default();
        if let Some(p) = prec {
            if digits > p {
                discard = big(digits - p);
            }
        }
        let mut subnormal = false;
        if ctx.has_exponent_range() && !mant.is_zero() {
            let adj_pre = &exp + &big(digits - 1);
            if adj_pre < ctx.e_min() {
                subnormal = true;
                let d2 = ctx.e_tiny() - &exp;
                if d2 > discard {
                    discard = d2;
                }
            }
        }

        let mut last = 0u8;
        let mut sticky = arg_sticky;
        if discard.signum() > 0 {
            // discarding more than every digit leaves only sticky state
            let d_eff = discard.to_i64().unwrap_or(i64::MAX).min(digits + 1);
            let mut acc = H::Acc::with_state(mant, 0, arg_sticky);
            acc.shift_right(&FastInt::from_i64(d_eff));
            last = acc.last_digit();
            sticky = acc.sticky();
            mant = acc.into_shifted_int();
            exp = &exp + &discard;
            fl |= FLAG_ROUNDED;
        }
        if last != 0 || sticky {
            fl |= FLAG_INEXACT | FLAG_ROUNDED;
            if Self::round_up_needed(ctx.rounding(), neg, last, sticky, &mant) {
                mant = &mant + &big(1);
                if let Some(p) = prec {
                    if H::digit_count(&mant) as i64 > p {
                        // the carry rippled out of the precision window
                        mant = mant.checked_div(&big(H::RADIX as i64)).unwrap_or_default();
                        exp = &exp + &big(1);
                    }
                }
            }
        }

        if subnormal {
            fl |= FLAG_SUBNORMAL;
            if fl & FLAG_INEXACT != 0 {
                fl |= FLAG_UNDERFLOW;
            }
        }

        // overflow test on the rounded result
        if ctx.has_exponent_range() && !mant.is_zero() {
            let digits_final = H::digit_count(&mant) as i64;
            let adj_final = &exp + &big(digits_final - 1);
            if adj_final > ctx.e_max() {
                fl |= FLAG_OVERFLOW | FLAG_INEXACT | FLAG_ROUNDED;
                ctx.signal(fl & flag_mask)?;
                return Ok(Self::overflow_result(ctx, neg));
            }
        }

        // exponent clamp for normal results
        if ctx.clamp_normal_exponents() {
            if let Some(p) = prec {
                let max_exp = ctx.e_max() + big(1) - big(p);
                if exp > max_exp {
                    if mant.is_zero() {
                        exp = max_exp;
                    } else {
                        let pad = &exp - &max_exp;
                        mant = H::multiply_by_radix_power(&mant, &pad);
                        exp = max_exp;
                    }
                    fl |= FLAG_CLAMPED;
                }
            }
        }

        ctx.signal(fl & flag_mask)?;
        Ok(RawFloat::finite(neg, mant, exp))
    }

    // Fits a zero's exponent into the context's range.
    fn place_zero(num: RawFloat, ctx: &mut PrecisionContext) -> Result<RawFloat, Error> {
        let mut exp = num.exponent;
        let mut fl = 0;
        if ctx.has_exponent_range() {
            if exp > ctx.e_max() {
                exp = ctx.e_max();
                fl |= FLAG_CLAMPED;
            } else if exp < ctx.e_tiny() {
                exp = ctx.e_tiny();
                fl |= FLAG_CLAMPED;
            }
        }
        if ctx.clamp_normal_exponents() && !ctx.precision().is_zero() {
            if let Ok(p) = ctx.precision().to_i64() {
                let max_exp = ctx.e_max() + big(1) - big(p);
                if exp > max_exp {
                    exp = max_exp;
                    fl |= FLAG_CLAMPED;
                }
            }
        }
        ctx.signal(fl)?;
        Ok(RawFloat::finite(num.flags & super::F_NEGATIVE != 0, BigInt::default(), exp))
    }
}
