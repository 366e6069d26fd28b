//! Simplified arithmetic (General Decimal Arithmetic Appendix A).
//!
//! The wrapper pre-rounds operands to the working precision, delegates to
//! the full kernel, and post-processes: subnormal results flush to zero,
//! zeros lose positive exponents, and quotients lose trailing zeros.

use crate::bigint::BigInt;
use crate::ctx::PrecisionContext;
use crate::ctx::FLAG_CLAMPED;
use crate::ctx::FLAG_INEXACT;
use crate::ctx::FLAG_INVALID;
use crate::ctx::FLAG_LOST_DIGITS;
use crate::ctx::FLAG_ROUNDED;
use crate::ctx::FLAG_UNDERFLOW;
use crate::defs::Error;
use crate::fastint::FastInt;

use super::RadixHelper;
use super::RadixMath;
use super::RawFloat;

pub(crate) type Op1 = fn(&RawFloat, &mut PrecisionContext) -> Result<RawFloat, Error>;
pub(crate) type Op2 = fn(&RawFloat, &RawFloat, &mut PrecisionContext) -> Result<RawFloat, Error>;

pub(crate) struct SimpleRadixMath<H>(core::marker::PhantomData<H>);

impl<H: RadixHelper> SimpleRadixMath<H> {
    // NaN payloads wider than the precision are cut down to fit.
    fn truncate_payload(payload: &BigInt, ctx: &PrecisionContext) -> BigInt {
        let prec = ctx.precision().to_i64().unwrap_or(0);
        if prec == 0 {
            return payload.clone();
        }
        let digits = H::digit_count(payload) as i64;
        if digits <= prec {
            return payload.clone();
        }
        use crate::accum::ShiftAccumulator;
        let mut acc = H::Acc::with_state(payload.clone(), 0, false);
        acc.shift_right(&FastInt::from_i64(digits - prec));
        acc.into_shifted_int()
    }

    // Resolves NaN operands under simplified rules. Returns `None` when no
    // operand is a NaN.
    fn take_nan(
        operands: &[&RawFloat],
        ctx: &mut PrecisionContext,
    ) -> Option<Result<RawFloat, Error>> {
        for v in operands {
            if v.is_signaling_nan() {
                let payload = Self::truncate_payload(&v.mantissa, ctx);
                return Some(
                    ctx.signal(FLAG_INVALID)
                        .map(|_| RawFloat::quiet_nan(v.is_negative(), payload)),
                );
            }
        }
        for v in operands {
            if v.is_quiet_nan() {
                let payload = Self::truncate_payload(&v.mantissa, ctx);
                return Some(Ok(RawFloat::quiet_nan(v.is_negative(), payload)));
            }
        }
        None
    }

    // Rounds an operand to the working precision before the operation,
    // recording lost digits on the parent context.
    fn pre_round(v: &RawFloat, ctx: &mut PrecisionContext) -> Result<RawFloat, Error> {
        if v.is_special() {
            return Ok(v.clone());
        }
        let mut work = ctx.with_blank_flags();
        let rounded = RadixMath::<H>::round_to_precision(v, &mut work)?;
        if work.flags() & FLAG_INEXACT != 0 {
            ctx.signal(FLAG_LOST_DIGITS | FLAG_INEXACT | FLAG_ROUNDED)?;
        }
        Ok(rounded)
    }

    // Appendix A result adjustments.
    fn post_process(
        mut r: RawFloat,
        raised: u32,
        after_division: bool,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        let mut fl = raised;
        if r.is_finite() {
            if fl & FLAG_UNDERFLOW != 0 {
                // subnormals flush to a signed zero
                r = RawFloat::finite(r.is_negative(), BigInt::default(), BigInt::default());
                fl |= FLAG_CLAMPED;
            }
            if r.is_zero() && r.exponent.signum() > 0 {
                r = RawFloat::finite(r.is_negative(), BigInt::default(), BigInt::default());
            }
            if after_division && !r.mantissa.is_zero() {
                let radix = BigInt::from(H::RADIX as i64);
                loop {
                    let (q, rem) = r.mantissa.div_rem(&radix)?;
                    if !rem.is_zero() {
                        break;
                    }
                    r.mantissa = q;
                    r.exponent = &r.exponent + &BigInt::from(1);
                }
            }
        }
        ctx.absorb(fl);
        Ok(r)
    }

    /// Runs a unary kernel operation under simplified semantics.
    pub(crate) fn unary(
        op: Op1,
        v: &RawFloat,
        ctx: &mut PrecisionContext,
        after_division: bool,
    ) -> Result<RawFloat, Error> {
        if let Some(r) = Self::take_nan(&[v], ctx) {
            return r;
        }
        let v2 = Self::pre_round(v, ctx)?;
        let mut inner = ctx.with_blank_flags();
        let r = op(&v2, &mut inner)?;
        Self::post_process(r, inner.flags(), after_division, ctx)
    }

    /// Runs a binary kernel operation under simplified semantics.
    pub(crate) fn binary(
        op: Op2,
        a: &RawFloat,
        b: &RawFloat,
        ctx: &mut PrecisionContext,
        after_division: bool,
    ) -> Result<RawFloat, Error> {
        if let Some(r) = Self::take_nan(&[a, b], ctx) {
            return r;
        }
        let a2 = Self::pre_round(a, ctx)?;
        let b2 = Self::pre_round(b, ctx)?;
        let mut inner = ctx.with_blank_flags();
        let r = op(&a2, &b2, &mut inner)?;
        Self::post_process(r, inner.flags(), after_division, ctx)
    }

    /// Ternary variant for fused multiply-add.
    pub(crate) fn ternary(
        op: fn(&RawFloat, &RawFloat, &RawFloat, &mut PrecisionContext) -> Result<RawFloat, Error>,
        a: &RawFloat,
        b: &RawFloat,
        c: &RawFloat,
        ctx: &mut PrecisionContext,
    ) -> Result<RawFloat, Error> {
        if let Some(r) = Self::take_nan(&[a, b, c], ctx) {
            return r;
        }
        let a2 = Self::pre_round(a, ctx)?;
        let b2 = Self::pre_round(b, ctx)?;
        let c2 = Self::pre_round(c, ctx)?;
        let mut inner = ctx.with_blank_flags();
        let r = op(&a2, &b2, &c2, &mut inner)?;
        Self::post_process(r, inner.flags(), false, ctx)
    }
}
