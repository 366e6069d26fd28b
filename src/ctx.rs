//! Arithmetic context: precision, exponent range, rounding, flags, traps.

use crate::bigint::BigInt;
use crate::defs::Error;
use crate::defs::Rounding;

/// Signals that the result was rounded to a different mathematical value,
/// but as close as possible to the original.
pub const FLAG_INEXACT: u32 = 1;

/// Signals that the result was rounded to fit the precision; either the
/// value or the exponent may have changed from the original.
pub const FLAG_ROUNDED: u32 = 2;

/// Signals that the result's exponent, before rounding, is lower than the
/// lowest exponent allowed.
pub const FLAG_SUBNORMAL: u32 = 4;

/// Signals a subnormal result that was also rounded.
pub const FLAG_UNDERFLOW: u32 = 8;

/// Signals that the result is non-zero and the exponent is higher than the
/// highest exponent allowed.
pub const FLAG_OVERFLOW: u32 = 16;

/// Signals that the exponent was adjusted to fit the exponent range.
pub const FLAG_CLAMPED: u32 = 32;

/// Signals an invalid operation.
pub const FLAG_INVALID: u32 = 64;

/// Signals a division of a nonzero number by zero.
pub const FLAG_DIVIDE_BY_ZERO: u32 = 128;

/// Signals that an operand was rounded to the working precision before the
/// operation (simplified-arithmetic mode only).
pub const FLAG_LOST_DIGITS: u32 = 256;

/// Parameters controlling precision, rounding, and exponent range of
/// arbitrary-precision arithmetic.
///
/// Contexts are immutable except for the flags accumulator: builder methods
/// return modified copies, and an operation handed a context with
/// `has_flags` set records its signals on that copy.
#[derive(Debug, Clone)]
pub struct PrecisionContext {
    precision: BigInt,
    e_max: BigInt,
    e_min: BigInt,
    has_exponent_range: bool,
    clamp_normal_exponents: bool,
    rounding: Rounding,
    traps: u32,
    has_flags: bool,
    flags: u32,
    simplified: bool,
}

impl PrecisionContext {
    /// Creates a context from small precision and exponent-range values.
    pub fn new(precision: u64, rounding: Rounding, e_min: i64, e_max: i64, clamp: bool) -> Self {
        PrecisionContext {
            precision: BigInt::from(precision),
            e_max: BigInt::from(e_max),
            e_min: BigInt::from(e_min),
            has_exponent_range: true,
            clamp_normal_exponents: clamp,
            rounding,
            traps: 0,
            has_flags: false,
            flags: 0,
            simplified: false,
        }
    }

    /// Context with the given precision, half-up rounding, and no exponent
    /// range. A precision of 0 means unlimited.
    pub fn for_precision(precision: u64) -> Self {
        Self::new(precision, Rounding::HalfUp, 0, 0, false).with_unlimited_exponents()
    }

    /// Context with unlimited precision and the given rounding.
    pub fn for_rounding(rounding: Rounding) -> Self {
        Self::new(0, rounding, 0, 0, false).with_unlimited_exponents()
    }

    /// Context with the given precision and rounding, no exponent range.
    pub fn for_precision_and_rounding(precision: u64, rounding: Rounding) -> Self {
        Self::new(precision, rounding, 0, 0, false).with_unlimited_exponents()
    }

    /// Maximum mantissa digit count; zero means unlimited.
    pub fn precision(&self) -> &BigInt {
        &self.precision
    }

    /// Highest adjusted exponent, or zero when no range is set.
    pub fn e_max(&self) -> BigInt {
        if self.has_exponent_range {
            self.e_max.clone()
        } else {
            BigInt::default()
        }
    }

    /// Lowest adjusted exponent, or zero when no range is set.
    pub fn e_min(&self) -> BigInt {
        if self.has_exponent_range {
            self.e_min.clone()
        } else {
            BigInt::default()
        }
    }

    /// Whether this context bounds exponents.
    pub fn has_exponent_range(&self) -> bool {
        self.has_exponent_range
    }

    /// Whether a converted number's exponent is clamped to
    /// `e_max + 1 - precision`.
    pub fn clamp_normal_exponents(&self) -> bool {
        self.has_exponent_range && self.clamp_normal_exponents
    }

    /// Rounding mode for inexact results.
    pub fn rounding(&self) -> Rounding {
        self.rounding
    }

    /// Trap mask: flags whose raising aborts the operation.
    pub fn traps(&self) -> u32 {
        self.traps
    }

    /// Whether this context accumulates flags.
    pub fn has_flags(&self) -> bool {
        self.has_flags
    }

    /// Accumulated flag bits.
    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// Clears the accumulated flags.
    pub fn clear_flags(&mut self) {
        self.flags = 0;
    }

    /// Whether simplified (General Decimal Arithmetic Appendix A)
    /// semantics are in effect.
    pub fn is_simplified(&self) -> bool {
        self.simplified
    }

    // Records newly raised flags; aborts with a trap error when any newly
    // set flag intersects the trap mask.
    pub(crate) fn signal(&mut self, new_flags: u32) -> Result<(), Error> {
        if self.has_flags {
            self.flags |= new_flags;
        }
        let trapped = new_flags & self.traps;
        if trapped != 0 {
            Err(Error::Trap(trapped))
        } else {
            Ok(())
        }
    }

    // Records flags already trap-checked on an inner context.
    pub(crate) fn absorb(&mut self, flags: u32) {
        if self.has_flags {
            self.flags |= flags;
        }
    }

    /// True if the given exponent can be a result exponent in this context.
    pub fn exponent_within_range(&self, exponent: &BigInt) -> bool {
        if !self.has_exponent_range {
            return true;
        }
        if self.precision.is_zero() {
            // with unlimited precision only e_max binds; any exponent below
            // e_min can be lifted by lengthening the mantissa
            return exponent <= &self.e_max;
        }
        let lowest = exponent + self.precision() - &BigInt::from(1);
        lowest >= self.e_min && exponent <= &self.e_max
    }

    /// Smallest exponent a subnormal may take, `e_min - (precision - 1)`.
    pub(crate) fn e_tiny(&self) -> BigInt {
        if self.precision.is_zero() {
            self.e_min()
        } else {
            self.e_min() - (self.precision() - &BigInt::from(1))
        }
    }

    /// Copy with a different rounding mode.
    pub fn with_rounding(&self, rounding: Rounding) -> Self {
        let mut pc = self.clone();
        pc.rounding = rounding;
        pc
    }

    /// Copy with `has_flags` set and the flags cleared.
    pub fn with_blank_flags(&self) -> Self {
        let mut pc = self.clone();
        pc.has_flags = true;
        pc.flags = 0;
        pc
    }

    /// Copy with `has_flags` unset and the flags cleared.
    pub fn with_no_flags(&self) -> Self {
        let mut pc = self.clone();
        pc.has_flags = false;
        pc.flags = 0;
        pc
    }

    /// Copy with the given trap mask (and flag accumulation enabled).
    pub fn with_traps(&self, traps: u32) -> Self {
        let mut pc = self.clone();
        pc.has_flags = true;
        pc.traps = traps;
        pc
    }

    /// Copy with the exponent clamp set as given.
    pub fn with_exponent_clamp(&self, clamp: bool) -> Self {
        let mut pc = self.clone();
        pc.clamp_normal_exponents = clamp;
        pc
    }

    /// Copy with the given exponent range.
    pub fn with_exponent_range(&self, e_min: i64, e_max: i64) -> Self {
        self.with_big_exponent_range(BigInt::from(e_min), BigInt::from(e_max))
    }

    /// Copy with the given arbitrary-precision exponent range. `e_min` must
    /// not exceed `e_max`.
    pub fn with_big_exponent_range(&self, e_min: BigInt, e_max: BigInt) -> Self {
        debug_assert!(e_min <= e_max);
        let mut pc = self.clone();
        pc.has_exponent_range = true;
        pc.e_min = e_min;
        pc.e_max = e_max;
        pc
    }

    /// Copy with no exponent bounds.
    pub fn with_unlimited_exponents(&self) -> Self {
        let mut pc = self.clone();
        pc.has_exponent_range = false;
        pc
    }

    /// Copy with the given precision; zero means unlimited.
    pub fn with_precision(&self, precision: u64) -> Self {
        let mut pc = self.clone();
        pc.precision = BigInt::from(precision);
        pc
    }

    /// Copy with the given arbitrary precision; must not be negative.
    pub fn with_big_precision(&self, precision: BigInt) -> Self {
        debug_assert!(precision.signum() >= 0);
        let mut pc = self.clone();
        pc.precision = precision;
        pc
    }

    /// Copy with simplified-arithmetic semantics enabled.
    pub fn with_simplified_arithmetic(&self, simplified: bool) -> Self {
        let mut pc = self.clone();
        pc.simplified = simplified;
        pc
    }

    /// No limit on precision; half-up rounding.
    pub fn unlimited() -> Self {
        Self::for_precision(0)
    }

    /// 9 digits precision, half-up rounding, unlimited exponent range.
    pub fn basic() -> Self {
        Self::for_precision_and_rounding(9, Rounding::HalfUp)
    }

    /// IEEE 754-2008 binary16: 11 bits precision.
    pub fn binary16() -> Self {
        Self::for_precision_and_rounding(11, Rounding::HalfEven)
            .with_exponent_clamp(true)
            .with_exponent_range(-14, 15)
    }

    /// IEEE 754-2008 binary32: 24 bits precision.
    pub fn binary32() -> Self {
        Self::for_precision_and_rounding(24, Rounding::HalfEven)
            .with_exponent_clamp(true)
            .with_exponent_range(-126, 127)
    }

    /// IEEE 754-2008 binary64: 53 bits precision.
    pub fn binary64() -> Self {
        Self::for_precision_and_rounding(53, Rounding::HalfEven)
            .with_exponent_clamp(true)
            .with_exponent_range(-1022, 1023)
    }

    /// IEEE 754-2008 binary128: 113 bits precision.
    pub fn binary128() -> Self {
        Self::for_precision_and_rounding(113, Rounding::HalfEven)
            .with_exponent_clamp(true)
            .with_exponent_range(-16382, 16383)
    }

    /// IEEE 754-2008 decimal32.
    pub fn decimal32() -> Self {
        Self::new(7, Rounding::HalfEven, -95, 96, true)
    }

    /// IEEE 754-2008 decimal64.
    pub fn decimal64() -> Self {
        Self::new(16, Rounding::HalfEven, -383, 384, true)
    }

    /// IEEE 754-2008 decimal128.
    pub fn decimal128() -> Self {
        Self::new(34, Rounding::HalfEven, -6143, 6144, true)
    }

    /// The Common Language Infrastructure decimal format: 96 bits of
    /// mantissa precision, exponent range 0 to 28. Use binary-precision
    /// rounding to convert decimal fractions to this format.
    pub fn cli_decimal() -> Self {
        Self::new(96, Rounding::HalfEven, 0, 28, true)
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_builders() {
        let ctx = PrecisionContext::for_precision(5);
        assert_eq!(*ctx.precision(), BigInt::from(5));
        assert!(!ctx.has_exponent_range());
        assert_eq!(ctx.rounding(), Rounding::HalfUp);

        let ctx = ctx.with_rounding(Rounding::Floor).with_exponent_range(-10, 10);
        assert_eq!(ctx.rounding(), Rounding::Floor);
        assert!(ctx.has_exponent_range());
        assert_eq!(ctx.e_min(), BigInt::from(-10));
        assert_eq!(ctx.e_max(), BigInt::from(10));
        assert_eq!(ctx.e_tiny(), BigInt::from(-14));
    }

    #[test]
    fn test_flags_and_traps() {
        let mut ctx = PrecisionContext::for_precision(3);
        // without has_flags, signals are not recorded
        ctx.signal(FLAG_INEXACT).unwrap();
        assert_eq!(ctx.flags(), 0);

        let mut ctx = ctx.with_blank_flags();
        ctx.signal(FLAG_INEXACT | FLAG_ROUNDED).unwrap();
        assert_eq!(ctx.flags(), FLAG_INEXACT | FLAG_ROUNDED);

        let mut ctx = ctx.with_traps(FLAG_OVERFLOW);
        ctx.signal(FLAG_ROUNDED).unwrap();
        assert_eq!(
            ctx.signal(FLAG_OVERFLOW | FLAG_INEXACT),
            Err(Error::Trap(FLAG_OVERFLOW))
        );
        // the flag is still recorded before the trap aborts
        assert_ne!(ctx.flags() & FLAG_OVERFLOW, 0);
    }

    #[test]
    fn test_exponent_within_range() {
        let ctx = PrecisionContext::new(3, Rounding::HalfEven, -100, 100, false);
        assert!(ctx.exponent_within_range(&BigInt::from(0)));
        assert!(ctx.exponent_within_range(&BigInt::from(100)));
        assert!(!ctx.exponent_within_range(&BigInt::from(101)));
        assert!(ctx.exponent_within_range(&BigInt::from(-102)));
        assert!(!ctx.exponent_within_range(&BigInt::from(-103)));

        let unlimited = PrecisionContext::unlimited();
        assert!(unlimited.exponent_within_range(&BigInt::from(1_000_000)));
    }

    #[test]
    fn test_predefined() {
        assert_eq!(*PrecisionContext::decimal32().precision(), BigInt::from(7));
        assert_eq!(PrecisionContext::decimal32().e_max(), BigInt::from(96));
        assert_eq!(PrecisionContext::decimal128().e_min(), BigInt::from(-6143));
        assert_eq!(*PrecisionContext::binary64().precision(), BigInt::from(53));
        assert!(PrecisionContext::binary64().clamp_normal_exponents());
        assert_eq!(*PrecisionContext::cli_decimal().precision(), BigInt::from(96));
        assert!(PrecisionContext::unlimited().precision().is_zero());
    }
}
