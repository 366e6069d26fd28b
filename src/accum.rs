//! Shift accumulators.
//!
//! Rounding needs to know three things after a mantissa loses digits: the
//! retained integer, the most significant discarded digit, and whether any
//! lower discarded digit was non-zero (the sticky state). The accumulators
//! track all three across repeated shifts so callers can apply any rounding
//! mode without re-dividing.

use crate::bigint::BigInt;
use crate::fastint::FastInt;

/// Common contract of the radix-10 and radix-2 accumulators.
pub trait ShiftAccumulator {
    /// Builds an accumulator over a non-negative mantissa with previously
    /// discarded rounding state.
    fn with_state(value: BigInt, last_digit: u8, sticky: bool) -> Self;

    /// The retained integer.
    fn shifted_int(&self) -> &BigInt;

    /// Consumes the accumulator, returning the retained integer.
    fn into_shifted_int(self) -> BigInt;

    /// Digit length of the retained integer in the accumulator's radix.
    fn digit_length(&self) -> FastInt;

    /// Total count of digits shifted off so far.
    fn discarded_count(&self) -> &FastInt;

    /// The most significant digit discarded by the latest shift.
    fn last_digit(&self) -> u8;

    /// True if any discarded digit below the last one was non-zero.
    fn sticky(&self) -> bool;

    /// Shifts right by a digit count.
    fn shift_right(&mut self, n: &FastInt);

    /// Shifts right until at most `n` digits remain.
    fn shift_to_digits(&mut self, n: &FastInt);
}

/// Radix-10 accumulator. Shifts of a handful of digits run as limb sweeps
/// dividing by 10^k (k <= 4); larger shifts use one big division, keeping
/// any shift O(limbs).
pub struct DigitShiftAccumulator {
    value: BigInt,
    discarded: FastInt,
    last: u8,
    any_older: bool,
    known_digits: Option<u64>,
}

const SMALL_POWERS_10: [i64; 5] = [1, 10, 100, 1_000, 10_000];

impl DigitShiftAccumulator {
    fn shift_right_small(&mut self, n: u32) {
        // n <= 4: a single divrem by a limb-sized power of ten
        debug_assert!(n >= 1 && n <= 4);
        let pow: BigInt = SMALL_POWERS_10[n as usize].into();
        let (q, r) = self.value.div_rem(&pow).unwrap_or_default();
        let mut r = r.to_i64().unwrap_or(0);
        // split the remainder into the rounding digit and the rest
        let below = SMALL_POWERS_10[n as usize - 1];
        self.any_older |= self.last != 0 || r % below != 0;
        r /= below;
        self.last = r as u8;
        self.value = q;
        self.discarded = self.discarded.add_int(n as i32);
        self.known_digits = None;
    }

    fn shift_right_big(&mut self, n: u64) {
        if self.value.is_zero() {
            self.any_older |= self.last != 0;
            self.last = 0;
            self.discarded = self.discarded.add(&FastInt::from_i64(n as i64));
            return;
        }
        let pow_below = BigInt::from(10).pow_big(&BigInt::from(n - 1)).unwrap_or_default();
        let (q1, r1) = self.value.div_rem(&pow_below).unwrap_or_default();
        let (q, d) = q1.div_rem(&BigInt::from(10)).unwrap_or_default();
        self.any_older |= self.last != 0 || !r1.is_zero();
        self.last = d.to_i32().unwrap_or(0) as u8;
        self.value = q;
        self.discarded = self.discarded.add(&FastInt::from_i64(n as i64));
        self.known_digits = None;
    }

    fn digits(&mut self) -> u64 {
        match self.known_digits {
            Some(d) => d,
            None => {
                let d = self.value.digit_count();
                self.known_digits = Some(d);
                d
            }
        }
    }
}

impl ShiftAccumulator for DigitShiftAccumulator {
    fn with_state(value: BigInt, last_digit: u8, sticky: bool) -> Self {
        debug_assert!(value.signum() >= 0);
        DigitShiftAccumulator {
            value,
            discarded: FastInt::new(0),
            last: last_digit,
            any_older: sticky,
            known_digits: None,
        }
    }

    fn shifted_int(&self) -> &BigInt {
        &self.value
    }

    fn into_shifted_int(self) -> BigInt {
        self.value
    }

    fn digit_length(&self) -> FastInt {
        FastInt::from_i64(self.value.digit_count() as i64)
    }

    fn discarded_count(&self) -> &FastInt {
        &self.discarded
    }

    fn last_digit(&self) -> u8 {
        self.last
    }

    fn sticky(&self) -> bool {
        self.any_older
    }

    fn shift_right(&mut self, n: &FastInt) {
        let left = match n.to_i64() {
            Some(v) if v > 0 => v as u64,
            _ => return,
        };
        if !self.value.is_zero() && left <= 4 {
            self.shift_right_small(left as u32);
        } else {
            self.shift_right_big(left);
        }
    }

    fn shift_to_digits(&mut self, n: &FastInt) {
        let target = match n.to_i64() {
            Some(v) if v >= 0 => v as u64,
            _ => return,
        };
        let digits = self.digits();
        if digits > target {
            self.shift_right(&FastInt::from_i64((digits - target) as i64));
        }
    }
}

/// Radix-2 accumulator used by the binary arithmetic kernel.
pub struct BitShiftAccumulator {
    value: BigInt,
    discarded: FastInt,
    last: u8,
    any_older: bool,
}

impl ShiftAccumulator for BitShiftAccumulator {
    fn with_state(value: BigInt, last_digit: u8, sticky: bool) -> Self {
        debug_assert!(value.signum() >= 0);
        BitShiftAccumulator {
            value,
            discarded: FastInt::new(0),
            last: last_digit,
            any_older: sticky,
        }
    }

    fn shifted_int(&self) -> &BigInt {
        &self.value
    }

    fn into_shifted_int(self) -> BigInt {
        self.value
    }

    fn digit_length(&self) -> FastInt {
        FastInt::from_i64(self.value.unsigned_bit_length().max(1) as i64)
    }

    fn discarded_count(&self) -> &FastInt {
        &self.discarded
    }

    fn last_digit(&self) -> u8 {
        self.last
    }

    fn sticky(&self) -> bool {
        self.any_older
    }

    fn shift_right(&mut self, n: &FastInt) {
        let n = match n.to_i64() {
            Some(v) if v > 0 => v,
            _ => return,
        };
        if self.value.is_zero() {
            self.any_older |= self.last != 0;
            self.last = 0;
            self.discarded = self.discarded.add(&FastInt::from_i64(n));
            return;
        }
        let keep_above = self.value.shift_right(n - 1);
        let below = &self.value - &keep_above.shift_left(n - 1);
        self.any_older |= self.last != 0 || !below.is_zero();
        self.last = u8::from(keep_above.test_bit(0));
        self.value = keep_above.shift_right(1);
        self.discarded = self.discarded.add(&FastInt::from_i64(n));
    }

    fn shift_to_digits(&mut self, n: &FastInt) {
        let target = match n.to_i64() {
            Some(v) if v >= 0 => v as u64,
            _ => return,
        };
        let bits = self.value.unsigned_bit_length() as u64;
        if bits > target {
            self.shift_right(&FastInt::from_i64((bits - target) as i64));
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    fn digit_acc(v: i64) -> DigitShiftAccumulator {
        DigitShiftAccumulator::with_state(BigInt::from(v), 0, false)
    }

    #[test]
    fn test_digit_shift() {
        let mut acc = digit_acc(123_456);
        acc.shift_right(&FastInt::new(2));
        assert_eq!(*acc.shifted_int(), BigInt::from(1234));
        assert_eq!(acc.last_digit(), 5);
        assert!(acc.sticky());
        assert_eq!(acc.discarded_count().to_i64(), Some(2));

        // a second shift folds the previous rounding digit into sticky
        acc.shift_right(&FastInt::new(1));
        assert_eq!(*acc.shifted_int(), BigInt::from(123));
        assert_eq!(acc.last_digit(), 4);
        assert!(acc.sticky());
        assert_eq!(acc.discarded_count().to_i64(), Some(3));
    }

    #[test]
    fn test_digit_shift_exact() {
        let mut acc = digit_acc(120_000);
        acc.shift_right(&FastInt::new(3));
        assert_eq!(*acc.shifted_int(), BigInt::from(120));
        assert_eq!(acc.last_digit(), 0);
        assert!(!acc.sticky());

        // half-way state: rounding digit 5, nothing below
        let mut acc = digit_acc(1250);
        acc.shift_right(&FastInt::new(2));
        assert_eq!(*acc.shifted_int(), BigInt::from(12));
        assert_eq!(acc.last_digit(), 5);
        assert!(!acc.sticky());
    }

    #[test]
    fn test_digit_shift_large() {
        // 10^40 + 1 shifted by 35 digits: all the evidence is in sticky
        let v = BigInt::from(10).pow(40) + BigInt::from(1);
        let mut acc = DigitShiftAccumulator::with_state(v, 0, false);
        acc.shift_right(&FastInt::new(35));
        assert_eq!(*acc.shifted_int(), BigInt::from(100_000));
        assert_eq!(acc.last_digit(), 0);
        assert!(acc.sticky());
    }

    #[test]
    fn test_shift_to_digits() {
        let mut acc = digit_acc(987_654_321);
        acc.shift_to_digits(&FastInt::new(3));
        assert_eq!(*acc.shifted_int(), BigInt::from(987));
        assert_eq!(acc.last_digit(), 6);
        assert!(acc.sticky());

        // already short enough: no change
        let mut acc = digit_acc(42);
        acc.shift_to_digits(&FastInt::new(5));
        assert_eq!(*acc.shifted_int(), BigInt::from(42));
        assert_eq!(acc.last_digit(), 0);
        assert!(!acc.sticky());
    }

    #[test]
    fn test_shift_past_zero() {
        let mut acc = digit_acc(7);
        acc.shift_right(&FastInt::new(1));
        assert_eq!(*acc.shifted_int(), BigInt::default());
        assert_eq!(acc.last_digit(), 7);
        assert!(!acc.sticky());

        acc.shift_right(&FastInt::new(10));
        assert_eq!(acc.last_digit(), 0);
        assert!(acc.sticky());
    }

    #[test]
    fn test_bit_shift() {
        // 0b1011_0100
        let mut acc = BitShiftAccumulator::with_state(BigInt::from(0b1011_0100), 0, false);
        acc.shift_right(&FastInt::new(3));
        assert_eq!(*acc.shifted_int(), BigInt::from(0b1_0110));
        assert_eq!(acc.last_digit(), 1);
        assert!(!acc.sticky());

        acc.shift_right(&FastInt::new(2));
        assert_eq!(*acc.shifted_int(), BigInt::from(0b101));
        assert_eq!(acc.last_digit(), 1);
        assert!(acc.sticky());

        let mut acc = BitShiftAccumulator::with_state(BigInt::from(0b1000), 0, false);
        acc.shift_to_digits(&FastInt::new(1));
        assert_eq!(*acc.shifted_int(), BigInt::from(1));
        assert_eq!(acc.last_digit(), 0);
        assert!(!acc.sticky());
    }
}
