//! Small-number-optimised integer.
//!
//! Counters and digit lengths are almost always tiny; `FastInt` keeps them
//! in a machine word and widens to a [`BigInt`] only when an operation
//! overflows the 32-bit path. Widening is one-way within a computation.

use crate::bigint::BigInt;

/// An integer that stays inline while it fits in 32 bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FastInt {
    /// Inline value.
    Small(i32),

    /// Widened value.
    Big(BigInt),
}

impl FastInt {
    /// Wraps an inline value.
    pub fn new(v: i32) -> Self {
        FastInt::Small(v)
    }

    /// Wraps a value already out of the inline range.
    pub fn from_big(v: BigInt) -> Self {
        match v.to_i32() {
            Ok(s) => FastInt::Small(s),
            Err(_) => FastInt::Big(v),
        }
    }

    /// Builds from an `i64`, widening if needed.
    pub fn from_i64(v: i64) -> Self {
        if let Ok(s) = i32::try_from(v) {
            FastInt::Small(s)
        } else {
            FastInt::Big(BigInt::from(v))
        }
    }

    /// Returns the inline value if the fast path is still authoritative.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            FastInt::Small(v) => Some(*v),
            FastInt::Big(_) => None,
        }
    }

    /// Value as an `i64` when it fits.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            FastInt::Small(v) => Some(*v as i64),
            FastInt::Big(v) => v.to_i64().ok(),
        }
    }

    /// Value widened to a [`BigInt`].
    pub fn to_big(&self) -> BigInt {
        match self {
            FastInt::Small(v) => BigInt::from(*v as i64),
            FastInt::Big(v) => v.clone(),
        }
    }

    /// Returns -1, 0, or 1.
    pub fn signum(&self) -> i32 {
        match self {
            FastInt::Small(v) => v.signum(),
            FastInt::Big(v) => v.signum(),
        }
    }

    /// True if equal to the given inline value.
    pub fn is_value(&self, v: i32) -> bool {
        matches!(self, FastInt::Small(s) if *s == v)
    }

    /// Adds an inline value.
    pub fn add_int(&self, v: i32) -> FastInt {
        match self {
            FastInt::Small(s) => match s.checked_add(v) {
                Some(r) => FastInt::Small(r),
                None => FastInt::Big(BigInt::from(*s as i64 + v as i64)),
            },
            FastInt::Big(b) => FastInt::Big(b + &BigInt::from(v as i64)),
        }
    }

    /// Subtracts an inline value.
    pub fn sub_int(&self, v: i32) -> FastInt {
        match self {
            FastInt::Small(s) => match s.checked_sub(v) {
                Some(r) => FastInt::Small(r),
                None => FastInt::Big(BigInt::from(*s as i64 - v as i64)),
            },
            FastInt::Big(b) => FastInt::Big(b - &BigInt::from(v as i64)),
        }
    }

    /// Adds another value.
    pub fn add(&self, other: &FastInt) -> FastInt {
        match (self, other) {
            (FastInt::Small(a), FastInt::Small(b)) => match a.checked_add(*b) {
                Some(r) => FastInt::Small(r),
                None => FastInt::Big(BigInt::from(*a as i64 + *b as i64)),
            },
            _ => FastInt::from_big(self.to_big() + other.to_big()),
        }
    }

    /// Subtracts another value.
    pub fn sub(&self, other: &FastInt) -> FastInt {
        match (self, other) {
            (FastInt::Small(a), FastInt::Small(b)) => match a.checked_sub(*b) {
                Some(r) => FastInt::Small(r),
                None => FastInt::Big(BigInt::from(*a as i64 - *b as i64)),
            },
            _ => FastInt::from_big(self.to_big() - other.to_big()),
        }
    }

    /// Multiplies by an inline value.
    pub fn mul_int(&self, v: i32) -> FastInt {
        match self {
            FastInt::Small(s) => match s.checked_mul(v) {
                Some(r) => FastInt::Small(r),
                None => FastInt::Big(BigInt::from(*s as i64 * v as i64)),
            },
            FastInt::Big(b) => FastInt::Big(b * &BigInt::from(v as i64)),
        }
    }

    /// Compares to an inline value.
    pub fn cmp_int(&self, v: i32) -> core::cmp::Ordering {
        match self {
            FastInt::Small(s) => s.cmp(&v),
            FastInt::Big(b) => b.cmp(&BigInt::from(v as i64)),
        }
    }
}

impl PartialOrd for FastInt {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FastInt {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        match (self, other) {
            (FastInt::Small(a), FastInt::Small(b)) => a.cmp(b),
            _ => self.to_big().cmp(&other.to_big()),
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_fastint() {
        let a = FastInt::new(5);
        assert_eq!(a.add_int(3), FastInt::Small(8));
        assert_eq!(a.sub_int(10), FastInt::Small(-5));
        assert_eq!(a.mul_int(4), FastInt::Small(20));
        assert_eq!(a.signum(), 1);
        assert!(a.is_value(5));
        assert_eq!(a.as_i32(), Some(5));
    }

    #[test]
    fn test_widening() {
        let a = FastInt::new(i32::MAX);
        let b = a.add_int(1);
        assert_eq!(b.as_i32(), None);
        assert_eq!(b.to_i64(), Some(i32::MAX as i64 + 1));

        let c = FastInt::new(i32::MIN).sub_int(1);
        assert_eq!(c.to_i64(), Some(i32::MIN as i64 - 1));

        let d = FastInt::new(1 << 20).mul_int(1 << 20);
        assert_eq!(d.to_i64(), Some(1i64 << 40));

        // narrow values constructed as big stay inline
        assert_eq!(FastInt::from_big(BigInt::from(7)), FastInt::Small(7));
    }

    #[test]
    fn test_ordering() {
        assert!(FastInt::new(2) < FastInt::new(3));
        assert!(FastInt::new(i32::MAX).add_int(1) > FastInt::new(i32::MAX));
        assert_eq!(FastInt::new(-1).cmp_int(0), core::cmp::Ordering::Less);
    }
}
