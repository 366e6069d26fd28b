//! Signed arbitrary-precision integer.
//!
//! A value is a sign, a little-endian vector of 16-bit limbs, and a
//! significant-limb count. The backing vector length always comes from a
//! fixed rounding table so repeated growth amortises. Values are immutable:
//! every operation returns a fresh `BigInt`.

use crate::defs::Error;
use crate::defs::Limb;
use crate::defs::Sign;
use crate::defs::LIMB_BIT_SIZE;
use lazy_static::lazy_static;

pub(crate) mod arith;
mod conv;
pub(crate) mod div;
pub(crate) mod mul;

lazy_static! {
    /// The number zero.
    pub static ref ZERO: BigInt = BigInt::default();

    /// The number one.
    pub static ref ONE: BigInt = BigInt::from(1);

    /// The number ten.
    pub static ref TEN: BigInt = BigInt::from(10);
}

/// An arbitrary-precision signed integer.
#[derive(Debug, Clone)]
pub struct BigInt {
    neg: bool,
    wc: usize,
    reg: Vec<Limb>,
}

impl Default for BigInt {
    fn default() -> Self {
        BigInt { neg: false, wc: 0, reg: vec![0, 0] }
    }
}

const ROUNDUP_SIZE_TABLE: [usize; 17] = [2, 2, 2, 4, 4, 8, 8, 8, 8, 16, 16, 16, 16, 16, 16, 16, 16];

#[inline]
fn bits_to_limbs(bits: usize) -> usize {
    (bits + LIMB_BIT_SIZE - 1) / LIMB_BIT_SIZE
}

impl BigInt {
    /// Rounds a limb count up to the next backing-array length.
    pub(crate) fn round_up_size(n: usize) -> usize {
        if n <= 16 {
            ROUNDUP_SIZE_TABLE[n]
        } else if n <= 32 {
            32
        } else if n <= 64 {
            64
        } else {
            1usize << (usize::BITS - (n - 1).leading_zeros())
        }
    }

    pub(crate) fn alloc(n: usize) -> BigInt {
        BigInt { neg: false, wc: 0, reg: vec![0; Self::round_up_size(n)] }
    }

    pub(crate) fn grow_for_carry(&mut self, carry: Limb) {
        let old = self.reg.len();
        self.reg.resize(Self::round_up_size(old + 1), 0);
        self.reg[old] = carry;
    }

    fn from_reg(reg: Vec<Limb>, neg: bool) -> BigInt {
        let wc = arith::count_limbs(&reg);
        BigInt { neg: neg && wc != 0, wc, reg }
    }

    /// Returns -1, 0, or 1.
    pub fn signum(&self) -> i32 {
        if self.wc == 0 {
            0
        } else if self.neg {
            -1
        } else {
            1
        }
    }

    /// The sign; zero reports positive.
    pub fn sign(&self) -> Sign {
        if self.neg && self.wc != 0 {
            Sign::Neg
        } else {
            Sign::Pos
        }
    }

    /// Returns true if the value is zero.
    pub fn is_zero(&self) -> bool {
        self.wc == 0
    }

    /// Returns true if the value is even.
    pub fn is_even(&self) -> bool {
        !self.unsigned_bit(0)
    }

    /// Absolute value.
    pub fn abs(&self) -> BigInt {
        let mut r = self.clone();
        r.neg = false;
        r
    }

    // Value of bit n of the magnitude.
    pub(crate) fn unsigned_bit(&self, n: usize) -> bool {
        if n / LIMB_BIT_SIZE >= self.reg.len() {
            false
        } else {
            (self.reg[n / LIMB_BIT_SIZE] >> (n % LIMB_BIT_SIZE)) & 1 != 0
        }
    }

    /// Value of bit `n` in the two's-complement representation.
    pub fn test_bit(&self, n: usize) -> bool {
        if self.signum() >= 0 {
            return self.unsigned_bit(n);
        }
        let limb_pos = n / LIMB_BIT_SIZE;
        if limb_pos >= self.reg.len() {
            return true;
        }
        // in two's complement, limbs below the lowest non-zero limb stay
        // zero and the rest invert, with one borrow at the boundary
        let mut tc_index = 0;
        while tc_index < limb_pos && self.reg[tc_index] == 0 {
            tc_index += 1;
        }
        let mut tc = self.reg[limb_pos];
        if tc_index == limb_pos {
            tc = tc.wrapping_sub(1);
        }
        tc = !tc;
        (tc >> (n % LIMB_BIT_SIZE)) & 1 != 0
    }

    /// Bits needed for the magnitude; 0 for zero.
    pub fn unsigned_bit_length(&self) -> usize {
        if self.wc == 0 {
            0
        } else {
            (self.wc - 1) * LIMB_BIT_SIZE + arith::bit_precision(self.reg[self.wc - 1])
        }
    }

    /// Bits needed for the value, excluding the sign. For negative values
    /// this is the bit length of the absolute value minus one, so both -1
    /// and 0 report 0.
    pub fn bit_length(&self) -> usize {
        if self.wc == 0 {
            return 0;
        }
        let mut top = self.reg[self.wc - 1];
        if self.neg {
            // |x| - 1 borrows into the top limb only when all lower limbs
            // are zero
            if self.reg[..self.wc - 1].iter().all(|&v| v == 0) {
                if top == 1 {
                    return (self.wc - 1) * LIMB_BIT_SIZE;
                }
                top -= 1;
            }
        }
        (self.wc - 1) * LIMB_BIT_SIZE + arith::bit_precision(top)
    }

    /// 2^e.
    pub(crate) fn pow2(e: usize) -> BigInt {
        let mut r = Self::alloc(bits_to_limbs(e + 1));
        r.reg[e / LIMB_BIT_SIZE] = 1 << (e % LIMB_BIT_SIZE);
        r.wc = e / LIMB_BIT_SIZE + 1;
        r
    }

    // Magnitude comparison.
    fn abs_cmp(&self, other: &BigInt) -> core::cmp::Ordering {
        match arith::compare_uneven(&self.reg[..self.wc], &other.reg[..other.wc]) {
            d if d > 0 => core::cmp::Ordering::Greater,
            d if d < 0 => core::cmp::Ordering::Less,
            _ => core::cmp::Ordering::Equal,
        }
    }

    // |a| + |b|, non-negative. Works over even limb spans; the rounded
    // backing arrays guarantee the padding limbs exist and read zero.
    fn positive_add(a: &BigInt, b: &BigInt) -> BigInt {
        let la = a.wc + (a.wc & 1);
        let lb = b.wc + (b.wc & 1);
        let (big, lbig, small, lsmall) = if la >= lb { (a, la, b, lb) } else { (b, lb, a, la) };
        let mut reg = vec![0 as Limb; Self::round_up_size(lbig + 2)];
        let mut c = arith::add_slices(&mut reg, &big.reg[..lsmall], &small.reg[..lsmall], lsmall);
        reg[lsmall..lbig].copy_from_slice(&big.reg[lsmall..lbig]);
        if c != 0 {
            c = arith::increment(&mut reg[lsmall..lbig], 1);
        }
        if c != 0 {
            reg[lbig] = 1;
        }
        Self::from_reg(reg, false)
    }

    // |a| - |b| with |a| >= |b|, non-negative.
    fn positive_subtract(a: &BigInt, b: &BigInt) -> BigInt {
        let la = a.wc + (a.wc & 1);
        let lb = b.wc + (b.wc & 1);
        let mut reg = vec![0 as Limb; Self::round_up_size(la)];
        let mut c = arith::sub_slices(&mut reg, &a.reg[..lb], &b.reg[..lb], lb);
        reg[lb..la].copy_from_slice(&a.reg[lb..la]);
        if c != 0 {
            c = arith::decrement(&mut reg[lb..la], 1);
        }
        debug_assert!(c == 0);
        Self::from_reg(reg, false)
    }

    fn add_impl(&self, other: &BigInt) -> BigInt {
        if self.wc == 0 {
            return other.clone();
        }
        if other.wc == 0 {
            return self.clone();
        }
        if self.neg == other.neg {
            let mut r = Self::positive_add(self, other);
            r.neg = self.neg;
            return r;
        }
        match self.abs_cmp(other) {
            core::cmp::Ordering::Equal => BigInt::default(),
            core::cmp::Ordering::Greater => {
                let mut r = Self::positive_subtract(self, other);
                r.neg = self.neg && r.wc != 0;
                r
            }
            core::cmp::Ordering::Less => {
                let mut r = Self::positive_subtract(other, self);
                r.neg = other.neg && r.wc != 0;
                r
            }
        }
    }

    fn sub_impl(&self, other: &BigInt) -> BigInt {
        if other.wc == 0 {
            return self.clone();
        }
        self.add_impl(&-other.clone())
    }

    fn mul_impl(&self, other: &BigInt) -> BigInt {
        if self.wc == 0 || other.wc == 0 {
            return BigInt::default();
        }
        let neg = self.neg != other.neg;
        if self.wc == 1 && self.reg[0] == 1 {
            return Self::from_reg(other.reg.clone(), neg);
        }
        if other.wc == 1 && other.reg[0] == 1 {
            return Self::from_reg(self.reg.clone(), neg);
        }
        if self.wc == 1 || other.wc == 1 {
            let (long, short) = if self.wc == 1 { (other, self) } else { (self, other) };
            let mut reg = vec![0 as Limb; Self::round_up_size(long.wc + 1)];
            reg[long.wc] = arith::linear_multiply(&mut reg, &long.reg, short.reg[0], long.wc);
            return Self::from_reg(reg, neg);
        }

        let na = Self::round_up_size(self.wc);
        let nb = Self::round_up_size(other.wc);
        let mut reg = vec![0 as Limb; Self::round_up_size(na + nb)];
        let mut workspace = vec![0 as Limb; na + nb];
        if na == nb && self.abs_cmp(other) == core::cmp::Ordering::Equal {
            mul::recursive_square(&mut reg, &mut workspace, &self.reg[..na], na);
        } else {
            mul::asymmetric_multiply(&mut reg, &mut workspace, &self.reg[..na], na, &other.reg[..nb], nb);
        }
        Self::from_reg(reg, neg)
    }

    /// Quotient and remainder in one division. The quotient truncates
    /// toward zero; the remainder takes the sign of the dividend.
    pub fn div_rem(&self, divisor: &BigInt) -> Result<(BigInt, BigInt), Error> {
        if divisor.wc == 0 {
            return Err(Error::DivisionByZero);
        }
        if self.wc == 0 {
            return Ok((BigInt::default(), BigInt::default()));
        }
        if self.abs_cmp(divisor) == core::cmp::Ordering::Less {
            return Ok((BigInt::default(), self.clone()));
        }
        if self.wc <= 2 && divisor.wc <= 2 {
            // both fit in 32 bits; i64 arithmetic is exact
            let a = self.small_i64();
            let b = divisor.small_i64();
            return Ok(((a / b).into(), (a % b).into()));
        }
        let qneg = self.neg != divisor.neg;
        if divisor.wc == 1 {
            let mut qreg = self.reg.clone();
            let rem = div::fast_divide_and_remainder(&mut qreg, self.wc, divisor.reg[0]);
            let q = Self::from_reg(qreg, qneg);
            let mut r: BigInt = (rem as i64).into();
            r.neg = self.neg && r.wc != 0;
            return Ok((q, r));
        }

        let na = self.wc + (self.wc & 1);
        let nb = divisor.wc + (divisor.wc & 1);
        let mut qreg = vec![0 as Limb; Self::round_up_size(na - nb + 2)];
        let mut rreg = vec![0 as Limb; Self::round_up_size(nb)];
        div::divide_core(
            Some(&mut rreg[..nb]),
            &mut qreg,
            &self.reg[..na],
            na,
            &divisor.reg[..nb],
            nb,
        );
        let q = Self::from_reg(qreg, qneg);
        let r = Self::from_reg(rreg, self.neg);
        Ok((q, r))
    }

    /// Quotient rounded toward zero. See also the `/` operator, which
    /// panics on a zero divisor.
    pub fn checked_div(&self, divisor: &BigInt) -> Result<BigInt, Error> {
        if divisor.wc == 0 {
            return Err(Error::DivisionByZero);
        }
        if self.wc == 0 || self.abs_cmp(divisor) == core::cmp::Ordering::Less {
            return Ok(BigInt::default());
        }
        if self.wc <= 2 && divisor.wc <= 2 {
            return Ok((self.small_i64() / divisor.small_i64()).into());
        }
        if divisor.wc == 1 {
            let mut qreg = self.reg.clone();
            div::fast_divide_and_remainder(&mut qreg, self.wc, divisor.reg[0]);
            return Ok(Self::from_reg(qreg, self.neg != divisor.neg));
        }
        Ok(self.div_rem(divisor)?.0)
    }

    /// Remainder with the sign of the dividend.
    pub fn checked_rem(&self, divisor: &BigInt) -> Result<BigInt, Error> {
        if divisor.wc == 0 {
            return Err(Error::DivisionByZero);
        }
        if self.wc == 0 || self.abs_cmp(divisor) == core::cmp::Ordering::Less {
            return Ok(self.clone());
        }
        if self.wc <= 2 && divisor.wc <= 2 {
            return Ok((self.small_i64() % divisor.small_i64()).into());
        }
        if divisor.wc == 1 {
            let rem = div::fast_remainder(&self.reg, self.wc, divisor.reg[0]);
            let mut r: BigInt = (rem as i64).into();
            r.neg = self.neg && r.wc != 0;
            return Ok(r);
        }
        Ok(self.div_rem(divisor)?.1)
    }

    /// Modulus remainder: always in `[0, divisor)` for a positive divisor.
    pub fn modulo(&self, divisor: &BigInt) -> Result<BigInt, Error> {
        if divisor.signum() < 0 {
            return Err(Error::DivisionByZero);
        }
        let rem = self.checked_rem(divisor)?;
        if rem.signum() < 0 {
            Ok(divisor - &rem.abs())
        } else {
            Ok(rem)
        }
    }

    /// Shifts left by `n` bits; negative `n` shifts right.
    pub fn shift_left(&self, n: i64) -> BigInt {
        if n == 0 || self.wc == 0 {
            return self.clone();
        }
        if n < 0 {
            return self.shift_right(-n);
        }
        let n = n as usize;
        let shift_limbs = n / LIMB_BIT_SIZE;
        let shift_bits = n % LIMB_BIT_SIZE;
        let total = self.wc + bits_to_limbs(n) + 1;
        let mut reg = vec![0 as Limb; Self::round_up_size(total)];
        reg[..self.wc].copy_from_slice(&self.reg[..self.wc]);
        arith::shift_limbs_left(&mut reg, total, shift_limbs);
        let carry = arith::shift_bits_left(&mut reg[shift_limbs..], total - shift_limbs, shift_bits);
        debug_assert!(carry == 0);
        Self::from_reg(reg, self.neg)
    }

    /// Shifts right by `n` bits with arithmetic (floor) semantics: for a
    /// negative value the magnitude is two's-complemented, shifted with
    /// sign extension, and complemented back. Negative `n` shifts left.
    pub fn shift_right(&self, n: i64) -> BigInt {
        if n == 0 || self.wc == 0 {
            return self.clone();
        }
        if n < 0 {
            return self.shift_left(-n);
        }
        let n = n as usize;
        let shift_limbs = n / LIMB_BIT_SIZE;
        let shift_bits = n % LIMB_BIT_SIZE;
        let num = self.wc;
        let mut reg = vec![0 as Limb; Self::round_up_size(num)];
        reg[..num].copy_from_slice(&self.reg[..num]);
        if self.neg {
            arith::twos_complement(&mut reg);
            arith::shift_limbs_right_sign_extend(&mut reg, num, shift_limbs);
            if num > shift_limbs {
                arith::shift_bits_right_sign_extend(&mut reg, num - shift_limbs, shift_bits);
            }
            arith::twos_complement(&mut reg);
        } else {
            arith::shift_limbs_right(&mut reg, num, shift_limbs);
            if num > shift_limbs {
                arith::shift_bits_right(&mut reg, num - shift_limbs, shift_bits);
            }
        }
        Self::from_reg(reg, self.neg)
    }

    /// Greatest common divisor of the magnitudes.
    pub fn gcd(&self, other: &BigInt) -> BigInt {
        if self.wc == 0 {
            return other.abs();
        }
        if other.wc == 0 {
            return self.abs();
        }
        let mut a = self.abs();
        let mut b = other.abs();
        if b == *ONE || a == b {
            return b;
        }
        if a == *ONE {
            return a;
        }
        while !a.is_zero() {
            if a < b {
                core::mem::swap(&mut a, &mut b);
            }
            // a >= b > 0, so the remainder always exists
            a = a.checked_rem(&b).unwrap_or_default();
        }
        b
    }

    /// Integer square root: the largest `s` with `s*s <= self`. Returns
    /// zero for values at or below zero.
    pub fn sqrt(&self) -> BigInt {
        if self.signum() <= 0 {
            return BigInt::default();
        }
        // Newton iteration seeded from a power of two above the root
        let mut x;
        let mut y = Self::pow2((self.unsigned_bit_length() + 1) / 2);
        loop {
            x = y;
            y = self.checked_div(&x).unwrap_or_default();
            y = &y + &x;
            y = y.shift_right(1);
            if y >= x {
                break;
            }
        }
        x
    }

    /// Raises the value to a small non-negative power.
    pub fn pow(&self, power: u32) -> BigInt {
        let mut r = ONE.clone();
        let mut v = self.clone();
        let mut e = power;
        while e != 0 {
            if e & 1 != 0 {
                r = &r * &v;
            }
            e >>= 1;
            if e != 0 {
                v = &v * &v;
            }
        }
        r
    }

    /// Raises the value to an arbitrary non-negative power.
    pub fn pow_big(&self, power: &BigInt) -> Result<BigInt, Error> {
        if power.signum() < 0 {
            return Err(Error::Unsupported);
        }
        if let Ok(small) = power.to_i64() {
            if small <= u32::MAX as i64 {
                return Ok(self.pow(small as u32));
            }
        }
        let mut r = ONE.clone();
        let mut v = self.clone();
        let mut e = power.clone();
        while !e.is_zero() {
            if e.test_bit(0) {
                r = &r * &v;
            }
            e = e.shift_right(1);
            if !e.is_zero() {
                v = &v * &v;
            }
        }
        Ok(r)
    }

    /// `self^power mod modulus` by square-and-multiply with per-step
    /// reduction. The power must be non-negative.
    pub fn mod_pow(&self, power: &BigInt, modulus: &BigInt) -> Result<BigInt, Error> {
        if power.signum() < 0 {
            return Err(Error::Unsupported);
        }
        if modulus.wc == 0 {
            return Err(Error::DivisionByZero);
        }
        let mut r = ONE.clone();
        let mut v = self.clone();
        let mut e = power.clone();
        while !e.is_zero() {
            if e.test_bit(0) {
                r = (&r * &v).checked_rem(modulus)?;
            }
            e = e.shift_right(1);
            if !e.is_zero() {
                v = (&v * &v).checked_rem(modulus)?;
            }
        }
        Ok(r)
    }

    // Value when wc <= 2, as i64 (always fits; minus sign applied).
    fn small_i64(&self) -> i64 {
        debug_assert!(self.wc <= 2);
        let mut v = self.reg[0] as i64;
        if self.wc > 1 {
            v |= (self.reg[1] as i64) << LIMB_BIT_SIZE;
        }
        if self.neg {
            -v
        } else {
            v
        }
    }

    // Value when it fits in i64, including i64::MIN.
    pub(crate) fn small_value(&self) -> Option<i64> {
        if self.wc > 4 {
            return None;
        }
        if self.wc == 4 && self.reg[3] & 0x8000 != 0 {
            return if self.neg
                && self.reg[3] == 0x8000
                && self.reg[2] == 0
                && self.reg[1] == 0
                && self.reg[0] == 0
            {
                Some(i64::MIN)
            } else {
                None
            };
        }
        let mut v: i64 = 0;
        for i in (0..self.wc).rev() {
            v = (v << LIMB_BIT_SIZE) | self.reg[i] as i64;
        }
        Some(if self.neg { -v } else { v })
    }

    /// Narrowing conversion to `i32`.
    ///
    /// ## Errors
    ///
    /// - Overflow: the value does not fit, with `i32::MIN` recognised.
    pub fn to_i32(&self) -> Result<i32, Error> {
        if self.wc > 2 {
            return Err(Error::Overflow);
        }
        if self.wc == 2 && self.reg[1] & 0x8000 != 0 {
            return if self.neg && self.reg[1] == 0x8000 && self.reg[0] == 0 {
                Ok(i32::MIN)
            } else {
                Err(Error::Overflow)
            };
        }
        if self.wc == 0 {
            return Ok(0);
        }
        Ok(self.small_i64() as i32)
    }

    /// Narrowing conversion to `i64`.
    ///
    /// ## Errors
    ///
    /// - Overflow: the value does not fit, with `i64::MIN` recognised.
    pub fn to_i64(&self) -> Result<i64, Error> {
        self.small_value().ok_or(Error::Overflow)
    }

    /// Narrowing conversion to `u64`; fails for negative values.
    pub fn to_u64(&self) -> Result<u64, Error> {
        if self.neg || self.wc > 4 {
            return Err(Error::Overflow);
        }
        let mut v: u64 = 0;
        for i in (0..self.wc).rev() {
            v = (v << LIMB_BIT_SIZE) | self.reg[i] as u64;
        }
        Ok(v)
    }
}

impl From<i64> for BigInt {
    fn from(v: i64) -> Self {
        let neg = v < 0;
        let mut u = v.unsigned_abs();
        let mut reg = vec![0 as Limb; 4];
        for x in reg.iter_mut() {
            *x = u as Limb;
            u >>= LIMB_BIT_SIZE;
        }
        Self::from_reg(reg, neg)
    }
}

impl From<i32> for BigInt {
    fn from(v: i32) -> Self {
        (v as i64).into()
    }
}

impl From<u64> for BigInt {
    fn from(mut v: u64) -> Self {
        let mut reg = vec![0 as Limb; 4];
        for x in reg.iter_mut() {
            *x = v as Limb;
            v >>= LIMB_BIT_SIZE;
        }
        Self::from_reg(reg, false)
    }
}

impl From<u32> for BigInt {
    fn from(v: u32) -> Self {
        (v as u64).into()
    }
}

impl PartialEq for BigInt {
    fn eq(&self, other: &Self) -> bool {
        self.neg == other.neg && self.wc == other.wc && self.reg[..self.wc] == other.reg[..other.wc]
    }
}

impl Eq for BigInt {}

impl core::hash::Hash for BigInt {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.neg.hash(state);
        self.reg[..self.wc].hash(state);
    }
}

impl PartialOrd for BigInt {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BigInt {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        let sa = self.signum();
        let sb = other.signum();
        if sa != sb {
            return sa.cmp(&sb);
        }
        if sa == 0 {
            return core::cmp::Ordering::Equal;
        }
        let m = self.abs_cmp(other);
        if sa > 0 {
            m
        } else {
            m.reverse()
        }
    }
}

impl core::fmt::Display for BigInt {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.to_string_impl())
    }
}

impl core::ops::Neg for BigInt {
    type Output = BigInt;

    fn neg(mut self) -> BigInt {
        if self.wc != 0 {
            self.neg = !self.neg;
        }
        self
    }
}

impl core::ops::Neg for &BigInt {
    type Output = BigInt;

    fn neg(self) -> BigInt {
        -self.clone()
    }
}

macro_rules! impl_binop {
    ($imp:ident, $method:ident, $delegate:ident) => {
        impl core::ops::$imp<&BigInt> for &BigInt {
            type Output = BigInt;

            fn $method(self, rhs: &BigInt) -> BigInt {
                self.$delegate(rhs)
            }
        }

        impl core::ops::$imp<BigInt> for BigInt {
            type Output = BigInt;

            fn $method(self, rhs: BigInt) -> BigInt {
                (&self).$delegate(&rhs)
            }
        }

        impl core::ops::$imp<&BigInt> for BigInt {
            type Output = BigInt;

            fn $method(self, rhs: &BigInt) -> BigInt {
                (&self).$delegate(rhs)
            }
        }

        impl core::ops::$imp<BigInt> for &BigInt {
            type Output = BigInt;

            fn $method(self, rhs: BigInt) -> BigInt {
                self.$delegate(&rhs)
            }
        }
    };
}

impl_binop!(Add, add, add_impl);
impl_binop!(Sub, sub, sub_impl);
impl_binop!(Mul, mul, mul_impl);
impl_binop!(Div, div, div_op);
impl_binop!(Rem, rem, rem_op);

impl BigInt {
    // operator backends; a zero divisor panics like primitive division
    fn div_op(&self, rhs: &BigInt) -> BigInt {
        match self.checked_div(rhs) {
            Ok(v) => v,
            Err(_) => panic!("attempt to divide by zero"),
        }
    }

    fn rem_op(&self, rhs: &BigInt) -> BigInt {
        match self.checked_rem(rhs) {
            Ok(v) => v,
            Err(_) => panic!("attempt to calculate the remainder with a divisor of zero"),
        }
    }
}

impl core::ops::Shl<u32> for BigInt {
    type Output = BigInt;

    fn shl(self, n: u32) -> BigInt {
        self.shift_left(n as i64)
    }
}

impl core::ops::Shl<u32> for &BigInt {
    type Output = BigInt;

    fn shl(self, n: u32) -> BigInt {
        self.shift_left(n as i64)
    }
}

impl core::ops::Shr<u32> for BigInt {
    type Output = BigInt;

    fn shr(self, n: u32) -> BigInt {
        self.shift_right(n as i64)
    }
}

impl core::ops::Shr<u32> for &BigInt {
    type Output = BigInt;

    fn shr(self, n: u32) -> BigInt {
        self.shift_right(n as i64)
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use rand::random;

    fn random_bigint(limbs: usize) -> BigInt {
        let mut v = BigInt::default();
        for _ in 0..limbs {
            v = (v << 16) + BigInt::from(random::<u16>() as i64);
        }
        if random::<bool>() {
            -v
        } else {
            v
        }
    }

    #[test]
    fn test_identities() {
        let zero = BigInt::default();
        let one = BigInt::from(1);
        for _ in 0..500 {
            let a = random_bigint(random::<usize>() % 24 + 1);
            assert_eq!(&a + &zero, a);
            assert_eq!(&a - &a, zero);
            assert_eq!(&a * &one, a);
            assert_eq!(&a * &zero, zero);
            assert_eq!(-(-a.clone()), a);
        }
    }

    #[test]
    fn test_add_sub() {
        for _ in 0..1000 {
            let a = random_bigint(random::<usize>() % 20 + 1);
            let b = random_bigint(random::<usize>() % 20 + 1);
            let s = &a + &b;
            assert_eq!(&s - &b, a);
            assert_eq!(&s - &a, b);
            assert_eq!(&a + &b, &b + &a);
        }

        // carry across many limbs
        let big = BigInt::pow2(320) - BigInt::from(1);
        assert_eq!(&big + &BigInt::from(1), BigInt::pow2(320));
    }

    #[test]
    fn test_mul_div() {
        for _ in 0..500 {
            let a = random_bigint(random::<usize>() % 40 + 1);
            let b = random_bigint(random::<usize>() % 12 + 1);
            if b.is_zero() {
                continue;
            }
            let p = &a * &b;
            assert_eq!(p.checked_div(&b).unwrap(), a);
            let (q, r) = a.div_rem(&b).unwrap();
            assert_eq!(&q * &b + &r, a);
            assert!(r.abs() < b.abs());
            // remainder sign follows the dividend
            assert!(r.is_zero() || (r.signum() == a.signum()));
        }
    }

    #[test]
    fn test_mul_commutative_and_square() {
        for _ in 0..200 {
            let a = random_bigint(random::<usize>() % 40 + 1);
            let b = random_bigint(random::<usize>() % 40 + 1);
            assert_eq!(&a * &b, &b * &a);
            assert_eq!(&a * &a, a.pow(2));
        }
    }

    #[test]
    fn test_div_by_zero() {
        let a = BigInt::from(5);
        assert_eq!(a.checked_div(&BigInt::default()), Err(Error::DivisionByZero));
        assert_eq!(a.checked_rem(&BigInt::default()), Err(Error::DivisionByZero));
    }

    #[test]
    fn test_shifts() {
        for _ in 0..500 {
            let a = random_bigint(random::<usize>() % 10 + 1).abs();
            let n = random::<u32>() % 100;
            assert_eq!((&a << n) >> n, a);
            assert_eq!(&a << n, &a * &BigInt::pow2(n as usize));
        }

        // arithmetic right shift of negatives rounds toward -infinity
        assert_eq!(BigInt::from(-1) >> 1, BigInt::from(-1));
        assert_eq!(BigInt::from(-5) >> 1, BigInt::from(-3));
        assert_eq!(BigInt::from(-4) >> 1, BigInt::from(-2));
        assert_eq!(BigInt::from(-1) >> 1000, BigInt::from(-1));
    }

    #[test]
    fn test_bits() {
        assert_eq!(BigInt::default().bit_length(), 0);
        assert_eq!(BigInt::from(-1).bit_length(), 0);
        assert_eq!(BigInt::from(1).bit_length(), 1);
        assert_eq!(BigInt::from(-2).bit_length(), 1);
        assert_eq!(BigInt::from(65535).bit_length(), 16);
        assert_eq!(BigInt::from(65536).bit_length(), 17);
        assert_eq!(BigInt::from(-65536).bit_length(), 16);

        assert!(BigInt::from(5).test_bit(0));
        assert!(!BigInt::from(5).test_bit(1));
        assert!(BigInt::from(5).test_bit(2));
        // -1 is all ones in two's complement
        for i in 0..100 {
            assert!(BigInt::from(-1).test_bit(i));
        }
        // -2 = ...11110
        assert!(!BigInt::from(-2).test_bit(0));
        assert!(BigInt::from(-2).test_bit(1));
    }

    #[test]
    fn test_gcd_lcm() {
        let gcd = BigInt::from(12).gcd(&BigInt::from(18));
        assert_eq!(gcd, BigInt::from(6));
        assert_eq!(BigInt::default().gcd(&BigInt::from(-7)), BigInt::from(7));

        for _ in 0..200 {
            let a = random_bigint(random::<usize>() % 8 + 1);
            let b = random_bigint(random::<usize>() % 8 + 1);
            if a.is_zero() || b.is_zero() {
                continue;
            }
            let g = a.gcd(&b);
            assert_eq!(a.checked_rem(&g).unwrap(), BigInt::default());
            assert_eq!(b.checked_rem(&g).unwrap(), BigInt::default());
            // gcd * lcm == |a*b|
            let lcm = (&a * &b).abs().checked_div(&g).unwrap();
            assert_eq!(&g * &lcm, (&a * &b).abs());
        }
    }

    #[test]
    fn test_sqrt() {
        assert_eq!(BigInt::default().sqrt(), BigInt::default());
        assert_eq!(BigInt::from(-4).sqrt(), BigInt::default());
        for _ in 0..300 {
            let a = random_bigint(random::<usize>() % 12 + 1).abs();
            let s = a.sqrt();
            assert!(&s * &s <= a);
            let s1 = &s + &BigInt::from(1);
            assert!(&s1 * &s1 > a);
        }
    }

    #[test]
    fn test_pow_modpow() {
        assert_eq!(BigInt::from(2).pow(10), BigInt::from(1024));
        assert_eq!(BigInt::from(-3).pow(3), BigInt::from(-27));
        assert_eq!(BigInt::from(7).pow(0), BigInt::from(1));
        assert_eq!(
            BigInt::from(2).pow_big(&BigInt::from(64)).unwrap(),
            BigInt::pow2(64)
        );
        assert_eq!(
            BigInt::from(2).pow_big(&BigInt::from(-1)),
            Err(Error::Unsupported)
        );

        // 2^10 mod 1000 = 24
        let r = BigInt::from(2)
            .mod_pow(&BigInt::from(10), &BigInt::from(1000))
            .unwrap();
        assert_eq!(r, BigInt::from(24));

        for _ in 0..50 {
            let b = random_bigint(2).abs();
            let e = BigInt::from((random::<u8>() % 20) as i64);
            let m = random_bigint(3).abs() + BigInt::from(1);
            let slow = b.pow(e.to_i32().unwrap() as u32).checked_rem(&m).unwrap();
            assert_eq!(b.mod_pow(&e, &m).unwrap(), slow);
        }
    }

    #[test]
    fn test_narrowing() {
        assert_eq!(BigInt::from(0).to_i32().unwrap(), 0);
        assert_eq!(BigInt::from(i32::MAX as i64).to_i32().unwrap(), i32::MAX);
        assert_eq!(BigInt::from(i32::MIN as i64).to_i32().unwrap(), i32::MIN);
        assert_eq!(
            BigInt::from(i32::MAX as i64 + 1).to_i32(),
            Err(Error::Overflow)
        );
        assert_eq!(
            BigInt::from(i32::MIN as i64 - 1).to_i32(),
            Err(Error::Overflow)
        );

        assert_eq!(BigInt::from(i64::MAX).to_i64().unwrap(), i64::MAX);
        assert_eq!(BigInt::from(i64::MIN).to_i64().unwrap(), i64::MIN);
        assert_eq!(
            (BigInt::from(i64::MAX) + BigInt::from(1)).to_i64(),
            Err(Error::Overflow)
        );
        assert_eq!(
            (BigInt::from(i64::MIN) - BigInt::from(1)).to_i64(),
            Err(Error::Overflow)
        );

        assert_eq!(BigInt::from(u64::MAX).to_u64().unwrap(), u64::MAX);
        assert_eq!(BigInt::from(-1).to_u64(), Err(Error::Overflow));
    }

    #[test]
    fn test_modulo() {
        assert_eq!(
            BigInt::from(-7).modulo(&BigInt::from(3)).unwrap(),
            BigInt::from(2)
        );
        assert_eq!(
            BigInt::from(7).modulo(&BigInt::from(3)).unwrap(),
            BigInt::from(1)
        );
    }

    #[test]
    fn test_ordering() {
        let mut vals: Vec<BigInt> = (0..50).map(|_| random_bigint(random::<usize>() % 6 + 1)).collect();
        vals.push(BigInt::default());
        vals.sort();
        for w in vals.windows(2) {
            let (a, b) = (&w[0], &w[1]);
            assert!(a <= b);
            let d = b - a;
            assert!(d.signum() >= 0);
        }
    }
}
