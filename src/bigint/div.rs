//! Magnitude division.
//!
//! The general path is Knuth's Algorithm D: the divisor is normalised so
//! its top bit is set, the dividend is swept two limbs at a time from the
//! high end, and each quotient limb pair starts from a deliberate
//! under-estimate that a short correction loop repairs. A single-limb
//! divisor short-circuits to a linear 32-by-16 sweep.

use crate::bigint::arith;
use crate::defs::DoubleLimb;
use crate::defs::Limb;
use crate::defs::LIMB_BIT_SIZE;
use crate::defs::LIMB_MAX;
use smallvec::smallvec;
use smallvec::SmallVec;

use super::mul;

// Scratch buffers stay on the stack for small operands.
type Scratch = SmallVec<[Limb; 64]>;

#[inline]
fn make_uint(lo: Limb, hi: Limb) -> DoubleLimb {
    lo as DoubleLimb | ((hi as DoubleLimb) << LIMB_BIT_SIZE)
}

/// Divides the three-limb window `a` by the two-limb divisor `(b0, b1)`,
/// leaving the remainder in the window. The initial estimate divides the top
/// two limbs by `b1 + 1`, which cannot overshoot; the loop then corrects
/// upward, at most a couple of iterations for a normalised divisor.
fn divide_three_limbs_by_two(a: &mut [Limb], b0: Limb, b1: Limb) -> Limb {
    debug_assert!(a[2] < b1 || (a[2] == b1 && a[1] < b0));

    let mut q: DoubleLimb = if b1 == LIMB_MAX {
        a[2] as DoubleLimb
    } else if b1 > 0 {
        make_uint(a[1], a[2]) / (b1 as DoubleLimb + 1)
    } else {
        make_uint(a[0], a[1]) / b0 as DoubleLimb
    };

    let b = ((b1 as u64) << LIMB_BIT_SIZE) | b0 as u64;
    let mut r = ((a[2] as u64) << (2 * LIMB_BIT_SIZE)) | ((a[1] as u64) << LIMB_BIT_SIZE) | a[0] as u64;

    r -= q as u64 * b;
    while r >= b {
        q += 1;
        r -= b;
    }

    a[0] = r as Limb;
    a[1] = (r >> LIMB_BIT_SIZE) as Limb;
    a[2] = (r >> (2 * LIMB_BIT_SIZE)) as Limb;
    q as Limb
}

// Divides the four-limb value (al, ah) by the two-limb b, returning the
// two-limb quotient. The three-by-two step runs twice over a shared window.
fn divide_four_limbs_by_two(al: DoubleLimb, ah: DoubleLimb, b: DoubleLimb) -> DoubleLimb {
    if b == 0 {
        // degenerate divisor; top limbs pass through
        return make_uint(al as Limb, (ah >> LIMB_BIT_SIZE) as Limb);
    }
    let mut t = [
        al as Limb,
        (al >> LIMB_BIT_SIZE) as Limb,
        ah as Limb,
        (ah >> LIMB_BIT_SIZE) as Limb,
    ];
    let b0 = b as Limb;
    let b1 = (b >> LIMB_BIT_SIZE) as Limb;
    let q1 = divide_three_limbs_by_two(&mut t[1..4], b0, b1);
    let q0 = divide_three_limbs_by_two(&mut t[0..3], b0, b1);
    make_uint(q0, q1)
}

// Estimates the next quotient limb pair from the top four limbs of the
// working remainder and the incremented top divisor pair `bt`.
fn atomic_divide(q: &mut [Limb], a: &[Limb], bt: &[Limb; 2]) {
    let v = divide_four_limbs_by_two(
        make_uint(a[0], a[1]),
        make_uint(a[2], a[3]),
        make_uint(bt[0], bt[1]),
    );
    q[0] = v as Limb;
    q[1] = (v >> LIMB_BIT_SIZE) as Limb;
}

// Applies the estimated quotient pair: subtracts q * b from the remainder
// window and bumps q while the window still holds at least b.
fn correct_quotient_estimate(
    r: &mut [Limb],
    tp: &mut [Limb],
    q: &mut [Limb],
    b: &[Limb],
    nb: usize,
) {
    let (prod, scratch) = tp.split_at_mut(nb + 2);
    mul::asymmetric_multiply(prod, scratch, &q[..2], 2, &b[..nb], nb);

    let mut borrow = 0;
    for i in 0..nb + 2 {
        borrow = arith::sub_borrow(r[i], prod[i], borrow, &mut r[i]);
    }
    debug_assert!(borrow == 0);

    while r[nb] != 0 || arith::compare(r, b, nb) >= 0 {
        let borrow = {
            let mut c = 0;
            for i in 0..nb {
                c = arith::sub_borrow(r[i], b[i], c, &mut r[i]);
            }
            c
        };
        r[nb] = r[nb].wrapping_sub(borrow);
        q[0] = q[0].wrapping_add(1);
        if q[0] == 0 {
            q[1] = q[1].wrapping_add(1);
        }
    }
}

/// Knuth Algorithm D over even-length operands (`na`, `nb` even, `nb >= 2`,
/// `na >= nb`). The quotient needs `na - nb + 2` limbs, the remainder `nb`.
pub fn divide_core(
    mut rem: Option<&mut [Limb]>,
    q: &mut [Limb],
    a: &[Limb],
    na: usize,
    b: &[Limb],
    nb: usize,
) {
    debug_assert!(na % 2 == 0 && nb % 2 == 0 && nb >= 2 && na >= nb);

    // normalise the divisor so its top limb has the high bit set; padding
    // to an even count may have left a zero top limb, shift one limb first
    let shift_limbs = usize::from(b[nb - 1] == 0);
    let mut tb: Scratch = smallvec![0; nb];
    tb[shift_limbs..nb].copy_from_slice(&b[..nb - shift_limbs]);
    let shift_bits = LIMB_BIT_SIZE - arith::bit_precision(tb[nb - 1]);
    arith::shift_bits_left(&mut tb, nb, shift_bits);

    let mut ta: Scratch = smallvec![0; na + 2];
    ta[shift_limbs..shift_limbs + na].copy_from_slice(&a[..na]);
    arith::shift_bits_left(&mut ta, na + 2, shift_bits);

    let mut nwork = na;
    if ta[na + 1] == 0 && ta[na] <= 1 {
        // the top window is already smaller than the divisor; handle the
        // highest quotient limb by repeated subtraction and skip the
        // two-limb extension
        q[na - nb + 1] = 0;
        q[na - nb] = 0;
        while ta[na] != 0 || arith::compare(&ta[na - nb..], &tb, nb) >= 0 {
            let mut c = 0;
            for i in 0..nb {
                c = arith::sub_borrow(ta[na - nb + i], tb[i], c, &mut ta[na - nb + i]);
            }
            ta[na] = ta[na].wrapping_sub(c);
            q[na - nb] = q[na - nb].wrapping_add(1);
        }
    } else {
        nwork += 2;
    }

    // predecessor-style divisor estimate: top pair of the normalised
    // divisor plus one, giving under-estimates in the atomic step
    let bt0 = tb[nb - 2].wrapping_add(1);
    let bt1 = tb[nb - 1].wrapping_add(Limb::from(bt0 == 0));
    let bt = [bt0, bt1];

    let mut tp: Scratch = smallvec![0; 2 * (nb + 2)];

    let mut i = nwork as isize - 2;
    while i >= nb as isize {
        let iu = i as usize;
        atomic_divide(&mut q[iu - nb..iu - nb + 2], &ta[iu - 2..iu + 2], &bt);
        correct_quotient_estimate(
            &mut ta[iu - nb..iu + 2],
            &mut tp,
            &mut q[iu - nb..iu - nb + 2],
            &tb,
            nb,
        );
        i -= 2;
    }

    if let Some(r) = rem.as_deref_mut() {
        r[..nb].copy_from_slice(&ta[shift_limbs..shift_limbs + nb]);
        arith::shift_bits_right(r, nb, shift_bits);
    }
}

/// Quotient sweep for a single-limb divisor.
pub fn fast_divide(q: &mut [Limb], a: &[Limb], count: usize, divisor: Limb) {
    let d = divisor as DoubleLimb;
    let mut remainder: DoubleLimb = 0;
    for i in (0..count).rev() {
        let cur = (remainder << LIMB_BIT_SIZE) | a[i] as DoubleLimb;
        q[i] = (cur / d) as Limb;
        remainder = cur % d;
    }
}

/// Remainder sweep for a single-limb divisor.
pub fn fast_remainder(a: &[Limb], count: usize, divisor: Limb) -> Limb {
    let d = divisor as DoubleLimb;
    let mut remainder: DoubleLimb = 0;
    for i in (0..count).rev() {
        let cur = (remainder << LIMB_BIT_SIZE) | a[i] as DoubleLimb;
        remainder = cur % d;
    }
    remainder as Limb
}

/// In-place quotient-and-remainder sweep for a single-limb divisor.
pub fn fast_divide_and_remainder(q: &mut [Limb], count: usize, divisor: Limb) -> Limb {
    let d = divisor as DoubleLimb;
    let mut remainder: DoubleLimb = 0;
    for i in (0..count).rev() {
        let cur = (remainder << LIMB_BIT_SIZE) | q[i] as DoubleLimb;
        q[i] = (cur / d) as Limb;
        remainder = cur % d;
    }
    remainder as Limb
}

#[cfg(test)]
mod tests {

    use super::*;
    use rand::random;

    // schoolbook reference: r = q*b + rem, checked limbwise
    fn check(a: &[Limb], na: usize, b: &[Limb], nb: usize) {
        let mut q = vec![0 as Limb; na - nb + 2];
        let mut rem = vec![0 as Limb; nb];
        divide_core(Some(&mut rem), &mut q, a, na, b, nb);

        // multiply back
        let mut prod = vec![0 as Limb; q.len() + nb];
        for i in 0..q.len() {
            let mut k: DoubleLimb = 0;
            for j in 0..nb {
                let p = q[i] as DoubleLimb * b[j] as DoubleLimb + prod[i + j] as DoubleLimb + k;
                prod[i + j] = p as Limb;
                k = p >> LIMB_BIT_SIZE;
            }
            prod[i + nb] = prod[i + nb].wrapping_add(k as Limb);
        }
        let mut c = 0;
        for i in 0..nb {
            c = arith::add_carry(prod[i], rem[i], c, &mut prod[i]);
        }
        if c != 0 {
            arith::increment(&mut prod[nb..], 1);
        }
        assert_eq!(&prod[..na], &a[..na]);
        for v in &prod[na..] {
            assert_eq!(*v, 0);
        }
        // remainder < divisor
        assert!(arith::compare_uneven(&rem, b) < 0);
    }

    #[test]
    fn test_divide_core() {
        for (na, nb) in [(4, 2), (8, 2), (8, 4), (16, 6), (32, 16), (64, 10)] {
            for _ in 0..200 {
                let mut a: Vec<Limb> = (0..na).map(|_| random()).collect();
                let mut b: Vec<Limb> = (0..nb).map(|_| random()).collect();
                if arith::count_limbs(&b) < 2 {
                    b[1] = 1;
                }
                // exercise the padded-top-limb path half the time
                if random::<bool>() {
                    b[nb - 1] = 0;
                    a[na - 1] = 0;
                }
                if arith::count_limbs(&b) < 2 {
                    b[0] = 1;
                    b[1] = 1;
                }
                check(&a, na, &b, nb);
            }
        }
    }

    #[test]
    fn test_divide_exact_and_small() {
        // a == b
        let b = [3, 9, 1, 0x8000u16 as Limb];
        check(&b.clone(), 4, &b, 4);

        // a < b
        let a = [1, 0, 0, 0];
        check(&a, 4, &b, 4);

        // maximum dividend
        let a = [LIMB_MAX; 8];
        let b = [LIMB_MAX, LIMB_MAX, 0, 0];
        check(&a, 8, &b, 4);
    }

    #[test]
    fn test_fast_divide() {
        for _ in 0..500 {
            let a: Vec<Limb> = (0..8).map(|_| random()).collect();
            let d: Limb = loop {
                let d = random();
                if d != 0 {
                    break d;
                }
            };
            let mut q = vec![0; 8];
            fast_divide(&mut q, &a, 8, d);
            let r = fast_remainder(&a, 8, d);

            let mut back = vec![0 as Limb; 9];
            back[8] = arith::linear_multiply(&mut back, &q, d, 8);
            arith::increment(&mut back, r);
            assert_eq!(&back[..8], &a[..]);
            assert_eq!(back[8], 0);

            let mut q2 = a.clone();
            let r2 = fast_divide_and_remainder(&mut q2, 8, d);
            assert_eq!(q2, q);
            assert_eq!(r2, r);
        }
    }
}
