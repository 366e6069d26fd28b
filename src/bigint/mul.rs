//! Magnitude multiplication and squaring.
//!
//! Operand lengths here are always even and, above the recursion cutoff,
//! powers of two (the facade pads with the capacity rounding table before
//! descending). `recursive_multiply` switches from schoolbook to Karatsuba
//! above [`RECURSION_LIMIT`] limbs.

use crate::bigint::arith;
use crate::defs::DoubleLimb;
use crate::defs::Limb;
use crate::defs::LIMB_BIT_SIZE;
use crate::defs::RECURSION_LIMIT;

// r[dst..dst+n] += r[src..src+n], windows may not overlap.
fn add_within(r: &mut [Limb], dst: usize, src: usize, n: usize) -> Limb {
    let mut c = 0;
    for i in 0..n {
        let s = r[dst + i] as DoubleLimb + r[src + i] as DoubleLimb + c as DoubleLimb;
        r[dst + i] = s as Limb;
        c = (s >> LIMB_BIT_SIZE) as Limb;
    }
    c
}

// r[dst..dst+n] = r[a..a+n] + r[b..b+n].
fn add_within3(r: &mut [Limb], dst: usize, a: usize, b: usize, n: usize) -> Limb {
    let mut c = 0;
    for i in 0..n {
        let s = r[a + i] as DoubleLimb + r[b + i] as DoubleLimb + c as DoubleLimb;
        r[dst + i] = s as Limb;
        c = (s >> LIMB_BIT_SIZE) as Limb;
    }
    c
}

// Adds the small signed value `v` at r[at..at+n], rippling carry or borrow.
fn apply_signed_carry(r: &mut [Limb], at: usize, n: usize, v: i32) {
    if v >= 0 {
        arith::increment(&mut r[at..at + n], v as Limb);
    } else {
        arith::decrement(&mut r[at..at + n], (-v) as Limb);
    }
}

/// Schoolbook product: r = a * b over `n` limbs each, r holding `2n`.
/// Serves every operand size up to the recursion cutoff.
pub fn baseline_multiply(r: &mut [Limb], a: &[Limb], b: &[Limb], n: usize) {
    r[..2 * n].fill(0);
    for i in 0..n {
        let ai = a[i] as DoubleLimb;
        if ai == 0 {
            continue;
        }
        let mut k: DoubleLimb = 0;
        for j in 0..n {
            let p = ai * b[j] as DoubleLimb + r[i + j] as DoubleLimb + k;
            r[i + j] = p as Limb;
            k = p >> LIMB_BIT_SIZE;
        }
        r[i + n] = k as Limb;
    }
}

/// Schoolbook square exploiting symmetry: cross products are accumulated
/// once and doubled, diagonals added afterwards.
pub fn baseline_square(r: &mut [Limb], a: &[Limb], n: usize) {
    r[..2 * n].fill(0);

    // cross terms a[i]*a[j], i < j
    for i in 0..n {
        let ai = a[i] as DoubleLimb;
        if ai == 0 {
            continue;
        }
        let mut k: DoubleLimb = 0;
        for j in i + 1..n {
            let p = ai * a[j] as DoubleLimb + r[i + j] as DoubleLimb + k;
            r[i + j] = p as Limb;
            k = p >> LIMB_BIT_SIZE;
        }
        r[i + n] = k as Limb;
    }

    // double the cross part
    let carry = arith::shift_bits_left(r, 2 * n, 1);
    debug_assert!(carry == 0);

    // diagonals a[i]^2 land at position 2i
    let mut c: DoubleLimb = 0;
    for i in 0..n {
        let sq = a[i] as DoubleLimb * a[i] as DoubleLimb;
        let s = r[2 * i] as DoubleLimb + (sq & 0xFFFF) + c;
        r[2 * i] = s as Limb;
        let s2 = r[2 * i + 1] as DoubleLimb + (sq >> LIMB_BIT_SIZE) + (s >> LIMB_BIT_SIZE);
        r[2 * i + 1] = s2 as Limb;
        c = s2 >> LIMB_BIT_SIZE;
    }
    debug_assert!(c == 0);
}

/// Karatsuba product. `r` receives the `2n`-limb result, `t` is a `2n`-limb
/// scratch buffer owned by this call tree.
///
/// The half differences are formed with their signs tracked in two offsets:
/// when the middle signs agree the cross term is subtracted, otherwise added.
pub fn recursive_multiply(r: &mut [Limb], t: &mut [Limb], a: &[Limb], b: &[Limb], n: usize) {
    debug_assert!(n >= 2 && n % 2 == 0);
    if n <= RECURSION_LIMIT {
        baseline_multiply(r, a, b, n);
        return;
    }
    let n2 = n / 2;

    // |a_lo - b_hi| into r[0..n2), |b_lo - b_hi| into r[n2..n), noting which
    // half was larger
    let an2 = if arith::compare(&a[..n2], &a[n2..], n2) > 0 { 0 } else { n2 };
    arith::sub_slices(&mut r[..n2], &a[an2..an2 + n2], &a[(n2 ^ an2)..(n2 ^ an2) + n2], n2);
    let bn2 = if arith::compare(&b[..n2], &b[n2..], n2) > 0 { 0 } else { n2 };
    arith::sub_slices(&mut r[n2..n], &b[bn2..bn2 + n2], &b[(n2 ^ bn2)..(n2 ^ bn2) + n2], n2);

    // high product into r[n..2n)
    {
        let (r_lo, r_hi) = r.split_at_mut(n);
        let (t_lo, t_hi) = t.split_at_mut(n);
        let _ = r_lo;
        let _ = t_lo;
        recursive_multiply(r_hi, t_hi, &a[n2..n], &b[n2..n], n2);
    }

    // middle (difference) product into t[0..n), consuming the diffs in r
    {
        let (t_lo, t_hi) = t.split_at_mut(n);
        recursive_multiply(t_lo, t_hi, &r[..n2], &r[n2..n], n2);
    }

    // low product into r[0..n), overwriting the consumed diffs
    {
        let (r_lo, _) = r.split_at_mut(n);
        let (_, t_hi) = t.split_at_mut(n);
        recursive_multiply(r_lo, t_hi, &a[..n2], &b[..n2], n2);
    }

    // combine by the Karatsuba identity
    let mut c2 = add_within(r, n, n2, n2) as i32;
    let mut c3 = c2;
    c2 += add_within3(r, n2, n, 0, n2) as i32;
    c3 += add_within(r, n, n + n2, n2) as i32;
    if an2 == bn2 {
        // middle signs agree: subtract the cross term
        let mut c = 0;
        for i in 0..n {
            c = arith::sub_borrow(r[n2 + i], t[i], c, &mut r[n2 + i]);
        }
        c3 -= c as i32;
    } else {
        let mut c = 0;
        for i in 0..n {
            c = arith::add_carry(r[n2 + i], t[i], c, &mut r[n2 + i]);
        }
        c3 += c as i32;
    }
    c3 += arith::increment(&mut r[n..n + n2], c2 as Limb) as i32;
    apply_signed_carry(r, n + n2, n2, c3);
}

/// Karatsuba square; same buffer contract as [`recursive_multiply`].
pub fn recursive_square(r: &mut [Limb], t: &mut [Limb], a: &[Limb], n: usize) {
    debug_assert!(n >= 2 && n % 2 == 0);
    if n <= RECURSION_LIMIT {
        baseline_square(r, a, n);
        return;
    }
    let n2 = n / 2;

    {
        let (r_lo, r_hi) = r.split_at_mut(n);
        let (_, t_hi) = t.split_at_mut(n);
        recursive_square(r_lo, t_hi, &a[..n2], n2);
        let (_, t_hi) = t.split_at_mut(n);
        recursive_square(r_hi, t_hi, &a[n2..n], n2);
    }
    {
        let (t_lo, t_hi) = t.split_at_mut(n);
        recursive_multiply(t_lo, t_hi, &a[..n2], &a[n2..n], n2);
    }

    // add the cross product twice
    let mut carry = 0i32;
    for _ in 0..2 {
        let mut c = 0;
        for i in 0..n {
            c = arith::add_carry(r[n2 + i], t[i], c, &mut r[n2 + i]);
        }
        carry += c as i32;
    }
    apply_signed_carry(r, n + n2, n2, carry);
}

/// Product of unequal-length magnitudes: the shorter operand (`na` limbs)
/// tiles the longer (`nb` limbs, a multiple of `na`), partial products are
/// laid out in `r` and `t` without overlap and summed once at the end.
///
/// `r` and `t` each hold `na + nb` limbs. A two-limb multiplier with a zero
/// high limb short-circuits to a linear sweep.
pub fn asymmetric_multiply(r: &mut [Limb], t: &mut [Limb], a: &[Limb], na: usize, b: &[Limb], nb: usize) {
    debug_assert!(na % 2 == 0 && nb % 2 == 0);

    if na == nb {
        if core::ptr::eq(a, b) {
            recursive_square(r, t, a, na);
        } else {
            recursive_multiply(r, t, a, b, na);
        }
        return;
    }

    let (a, na, b, nb) = if na > nb { (b, nb, a, na) } else { (a, na, b, nb) };

    if na == 2 && a[1] == 0 {
        match a[0] {
            0 => {
                r[..nb + 2].fill(0);
                return;
            }
            1 => {
                r[..nb].copy_from_slice(&b[..nb]);
                r[nb] = 0;
                r[nb + 1] = 0;
                return;
            }
            m => {
                r[nb] = arith::linear_multiply(r, b, m, nb);
                r[nb + 1] = 0;
                return;
            }
        }
    }

    // Tiles of b at even offsets land in one buffer, odd offsets in the
    // other, so no partial product overlaps another; a single addition
    // merges the two layers.
    let step = 2 * na;
    if (nb / na) % 2 == 0 {
        {
            let (t_scr, _) = t.split_at_mut(step);
            recursive_multiply(&mut r[..step], t_scr, a, &b[..na], na);
        }
        let (t_scr, t_acc) = t.split_at_mut(step);
        t_acc[..na].copy_from_slice(&r[na..step]);
        let mut i = step;
        while i < nb {
            recursive_multiply(&mut t_acc[i - na..i + na], t_scr, a, &b[i..i + na], na);
            i += step;
        }
        let mut i = na;
        while i < nb {
            recursive_multiply(&mut r[i..i + step], t_scr, a, &b[i..i + na], na);
            i += step;
        }
    } else {
        let (t_scr, t_acc) = t.split_at_mut(step);
        let mut i = 0;
        while i < nb {
            recursive_multiply(&mut r[i..i + step], t_scr, a, &b[i..i + na], na);
            i += step;
        }
        let mut i = na;
        while i < nb {
            recursive_multiply(&mut t_acc[i - na..i + na], t_scr, a, &b[i..i + na], na);
            i += step;
        }
    }

    let mut c = 0;
    for i in 0..nb - na {
        let v = t[step + i];
        c = arith::add_carry(r[na + i], v, c, &mut r[na + i]);
    }
    if c != 0 {
        arith::increment(&mut r[nb..nb + na], 1);
    }
}
