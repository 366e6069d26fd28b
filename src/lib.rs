//! A library for the Concise Binary Object Representation (CBOR) data
//! model together with the arbitrary-precision numeric types CBOR needs to
//! be lossless.
//!
//! ## Numbers
//!
//! [`BigInt`] is a signed arbitrary-precision integer stored as 16-bit
//! limbs. Multiplication switches to Karatsuba recursion above 16 limbs,
//! division is Knuth's algorithm with two-limb quotient estimates, and
//! decimal conversion runs four digits per pass.
//!
//! [`ExtendedDecimal`] and [`ExtendedFloat`] are decimal and binary
//! floating-point numbers with an unlimited mantissa and exponent. Every
//! operation takes a [`PrecisionContext`] that selects precision, rounding
//! mode, and exponent range, accumulates IEEE-style status flags, and can
//! trap on any of them. [`ExtendedRational`] completes the numeric tower
//! for CBOR tag 30.
//!
//! ## CBOR
//!
//! [`CborValue`] is the typed value model. `decode` reads a byte slice
//! through an explicit state machine and applies a [`TagRegistry`] that
//! normalises the well-known numeric tags (2/3 bignum, 4 decimal
//! fraction, 5 bigfloat, 30 rational); `CborValue::to_bytes` produces the
//! unique canonical encoding, so `decode(encode(v)) == v` for every value
//! the public API can build.
//!
//! ## Example
//!
//! ```rust
//! use cbor_bignum::{CborValue, DecodeOptions, ExtendedDecimal, PrecisionContext, decode};
//!
//! // 1/3 to nine digits, with the inexact flag recorded
//! let mut ctx = PrecisionContext::basic().with_blank_flags();
//! let third = ExtendedDecimal::from_string("1").unwrap()
//!     .divide(&ExtendedDecimal::from_string("3").unwrap(), &mut ctx)
//!     .unwrap();
//! assert_eq!(third.to_string(), "0.333333333");
//! assert_ne!(ctx.flags() & cbor_bignum::FLAG_INEXACT, 0);
//!
//! // the canonical encoding of a decimal fraction round-trips
//! let v = CborValue::Decimal(third);
//! let bytes = v.to_bytes();
//! assert_eq!(decode(&bytes, &DecodeOptions::canonical()).unwrap(), v);
//! ```

#![deny(clippy::suspicious)]
#![allow(clippy::comparison_chain)]
#![allow(clippy::collapsible_else_if)]
#![allow(clippy::collapsible_if)]
#![allow(clippy::module_inception)]

mod accum;
mod bigint;
mod cbor;
mod ctx;
mod dec;
mod defs;
mod fastint;
mod float;
mod radix;
mod rational;

#[cfg(feature = "serde")]
mod for_3rd;

pub use crate::accum::BitShiftAccumulator;
pub use crate::accum::DigitShiftAccumulator;
pub use crate::accum::ShiftAccumulator;
pub use crate::bigint::BigInt;
pub use crate::bigint::ONE;
pub use crate::bigint::TEN;
pub use crate::bigint::ZERO;
pub use crate::cbor::decode;
pub use crate::cbor::decode_with;
pub use crate::cbor::half;
pub use crate::cbor::CborMap;
pub use crate::cbor::CborReader;
pub use crate::cbor::CborTypeFilter;
pub use crate::cbor::CborValue;
pub use crate::cbor::DecodeOptions;
pub use crate::cbor::TagHandler;
pub use crate::cbor::TagRegistry;
pub use crate::ctx::PrecisionContext;
pub use crate::dec::ExtendedDecimal;
pub use crate::defs::DecodeError;
pub use crate::defs::Error;
pub use crate::defs::Limb;
pub use crate::defs::Rounding;
pub use crate::defs::Sign;
pub use crate::fastint::FastInt;
pub use crate::float::ExtendedFloat;
pub use crate::rational::ExtendedRational;

pub use crate::ctx::FLAG_CLAMPED;
pub use crate::ctx::FLAG_DIVIDE_BY_ZERO;
pub use crate::ctx::FLAG_INEXACT;
pub use crate::ctx::FLAG_INVALID;
pub use crate::ctx::FLAG_LOST_DIGITS;
pub use crate::ctx::FLAG_OVERFLOW;
pub use crate::ctx::FLAG_ROUNDED;
pub use crate::ctx::FLAG_SUBNORMAL;
pub use crate::ctx::FLAG_UNDERFLOW;

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_crate_level_flow() {
        // parse, compute, encode, decode, compare
        let mut ctx = PrecisionContext::for_precision_and_rounding(28, Rounding::HalfEven);
        let a = ExtendedDecimal::from_string("2").unwrap();
        let root = a.square_root(&mut ctx).unwrap();
        let squared = root.multiply(&root, &mut ctx).unwrap();
        let diff = squared.subtract(&a, &mut ctx).unwrap();
        // |sqrt(2)^2 - 2| is tiny at 28 digits
        assert!(diff.abs(&mut ctx).unwrap().compare_to(&ExtendedDecimal::from_string("1E-26").unwrap())
            == core::cmp::Ordering::Less);

        let v = CborValue::Decimal(root);
        let bytes = v.to_bytes();
        let back = decode(&bytes, &DecodeOptions::canonical()).unwrap();
        assert_eq!(back, v);
    }
}
