//! Definitions.

use core::fmt::Display;

/// A limb of a big integer's magnitude.
pub type Limb = u16;

/// Doubled limb.
pub type DoubleLimb = u32;

/// Limb with sign.
pub type SignedLimb = i32;

/// Maximum value of a limb.
pub const LIMB_MAX: Limb = Limb::MAX;

/// Base of limbs.
pub const LIMB_BASE: DoubleLimb = LIMB_MAX as DoubleLimb + 1;

/// Size of a limb in bits.
pub const LIMB_BIT_SIZE: usize = core::mem::size_of::<Limb>() * 8;

/// Karatsuba recursion cutoff: operands of this many limbs or fewer
/// multiply with the schoolbook routine.
pub const RECURSION_LIMIT: usize = 16;

/// Sign of a number.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
pub enum Sign {
    /// Negative.
    Neg = -1,

    /// Positive.
    Pos = 1,
}

impl Sign {
    /// Changes the sign to the opposite.
    pub fn invert(&self) -> Self {
        match *self {
            Sign::Pos => Sign::Neg,
            Sign::Neg => Sign::Pos,
        }
    }

    /// Returns true if `self` is positive.
    pub fn is_positive(&self) -> bool {
        *self == Sign::Pos
    }

    /// Returns true if `self` is negative.
    pub fn is_negative(&self) -> bool {
        *self == Sign::Neg
    }
}

/// Rounding modes for inexact results.
#[derive(Eq, PartialEq, Debug, Copy, Clone, Hash)]
pub enum Rounding {
    /// Round half to the nearest even last digit.
    HalfEven,

    /// Round half away from zero.
    HalfUp,

    /// Round half toward zero.
    HalfDown,

    /// Round toward positive infinity.
    Ceiling,

    /// Round toward negative infinity.
    Floor,

    /// Round away from zero whenever any digit is discarded.
    Up,

    /// Truncate.
    Down,

    /// Round up only if the retained last digit is 0 or 5.
    ZeroFiveUp,
}

/// Errors reported by the arithmetic layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Integer division by zero.
    DivisionByZero,

    /// A narrowing conversion could not represent the value.
    Overflow,

    /// Integer conversion of a NaN value.
    NotANumber,

    /// The exact result would have a nonterminating expansion.
    NonTerminating,

    /// The operation is not implemented by the arithmetic helper.
    Unsupported,

    /// A newly raised flag intersected the context's trap mask.
    /// Carries the trapped flag bits.
    Trap(u32),
}

impl Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::DivisionByZero => f.write_str("division by zero"),
            Error::Overflow => f.write_str("value out of range for conversion"),
            Error::NotANumber => f.write_str("integer conversion of NaN"),
            Error::NonTerminating => f.write_str("result would have a nonterminating expansion"),
            Error::Unsupported => f.write_str("operation not supported by this helper"),
            Error::Trap(fl) => write!(f, "arithmetic trap raised (flags 0x{:x})", fl),
        }
    }
}

impl std::error::Error for Error {}

/// Errors reported by the CBOR decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The input ended in the middle of an item.
    UnexpectedEof,

    /// A header used one of the reserved argument values 28..30.
    ReservedArgument,

    /// In canonical mode, an argument was not encoded in its shortest form.
    NonMinimalArgument,

    /// A text string was not well-formed UTF-8.
    InvalidUtf8,

    /// In canonical mode, a map contained the same key twice.
    DuplicateMapKey,

    /// In canonical mode, map keys were not in canonical order.
    OutOfOrderMapKey,

    /// An indefinite-length item was malformed (wrong chunk type, or
    /// indefinite length on a major type that does not allow it), or an
    /// indefinite item appeared in canonical mode.
    MalformedIndefinite,

    /// A break byte appeared outside an indefinite-length item.
    UnexpectedBreak,

    /// A tagged item failed validation in canonical mode.
    TagValidationFailed(u64),

    /// Nesting depth exceeded the decoder limit.
    DepthExceeded,

    /// Extra bytes followed the top-level item.
    TrailingData,
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DecodeError::UnexpectedEof => f.write_str("unexpected end of input"),
            DecodeError::ReservedArgument => f.write_str("reserved additional information value"),
            DecodeError::NonMinimalArgument => f.write_str("argument not in shortest form"),
            DecodeError::InvalidUtf8 => f.write_str("text string is not valid UTF-8"),
            DecodeError::DuplicateMapKey => f.write_str("duplicate map key"),
            DecodeError::OutOfOrderMapKey => f.write_str("map keys out of canonical order"),
            DecodeError::MalformedIndefinite => f.write_str("malformed indefinite-length item"),
            DecodeError::UnexpectedBreak => f.write_str("unexpected break byte"),
            DecodeError::TagValidationFailed(t) => write!(f, "tag {} payload failed validation", t),
            DecodeError::DepthExceeded => f.write_str("nesting depth limit exceeded"),
            DecodeError::TrailingData => f.write_str("extra bytes after top-level item"),
        }
    }
}

impl std::error::Error for DecodeError {}
