//! Bounded-width numeral parsing.
//!
//! Rust's own `FromStr` impls for integers already distinguish overflow from
//! malformed input via [`std::num::IntErrorKind`], so there is no need to
//! hand-roll atoi here — only the exact-cast float fast path below is
//! bespoke, because the standard library has no such shortcut.

use std::num::IntErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NumericError {
    Overflow,
    Invalid,
}

/// A target integer width the interpreter can decode into.
pub(crate) trait BoundedInt: Copy + 'static {
    fn parse_bounded(text: &str) -> Result<Self, NumericError>;
}

macro_rules! impl_bounded_int {
    ($($t:ty),+ $(,)?) => {
        $(impl BoundedInt for $t {
            fn parse_bounded(text: &str) -> Result<Self, NumericError> {
                text.parse::<$t>().map_err(|e| match e.kind() {
                    IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => NumericError::Overflow,
                    _ => NumericError::Invalid,
                })
            }
        })+
    };
}

impl_bounded_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Digits in `text` excluding sign and any `.`/exponent markers — callers
/// only invoke this on tokens already classified `TokenKind::Integer`, so
/// no such markers are present, but counting only ascii digits keeps the
/// function correct even if that assumption is ever relaxed.
fn digit_count(text: &str) -> usize {
    text.bytes().filter(u8::is_ascii_digit).count()
}

/// Exact-cast fast path for an `Integer`-tagged token decoding into `f32`:
/// below 8 digits the value always round-trips exactly through `i64`, which
/// is far cheaper than the general decimal parser. At or above the
/// threshold, fall back to `f32::from_str`.
pub(crate) fn integer_text_to_f32(text: &str) -> Result<f32, NumericError> {
    if digit_count(text) < 8 {
        if let Ok(i) = text.parse::<i64>() {
            return Ok(i as f32);
        }
    }
    text.parse::<f32>().map_err(|_| NumericError::Invalid)
}

/// Exact-cast fast path for an `Integer`-tagged token decoding into `f64`:
/// below 16 digits the value always round-trips exactly through `i64`
/// (`f64` carries 53 bits of mantissa, comfortably covering 15 decimal
/// digits).
pub(crate) fn integer_text_to_f64(text: &str) -> Result<f64, NumericError> {
    if digit_count(text) < 16 {
        if let Ok(i) = text.parse::<i64>() {
            return Ok(i as f64);
        }
    }
    text.parse::<f64>().map_err(|_| NumericError::Invalid)
}

pub(crate) fn parse_f32(text: &str) -> Result<f32, NumericError> {
    text.parse::<f32>().map_err(|_| NumericError::Invalid)
}

pub(crate) fn parse_f64(text: &str) -> Result<f64, NumericError> {
    text.parse::<f64>().map_err(|_| NumericError::Invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_int_detects_overflow() {
        assert_eq!(u8::parse_bounded("256"), Err(NumericError::Overflow));
        assert_eq!(u8::parse_bounded("255"), Ok(255));
        assert_eq!(i8::parse_bounded("-129"), Err(NumericError::Overflow));
    }

    #[test]
    fn bounded_int_rejects_leading_minus_for_unsigned() {
        assert_eq!(u32::parse_bounded("-5"), Err(NumericError::Invalid));
    }

    #[test]
    fn float_fast_path_matches_generic_parse() {
        assert_eq!(integer_text_to_f64("1234567"), Ok(1234567.0));
        assert_eq!(integer_text_to_f32("1234567"), Ok(1234567.0f32));
    }

    #[test]
    fn float_fast_path_falls_back_above_threshold() {
        let text = "123456789012345678";
        assert_eq!(integer_text_to_f64(text), parse_f64(text));
    }
}
