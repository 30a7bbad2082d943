//! Display port and number formatting
//!
//! The badge display holds one message at a time. Showing a new message
//! replaces the previous one; there is no queue.

use core::fmt::{Debug, Write};

/// Maximum formatted length of a number shown on the display.
///
/// Fits the longest scientific form of an `f64` (`-1.7976931348623157e308`).
pub const NUMBER_TEXT_LEN: usize = 24;

/// Magnitude from which numbers switch to scientific notation.
const SCIENTIFIC_FROM: f64 = 1e15;

/// A message for the badge display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayMessage<'a> {
    /// A numeric value, formatted by [`format_number`].
    Number(f64),
    /// A literal string.
    Text(&'a str),
}

/// Port for the on-device display.
///
/// `show` is synchronous: it returns once the message is presented.
pub trait TextDisplay {
    type Error: Debug;

    fn show(&mut self, message: DisplayMessage<'_>) -> Result<(), Self::Error>;
}

/// Formats a number the way the badge presents it.
///
/// Whole values print without a fraction (`21`), other values print with up
/// to two decimals and no trailing zeros (`21.5`). Magnitudes of 1e15 and
/// above print in scientific notation (`1e16`).
pub fn format_number(value: f64) -> heapless::String<NUMBER_TEXT_LEN> {
    let mut text = heapless::String::new();

    if !value.is_finite() {
        let _ = text.push_str(if value.is_nan() {
            "NaN"
        } else if value > 0.0 {
            "inf"
        } else {
            "-inf"
        });
        return text;
    }

    // Every branch below fits NUMBER_TEXT_LEN, so the writes cannot fail
    if value >= SCIENTIFIC_FROM || value <= -SCIENTIFIC_FROM {
        let _ = write!(text, "{:e}", value);
        return text;
    }

    let whole = value as i64;
    if whole as f64 == value {
        let _ = write!(text, "{}", whole);
        return text;
    }

    let _ = write!(text, "{:.2}", value);
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }
    if text.as_str() == "-0" {
        text.clear();
        let _ = text.push('0');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_whole_number() {
        assert_eq!(format_number(21.0).as_str(), "21");
        assert_eq!(format_number(-4.0).as_str(), "-4");
        assert_eq!(format_number(0.0).as_str(), "0");
    }

    #[test]
    fn test_format_fraction_trims_zeros() {
        assert_eq!(format_number(21.5).as_str(), "21.5");
        assert_eq!(format_number(43.25).as_str(), "43.25");
        assert_eq!(format_number(-1.5).as_str(), "-1.5");
    }

    #[test]
    fn test_format_non_finite() {
        assert_eq!(format_number(f64::NAN).as_str(), "NaN");
        assert_eq!(format_number(f64::INFINITY).as_str(), "inf");
    }

    #[test]
    fn test_format_large_values_use_scientific_notation() {
        assert_eq!(format_number(1e16).as_str(), "1e16");
        assert_eq!(format_number(1e30).as_str(), "1e30");
        assert_eq!(format_number(-2.5e20).as_str(), "-2.5e20");
        assert_eq!(format_number(f64::MAX).as_str(), "1.7976931348623157e308");
        assert_eq!(
            format_number(f64::MIN).as_str(),
            "-1.7976931348623157e308"
        );
        // Just below the switch still prints plainly
        assert_eq!(format_number(999_999_999_999_999.0).as_str(), "999999999999999");
    }

    #[test]
    fn test_format_tiny_negative_is_zero() {
        assert_eq!(format_number(-0.001).as_str(), "0");
        assert_eq!(format_number(0.004).as_str(), "0");
    }
}
