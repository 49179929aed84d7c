//! Numeric converters.
//!
//! The fixed-width types use strict radix-10 parsing. The generic [`Number`]
//! target uses [`NumberFormat`], which reads the longest numeric prefix of the
//! input and accepts grouping separators, the way a locale-aware number
//! format does.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A number of unspecified width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Decimal(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(value) => *value as f64,
            Number::Decimal(value) => *value,
        }
    }

    /// `None` for decimals.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Integer(value) => Some(*value),
            Number::Decimal(_) => None,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(value) => write!(f, "{}", value),
            Number::Decimal(value) => write!(f, "{}", value),
        }
    }
}

/// Separators used when reading a generic [`Number`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberFormat {
    #[serde(default = "default_grouping_separator")]
    pub grouping_separator: char,
    #[serde(default = "default_decimal_separator")]
    pub decimal_separator: char,
}

fn default_grouping_separator() -> char {
    ','
}

fn default_decimal_separator() -> char {
    '.'
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            grouping_separator: default_grouping_separator(),
            decimal_separator: default_decimal_separator(),
        }
    }
}

impl NumberFormat {
    pub fn new(grouping_separator: char, decimal_separator: char) -> Self {
        Self {
            grouping_separator,
            decimal_separator,
        }
    }

    /// Reads the longest numeric prefix of `raw`.
    ///
    /// Integral values that fit an `i64` become [`Number::Integer`]; anything
    /// else, including negative zero, becomes [`Number::Decimal`]. Grouping
    /// separators are skipped anywhere in the integer part. Returns `None`
    /// when the prefix holds no digit.
    pub fn parse(&self, raw: &str) -> Option<Number> {
        let (negative, body) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        let mut integer = String::new();
        let mut fraction = String::new();
        let mut in_fraction = false;

        for c in body.chars() {
            if c.is_ascii_digit() {
                if in_fraction {
                    fraction.push(c);
                } else {
                    integer.push(c);
                }
            } else if c == self.decimal_separator && !in_fraction {
                in_fraction = true;
            } else if c == self.grouping_separator && !in_fraction {
                continue;
            } else {
                break;
            }
        }

        if integer.is_empty() && fraction.is_empty() {
            return None;
        }

        let fraction = fraction.trim_end_matches('0');
        if fraction.is_empty() {
            let digits = if integer.is_empty() { "0" } else { &integer };
            if let Ok(value) = digits.parse::<i64>() {
                return Some(match (negative, value) {
                    (true, 0) => Number::Decimal(-0.0),
                    (true, value) => Number::Integer(-value),
                    (false, value) => Number::Integer(value),
                });
            }
        }

        let sign = if negative { "-" } else { "" };
        let integer = if integer.is_empty() { "0" } else { &integer };
        format!("{}{}.{}0", sign, integer, fraction)
            .parse::<f64>()
            .ok()
            .map(Number::Decimal)
    }
}

pub fn parse_integer(raw: &str) -> Option<i32> {
    raw.parse().ok()
}

pub fn parse_long(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

pub fn parse_byte(raw: &str) -> Option<i8> {
    raw.parse().ok()
}

pub fn parse_float(raw: &str) -> Option<f32> {
    raw.trim().parse().ok()
}

pub fn parse_double(raw: &str) -> Option<f64> {
    raw.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_integers() {
        assert_eq!(parse_integer("42"), Some(42));
        assert_eq!(parse_integer("-7"), Some(-7));
        assert_eq!(parse_integer("+7"), Some(7));
        assert_eq!(parse_integer(" 42"), None);
        assert_eq!(parse_integer("4.2"), None);
        assert_eq!(parse_integer("2147483648"), None);
        assert_eq!(parse_long("2147483648"), Some(2_147_483_648));
        assert_eq!(parse_byte("127"), Some(127));
        assert_eq!(parse_byte("128"), None);
    }

    #[test]
    fn test_strict_floats() {
        assert_eq!(parse_double("3.5"), Some(3.5));
        assert_eq!(parse_double(" 3.5 "), Some(3.5));
        assert_eq!(parse_float("-0.25"), Some(-0.25));
        assert_eq!(parse_double("abc"), None);
        assert_eq!(parse_double("1,5"), None);
    }

    #[test]
    fn test_generic_number_integral() {
        let format = NumberFormat::default();
        assert_eq!(format.parse("42"), Some(Number::Integer(42)));
        assert_eq!(format.parse("-42"), Some(Number::Integer(-42)));
        assert_eq!(format.parse("1,234,567"), Some(Number::Integer(1_234_567)));
        assert_eq!(format.parse("2.0"), Some(Number::Integer(2)));
    }

    #[test]
    fn test_generic_number_decimal() {
        let format = NumberFormat::default();
        assert_eq!(format.parse("3.25"), Some(Number::Decimal(3.25)));
        assert_eq!(format.parse(".5"), Some(Number::Decimal(0.5)));
        assert_eq!(format.parse("1,000.5"), Some(Number::Decimal(1000.5)));
        match format.parse("-0") {
            Some(Number::Decimal(value)) => assert!(value == 0.0 && value.is_sign_negative()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_generic_number_reads_prefix() {
        let format = NumberFormat::default();
        assert_eq!(format.parse("12abc"), Some(Number::Integer(12)));
        assert_eq!(format.parse("1.5.6"), Some(Number::Decimal(1.5)));
        assert_eq!(format.parse("abc"), None);
        assert_eq!(format.parse(""), None);
        assert_eq!(format.parse("-"), None);
        assert_eq!(format.parse(" 1"), None);
    }

    #[test]
    fn test_generic_number_overflow_becomes_decimal() {
        let format = NumberFormat::default();
        assert_eq!(
            format.parse("18446744073709551616"),
            Some(Number::Decimal(18_446_744_073_709_551_616.0))
        );
    }

    #[test]
    fn test_generic_number_custom_locale() {
        let format = NumberFormat::new('.', ',');
        assert_eq!(format.parse("1.234,5"), Some(Number::Decimal(1234.5)));
        assert_eq!(format.parse("1.234"), Some(Number::Integer(1234)));
    }

    #[test]
    fn test_number_accessors() {
        assert_eq!(Number::Integer(3).as_f64(), 3.0);
        assert_eq!(Number::Integer(3).as_i64(), Some(3));
        assert_eq!(Number::Decimal(3.5).as_i64(), None);
        assert_eq!(Number::Decimal(3.5).to_string(), "3.5");
    }
}
