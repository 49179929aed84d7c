//! Textual durations such as `"2d 3h"` or `"1 week 30m"`.
//!
//! Input is a sequence of `<integer><unit>` tokens separated by whitespace;
//! whitespace between the number and its unit is optional. Token values are
//! summed left to right. Units are matched case-insensitively:
//!
//! | unit | spellings |
//! |------|-----------|
//! | weeks | `w`, `week`, `weeks` |
//! | days | `d`, `day`, `days` |
//! | half days | `halfday`, `halfdays` |
//! | hours | `h`, `hour`, `hours` |
//! | minutes | `m`, `minute`, `minutes` |
//! | seconds | `s`, `second`, `seconds` |
//! | milliseconds | `millis`, `milliseconds` |
//! | microseconds | `micros`, `microseconds` |
//! | nanoseconds | `nanos`, `nanoseconds` |
//! | months | `mo`, `month`, `months` |
//! | years | `y`, `year`, `years` |
//! | decades | `decade`, `decades` |
//! | centuries | `century`, `centuries` |
//! | millennia | `millennium`, `millennia` |
//! | eras | `era` |
//! | forever | `forever` |
//!
//! Calendar units use their estimated lengths (a year is 365.2425 days).
//! A total of zero is reported as `None`, so `"0d"` and `""` read the same.

use std::time::Duration;

use tracing::trace;

const SECONDS_PER_YEAR: u64 = 31_556_952;

/// The longest representable duration, also the length of [`TimeUnit::Forever`].
pub const FOREVER: Duration = Duration::new(i64::MAX as u64, 999_999_999);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumString, strum::Display)]
#[strum(ascii_case_insensitive)]
pub enum TimeUnit {
    #[strum(serialize = "nanos", serialize = "nanoseconds")]
    Nanos,
    #[strum(serialize = "micros", serialize = "microseconds")]
    Micros,
    #[strum(serialize = "millis", serialize = "milliseconds")]
    Millis,
    #[strum(serialize = "s", serialize = "second", serialize = "seconds")]
    Seconds,
    #[strum(serialize = "m", serialize = "minute", serialize = "minutes")]
    Minutes,
    #[strum(serialize = "h", serialize = "hour", serialize = "hours")]
    Hours,
    #[strum(serialize = "halfday", serialize = "halfdays")]
    HalfDays,
    #[strum(serialize = "d", serialize = "day", serialize = "days")]
    Days,
    #[strum(serialize = "w", serialize = "week", serialize = "weeks")]
    Weeks,
    #[strum(serialize = "mo", serialize = "month", serialize = "months")]
    Months,
    #[strum(serialize = "y", serialize = "year", serialize = "years")]
    Years,
    #[strum(serialize = "decade", serialize = "decades")]
    Decades,
    #[strum(serialize = "century", serialize = "centuries")]
    Centuries,
    #[strum(serialize = "millennium", serialize = "millennia")]
    Millennia,
    #[strum(serialize = "era")]
    Eras,
    #[strum(serialize = "forever")]
    Forever,
}

impl TimeUnit {
    pub fn duration(&self) -> Duration {
        match self {
            TimeUnit::Nanos => Duration::from_nanos(1),
            TimeUnit::Micros => Duration::from_micros(1),
            TimeUnit::Millis => Duration::from_millis(1),
            TimeUnit::Seconds => Duration::from_secs(1),
            TimeUnit::Minutes => Duration::from_secs(60),
            TimeUnit::Hours => Duration::from_secs(60 * 60),
            TimeUnit::HalfDays => Duration::from_secs(12 * 60 * 60),
            TimeUnit::Days => Duration::from_secs(24 * 60 * 60),
            TimeUnit::Weeks => Duration::from_secs(7 * 24 * 60 * 60),
            TimeUnit::Months => Duration::from_secs(SECONDS_PER_YEAR / 12),
            TimeUnit::Years => Duration::from_secs(SECONDS_PER_YEAR),
            TimeUnit::Decades => Duration::from_secs(SECONDS_PER_YEAR * 10),
            TimeUnit::Centuries => Duration::from_secs(SECONDS_PER_YEAR * 100),
            TimeUnit::Millennia => Duration::from_secs(SECONDS_PER_YEAR * 1_000),
            TimeUnit::Eras => Duration::from_secs(SECONDS_PER_YEAR * 1_000_000_000),
            TimeUnit::Forever => FOREVER,
        }
    }
}

type Observer<'a> = Box<dyn FnMut(&str) + 'a>;

/// Duration reader with optional diagnostics.
///
/// ```rust
/// # use input_await::converter::DurationParser;
/// # use std::time::Duration;
/// let mut unknown = Vec::new();
/// let parsed = DurationParser::new()
///     .on_invalid_unit(|unit| unknown.push(unit.to_string()))
///     .parse("2x");
/// assert_eq!(parsed, None);
/// assert_eq!(unknown, vec!["x".to_string()]);
/// ```
#[derive(Default)]
pub struct DurationParser<'a> {
    on_invalid_unit: Option<Observer<'a>>,
    on_invalid_number: Option<Observer<'a>>,
}

impl<'a> DurationParser<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the unit text when a unit is not recognized.
    pub fn on_invalid_unit<F>(mut self, observer: F) -> Self
    where
        F: FnMut(&str) + 'a,
    {
        self.on_invalid_unit = Some(Box::new(observer));
        self
    }

    /// Called with the remaining input when a token does not start with a
    /// number that fits `u32`.
    pub fn on_invalid_number<F>(mut self, observer: F) -> Self
    where
        F: FnMut(&str) + 'a,
    {
        self.on_invalid_number = Some(Box::new(observer));
        self
    }

    /// Sums every token up to the first malformed one.
    ///
    /// Returns `None` for a zero total, or when the sum overflows.
    pub fn parse(mut self, input: &str) -> Option<Duration> {
        let mut total = Duration::ZERO;
        let mut rest = input;

        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }

            let digits_end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            let (digits, tail) = rest.split_at(digits_end);
            let Ok(amount) = digits.parse::<u32>() else {
                trace!(rest, "duration token without a valid number");
                if let Some(observer) = self.on_invalid_number.as_mut() {
                    observer(rest);
                }
                break;
            };

            let tail = tail.trim_start();
            let unit_end = tail
                .find(|c: char| !c.is_alphabetic())
                .unwrap_or(tail.len());
            let (unit, tail) = tail.split_at(unit_end);

            match unit.parse::<TimeUnit>() {
                Ok(unit) => {
                    total = total.checked_add(unit.duration().checked_mul(amount)?)?;
                    if total > FOREVER {
                        return None;
                    }
                }
                Err(_) => {
                    trace!(unit, "unknown duration unit");
                    if let Some(observer) = self.on_invalid_unit.as_mut() {
                        observer(unit);
                    }
                    break;
                }
            }

            rest = tail;
        }

        (!total.is_zero()).then_some(total)
    }
}

/// Reads a duration without diagnostics.
pub fn parse_duration(input: &str) -> Option<Duration> {
    DurationParser::new().parse(input)
}
