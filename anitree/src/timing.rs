// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! SMIL timing values.

use std::str::FromStr;


/// A timing value parsing error.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TimingError {
    /// The input has no number where one is expected.
    InvalidNumber,
    /// The input has an unknown unit or trailing data.
    UnexpectedData,
}

impl std::fmt::Display for TimingError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            TimingError::InvalidNumber => write!(f, "invalid number"),
            TimingError::UnexpectedData => write!(f, "unexpected data"),
        }
    }
}

impl std::error::Error for TimingError {}

/// A duration unit.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DurationUnit {
    /// Seconds, `s`.
    Seconds,
    /// Milliseconds, `ms`.
    Milliseconds,
}

/// A [clock value](https://www.w3.org/TR/SMIL/smil-timing.html#Timing-ClockValueSyntax)
/// restricted to the timecount form: a number with an optional `s` or `ms` unit.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Duration {
    /// The unit the value was written in.
    pub unit: DurationUnit,
    value: f64,
}

impl Duration {
    /// Creates a duration in seconds.
    ///
    /// Negative values are clamped to zero.
    #[inline]
    pub fn from_seconds(value: f64) -> Self {
        Duration {
            unit: DurationUnit::Seconds,
            value: value.max(0.0),
        }
    }

    /// Creates a duration in milliseconds.
    ///
    /// Negative values are clamped to zero.
    #[inline]
    pub fn from_milliseconds(value: f64) -> Self {
        Duration {
            unit: DurationUnit::Milliseconds,
            value: value.max(0.0),
        }
    }

    /// Returns the value in its own unit.
    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Converts the duration into milliseconds.
    #[inline]
    pub fn to_milliseconds(&self) -> f64 {
        match self.unit {
            DurationUnit::Seconds => self.value * 1000.0,
            DurationUnit::Milliseconds => self.value,
        }
    }

    /// Checks that the duration is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.value == 0.0
    }
}

/// Splits off a leading unsigned decimal number without an exponent.
///
/// Grammar: `digits ('.' digits)?`. Returns the number and the rest of the text.
fn split_simple_number(text: &str) -> Result<(f64, &str), TimingError> {
    let text = text.trim_start();
    let bytes = text.as_bytes();

    let mut end = bytes.iter().take_while(|c| c.is_ascii_digit()).count();
    if end == 0 {
        return Err(TimingError::InvalidNumber);
    }

    if bytes.get(end) == Some(&b'.') {
        let fraction = bytes[end + 1..].iter().take_while(|c| c.is_ascii_digit()).count();
        if fraction != 0 {
            end += 1 + fraction;
        }
    }

    let n = svgtypes::Number::from_str(&text[..end]).map_err(|_| TimingError::InvalidNumber)?;
    Ok((n.0, &text[end..]))
}

impl FromStr for Duration {
    type Err = TimingError;

    fn from_str(text: &str) -> Result<Self, TimingError> {
        let (value, rest) = split_simple_number(text)?;
        let rest = rest.trim_start();

        let (unit, rest) = if rest.is_empty() {
            (DurationUnit::Seconds, rest)
        } else if let Some(rest) = rest.strip_prefix("ms") {
            (DurationUnit::Milliseconds, rest)
        } else if let Some(rest) = rest.strip_prefix('s') {
            (DurationUnit::Seconds, rest)
        } else {
            return Err(TimingError::UnexpectedData);
        };

        if !rest.trim().is_empty() {
            return Err(TimingError::UnexpectedData);
        }

        Ok(Duration { unit, value })
    }
}

impl std::fmt::Display for Duration {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.unit {
            DurationUnit::Seconds => write!(f, "{:.2}s", self.value),
            DurationUnit::Milliseconds => write!(f, "{:.2}ms", self.value),
        }
    }
}

/// A `repeatCount` value.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum RepeatCount {
    /// Repeat a finite, positive number of times. Fractions are allowed.
    Count(f64),
    /// Repeat forever.
    Indefinite,
}

impl RepeatCount {
    /// Checks that the count is `indefinite`.
    #[inline]
    pub fn is_indefinite(&self) -> bool {
        matches!(self, RepeatCount::Indefinite)
    }

    /// Returns the numeric count.
    ///
    /// `indefinite` has a value of 0.
    #[inline]
    pub fn value(&self) -> f64 {
        match *self {
            RepeatCount::Count(n) => n,
            RepeatCount::Indefinite => 0.0,
        }
    }
}

impl FromStr for RepeatCount {
    type Err = TimingError;

    fn from_str(text: &str) -> Result<Self, TimingError> {
        let (count, rest) = match text.trim_start().strip_prefix("indefinite") {
            Some(rest) => (RepeatCount::Indefinite, rest),
            None => {
                let (n, rest) = split_simple_number(text)?;
                if n <= 0.0 {
                    return Err(TimingError::InvalidNumber);
                }

                (RepeatCount::Count(n), rest)
            }
        };

        if !rest.trim().is_empty() {
            return Err(TimingError::UnexpectedData);
        }

        Ok(count)
    }
}

impl std::fmt::Display for RepeatCount {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            RepeatCount::Count(n) => write!(f, "{:.2}", n),
            RepeatCount::Indefinite => write!(f, "indefinite"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_dur {
        ($name:ident, $text:expr, $unit:expr, $value:expr) => (
            #[test]
            fn $name() {
                let d = Duration::from_str($text).unwrap();
                assert_eq!(d.unit, $unit);
                assert_eq!(d.value(), $value);
            }
        )
    }

    test_dur!(dur_seconds, "1.5s", DurationUnit::Seconds, 1.5);
    test_dur!(dur_milliseconds, "150ms", DurationUnit::Milliseconds, 150.0);
    test_dur!(dur_no_unit, "1.5", DurationUnit::Seconds, 1.5);
    test_dur!(dur_spaces, "  2 s  ", DurationUnit::Seconds, 2.0);
    test_dur!(dur_integer_ms, "0ms", DurationUnit::Milliseconds, 0.0);

    #[test]
    fn dur_exponent_is_not_a_unit() {
        assert_eq!(Duration::from_str("1e3s"), Err(TimingError::UnexpectedData));
        assert_eq!(Duration::from_str("1.s"), Err(TimingError::UnexpectedData));
    }

    #[test]
    fn dur_unknown_unit() {
        assert_eq!(Duration::from_str("150 stupid"), Err(TimingError::UnexpectedData));
    }

    #[test]
    fn dur_trailing_data() {
        assert_eq!(Duration::from_str("1s 2s"), Err(TimingError::UnexpectedData));
        assert_eq!(Duration::from_str("1mss"), Err(TimingError::UnexpectedData));
    }

    #[test]
    fn dur_no_number() {
        assert_eq!(Duration::from_str(""), Err(TimingError::InvalidNumber));
        assert_eq!(Duration::from_str("-1s"), Err(TimingError::InvalidNumber));
        assert_eq!(Duration::from_str("s"), Err(TimingError::InvalidNumber));
    }

    #[test]
    fn dur_to_milliseconds() {
        for x in &[0.0, 0.25, 1.0, 1.5, 2.0, 10.0, 3600.0] {
            assert_eq!(Duration::from_seconds(*x).to_milliseconds(), x * 1000.0);
        }

        assert_eq!(Duration::from_milliseconds(150.0).to_milliseconds(), 150.0);
    }

    #[test]
    fn dur_to_string() {
        assert_eq!(Duration::from_seconds(1.5).to_string(), "1.50s");
        assert_eq!(Duration::from_milliseconds(150.0).to_string(), "150.00ms");
    }

    #[test]
    fn repeat_indefinite() {
        let r = RepeatCount::from_str("indefinite").unwrap();
        assert!(r.is_indefinite());
        assert_eq!(r.value(), 0.0);
        assert_eq!(r.to_string(), "indefinite");
    }

    #[test]
    fn repeat_count() {
        assert_eq!(RepeatCount::from_str("3.2").unwrap(), RepeatCount::Count(3.2));
        assert_eq!(RepeatCount::from_str(" 3 ").unwrap(), RepeatCount::Count(3.0));
        assert_eq!(RepeatCount::Count(3.2).to_string(), "3.20");
    }

    #[test]
    fn repeat_errors() {
        assert_eq!(RepeatCount::from_str("   "), Err(TimingError::InvalidNumber));
        assert_eq!(RepeatCount::from_str(""), Err(TimingError::InvalidNumber));
        assert_eq!(RepeatCount::from_str("0"), Err(TimingError::InvalidNumber));
        assert_eq!(RepeatCount::from_str("3 times"), Err(TimingError::UnexpectedData));
        assert_eq!(RepeatCount::from_str("indefinitely"), Err(TimingError::UnexpectedData));
    }
}
