//! Fixed-length time spans.
//!
//! Spans are used for the time unit divisor, the blanking window, and the
//! minimum follow-up. They are parsed from text in three forms:
//!
//! - Numeric days (e.g., "30", "1.5")
//! - Text descriptions (e.g., "30 days", "2 weeks", "1 year 6 months", "12h", "days")
//! - ISO 8601 durations (e.g., "P30D", "P1Y", "PT12H", "P2W")
//!
//! Months and years have no fixed calendar length, so they are treated as
//! 30.4375 and 365.25 days respectively.

use std::fmt;
use std::str::FromStr;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const SECOND: f64 = 1.0;
const MINUTE: f64 = 60.0;
const HOUR: f64 = 3_600.0;
const DAY: f64 = 86_400.0;
const WEEK: f64 = 7.0 * DAY;
const MONTH: f64 = 30.4375 * DAY;
const YEAR: f64 = 365.25 * DAY;

/// Named units, largest first. Used for display and unit labels.
const NAMED_UNITS: [(f64, &str, &str); 7] = [
    (YEAR, "year", "years"),
    (MONTH, "month", "months"),
    (WEEK, "week", "weeks"),
    (DAY, "day", "days"),
    (HOUR, "hour", "hours"),
    (MINUTE, "minute", "minutes"),
    (SECOND, "second", "seconds"),
];

/// A fixed-length duration with millisecond resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "SpanRepr", into = "String")]
pub struct TimeSpan(TimeDelta);

impl TimeSpan {
    /// The empty span.
    pub fn zero() -> Self {
        Self(TimeDelta::zero())
    }

    /// A span of whole days.
    pub fn days(days: i64) -> Self {
        Self(TimeDelta::days(days))
    }

    /// A span of whole weeks.
    pub fn weeks(weeks: i64) -> Self {
        Self(TimeDelta::weeks(weeks))
    }

    /// A span of whole hours.
    pub fn hours(hours: i64) -> Self {
        Self(TimeDelta::hours(hours))
    }

    /// One (fixed-length) year of 365.25 days.
    pub fn year() -> Self {
        Self::from_seconds(YEAR).unwrap_or_else(Self::zero)
    }

    /// Builds a span from fractional seconds, rounded to milliseconds.
    ///
    /// Returns `None` for non-finite or out-of-range values.
    pub fn from_seconds(seconds: f64) -> Option<Self> {
        let millis = (seconds * 1_000.0).round();
        if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
            return None;
        }
        TimeDelta::try_milliseconds(millis as i64).map(Self)
    }

    /// The underlying chrono duration.
    pub fn as_delta(self) -> TimeDelta {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(self) -> bool {
        self.0 > TimeDelta::zero()
    }

    pub fn is_negative(self) -> bool {
        self.0 < TimeDelta::zero()
    }

    /// Expresses `elapsed` as a (fractional) count of this span.
    ///
    /// Callers must ensure the span is positive.
    pub fn count_in(self, elapsed: TimeDelta) -> f64 {
        elapsed.num_milliseconds() as f64 / self.0.num_milliseconds() as f64
    }

    /// Plural unit name when the span is exactly one named unit
    /// (e.g., "days"), otherwise the full display form (e.g., "30 days").
    pub fn unit_label(self) -> String {
        let millis = self.0.num_milliseconds();
        NAMED_UNITS
            .iter()
            .find(|(seconds, _, _)| unit_millis(*seconds) == millis)
            .map(|(_, _, plural)| (*plural).to_string())
            .unwrap_or_else(|| self.to_string())
    }

    /// Parses a span from text.
    ///
    /// # Examples
    ///
    /// ```
    /// use tte_model::TimeSpan;
    ///
    /// assert_eq!(TimeSpan::parse("30 days").unwrap(), TimeSpan::days(30));
    /// assert_eq!(TimeSpan::parse("P2W").unwrap(), TimeSpan::weeks(2));
    /// assert_eq!(TimeSpan::parse("14").unwrap(), TimeSpan::days(14));
    /// assert!(TimeSpan::parse("soon").is_err());
    /// ```
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidSpan {
            value: value.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty value"));
        }
        let (sign, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (-1.0, rest.trim_start()),
            None => (1.0, trimmed),
        };

        let seconds = if let Some(iso) = body.strip_prefix('P') {
            parse_iso8601(iso).ok_or_else(|| invalid("malformed ISO 8601 duration"))?
        } else if let Ok(days) = body.parse::<f64>() {
            days * DAY
        } else if let Some(per) = unit_seconds(body) {
            // a bare unit ("days", "weeks") is one of that unit
            per
        } else {
            parse_text(body).ok_or_else(|| invalid("expected a number followed by a unit"))?
        };

        Self::from_seconds(sign * seconds).ok_or_else(|| invalid("out of range"))
    }
}

impl Default for TimeSpan {
    fn default() -> Self {
        Self::zero()
    }
}

impl FromStr for TimeSpan {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = self.0.num_milliseconds();
        if millis == 0 {
            return write!(f, "0 days");
        }
        let sign = if millis < 0 { "-" } else { "" };
        let abs = millis.unsigned_abs();

        for (seconds, singular, plural) in NAMED_UNITS {
            let per = unit_millis(seconds).unsigned_abs();
            if abs % per == 0 {
                let count = abs / per;
                let name = if count == 1 { singular } else { plural };
                return write!(f, "{sign}{count} {name}");
            }
        }
        write!(f, "{sign}{} seconds", abs as f64 / 1_000.0)
    }
}

impl From<TimeSpan> for String {
    fn from(span: TimeSpan) -> Self {
        span.to_string()
    }
}

/// Serialized form: a bare number of days or a text span.
#[derive(Deserialize)]
#[serde(untagged)]
enum SpanRepr {
    Days(f64),
    Text(String),
}

impl TryFrom<SpanRepr> for TimeSpan {
    type Error = ConfigError;

    fn try_from(repr: SpanRepr) -> Result<Self, Self::Error> {
        match repr {
            SpanRepr::Days(days) => {
                Self::from_seconds(days * DAY).ok_or_else(|| ConfigError::InvalidSpan {
                    value: days.to_string(),
                    reason: "out of range".to_string(),
                })
            }
            SpanRepr::Text(text) => Self::parse(&text),
        }
    }
}

fn unit_millis(seconds: f64) -> i64 {
    (seconds * 1_000.0) as i64
}

/// Seconds per unit for a textual unit name.
fn unit_seconds(unit: &str) -> Option<f64> {
    let seconds = match unit.to_ascii_lowercase().as_str() {
        "s" | "sec" | "secs" | "second" | "seconds" => SECOND,
        "min" | "mins" | "minute" | "minutes" => MINUTE,
        "h" | "hr" | "hrs" | "hour" | "hours" => HOUR,
        "d" | "day" | "days" => DAY,
        "w" | "wk" | "wks" | "week" | "weeks" => WEEK,
        "mo" | "mon" | "month" | "months" => MONTH,
        "y" | "yr" | "yrs" | "year" | "years" => YEAR,
        _ => return None,
    };
    Some(seconds)
}

/// Parses descriptions like "30 days", "2w", "1 year 6 months", "1 week, 2 days".
fn parse_text(value: &str) -> Option<f64> {
    let mut total = 0.0;
    let mut components = 0usize;
    let mut chars = value.chars().peekable();

    loop {
        while chars
            .peek()
            .is_some_and(|c| c.is_whitespace() || *c == ',')
        {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut number = String::new();
        while let Some(c) = chars.peek().copied().filter(|c| c.is_ascii_digit() || *c == '.') {
            number.push(c);
            chars.next();
        }
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        let mut unit = String::new();
        while let Some(c) = chars.peek().copied().filter(char::is_ascii_alphabetic) {
            unit.push(c);
            chars.next();
        }

        // "1 week and 2 days"
        if number.is_empty() && unit.eq_ignore_ascii_case("and") && components > 0 {
            continue;
        }
        let amount: f64 = number.parse().ok()?;
        total += amount * unit_seconds(&unit)?;
        components += 1;
    }

    (components > 0).then_some(total)
}

/// Parses the part of an ISO 8601 duration after the leading `P`.
fn parse_iso8601(body: &str) -> Option<f64> {
    // Week format: PnW
    if let Some(weeks) = body.strip_suffix('W')
        && let Ok(count) = weeks.parse::<f64>()
    {
        return Some(count * WEEK);
    }

    let (date_part, time_part) = match body.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (body, None),
    };
    if date_part.is_empty() && time_part.is_none_or(str::is_empty) {
        return None;
    }

    let mut seconds = sum_components(date_part, &[('Y', YEAR), ('M', MONTH), ('W', WEEK), ('D', DAY)])?;
    if let Some(time) = time_part {
        if time.is_empty() {
            return None;
        }
        seconds += sum_components(time, &[('H', HOUR), ('M', MINUTE), ('S', SECOND)])?;
    }
    Some(seconds)
}

fn sum_components(part: &str, designators: &[(char, f64)]) -> Option<f64> {
    let mut total = 0.0;
    let mut number = String::new();
    for c in part.chars() {
        if c.is_ascii_digit() || c == '.' {
            number.push(c);
            continue;
        }
        let (_, per) = designators.iter().find(|(designator, _)| *designator == c)?;
        let amount: f64 = number.parse().ok()?;
        total += amount * per;
        number.clear();
    }
    number.is_empty().then_some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_days() {
        assert_eq!(TimeSpan::parse("0").unwrap(), TimeSpan::zero());
        assert_eq!(TimeSpan::parse("30").unwrap(), TimeSpan::days(30));
        assert_eq!(TimeSpan::parse("0.5").unwrap(), TimeSpan::hours(12));
    }

    #[test]
    fn test_text_descriptions() {
        assert_eq!(TimeSpan::parse("30 days").unwrap(), TimeSpan::days(30));
        assert_eq!(TimeSpan::parse("1 day").unwrap(), TimeSpan::days(1));
        assert_eq!(TimeSpan::parse("2w").unwrap(), TimeSpan::weeks(2));
        assert_eq!(TimeSpan::parse("12 hours").unwrap(), TimeSpan::hours(12));
        assert_eq!(
            TimeSpan::parse("1 week, 2 days").unwrap(),
            TimeSpan::days(9)
        );
        assert_eq!(
            TimeSpan::parse("1 week and 2 days").unwrap(),
            TimeSpan::days(9)
        );
        assert_eq!(TimeSpan::parse("1 year").unwrap(), TimeSpan::year());
    }

    #[test]
    fn test_bare_unit_is_one_unit() {
        assert_eq!(TimeSpan::parse("days").unwrap(), TimeSpan::days(1));
        assert_eq!(TimeSpan::parse("Weeks").unwrap(), TimeSpan::weeks(1));
        assert_eq!(TimeSpan::parse("year").unwrap(), TimeSpan::year());
    }

    #[test]
    fn test_iso8601() {
        assert_eq!(TimeSpan::parse("P30D").unwrap(), TimeSpan::days(30));
        assert_eq!(TimeSpan::parse("P2W").unwrap(), TimeSpan::weeks(2));
        assert_eq!(TimeSpan::parse("PT12H").unwrap(), TimeSpan::hours(12));
        assert_eq!(TimeSpan::parse("P1DT12H").unwrap(), TimeSpan::hours(36));
        assert_eq!(TimeSpan::parse("P1Y").unwrap(), TimeSpan::year());
        assert!(TimeSpan::parse("P").is_err());
        assert!(TimeSpan::parse("PT").is_err());
        assert!(TimeSpan::parse("P5X").is_err());
    }

    #[test]
    fn test_negative_and_invalid() {
        assert_eq!(TimeSpan::parse("-3 days").unwrap(), TimeSpan::days(-3));
        assert!(TimeSpan::parse("-3 days").unwrap().is_negative());
        assert!(TimeSpan::parse("").is_err());
        assert!(TimeSpan::parse("and").is_err());
        assert!(TimeSpan::parse("3 fortnights").is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for span in [
            TimeSpan::days(30),
            TimeSpan::days(1),
            TimeSpan::weeks(2),
            TimeSpan::hours(36),
            TimeSpan::year(),
            TimeSpan::days(-3),
            TimeSpan::zero(),
        ] {
            assert_eq!(TimeSpan::parse(&span.to_string()).unwrap(), span);
        }
        assert_eq!(TimeSpan::days(30).to_string(), "30 days");
        assert_eq!(TimeSpan::days(14).to_string(), "2 weeks");
        assert_eq!(TimeSpan::hours(36).to_string(), "36 hours");
    }

    #[test]
    fn test_unit_label() {
        assert_eq!(TimeSpan::days(1).unit_label(), "days");
        assert_eq!(TimeSpan::weeks(1).unit_label(), "weeks");
        assert_eq!(TimeSpan::year().unit_label(), "years");
        assert_eq!(TimeSpan::days(30).unit_label(), "30 days");
    }

    #[test]
    fn test_count_in() {
        let elapsed = TimeDelta::days(151);
        assert_eq!(TimeSpan::days(1).count_in(elapsed), 151.0);
        assert_eq!(TimeSpan::weeks(1).count_in(TimeDelta::days(14)), 2.0);
    }
}
