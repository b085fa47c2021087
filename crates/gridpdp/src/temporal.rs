//! Calendar arithmetic backing the `dateTime`, `duration` and `period` kinds.
//!
//! Durations keep calendar months apart from exact seconds so that adding
//! `P1Y` to `2020-01-01T00:00:00Z` lands on `2021-01-01T00:00:00Z` regardless
//! of leap years.

use std::hash::{Hash, Hasher};

use chrono::{DateTime, Months, NaiveDateTime, SecondsFormat, TimeDelta, Utc};

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;
const SECONDS_PER_WEEK: i64 = 7 * SECONDS_PER_DAY;

// ============================================================================
// Date-time literals
// ============================================================================

/// Parses a date-time literal.
///
/// Accepts RFC 3339 (`2020-01-01T00:00:00Z`, `2020-01-01T02:00:00+02:00`) and
/// zone-less `YYYY-MM-DDTHH:MM:SS` / `YYYY-MM-DD HH:MM:SS`, which are read as UTC.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Canonical RFC 3339 form in UTC with a `Z` suffix.
pub fn encode_datetime(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

// ============================================================================
// Duration
// ============================================================================

/// An ISO 8601 duration (`PnYnMnWnDTnHnMnS`).
///
/// Years and months are calendar units; weeks, days, hours, minutes and
/// seconds are folded into an exact number of seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Duration {
    months: u32,
    seconds: i64,
}

impl Duration {
    /// Calendar months plus exact seconds. `None` if `seconds` is negative.
    pub fn new(months: u32, seconds: i64) -> Option<Self> {
        (seconds >= 0).then_some(Self { months, seconds })
    }

    pub fn from_seconds(seconds: i64) -> Option<Self> {
        Self::new(0, seconds)
    }

    pub fn months(&self) -> u32 {
        self.months
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    pub fn is_zero(&self) -> bool {
        self.months == 0 && self.seconds == 0
    }

    /// Parses an ISO 8601 duration, returning a human-readable reason on failure.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        let body = raw
            .strip_prefix('P')
            .ok_or_else(|| "duration must start with 'P'".to_string())?;

        let mut months: u32 = 0;
        let mut seconds: i64 = 0;
        let mut in_time = false;
        let mut components = 0usize;
        let mut digits = String::new();

        for c in body.chars() {
            if c.is_ascii_digit() {
                digits.push(c);
                continue;
            }
            if c == 'T' && !in_time && digits.is_empty() {
                in_time = true;
                continue;
            }
            if digits.is_empty() {
                return Err(format!("missing number before '{c}'"));
            }
            let n: u64 = digits
                .parse()
                .map_err(|_| format!("component '{digits}' is out of range"))?;
            digits.clear();

            match (in_time, c) {
                (false, 'Y') => months = add_months(months, n, 12)?,
                (false, 'M') => months = add_months(months, n, 1)?,
                (false, 'W') => seconds = add_scaled(seconds, n, SECONDS_PER_WEEK)?,
                (false, 'D') => seconds = add_scaled(seconds, n, SECONDS_PER_DAY)?,
                (true, 'H') => seconds = add_scaled(seconds, n, SECONDS_PER_HOUR)?,
                (true, 'M') => seconds = add_scaled(seconds, n, SECONDS_PER_MINUTE)?,
                (true, 'S') => seconds = add_scaled(seconds, n, 1)?,
                _ => return Err(format!("unexpected designator '{c}'")),
            }
            components += 1;
        }

        if !digits.is_empty() {
            return Err(format!("number '{digits}' has no designator"));
        }
        if components == 0 {
            return Err("duration has no components".to_string());
        }
        Ok(Self { months, seconds })
    }

    /// Canonical ISO 8601 form with zero components omitted (`PT0S` for zero).
    pub fn encode(&self) -> String {
        if self.is_zero() {
            return "PT0S".to_string();
        }

        let mut out = String::from("P");
        let (years, months) = (self.months / 12, self.months % 12);
        if years > 0 {
            out.push_str(&format!("{years}Y"));
        }
        if months > 0 {
            out.push_str(&format!("{months}M"));
        }

        let days = self.seconds / SECONDS_PER_DAY;
        let rem = self.seconds % SECONDS_PER_DAY;
        if days > 0 {
            out.push_str(&format!("{days}D"));
        }
        if rem > 0 {
            out.push('T');
            let (hours, rem) = (rem / SECONDS_PER_HOUR, rem % SECONDS_PER_HOUR);
            let (minutes, secs) = (rem / SECONDS_PER_MINUTE, rem % SECONDS_PER_MINUTE);
            if hours > 0 {
                out.push_str(&format!("{hours}H"));
            }
            if minutes > 0 {
                out.push_str(&format!("{minutes}M"));
            }
            if secs > 0 {
                out.push_str(&format!("{secs}S"));
            }
        }
        out
    }

    /// `instant + self`, or `None` on calendar overflow.
    pub fn add_to(&self, instant: DateTime<Utc>) -> Option<DateTime<Utc>> {
        instant
            .checked_add_months(Months::new(self.months))?
            .checked_add_signed(TimeDelta::try_seconds(self.seconds)?)
    }

    /// `instant - self`, or `None` on calendar overflow.
    pub fn subtract_from(&self, instant: DateTime<Utc>) -> Option<DateTime<Utc>> {
        instant
            .checked_sub_months(Months::new(self.months))?
            .checked_sub_signed(TimeDelta::try_seconds(self.seconds)?)
    }
}

fn overflow() -> String {
    "duration overflows".to_string()
}

fn add_months(acc: u32, n: u64, unit: u32) -> Result<u32, String> {
    u32::try_from(n)
        .ok()
        .and_then(|n| n.checked_mul(unit))
        .and_then(|m| acc.checked_add(m))
        .ok_or_else(overflow)
}

fn add_scaled(acc: i64, n: u64, unit: i64) -> Result<i64, String> {
    i64::try_from(n)
        .ok()
        .and_then(|n| n.checked_mul(unit))
        .and_then(|s| acc.checked_add(s))
        .ok_or_else(overflow)
}

// ============================================================================
// Period
// ============================================================================

/// How a period literal was written; kept so `encode` reproduces it.
#[derive(Debug, Clone, Copy)]
enum PeriodForm {
    Endpoints,
    StartDuration(Duration),
    DurationEnd(Duration),
}

/// A closed time interval.
///
/// Written as `start/end`, `start/duration` or `duration/end`; the missing
/// endpoint is derived from the other one and the duration. Two periods are
/// equal when they cover the same interval, however they were written.
#[derive(Debug, Clone, Copy)]
pub struct Period {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    form: PeriodForm,
}

impl Period {
    /// Interval between two endpoints. `None` if `end` precedes `start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start <= end).then_some(Self {
            start,
            end,
            form: PeriodForm::Endpoints,
        })
    }

    pub fn starting_at(start: DateTime<Utc>, duration: Duration) -> Option<Self> {
        let end = duration.add_to(start)?;
        Some(Self {
            start,
            end,
            form: PeriodForm::StartDuration(duration),
        })
    }

    pub fn ending_at(duration: Duration, end: DateTime<Utc>) -> Option<Self> {
        let start = duration.subtract_from(end)?;
        Some(Self {
            start,
            end,
            form: PeriodForm::DurationEnd(duration),
        })
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        let (left, right) = raw.trim().split_once('/').ok_or_else(|| {
            "period must be 'start/end', 'start/duration' or 'duration/end'".to_string()
        })?;
        let (left, right) = (left.trim(), right.trim());

        match (left.starts_with('P'), right.starts_with('P')) {
            (true, true) => Err("period needs at least one endpoint".to_string()),
            (true, false) => {
                let duration = Duration::parse(left)?;
                let end = datetime_endpoint(right)?;
                Self::ending_at(duration, end).ok_or_else(|| "period start overflows".to_string())
            }
            (false, true) => {
                let start = datetime_endpoint(left)?;
                let duration = Duration::parse(right)?;
                Self::starting_at(start, duration).ok_or_else(|| "period end overflows".to_string())
            }
            (false, false) => {
                let start = datetime_endpoint(left)?;
                let end = datetime_endpoint(right)?;
                Self::new(start, end).ok_or_else(|| "period end precedes its start".to_string())
            }
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// The duration the period was written with, if any.
    pub fn duration(&self) -> Option<Duration> {
        match self.form {
            PeriodForm::Endpoints => None,
            PeriodForm::StartDuration(d) | PeriodForm::DurationEnd(d) => Some(d),
        }
    }

    /// Inclusive at both ends.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    pub fn encode(&self) -> String {
        match self.form {
            PeriodForm::Endpoints => format!(
                "{}/{}",
                encode_datetime(&self.start),
                encode_datetime(&self.end)
            ),
            PeriodForm::StartDuration(d) => {
                format!("{}/{}", encode_datetime(&self.start), d.encode())
            }
            PeriodForm::DurationEnd(d) => format!("{}/{}", d.encode(), encode_datetime(&self.end)),
        }
    }
}

fn datetime_endpoint(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_datetime(raw).ok_or_else(|| format!("'{raw}' is not a date-time"))
}

impl PartialEq for Period {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.end == other.end
    }
}

impl Eq for Period {}

impl Hash for Period {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.start.hash(state);
        self.end.hash(state);
    }
}

// ============================================================================
// Tests
// ============================================================================
