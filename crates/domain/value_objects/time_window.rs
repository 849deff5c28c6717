use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_RANGE_DAYS: i64 = 30;

/// How a range token that is not `<digits>d` is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangeParsing {
    /// Strip every `d`, read the leading digits after an optional `+`, fall back to 0
    /// when there are none.
    #[default]
    Lenient,
    /// Anything other than `<digits>d` is rejected.
    Strict,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TimeRangeError {
    #[error("time_range must look like `30d`, got `{0}`")]
    Malformed(String),
    #[error("time_range reaches outside the supported calendar, got `{0}`")]
    OutOfRange(String),
}

/// Lookback expressed in whole days, e.g. `30d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeToken {
    days: i64,
}

impl Default for RangeToken {
    fn default() -> Self {
        Self {
            days: DEFAULT_RANGE_DAYS,
        }
    }
}

impl RangeToken {
    pub fn parse(raw: Option<&str>, mode: RangeParsing) -> Result<Self, TimeRangeError> {
        let raw = match raw.map(str::trim) {
            Some(value) if !value.is_empty() => value,
            _ => return Ok(Self::default()),
        };

        let digits = match mode {
            RangeParsing::Strict => {
                let digits = raw
                    .strip_suffix('d')
                    .filter(|d| !d.is_empty() && d.chars().all(|c| c.is_ascii_digit()))
                    .ok_or_else(|| TimeRangeError::Malformed(raw.to_string()))?;
                digits.to_string()
            }
            RangeParsing::Lenient => {
                let stripped = raw.chars().filter(|c| *c != 'd').collect::<String>();
                let stripped = stripped.trim_start();
                stripped
                    .strip_prefix('+')
                    .unwrap_or(stripped)
                    .chars()
                    .take_while(|c| c.is_ascii_digit())
                    .collect::<String>()
            }
        };

        if digits.is_empty() {
            return Ok(Self { days: 0 });
        }

        let days = digits
            .parse::<i64>()
            .ok()
            .filter(|days| Duration::try_days(*days).is_some())
            .ok_or_else(|| TimeRangeError::OutOfRange(raw.to_string()))?;

        Ok(Self { days })
    }

    pub fn days(&self) -> i64 {
        self.days
    }

    pub fn as_token(&self) -> String {
        format!("{}d", self.days)
    }
}

/// Every instant one dashboard computation needs, derived from a single `now`.
///
/// `start..=end` is the requested rolling window. `previous_start..previous_end`
/// is always the previous calendar month, independent of the requested range.
/// Weeks start on Monday and calendar boundaries are UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub days: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub previous_start: DateTime<Utc>,
    pub previous_end: DateTime<Utc>,
    #[serde(skip)]
    pub today_start: DateTime<Utc>,
    #[serde(skip)]
    pub week_start: DateTime<Utc>,
    #[serde(skip)]
    pub month_start: DateTime<Utc>,
    #[serde(skip)]
    pub next_month_start: DateTime<Utc>,
}

impl TimeWindow {
    /// Fails when `now - days` falls outside what chrono can represent.
    pub fn resolve(token: RangeToken, now: DateTime<Utc>) -> Result<Self, TimeRangeError> {
        let start = Duration::try_days(token.days())
            .and_then(|lookback| now.checked_sub_signed(lookback))
            .ok_or_else(|| TimeRangeError::OutOfRange(token.as_token()))?;

        let today = now.date_naive();
        let week_start = today - Days::new(u64::from(today.weekday().num_days_from_monday()));
        let month_start = today - Days::new(u64::from(today.day0()));
        let previous_month_start = month_start - Months::new(1);
        let next_month_start = month_start + Months::new(1);

        Ok(Self {
            days: token.days(),
            start,
            end: now,
            previous_start: midnight(previous_month_start),
            previous_end: midnight(month_start),
            today_start: midnight(today),
            week_start: midnight(week_start),
            month_start: midnight(month_start),
            next_month_start: midnight(next_month_start),
        })
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
