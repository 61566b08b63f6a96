//! Date/time formatting and validation for date boxes and formatted fields.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

use super::error::{FormError, Result};

/// Accepted date-time spellings, tried in order.
const DATE_TIME_INPUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Accepted date-only spellings, tried in order.
const DATE_INPUTS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Accepted time spellings, tried in order.
const TIME_INPUTS: &[&str] = &["%H:%M:%S", "%H:%M:%S%.f", "%H:%M"];

/// Date box display mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateMode {
    /// `YYYY-MM-DD` (flag 1)
    #[default]
    Date,
    /// `YYYY-MM-DD HH:mm:ss` (flag 2)
    DateTime,
    /// `HH:mm:ss` (flag 3)
    Time,
}

impl DateMode {
    /// Select the mode from a `format` flag; absent or unrecognized flags mean date-only.
    pub fn from_flag(flag: Option<&Value>) -> Self {
        let flag = match flag {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };
        match flag {
            Some(2) => DateMode::DateTime,
            Some(3) => DateMode::Time,
            _ => DateMode::Date,
        }
    }

    /// The display pattern in the notation the backend uses
    pub fn pattern(&self) -> &'static str {
        match self {
            DateMode::Date => "YYYY-MM-DD",
            DateMode::DateTime => "YYYY-MM-DD HH:mm:ss",
            DateMode::Time => "HH:mm:ss",
        }
    }

    fn chrono_pattern(&self) -> &'static str {
        match self {
            DateMode::Date => "%Y-%m-%d",
            DateMode::DateTime => "%Y-%m-%d %H:%M:%S",
            DateMode::Time => "%H:%M:%S",
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            DateMode::Date => "date (YYYY-MM-DD)",
            DateMode::DateTime => "date-time (YYYY-MM-DD HH:mm:ss)",
            DateMode::Time => "time (HH:mm:ss)",
        }
    }
}

fn parse_date_time(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(input) {
        return Some(dt.naive_local());
    }
    DATE_TIME_INPUTS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            DATE_INPUTS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

fn parse_time(input: &str) -> Option<NaiveTime> {
    let input = input.trim();
    TIME_INPUTS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(input, fmt).ok())
}

fn parses(input: &str, mode: DateMode) -> bool {
    match mode {
        DateMode::Time => parse_time(input).is_some(),
        DateMode::Date | DateMode::DateTime => parse_date_time(input).is_some(),
    }
}

/// Format `input` for display under `mode`.
///
/// Time-only values are returned unchanged when they parse. Dates and
/// date-times are re-rendered in the mode's pattern. Anything unparseable
/// yields an empty string.
pub fn format_date(input: &str, mode: DateMode) -> String {
    match mode {
        DateMode::Time => {
            if parse_time(input).is_some() {
                input.to_string()
            } else {
                String::new()
            }
        }
        DateMode::Date | DateMode::DateTime => parse_date_time(input)
            .map(|dt| dt.format(mode.chrono_pattern()).to_string())
            .unwrap_or_default(),
    }
}

/// Check user input under `mode` without reformatting it.
///
/// Empty input is accepted; whether it is allowed is a required-field concern.
pub fn validate_date(input: &str, mode: DateMode) -> Result<()> {
    if input.trim().is_empty() || parses(input, mode) {
        Ok(())
    } else {
        Err(FormError::InvalidDate {
            input: input.to_string(),
            expected: mode.describe(),
        })
    }
}
