//! Time converters and formatters used by the `datetime` value type.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use import_common::{Value, DATETIME_FORMAT};

use crate::error::AccessError;

/// Layouts tried in order by [`TimeConverter::BomDateTimeFull`].
const DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d/%m/%Y %I:%M:%S %p",
    "%d/%m/%Y %I:%M %p",
    "%d %B %Y %H:%M",
    "%d %b %Y %H:%M",
];

const DATE_LAYOUTS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d %B %Y", "%d %b %Y"];

/// Converts a raw source value into a datetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeConverter {
    /// Fractional days since 1950-01-01T00:00:00.
    DaysSince1950,
    /// Free-form observation timestamp text.
    BomDateTimeFull,
}

/// Optional output formatting applied after conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFormatter {
    /// `YYYY-MM-DDTHH:MM:SS` text.
    Json,
}

impl TimeConverter {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "days_since_1950" => Some(TimeConverter::DaysSince1950),
            "bom_date_time_full" => Some(TimeConverter::BomDateTimeFull),
            _ => None,
        }
    }

    pub fn convert(&self, value: &Value) -> Result<NaiveDateTime, AccessError> {
        let fail = || AccessError::Conversion {
            value: value.to_string(),
            target: "datetime".to_string(),
        };

        match self {
            TimeConverter::DaysSince1950 => {
                let days = value.as_f64().ok_or_else(fail)?;
                days_since_1950(days).ok_or_else(fail)
            }
            TimeConverter::BomDateTimeFull => match value {
                Value::DateTime(dt) => Ok(*dt),
                Value::Text(text) => parse_date_time_full(text).ok_or_else(fail),
                Value::Integer(i) => parse_date_time_full(&i.to_string()).ok_or_else(fail),
                _ => Err(fail()),
            },
        }
    }
}

impl TimeFormatter {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "json" => Some(TimeFormatter::Json),
            _ => None,
        }
    }

    pub fn format(&self, dt: &NaiveDateTime) -> String {
        match self {
            TimeFormatter::Json => dt.format(DATETIME_FORMAT).to_string(),
        }
    }
}

fn epoch_1950() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1950, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// `1950-01-01 + days`, rounded to the microsecond.
pub fn days_since_1950(days: f64) -> Option<NaiveDateTime> {
    if !days.is_finite() {
        return None;
    }
    let micros = (days * 86_400_000_000.0).round();
    if micros.abs() >= i64::MAX as f64 {
        return None;
    }
    epoch_1950()?.checked_add_signed(Duration::microseconds(micros as i64))
}

/// Parse a free-form timestamp, trying compact digit forms first.
pub fn parse_date_time_full(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if text.bytes().all(|b| b.is_ascii_digit()) {
        return parse_compact(text);
    }

    for layout in DATETIME_LAYOUTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, layout) {
            return Some(dt);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }

    DATE_LAYOUTS.iter().find_map(|layout| {
        NaiveDate::parse_from_str(text, layout)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    })
}

/// `YYYYMMDD`, `YYYYMMDDHHMM` or `YYYYMMDDHHMMSS`.
fn parse_compact(digits: &str) -> Option<NaiveDateTime> {
    let part = |range: std::ops::Range<usize>| digits.get(range)?.parse::<u32>().ok();

    let (hour, minute, second) = match digits.len() {
        8 => (0, 0, 0),
        12 => (part(8..10)?, part(10..12)?, 0),
        14 => (part(8..10)?, part(10..12)?, part(12..14)?),
        _ => return None,
    };

    let year = digits.get(0..4)?.parse::<i32>().ok()?;
    NaiveDate::from_ymd_opt(year, part(4..6)?, part(6..8)?)?.and_hms_opt(hour, minute, second)
}
