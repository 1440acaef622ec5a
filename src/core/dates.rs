use anyhow::{Result, anyhow};
use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, Utc};

const DATETIME_LAYOUTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_LAYOUT: &str = "%Y-%m-%d";

/// Parses a user supplied date. An empty string means now.
pub fn parse_date_string(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(Utc::now());
    }
    parse_datetime(value)
}

/// Parses `YYYY-MM-DD`, `YYYY-MM-DD HH:MM` or `YYYY-MM-DD HH:MM:SS` as UTC.
pub fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    for layout in DATETIME_LAYOUTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, layout) {
            return Ok(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, DATE_LAYOUT)
        .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc())
        .map_err(|_| anyhow!("Invalid date: '{}'", value))
}

/// Same calendar day `years` back from `end`. Feb 29 falls back to Feb 28.
pub fn years_before(end: DateTime<Utc>, years: u32) -> Result<DateTime<Utc>> {
    years
        .checked_mul(12)
        .and_then(|months| end.checked_sub_months(Months::new(months)))
        .ok_or_else(|| anyhow!("Cannot go back {} years from {}", years, end))
}
