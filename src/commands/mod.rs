pub mod agenda;
pub mod conflicts;
pub mod day;
pub mod move_cmd;
pub mod new;
pub mod remove;

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Default agenda span in days.
pub const AGENDA_DAYS: i64 = 7;

/// Inclusive day range as UTC window boundaries.
pub fn day_window(from: NaiveDate, to: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = from.and_hms_opt(0, 0, 0).unwrap().and_utc();
    let end = to.and_hms_opt(23, 59, 59).unwrap().and_utc();
    (start, end)
}

/// Parse a date/time argument: "2024-03-20T15:00" or "2024-03-20"
/// (midnight).
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(datetime) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M") {
        return Ok(datetime.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(0, 0, 0).unwrap().and_utc());
    }
    Err(anyhow!(
        "Invalid date/time '{}'. Expected YYYY-MM-DD or YYYY-MM-DDTHH:MM",
        s
    ))
}
