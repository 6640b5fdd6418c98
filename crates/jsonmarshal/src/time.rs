//! Text forms of the date and date-time scalars.
//!
//! Dates use ISO 8601 calendar dates (`2024-02-29`); date-times use RFC 3339
//! and are normalized to UTC, rendered with a `Z` suffix.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::error::ErrorKind;

pub(crate) fn parse_date(text: &str) -> Result<NaiveDate, ErrorKind> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| ErrorKind::InvalidDateTime {
        format: "date",
        text: text.to_string(),
    })
}

pub(crate) fn parse_date_time(text: &str) -> Result<DateTime<Utc>, ErrorKind> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ErrorKind::InvalidDateTime {
            format: "date-time",
            text: text.to_string(),
        })
}

pub(crate) fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn format_date_time(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
