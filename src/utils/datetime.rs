//! Datetime storage helpers
//!
//! Timestamps are stored as fixed-width UTC text (`YYYY-MM-DD HH:MM:SS.ffffff`)
//! so that ordering by the column's text matches ordering by time.

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

/// Errors that can occur during datetime operations
#[derive(Error, Debug)]
pub enum DateTimeError {
    /// Invalid datetime format provided
    #[error("Invalid datetime format: '{input}' - expected RFC3339 or YYYY-MM-DD HH:MM:SS[.f]")]
    InvalidFormat { input: String },
}

pub struct DateTimeParser;

impl DateTimeParser {
    /// Parse RFC3339 or the naive storage formats (assumed UTC).
    pub fn parse_flexible(datetime_str: &str) -> Result<DateTime<Utc>, DateTimeError> {
        let trimmed = datetime_str.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(dt.with_timezone(&Utc));
        }

        let naive_formats = [
            "%Y-%m-%d %H:%M:%S%.f", // storage format
            "%Y-%m-%d %H:%M:%S",    // SQLite CURRENT_TIMESTAMP
            "%Y-%m-%dT%H:%M:%S%.f",
        ];

        for format in &naive_formats {
            if let Ok(naive_dt) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Ok(DateTime::from_naive_utc_and_offset(naive_dt, Utc));
            }
        }

        Err(DateTimeError::InvalidFormat {
            input: datetime_str.to_string(),
        })
    }

    /// Fixed-width storage format with microsecond precision.
    pub fn format_for_storage(dt: &DateTime<Utc>) -> String {
        dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
    }
}
