//! Command implementations.

pub mod coach;
pub mod completions;
pub mod init;
pub mod plan;
pub mod stats;
pub mod task;
pub mod today;
pub mod version;

use crate::config::{default_actor, resolve_db_path};
use crate::coordinator::Coordinator;
use crate::error::{Error, Result};
use chrono::{Local, NaiveDate};
use std::path::PathBuf;

/// Open the resolved database behind a coordinator.
///
/// The database must already exist (`growth init`).
pub(crate) fn open_coordinator(db_path: Option<&PathBuf>, actor: Option<&str>) -> Result<Coordinator> {
    let db_path = resolve_db_path(db_path.map(PathBuf::as_path)).ok_or(Error::NotInitialized)?;

    if !db_path.exists() {
        return Err(Error::NotInitialized);
    }

    let actor = actor.map_or_else(default_actor, String::from);
    Coordinator::open(&db_path, actor)
}

/// Render epoch milliseconds as local RFC 3339.
pub(crate) fn format_timestamp(ts: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ts)
        .map_or_else(|| ts.to_string(), |dt| dt.with_timezone(&Local).to_rfc3339())
}

/// Render epoch milliseconds as a local calendar day.
pub(crate) fn format_day(ts: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ts)
        .map_or_else(|| ts.to_string(), |dt| dt.with_timezone(&Local).format("%Y-%m-%d").to_string())
}

/// Parse a `YYYY-MM-DD` argument.
pub(crate) fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| Error::InvalidArgument(format!("invalid date '{input}', expected YYYY-MM-DD")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-05-10").unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
        );
        assert!(matches!(parse_date("10/05/2024"), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_format_timestamp_falls_back_to_raw() {
        assert_eq!(format_timestamp(i64::MAX), i64::MAX.to_string());
        assert!(format_timestamp(0).contains('T'));
    }
}
