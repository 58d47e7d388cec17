//! Helpers for parsing and formatting appointment timestamps.
//!
//! Timestamps are stored as naive UTC in SQLite and exposed as RFC 3339.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Format a stored timestamp as RFC 3339 with a `Z` suffix.
pub fn format_utc_rfc3339(date: NaiveDateTime) -> String {
    date.and_utc().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a client supplied datetime into naive UTC.
///
/// Accepts RFC 3339 (any offset) or a naive `YYYY-MM-DD HH:MM[:SS[.f]]`
/// where the separator may be `T`, a space or a tab. Naive input is UTC.
pub fn parse_datetime(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(input) {
        return Some(date.with_timezone(&Utc).naive_utc());
    }

    let normalized = match input.find(|c: char| c == ' ' || c == '\t') {
        Some(idx) => format!("{}T{}", &input[..idx], input[idx + 1..].trim_start()),
        None => input.to_string(),
    };
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&normalized, fmt).ok())
}
