use chrono::{DateTime, NaiveDate, NaiveDateTime};

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

// `%.f` also matches when there is no fractional part.
const OFFSET_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M%#z"];
const LOCAL_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y%m%d"];

/// Render a byte count with the largest fitting unit, rounded to two decimals
/// with trailing zeros dropped (`1536` -> `1.5 KB`).
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_owned();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", SIZE_UNITS[unit])
}

/// Fixed two-decimal megabyte figure used in validator output.
#[must_use]
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / (1024.0 * 1024.0))
}

/// Parse an ISO-8601 release date: a calendar date (`2024-01-15` or
/// `20240115`), or a date-time with or without seconds, fraction and offset.
/// Date-times keep the calendar day as written.
pub fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    OFFSET_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date_naive())
        .or_else(|| {
            LOCAL_DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        })
}

/// Long en-US calendar date (`January 15, 2024`). Unparseable input is shown
/// as-is.
#[must_use]
pub fn format_release_date(raw: &str) -> String {
    parse_release_date(raw)
        .map(|date| date.format("%B %-d, %Y").to_string())
        .unwrap_or_else(|| raw.to_owned())
}
