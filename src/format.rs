//! Display helpers for dashboard tables.

#[cfg(test)]
#[path = "format_test.rs"]
mod tests;

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Rounded percentage of `completed` over `attempted`; 0 when nothing was
/// attempted.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn success_rate(completed: u64, attempted: u64) -> u32 {
    if attempted == 0 {
        return 0;
    }
    ((completed as f64 / attempted as f64) * 100.0).round() as u32
}

/// Milliseconds as `HH:MM:SS`. Hours keep counting past 99.
#[must_use]
pub fn format_duration(ms: u64) -> String {
    let total = ms / 1000;
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Normalize a timestamp to `YYYY-MM-DD HH:MM:SS`.
///
/// Accepts RFC 3339 (converted to UTC), the backend's own
/// `YYYY-MM-DD HH:MM:SS`, and ISO `YYYY-MM-DDTHH:MM:SS[.fff]` without an
/// offset. Returns `None` for anything else.
#[must_use]
pub fn format_timestamp(raw: &str) -> Option<String> {
    let out = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let raw = raw.trim();

    if let Ok(dt) = OffsetDateTime::parse(raw, &Rfc3339) {
        return dt.to_offset(time::UtcOffset::UTC).format(out).ok();
    }
    let naive = [
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    ];
    naive
        .iter()
        .find_map(|fmt| PrimitiveDateTime::parse(raw, *fmt).ok())
        .and_then(|dt| dt.format(out).ok())
}
