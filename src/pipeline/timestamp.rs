//! Lenient parsing and display of API publish timestamps.
//!
//! Parsing never fails. Anything that cannot be read becomes
//! [`DateTime::<Utc>::MIN_UTC`], so undated articles collect at one end of a
//! sorted list instead of erroring.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Parse a raw timestamp, returning `None` when no known format matches.
pub fn try_parse(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    DateTime::parse_from_rfc2822(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Sort key for a possibly missing timestamp.
pub fn sort_key(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(try_parse).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// `02 Jan 2024, 10:00 AM`, or `02 Jan 2024` when only the date is readable,
/// or the raw date prefix as a last resort.
pub fn format_display_date(raw: Option<&str>) -> String {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return String::new();
    };

    if let Some(dt) = try_parse(raw) {
        if raw.contains('T') || raw.contains(':') {
            return dt.format("%d %b %Y, %-I:%M %p").to_string();
        }
        return dt.format("%d %b %Y").to_string();
    }

    let date_part = raw.split('T').next().unwrap_or(raw);
    match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(date) => date.format("%d %b %Y").to_string(),
        Err(_) => date_part.to_string(),
    }
}

/// Relative age such as `5 minutes ago`; switches to a date after a week.
pub fn time_ago(raw: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };
    let Some(published) = try_parse(raw) else {
        return raw.split('T').next().unwrap_or(raw).to_string();
    };

    let diff = now.signed_duration_since(published);
    let seconds = diff.num_seconds().max(0);
    let minutes = diff.num_minutes().max(0);
    let hours = diff.num_hours().max(0);
    let days = diff.num_days().max(0);

    if seconds < 60 {
        format!("{} seconds ago", seconds)
    } else if minutes < 60 {
        format!("{} minutes ago", minutes)
    } else if hours < 24 {
        format!("{} hours ago", hours)
    } else if days < 7 {
        format!("{} days ago", days)
    } else {
        published.format("%d %b %Y").to_string()
    }
}
