//! Wall-clock and calendar helpers. Timestamps are plain Unix seconds; no
//! timezone database is involved, offsets in ISO strings are applied directly.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::CreationStamp;

pub fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Convert a provider creation stamp to Unix seconds.
pub fn stamp_to_unix_secs(stamp: &CreationStamp) -> Option<f64> {
    match stamp {
        CreationStamp::EpochMillis(ms) if ms.is_finite() => Some(ms / 1000.0),
        CreationStamp::EpochMillis(_) => None,
        CreationStamp::Text(s) => parse_iso_to_unix_secs(s),
    }
}

/// Parse an ISO 8601 date or date-time to Unix seconds.
///
/// Accepts `YYYY-MM-DD`, optionally followed by `T` (or a space) and
/// `HH:MM[:SS[.fff]]`, optionally followed by `Z` or a `±HH[:MM]` offset.
/// A date-time without an offset is read as UTC.
pub fn parse_iso_to_unix_secs(s: &str) -> Option<f64> {
    let s = s.trim();
    let (date, rest) = match s.find(|c: char| c == 'T' || c == 't' || c == ' ') {
        Some(idx) => (&s[..idx], Some(&s[idx + 1..])),
        None => (s, None),
    };

    let mut secs = parse_date(date)? as f64 * 86_400.0;
    if let Some(rest) = rest {
        let (clock, offset_secs) = split_offset(rest)?;
        secs += parse_clock(clock)?;
        secs -= offset_secs as f64;
    }
    Some(secs)
}

fn parse_date(date: &str) -> Option<i64> {
    if date.len() != 10 {
        return None;
    }
    let mut parts = date.splitn(3, '-');
    let year: i64 = parts.next()?.parse().ok()?;
    let month: i64 = parts.next()?.parse().ok()?;
    let day: i64 = parts.next()?.parse().ok()?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    // Days past the end of the month (2024-02-31) would roll into the next one.
    let days = days_from_civil(year, month, day);
    (civil_from_days(days) == (year, month as u32, day as u32)).then_some(days)
}

/// Splits a trailing `Z` / `±HH:MM` / `±HHMM` / `±HH` offset off a clock string.
fn split_offset(rest: &str) -> Option<(&str, i64)> {
    if let Some(clock) = rest.strip_suffix('Z').or_else(|| rest.strip_suffix('z')) {
        return Some((clock, 0));
    }
    let Some(idx) = rest.rfind(|c: char| c == '+' || c == '-') else {
        return Some((rest, 0));
    };

    let sign = if rest.as_bytes()[idx] == b'-' { -1 } else { 1 };
    let digits: String = rest[idx + 1..].chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) || !(digits.len() == 2 || digits.len() == 4) {
        return None;
    }
    let hours: i64 = digits[..2].parse().ok()?;
    let minutes: i64 = if digits.len() == 4 { digits[2..].parse().ok()? } else { 0 };
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some((&rest[..idx], sign * (hours * 3_600 + minutes * 60)))
}

fn parse_clock(clock: &str) -> Option<f64> {
    let mut parts = clock.split(':');
    let hour: u32 = parts.next()?.parse().ok()?;
    let minute: u32 = parts.next()?.parse().ok()?;
    let second: f64 = match parts.next() {
        Some(s) => s.parse().ok()?,
        None => 0.0,
    };
    if parts.next().is_some() || hour > 23 || minute > 59 || !(0.0..61.0).contains(&second) {
        return None;
    }
    Some(f64::from(hour) * 3_600.0 + f64::from(minute) * 60.0 + second)
}

/// Days since 1970-01-01 for a proleptic Gregorian date (Julian day number offset).
fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let a = (14 - month) / 12;
    let y = year + 4800 - a;
    let m = month + 12 * a - 3;
    let jdn = day + (153 * m + 2) / 5 + 365 * y + y / 4 - y / 100 + y / 400 - 32_045;
    jdn - 2_440_588
}

fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// `2024-03-01T12:30:05Z` style rendering of Unix seconds (sub-second part dropped).
pub fn format_unix_secs_iso(secs: f64) -> String {
    let total = secs.floor() as i64;
    let days = total.div_euclid(86_400);
    let sod = total.rem_euclid(86_400);
    let (year, month, day) = civil_from_days(days);
    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}Z",
        sod / 3_600,
        (sod % 3_600) / 60,
        sod % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_utc_datetime() {
        assert_eq!(parse_iso_to_unix_secs("2021-01-01T00:00:00Z"), Some(1_609_459_200.0));
        assert_eq!(parse_iso_to_unix_secs("1970-01-01"), Some(0.0));
    }

    #[test]
    fn applies_offsets() {
        let utc = parse_iso_to_unix_secs("2024-06-01T12:00:00Z").unwrap();
        let plus_two = parse_iso_to_unix_secs("2024-06-01T14:00:00+02:00").unwrap();
        let minus_five = parse_iso_to_unix_secs("2024-06-01T07:00:00-0500").unwrap();
        assert_eq!(utc, plus_two);
        assert_eq!(utc, minus_five);
    }

    #[test]
    fn keeps_fractional_seconds() {
        let secs = parse_iso_to_unix_secs("2024-06-01T00:00:01.500Z").unwrap();
        let whole = parse_iso_to_unix_secs("2024-06-01T00:00:00Z").unwrap();
        assert!((secs - whole - 1.5).abs() < 1e-9);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_iso_to_unix_secs("not a date"), None);
        assert_eq!(parse_iso_to_unix_secs("2024-13-01"), None);
        assert_eq!(parse_iso_to_unix_secs("2024-01-01T25:00:00Z"), None);
        assert_eq!(parse_iso_to_unix_secs(""), None);
    }

    #[test]
    fn rejects_days_past_month_end() {
        assert_eq!(parse_iso_to_unix_secs("2024-02-31T00:00:00Z"), None);
        assert_eq!(parse_iso_to_unix_secs("2023-04-31"), None);
        assert_eq!(parse_iso_to_unix_secs("2023-02-29"), None);
        assert_eq!(parse_iso_to_unix_secs("1900-02-29"), None);
        assert!(parse_iso_to_unix_secs("2024-02-29T00:00:00Z").is_some());
        assert!(parse_iso_to_unix_secs("2000-02-29").is_some());
        assert!(parse_iso_to_unix_secs("2023-04-30").is_some());
    }

    #[test]
    fn millis_stamp_converts_to_seconds() {
        let stamp = CreationStamp::EpochMillis(1_609_459_200_000.0);
        assert_eq!(stamp_to_unix_secs(&stamp), Some(1_609_459_200.0));
    }

    #[test]
    fn formats_back_to_iso() {
        assert_eq!(format_unix_secs_iso(0.0), "1970-01-01T00:00:00Z");
        assert_eq!(format_unix_secs_iso(1_709_296_205.9), "2024-03-01T12:30:05Z");
        let parsed = parse_iso_to_unix_secs("2000-02-29T23:59:59Z").unwrap();
        assert_eq!(format_unix_secs_iso(parsed), "2000-02-29T23:59:59Z");
    }
}
