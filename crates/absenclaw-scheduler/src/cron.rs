//! Lightweight cron expression parser.
//! Supports: "MIN HOUR DOM MON DOW" (5-field, no seconds)
//! Field syntax: *, */N, N, N-M, comma lists (DOM/MON simplified: only *).
//! Example: "50 7 * * 1-5" = weekdays at 7:50.
//!
//! Evaluation happens in the workplace's fixed UTC offset — the target
//! zones here have no daylight saving, so the offset is the whole story.

use chrono::{DateTime, Datelike, Duration, FixedOffset, Timelike};

/// Parse a cron expression and compute the next run time after `after`.
pub fn next_run_from_cron(
    expression: &str,
    after: DateTime<FixedOffset>,
) -> Option<DateTime<FixedOffset>> {
    let parts: Vec<&str> = expression.split_whitespace().collect();
    if parts.len() != 5 {
        tracing::warn!(
            "Invalid cron expression: '{}' (need 5 fields: MIN HOUR DOM MON DOW)",
            expression
        );
        return None;
    }

    let minutes = parse_field(parts[0], 0, 59)?;
    let hours = parse_field(parts[1], 0, 23)?;
    let _dom_spec = parts[2]; // Day of month (simplified: only * supported)
    let _mon_spec = parts[3]; // Month (simplified: only * supported)
    // Day of week, cron numbering: 0=Sunday … 6=Saturday.
    let dows = parse_field(parts[4], 0, 6)?;

    // Find the next matching minute after `after`.
    let mut candidate = after + Duration::minutes(1);
    candidate = candidate.with_second(0).unwrap_or(candidate);
    candidate = candidate.with_nanosecond(0).unwrap_or(candidate);

    // Try up to 8 days ahead — enough for any weekday constraint.
    for _ in 0..(8 * 24 * 60) {
        let m = candidate.minute();
        let h = candidate.hour();
        let d = candidate.weekday().num_days_from_sunday();

        if minutes.contains(&m) && hours.contains(&h) && dows.contains(&d) {
            return Some(candidate);
        }
        candidate += Duration::minutes(1);
    }

    None
}

/// Parse a cron field into a list of matching values.
fn parse_field(field: &str, min: u32, max: u32) -> Option<Vec<u32>> {
    if field == "*" {
        return Some((min..=max).collect());
    }

    // */N — every N
    if let Some(step) = field.strip_prefix("*/") {
        let n: u32 = step.parse().ok()?;
        if n == 0 {
            return None;
        }
        return Some((min..=max).step_by(n as usize).collect());
    }

    // Comma list where each element is N or N-M: "0,6", "1-5", "1,3-5"
    let mut values = Vec::new();
    for part in field.split(',') {
        let part = part.trim();
        if let Some((lo, hi)) = part.split_once('-') {
            let lo: u32 = lo.trim().parse().ok()?;
            let hi: u32 = hi.trim().parse().ok()?;
            if lo > hi || hi > max || lo < min {
                return None;
            }
            values.extend(lo..=hi);
        } else {
            let n: u32 = part.parse().ok()?;
            if n < min || n > max {
                return None;
            }
            values.push(n);
        }
    }
    if values.is_empty() { None } else { Some(values) }
}

/// Parse a "+07:00" / "-03:30" style offset into a `FixedOffset`.
pub fn parse_utc_offset(s: &str) -> Option<FixedOffset> {
    let s = s.trim();
    let (sign, rest) = match *s.as_bytes().first()? {
        b'+' => (1i32, &s[1..]),
        b'-' => (-1i32, &s[1..]),
        _ => (1i32, s),
    };
    let (h, m) = rest.split_once(':')?;
    let hours: i32 = h.parse().ok()?;
    let minutes: i32 = m.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn jakarta() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }

    #[test]
    fn test_every_hour() {
        let after = jakarta().with_ymd_and_hms(2026, 2, 22, 10, 30, 0).unwrap();
        let next = next_run_from_cron("0 * * * *", after).unwrap();
        assert_eq!(next.hour(), 11);
        assert_eq!(next.minute(), 0);
    }

    #[test]
    fn test_specific_time() {
        let after = jakarta().with_ymd_and_hms(2026, 2, 22, 7, 0, 0).unwrap();
        let next = next_run_from_cron("50 7 * * *", after).unwrap();
        assert_eq!(next.hour(), 7);
        assert_eq!(next.minute(), 50);
    }

    #[test]
    fn test_weekday_range_skips_weekend() {
        // 2026-02-21 is a Saturday.
        let after = jakarta().with_ymd_and_hms(2026, 2, 21, 6, 0, 0).unwrap();
        let next = next_run_from_cron("50 7 * * 1-5", after).unwrap();
        // First weekday match is Monday the 23rd.
        assert_eq!(next.day(), 23);
        assert_eq!(next.weekday(), chrono::Weekday::Mon);
        assert_eq!((next.hour(), next.minute()), (7, 50));
    }

    #[test]
    fn test_friday_only() {
        // 2026-02-23 is a Monday; DOW 5 = Friday.
        let after = jakarta().with_ymd_and_hms(2026, 2, 23, 12, 0, 0).unwrap();
        let next = next_run_from_cron("30 16 * * 5", after).unwrap();
        assert_eq!(next.weekday(), chrono::Weekday::Fri);
        assert_eq!(next.day(), 27);
        assert_eq!((next.hour(), next.minute()), (16, 30));
    }

    #[test]
    fn test_same_day_future_time() {
        let after = jakarta().with_ymd_and_hms(2026, 2, 23, 7, 49, 30).unwrap();
        let next = next_run_from_cron("50 7 * * 1-5", after).unwrap();
        assert_eq!(next.day(), 23);
        assert_eq!((next.hour(), next.minute(), next.second()), (7, 50, 0));
    }

    #[test]
    fn test_invalid_expression() {
        let after = jakarta().with_ymd_and_hms(2026, 2, 23, 12, 0, 0).unwrap();
        assert!(next_run_from_cron("bad", after).is_none());
        assert!(next_run_from_cron("61 7 * * *", after).is_none());
        assert!(next_run_from_cron("0 7 * * 9", after).is_none());
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(
            parse_utc_offset("+07:00"),
            FixedOffset::east_opt(7 * 3600)
        );
        assert_eq!(
            parse_utc_offset("-03:30"),
            FixedOffset::east_opt(-(3 * 3600 + 30 * 60))
        );
        assert!(parse_utc_offset("25:00").is_none());
        assert!(parse_utc_offset("jakarta").is_none());
    }
}
