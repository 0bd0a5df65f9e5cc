use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, Utc};

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse an event timestamp as found in the static data.
///
/// Accepts RFC 3339, offset timestamps without a colon, naive date-times
/// (read as UTC) and bare dates (midnight UTC). Anything else is `None`.
pub fn parse_event_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(day_start)
}

/// Midnight UTC at the beginning of `date`.
pub fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Midnight UTC at the beginning of the day after `date`.
pub fn next_day_start(date: NaiveDate) -> DateTime<Utc> {
    date.checked_add_days(Days::new(1))
        .map(day_start)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

pub fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    day_start(at.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_rfc3339_with_offset() {
        let dt = parse_event_date("2025-01-10T18:00:00+02:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 10, 16, 0, 0).unwrap());
    }

    #[test]
    fn parses_compact_offset() {
        let dt = parse_event_date("2025-01-10T18:00:00+0200").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 10, 16, 0, 0).unwrap());
    }

    #[test]
    fn naive_datetime_is_utc() {
        let dt = parse_event_date("2025-01-10T18:30:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 10, 18, 30, 0).unwrap());

        let dt = parse_event_date("2025-01-10T18:30").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 10, 18, 30, 0).unwrap());
    }

    #[test]
    fn bare_date_is_midnight() {
        let dt = parse_event_date("2025-01-05").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 5, 0, 0, 0).unwrap());
    }

    #[test]
    fn garbage_is_none() {
        assert!(parse_event_date("").is_none());
        assert!(parse_event_date("next tuesday").is_none());
        assert!(parse_event_date("2025-13-45").is_none());
    }

    #[test]
    fn start_of_day_truncates() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 23, 59, 59).unwrap();
        assert_eq!(
            start_of_day(at),
            Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn next_day_start_rolls_over_month() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        assert_eq!(
            next_day_start(date),
            Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap()
        );
    }
}
