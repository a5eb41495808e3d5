use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;

const MINUTES_PER_HOUR: i64 = 60;
const MINUTES_PER_DAY: i64 = 1440;

/// How the "time ago" line under a notification is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimeFormat {
    /// "5 minutes ago"
    #[default]
    Relative,
    /// "5m"
    Short,
    /// "14:07"
    Exact,
    /// "Mar 5, 14:07"
    Full,
    /// Anything else found in a stored config.
    #[serde(other)]
    Unknown,
}

/// Format `timestamp` as seen at `now`. Future timestamps count as "now".
pub fn format_time<Tz>(timestamp: &DateTime<Tz>, now: &DateTime<Tz>, format: TimeFormat) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let minutes = now
        .clone()
        .signed_duration_since(timestamp.clone())
        .num_minutes()
        .max(0);

    match format {
        TimeFormat::Relative => match minutes {
            0 => "just now".to_string(),
            m if m < MINUTES_PER_HOUR => format!("{m} minutes ago"),
            m if m < MINUTES_PER_DAY => format!("{} hours ago", m / MINUTES_PER_HOUR),
            m => format!("{} days ago", m / MINUTES_PER_DAY),
        },
        TimeFormat::Short => match minutes {
            0 => "now".to_string(),
            m if m < MINUTES_PER_HOUR => format!("{m}m"),
            m if m < MINUTES_PER_DAY => format!("{}h", m / MINUTES_PER_HOUR),
            m => format!("{}d", m / MINUTES_PER_DAY),
        },
        TimeFormat::Exact => timestamp.format("%H:%M").to_string(),
        TimeFormat::Full => timestamp.format("%b %-d, %H:%M").to_string(),
        TimeFormat::Unknown => "Invalid format".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 30).unwrap()
    }

    fn ago(seconds: i64) -> DateTime<Utc> {
        now() - Duration::seconds(seconds)
    }

    fn fmt(minutes_ago: f64, format: TimeFormat) -> String {
        format_time(&ago((minutes_ago * 60.0) as i64), &now(), format)
    }

    // --- relative buckets ---

    #[test]
    fn relative_buckets() {
        let cases = [
            (0.0, "just now"),
            (0.5, "just now"),
            (59.0, "59 minutes ago"),
            (60.0, "1 hours ago"),
            (90.0, "1 hours ago"),
            (1439.0, "23 hours ago"),
            (1440.0, "1 days ago"),
            (2880.0, "2 days ago"),
        ];
        for (minutes, expected) in cases {
            assert_eq!(fmt(minutes, TimeFormat::Relative), expected, "Δ={minutes}");
        }
    }

    // --- short buckets ---

    #[test]
    fn short_buckets() {
        let cases = [
            (0.0, "now"),
            (0.5, "now"),
            (59.0, "59m"),
            (60.0, "1h"),
            (1439.0, "23h"),
            (1440.0, "1d"),
            (2880.0, "2d"),
        ];
        for (minutes, expected) in cases {
            assert_eq!(fmt(minutes, TimeFormat::Short), expected, "Δ={minutes}");
        }
    }

    #[test]
    fn minutes_are_floored() {
        assert_eq!(format_time(&ago(119), &now(), TimeFormat::Short), "1m");
    }

    // --- future timestamps ---

    #[test]
    fn future_timestamp_counts_as_now() {
        let future = now() + Duration::minutes(10);
        assert_eq!(format_time(&future, &now(), TimeFormat::Relative), "just now");
        assert_eq!(format_time(&future, &now(), TimeFormat::Short), "now");
    }

    // --- clock formats ---

    #[test]
    fn exact_is_hour_and_minute() {
        assert_eq!(format_time(&ago(0), &now(), TimeFormat::Exact), "14:07");
    }

    #[test]
    fn full_includes_month_and_day() {
        assert_eq!(format_time(&ago(0), &now(), TimeFormat::Full), "Mar 5, 14:07");
    }

    #[test]
    fn exact_uses_timestamp_zone() {
        let offset = chrono::FixedOffset::east_opt(2 * 3600).unwrap();
        let ts = now().with_timezone(&offset);
        assert_eq!(format_time(&ts, &ts, TimeFormat::Exact), "16:07");
    }

    // --- unknown ---

    #[test]
    fn unknown_format_never_fails() {
        assert_eq!(fmt(5.0, TimeFormat::Unknown), "Invalid format");
    }
}
