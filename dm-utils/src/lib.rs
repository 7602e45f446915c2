//! Shared utility functions for drought monitor crates.

/// Date utility functions
pub mod dates {
    use chrono::{DateTime, NaiveDate, Utc};

    /// Format a timestamp as "YYYY-MM-DD"
    pub fn format_date(date: &DateTime<Utc>) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Format a timestamp for tooltips and labels, e.g. "Jan 08, 2023"
    pub fn format_display_date(date: &DateTime<Utc>) -> String {
        date.format("%b %d, %Y").to_string()
    }

    /// Format a timestamp for compact axis ticks, e.g. "Jan 2023"
    pub fn format_axis_date(date: &DateTime<Utc>) -> String {
        date.format("%b %Y").to_string()
    }

    /// Epoch milliseconds, as used by the URL `date` parameter.
    pub fn to_epoch_millis(date: &DateTime<Utc>) -> i64 {
        date.timestamp_millis()
    }

    /// Inverse of [`to_epoch_millis`].
    pub fn from_epoch_millis(millis: i64) -> anyhow::Result<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(millis)
            .ok_or_else(|| anyhow::anyhow!("timestamp out of range: {}", millis))
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")?)
    }

    /// Parse a timestamp given as epoch milliseconds, RFC 3339 or "YYYY-MM-DD"
    /// (midnight UTC).
    pub fn parse_timestamp(s: &str) -> anyhow::Result<DateTime<Utc>> {
        let s = s.trim();
        if let Ok(millis) = s.parse::<i64>() {
            return from_epoch_millis(millis);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }
        let date = parse_date(s)?;
        date.and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc())
            .ok_or_else(|| anyhow::anyhow!("invalid date: {}", s))
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::TimeZone;

        #[test]
        fn test_parse_timestamp_formats() {
            let expected = Utc.with_ymd_and_hms(2023, 1, 8, 0, 0, 0).unwrap();
            assert_eq!(parse_timestamp("2023-01-08").unwrap(), expected);
            assert_eq!(parse_timestamp("1673136000000").unwrap(), expected);
            assert_eq!(parse_timestamp("2023-01-08T00:00:00Z").unwrap(), expected);
            assert!(parse_timestamp("next tuesday").is_err());
        }

        #[test]
        fn test_epoch_round_trip() {
            let date = Utc.with_ymd_and_hms(2023, 6, 15, 12, 0, 0).unwrap();
            let millis = to_epoch_millis(&date);
            assert_eq!(from_epoch_millis(millis).unwrap(), date);
            assert!(from_epoch_millis(i64::MAX).is_err());
        }

        #[test]
        fn test_format_and_parse() {
            let date = Utc.with_ymd_and_hms(2023, 6, 15, 0, 0, 0).unwrap();
            assert_eq!(format_date(&date), "2023-06-15");
            assert_eq!(format_display_date(&date), "Jun 15, 2023");
            assert_eq!(format_axis_date(&date), "Jun 2023");
            let parsed = parse_date(&format_date(&date)).unwrap();
            assert_eq!(parsed, date.date_naive());
        }
    }
}

/// Display formatting for category values
pub mod format {
    /// Percentage with one decimal, or "No data" when the source had no value.
    ///
    /// A recorded 0 renders as "0.0%", never as "No data".
    pub fn format_percent(value: Option<f64>) -> String {
        match value {
            Some(v) => format!("{:.1}%", v),
            None => "No data".to_string(),
        }
    }

    /// Axis tick label for a percentage value.
    pub fn format_tick(value: f64) -> String {
        if (value - value.round()).abs() < 1e-9 {
            format!("{:.0}%", value)
        } else {
            format!("{:.1}%", value)
        }
    }

}
