use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Length of the map layer's time window, in days, ending at the selected date.
pub const MAP_WINDOW_DAYS: i64 = 7;

/// A closed time window `[start, end]` used to filter the drought map layer.
///
/// Serialized as epoch milliseconds, which is what the map layer's
/// time extent expects.
#[derive(Clone, Eq, PartialEq, Copy, Debug, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// The map window for a selected date: `[date - 7 days, date]`.
    pub fn ending_at(date: DateTime<Utc>) -> Self {
        let start = date
            .checked_sub_signed(Self::window())
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        DateRange { start, end: date }
    }

    /// The fixed window length.
    pub fn window() -> TimeDelta {
        TimeDelta::days(MAP_WINDOW_DAYS)
    }
}
