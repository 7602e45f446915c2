//! Data processing for drought intensity observations.
//!
//! This crate turns the flat per-date records mapped out of a feature-service
//! response into the stacked form the chart draws.

/// Stacking of per-category percentages into cumulative `[low, high]` bands.
pub mod stacking {
    use chrono::{DateTime, Utc};
    use dm_core::category::{DroughtCategory, IN_DROUGHT, STACK_ORDER};
    use dm_core::record::DroughtRecord;
    use log::debug;
    use std::collections::BTreeMap;

    /// One observation for one date.
    #[derive(Debug, Clone, PartialEq)]
    pub struct SeriesPoint {
        pub date: DateTime<Utc>,
        /// Only categories the source actually reported.
        pub values: BTreeMap<DroughtCategory, f64>,
    }

    impl SeriesPoint {
        /// Value used for geometry: absent reads as 0.
        pub fn value(&self, category: DroughtCategory) -> f64 {
            self.raw(category).unwrap_or(0.0)
        }

        /// Value as reported, `None` when the source had no data.
        pub fn raw(&self, category: DroughtCategory) -> Option<f64> {
            self.values.get(&category).copied()
        }

        /// Share of area in drought (D1 through D4).
        pub fn in_drought(&self) -> f64 {
            IN_DROUGHT.iter().map(|c| self.value(*c)).sum()
        }
    }

    /// Cumulative extent of one category within a stacked point.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Band {
        pub category: DroughtCategory,
        pub low: f64,
        pub high: f64,
    }

    /// A point together with its bands, indexed like [`STACK_ORDER`].
    #[derive(Debug, Clone, PartialEq)]
    pub struct StackedPoint {
        pub point: SeriesPoint,
        pub bands: [Band; STACK_ORDER.len()],
    }

    impl StackedPoint {
        pub fn date(&self) -> DateTime<Utc> {
            self.point.date
        }

        pub fn band(&self, category: DroughtCategory) -> Option<&Band> {
            category.stack_index().map(|i| &self.bands[i])
        }

        /// Height of the whole stack.
        pub fn top(&self) -> f64 {
            self.bands.last().map(|b| b.high).unwrap_or(0.0)
        }
    }

    /// Points sorted ascending by date, each with its stacked bands.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct StackedSeries {
        points: Vec<StackedPoint>,
    }

    impl StackedSeries {
        pub fn empty() -> Self {
            Self::default()
        }

        pub fn len(&self) -> usize {
            self.points.len()
        }

        pub fn is_empty(&self) -> bool {
            self.points.is_empty()
        }

        pub fn points(&self) -> &[StackedPoint] {
            &self.points
        }

        pub fn get(&self, index: usize) -> Option<&StackedPoint> {
            self.points.get(index)
        }

        /// First and last date, `None` for an empty series.
        pub fn extent(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
            Some((self.points.first()?.date(), self.points.last()?.date()))
        }

        /// Largest `high` over every point and category; 0 when empty.
        pub fn max_high(&self) -> f64 {
            self.points
                .iter()
                .flat_map(|p| p.bands.iter().map(|b| b.high))
                .fold(0.0, f64::max)
        }

        /// Index of the point closest to `date`; the earlier point wins ties.
        pub fn nearest_index(&self, date: DateTime<Utc>) -> Option<usize> {
            if self.points.is_empty() {
                return None;
            }
            let right = self.points.partition_point(|p| p.date() < date);
            if right == 0 {
                return Some(0);
            }
            if right == self.points.len() {
                return Some(right - 1);
            }
            let before = date - self.points[right - 1].date();
            let after = self.points[right].date() - date;
            Some(if after < before { right } else { right - 1 })
        }
    }

    /// Stack `records` into a date-sorted series.
    ///
    /// The input is left untouched. Records with equal dates keep their
    /// relative order. Values are passed through as-is; nothing is clamped
    /// or normalised to 100.
    pub fn stack(records: &[DroughtRecord]) -> StackedSeries {
        let mut sorted: Vec<&DroughtRecord> = records.iter().collect();
        sorted.sort_by_key(|r| r.date);

        let points: Vec<StackedPoint> = sorted
            .into_iter()
            .map(|record| {
                let point = SeriesPoint {
                    date: record.date,
                    values: record.values.clone(),
                };
                let mut low = 0.0;
                let bands = STACK_ORDER.map(|category| {
                    let high = low + point.value(category);
                    let band = Band {
                        category,
                        low,
                        high,
                    };
                    low = high;
                    band
                });
                StackedPoint { point, bands }
            })
            .collect();

        debug!("Stacked {} drought observations", points.len());
        StackedSeries { points }
    }

}
