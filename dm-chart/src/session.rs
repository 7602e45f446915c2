//! The chart's lifetime across fetches.
//!
//! Each location click starts a fetch; responses can resolve out of order.
//! [`ChartSession::apply`] is the single place a resolved fetch turns into
//! chart state, and it drops anything but the newest fetch.

use crate::config::ChartConfig;
use crate::error::DroughtError;
use crate::map_sync::SharedSync;
use crate::render::{ChartHandle, ChartRenderer, ChartSurface, EventOutcome, PointerEvent};
use chrono::{DateTime, Utc};
use dm_core::feature::FeatureSet;
use dm_core::query::QueryError;
use dm_core::record::FieldMapping;
use dm_data::stacking::{stack, StackedSeries};
use log::{debug, info, warn};

/// Receives errors meant for the user.
pub trait ErrorReporter {
    fn report(&self, error: &DroughtError);
}

/// Identifies one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchToken(u64);

/// Monotonic fetch counter; only the latest token is current.
#[derive(Debug, Default)]
pub struct FetchGeneration {
    current: u64,
}

impl FetchGeneration {
    pub fn begin(&mut self) -> FetchToken {
        self.current += 1;
        FetchToken(self.current)
    }

    pub fn is_current(&self, token: FetchToken) -> bool {
        token.0 == self.current
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// A new chart replaced the old one.
    Rendered,
    /// A newer fetch was started; the result was dropped.
    Stale,
    /// The series had no points; an empty chart was drawn.
    Empty,
    /// The fetch or the first draw failed and was reported.
    Failed,
}

/// Makes a fresh surface for every new chart.
pub type SurfaceFactory = Box<dyn FnMut() -> Box<dyn ChartSurface>>;

/// Turn a feature-service response into a stacked series.
///
/// An empty response, or one with no usable rows, is [`DroughtError::NoData`]
/// for `name`.
pub fn build_series(
    response: Result<FeatureSet, QueryError>,
    mapping: &FieldMapping,
    name: &str,
) -> Result<StackedSeries, DroughtError> {
    let set = response.and_then(FeatureSet::into_result)?;
    if set.is_empty() {
        return Err(DroughtError::NoData(name.to_string()));
    }
    let records = mapping.to_records(&set);
    if records.is_empty() {
        warn!("{} features for {} had no usable dates", set.features.len(), name);
        return Err(DroughtError::NoData(name.to_string()));
    }
    Ok(stack(&records))
}

pub struct ChartSession {
    config: ChartConfig,
    width: f64,
    surfaces: SurfaceFactory,
    sync: Option<SharedSync>,
    reporter: Box<dyn ErrorReporter>,
    generation: FetchGeneration,
    chart: Option<ChartHandle>,
    restore: Option<DateTime<Utc>>,
}

impl ChartSession {
    pub fn new(
        config: ChartConfig,
        width: f64,
        surfaces: SurfaceFactory,
        sync: Option<SharedSync>,
        reporter: Box<dyn ErrorReporter>,
    ) -> Self {
        ChartSession {
            config,
            width,
            surfaces,
            sync,
            reporter,
            generation: FetchGeneration::default(),
            chart: None,
            restore: None,
        }
    }

    /// Start a fetch. Any earlier token becomes stale.
    pub fn begin_fetch(&mut self) -> FetchToken {
        let token = self.generation.begin();
        debug!("Starting fetch {:?}", token);
        token
    }

    /// Select the point nearest `date` once the next chart is rendered.
    pub fn restore_selection(&mut self, date: DateTime<Utc>) {
        self.restore = Some(date);
    }

    /// Apply a resolved fetch.
    pub fn apply(
        &mut self,
        token: FetchToken,
        result: Result<StackedSeries, DroughtError>,
    ) -> ApplyOutcome {
        if !self.generation.is_current(token) {
            debug!("Discarding stale fetch {:?}", token);
            return ApplyOutcome::Stale;
        }

        let series = match result {
            Ok(series) => series,
            Err(e) => {
                warn!("Fetch {:?} failed: {}", token, e);
                self.reporter.report(&e);
                return ApplyOutcome::Failed;
            }
        };

        if let Some(old) = self.chart.take() {
            ChartRenderer::destroy(old);
        }

        let empty = series.is_empty();
        let surface = (self.surfaces)();
        let viewport = self.config.viewport(self.width);
        let mut chart = match ChartRenderer::create(
            series,
            &self.config,
            viewport,
            surface,
            self.sync.clone(),
        ) {
            Ok(chart) => chart,
            Err(e) => {
                self.reporter.report(&e);
                return ApplyOutcome::Failed;
            }
        };

        if let Some(date) = self.restore.take() {
            if let Err(e) = chart.set_selection(date) {
                self.reporter.report(&e);
            }
        }

        let alive = chart.is_live();
        self.chart = Some(chart);
        if !alive {
            return ApplyOutcome::Failed;
        }
        if empty {
            return ApplyOutcome::Empty;
        }
        info!("Rendered fetch {:?}", token);
        ApplyOutcome::Rendered
    }

    /// Forward a pointer event to the current chart. Errors are reported;
    /// a chart that failed to draw is dropped.
    pub fn handle(&mut self, event: PointerEvent) -> EventOutcome {
        let Some(chart) = self.chart.as_mut() else {
            return EventOutcome::Ignored;
        };
        match chart.handle(event) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.reporter.report(&e);
                if !chart.is_live() {
                    self.chart = None;
                }
                EventOutcome::Ignored
            }
        }
    }

    pub fn resize(&mut self, width: f64) {
        self.width = width;
        let viewport = self.config.viewport(width);
        if let Some(chart) = self.chart.as_mut() {
            if let Err(e) = chart.resize(viewport) {
                self.reporter.report(&e);
                self.chart = None;
            }
        }
    }

    /// Tear the chart down, e.g. when the administrative level changes.
    pub fn clear(&mut self) {
        if let Some(chart) = self.chart.take() {
            ChartRenderer::destroy(chart);
        }
    }

    pub fn chart(&self) -> Option<&ChartHandle> {
        self.chart.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CollectingReporter, RecordingSurface};
    use chrono::TimeZone;
    use dm_core::admin::AdminLevel;
    use dm_core::category::DroughtCategory::*;
    use dm_core::record::DroughtRecord;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, d, 0, 0, 0).unwrap()
    }

    fn series(days: &[u32]) -> StackedSeries {
        let records: Vec<DroughtRecord> = days
            .iter()
            .map(|d| DroughtRecord::new(day(*d), &[(D0, 10.0), (D1, 5.0)]))
            .collect();
        stack(&records)
    }

    fn session() -> (ChartSession, RecordingSurface, CollectingReporter) {
        let surface = RecordingSurface::new();
        let reporter = CollectingReporter::default();
        let factory_surface = surface.clone();
        let session = ChartSession::new(
            ChartConfig::default(),
            600.0,
            Box::new(move || Box::new(factory_surface.clone()) as Box<dyn ChartSurface>),
            None,
            Box::new(reporter.clone()),
        );
        (session, surface, reporter)
    }

    #[test]
    fn test_stale_fetch_is_discarded() {
        let (mut session, _surface, reporter) = session();
        let a = session.begin_fetch();
        let b = session.begin_fetch();
        assert_eq!(session.apply(b, Ok(series(&[8, 15]))), ApplyOutcome::Rendered);
        assert_eq!(session.apply(a, Ok(series(&[1]))), ApplyOutcome::Stale);
        assert_eq!(session.apply(a, Err(DroughtError::BoundaryNotFound)), ApplyOutcome::Stale);
        let chart = session.chart().unwrap();
        assert_eq!(chart.series().len(), 2);
        assert_eq!(chart.series().extent(), Some((day(8), day(15))));
        assert!(reporter.reports().is_empty());
    }

    #[test]
    fn test_new_fetch_replaces_chart_and_resets_state() {
        let (mut session, surface, _reporter) = session();
        let first = session.begin_fetch();
        session.apply(first, Ok(series(&[1, 8])));
        session.handle(PointerEvent::Wheel {
            x: 300.0,
            delta_y: -500.0,
        });
        session.handle(PointerEvent::Click { x: 300.0, y: 100.0 });
        assert!(session.chart().unwrap().selected_date().is_some());

        let second = session.begin_fetch();
        assert_eq!(session.apply(second, Ok(series(&[15, 22]))), ApplyOutcome::Rendered);
        let chart = session.chart().unwrap();
        assert!(chart.transform().is_identity());
        assert_eq!(chart.selected_date(), None);
        assert_eq!(surface.attach_count(), 2);
        assert_eq!(surface.detach_count(), 1);
    }

    #[test]
    fn test_failed_fetch_is_reported_and_keeps_chart() {
        let (mut session, _surface, reporter) = session();
        let first = session.begin_fetch();
        session.apply(first, Ok(series(&[1, 8])));
        let second = session.begin_fetch();
        let outcome = session.apply(
            second,
            Err(DroughtError::Query(QueryError::Status(500))),
        );
        assert_eq!(outcome, ApplyOutcome::Failed);
        assert_eq!(reporter.reports(), vec![DroughtError::Query(QueryError::Status(500))]);
        assert_eq!(session.chart().unwrap().series().len(), 2);
    }

    #[test]
    fn test_empty_series_draws_empty_chart() {
        let (mut session, surface, _reporter) = session();
        let token = session.begin_fetch();
        assert_eq!(session.apply(token, Ok(StackedSeries::empty())), ApplyOutcome::Empty);
        assert!(surface.last_frame().unwrap().bars.is_empty());
    }

    #[test]
    fn test_restored_selection_applies_on_render() {
        let (mut session, _surface, _reporter) = session();
        session.restore_selection(day(9));
        let token = session.begin_fetch();
        session.apply(token, Ok(series(&[1, 8, 15])));
        assert_eq!(session.chart().unwrap().selected_date(), Some(day(8)));
    }

    #[test]
    fn test_draw_failure_drops_chart() {
        let (mut session, surface, reporter) = session();
        let token = session.begin_fetch();
        session.apply(token, Ok(series(&[1, 8])));
        surface.fail_next_draw();
        session.handle(PointerEvent::DoubleClick);
        session.handle(PointerEvent::Wheel {
            x: 300.0,
            delta_y: -500.0,
        });
        assert!(session.chart().is_none());
        assert_eq!(reporter.reports().len(), 1);
        assert_eq!(surface.detach_count(), 1);
    }

    #[test]
    fn test_build_series() {
        let mapping = FieldMapping::for_admin(AdminLevel::County);
        let body = r#"{"features": [
            {"attributes": {"ddate": 1673136000000, "D0": 20, "D1": 10, "D2": 5}},
            {"attributes": {"ddate": 1672531200000, "D0": 10, "D1": 5}}
        ]}"#;
        let series = build_series(FeatureSet::from_json(body), &mapping, "Fresno").unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.max_high(), 35.0);

        assert_eq!(
            build_series(FeatureSet::from_json(r#"{"features": []}"#), &mapping, "Fresno"),
            Err(DroughtError::NoData("Fresno".to_string()))
        );
        let service_error = r#"{"error": {"code": 400, "message": "Invalid query"}}"#;
        assert!(matches!(
            build_series(FeatureSet::from_json(service_error), &mapping, "Fresno"),
            Err(DroughtError::Query(QueryError::Service { code: 400, .. }))
        ));
    }
}
