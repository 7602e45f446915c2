//! Chart lifecycle and frame building.
//!
//! [`ChartRenderer::create`] wires a stacked series to a [`ChartSurface`] and
//! returns the [`ChartHandle`] that owns the chart from then on: scales, zoom,
//! hover/selection state and the surface's listeners. Every state change
//! produces a complete [`Frame`]; the surface only paints it.

use crate::config::ChartConfig;
use crate::error::DroughtError;
use crate::interaction::{InteractionController, PagePosition, SelectionLabel, Tooltip};
use crate::map_sync::{SharedSync, SyncOutcome};
use crate::scale::{
    x_ticks, y_ticks, ChartMode, LinearScale, PlotArea, ScaleManager, Tick, Viewport, XScale,
};
use crate::zoom::{ViewTransform, ZoomController, ZoomGesture};
use chrono::{DateTime, Utc};
use dm_core::category::{DroughtCategory, STACK_ORDER};
use dm_data::stacking::StackedSeries;
use log::{debug, error, info};
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq)]
pub struct BarRect {
    pub category: DroughtCategory,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: &'static str,
}

/// One stacked area, as SVG path data.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaPath {
    pub category: DroughtCategory,
    pub d: String,
    pub color: &'static str,
}

/// Vertical highlight over one point. `width` is 0 on a time axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub x: f64,
    pub width: f64,
    pub top: f64,
    pub bottom: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: &'static str,
    pub color: &'static str,
}

/// Everything needed to paint the chart once.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: f64,
    pub height: f64,
    pub mode: ChartMode,
    /// Clip rectangle for marks and markers.
    pub plot: PlotArea,
    pub bars: Vec<BarRect>,
    pub areas: Vec<AreaPath>,
    pub x_ticks: Vec<Tick>,
    pub y_ticks: Vec<Tick>,
    pub hover: Option<Marker>,
    pub selection: Option<Marker>,
    pub tooltip: Option<Tooltip>,
    pub label: Option<SelectionLabel>,
    pub legend: Vec<LegendEntry>,
}

/// Where frames are painted and pointer listeners live.
pub trait ChartSurface {
    fn attach(&mut self);
    fn detach(&mut self);
    fn draw(&mut self, frame: &Frame) -> Result<(), DroughtError>;
    fn clear(&mut self);
}

/// Pointer input in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Move { x: f64, y: f64, page: PagePosition },
    Leave,
    Click { x: f64, y: f64 },
    Wheel { x: f64, delta_y: f64 },
    Drag { dx: f64 },
    /// Resets the zoom.
    DoubleClick,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventOutcome {
    /// Nothing changed, or the chart is destroyed.
    Ignored,
    Redrawn,
    /// A point was selected; `sync` is `None` when no map is attached.
    Selected {
        date: DateTime<Utc>,
        sync: Option<SyncOutcome>,
    },
}

pub struct ChartRenderer;

impl ChartRenderer {
    /// Build a chart for `series`, attach the surface and draw the first frame.
    pub fn create(
        series: StackedSeries,
        config: &ChartConfig,
        viewport: Viewport,
        surface: Box<dyn ChartSurface>,
        sync: Option<SharedSync>,
    ) -> Result<ChartHandle, DroughtError> {
        let scales = ScaleManager::new(&series, viewport, config.mode, config.padding);
        let plot = scales.plot_area();
        let mut handle = ChartHandle {
            series,
            scales,
            zoom: ZoomController::new((plot.left, plot.right)),
            interaction: InteractionController::new(),
            surface,
            sync,
            live: true,
        };
        handle.surface.attach();
        handle.redraw()?;
        info!("Created drought chart with {} points", handle.series.len());
        Ok(handle)
    }

    pub fn destroy(mut handle: ChartHandle) {
        handle.teardown();
    }
}

pub struct ChartHandle {
    series: StackedSeries,
    scales: ScaleManager,
    zoom: ZoomController,
    interaction: InteractionController,
    surface: Box<dyn ChartSurface>,
    sync: Option<SharedSync>,
    live: bool,
}

impl ChartHandle {
    pub fn handle(&mut self, event: PointerEvent) -> Result<EventOutcome, DroughtError> {
        if !self.live {
            return Ok(EventOutcome::Ignored);
        }
        let plot = self.scales.plot_area();
        let x_scale = self.scales.x_for(&self.zoom.transform());
        let changed = match event {
            PointerEvent::Move { x, y, page } => {
                self.interaction
                    .pointer_move(x, y, page, &plot, &x_scale, &self.series)
            }
            PointerEvent::Leave => self.interaction.pointer_leave(),
            PointerEvent::Click { x, y } => {
                let Some(date) = self.interaction.click(x, y, &plot, &x_scale, &self.series)
                else {
                    return Ok(EventOutcome::Ignored);
                };
                self.redraw()?;
                let sync = self.sync_date(date)?;
                return Ok(EventOutcome::Selected { date, sync });
            }
            PointerEvent::Wheel { x, delta_y } => self.zoom.apply(ZoomGesture::Wheel {
                delta_y,
                anchor_x: x,
            }),
            PointerEvent::Drag { dx } => self.zoom.apply(ZoomGesture::Pan { dx }),
            PointerEvent::DoubleClick => self.zoom.apply(ZoomGesture::Reset),
        };
        if !changed {
            return Ok(EventOutcome::Ignored);
        }
        self.redraw()?;
        Ok(EventOutcome::Redrawn)
    }

    /// Select the point nearest `date` and sync the map, as if clicked.
    /// Returns `None` for an empty series.
    pub fn set_selection(
        &mut self,
        date: DateTime<Utc>,
    ) -> Result<Option<EventOutcome>, DroughtError> {
        if !self.live {
            return Ok(None);
        }
        let Some(index) = self.series.nearest_index(date) else {
            return Ok(None);
        };
        let Some(selected) = self.interaction.select_index(index, &self.series) else {
            return Ok(None);
        };
        self.redraw()?;
        let sync = self.sync_date(selected)?;
        Ok(Some(EventOutcome::Selected {
            date: selected,
            sync,
        }))
    }

    /// Relayout for a new surface size. Zoom factor and selection are kept.
    pub fn resize(&mut self, viewport: Viewport) -> Result<bool, DroughtError> {
        if !self.live || !self.scales.resize(&self.series, viewport) {
            return Ok(false);
        }
        let plot = self.scales.plot_area();
        self.zoom.set_extent((plot.left, plot.right));
        self.redraw()?;
        Ok(true)
    }

    pub fn series(&self) -> &StackedSeries {
        &self.series
    }

    pub fn selected_date(&self) -> Option<DateTime<Utc>> {
        self.interaction.state().selected_date
    }

    pub fn transform(&self) -> ViewTransform {
        self.zoom.transform()
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Current frame, without drawing it.
    pub fn frame(&self) -> Frame {
        build_frame(
            &self.series,
            &self.scales,
            &self.interaction,
            self.zoom.transform(),
        )
    }

    fn sync_date(&self, date: DateTime<Utc>) -> Result<Option<SyncOutcome>, DroughtError> {
        let Some(sync) = &self.sync else {
            return Ok(None);
        };
        let mut adapter = sync
            .try_borrow_mut()
            .map_err(|_| DroughtError::Map("map sync is already in use".to_string()))?;
        adapter.on_date_selected(date).map(Some)
    }

    fn redraw(&mut self) -> Result<(), DroughtError> {
        let frame = self.frame();
        if let Err(e) = self.surface.draw(&frame) {
            error!("Drawing the drought chart failed: {}", e);
            self.teardown();
            return Err(match e {
                DroughtError::Render(_) => e,
                other => DroughtError::Render(other.to_string()),
            });
        }
        Ok(())
    }

    fn teardown(&mut self) {
        if !self.live {
            return;
        }
        self.live = false;
        self.surface.detach();
        self.surface.clear();
        debug!("Drought chart destroyed");
    }
}

impl Drop for ChartHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn marker(x: &XScale, index: Option<usize>, series: &StackedSeries, plot: &PlotArea) -> Option<Marker> {
    let (left, width) = x.span(index?, series)?;
    Some(Marker {
        x: left,
        width,
        top: plot.top,
        bottom: plot.bottom,
    })
}

fn build_frame(
    series: &StackedSeries,
    scales: &ScaleManager,
    interaction: &InteractionController,
    transform: ViewTransform,
) -> Frame {
    let viewport = scales.viewport();
    let plot = scales.plot_area();
    let x = scales.x_for(&transform);
    let y = scales.scales().y;
    let color = scales.scales().color;

    let (bars, areas) = match scales.mode() {
        ChartMode::Bar => (bar_rects(series, &x, &y, &plot), Vec::new()),
        ChartMode::Area => (Vec::new(), area_paths(series, &x, &y)),
    };

    Frame {
        width: viewport.width,
        height: viewport.height,
        mode: scales.mode(),
        plot,
        bars,
        areas,
        x_ticks: x_ticks(&x, series, &plot),
        y_ticks: y_ticks(&y),
        hover: marker(&x, interaction.hover_index(), series, &plot),
        selection: marker(&x, interaction.selected_index(), series, &plot),
        tooltip: interaction.tooltip().cloned(),
        label: interaction.label(),
        legend: color
            .legend()
            .into_iter()
            .map(|(category, color)| LegendEntry {
                label: category.label(),
                color,
            })
            .collect(),
    }
}

/// Bars per point in stacking order; zero-height and off-plot bars are skipped.
fn bar_rects(series: &StackedSeries, x: &XScale, y: &LinearScale, plot: &PlotArea) -> Vec<BarRect> {
    let color = crate::scale::ColorScale;
    let mut rects = Vec::new();
    for (index, point) in series.points().iter().enumerate() {
        let Some((left, width)) = x.span(index, series) else {
            continue;
        };
        if left + width < plot.left || left > plot.right {
            continue;
        }
        for band in point.bands.iter() {
            let top = y.map(band.high);
            let bottom = y.map(band.low);
            let height = bottom - top;
            if height <= 0.0 {
                continue;
            }
            rects.push(BarRect {
                category: band.category,
                x: left,
                y: top,
                width,
                height,
                color: color.color(band.category),
            });
        }
    }
    rects
}

/// One closed path per category: along the band tops left to right, then
/// back along the band bottoms.
fn area_paths(series: &StackedSeries, x: &XScale, y: &LinearScale) -> Vec<AreaPath> {
    if series.is_empty() {
        return Vec::new();
    }
    let color = crate::scale::ColorScale;
    let xs: Vec<f64> = (0..series.len())
        .filter_map(|i| x.anchor(i, series))
        .collect();
    if xs.len() != series.len() {
        return Vec::new();
    }

    STACK_ORDER
        .iter()
        .enumerate()
        .map(|(slot, category)| {
            let mut d = String::new();
            for (i, point) in series.points().iter().enumerate() {
                let cmd = if i == 0 { 'M' } else { 'L' };
                let _ = write!(d, "{}{:.2},{:.2}", cmd, xs[i], y.map(point.bands[slot].high));
            }
            for (i, point) in series.points().iter().enumerate().rev() {
                let _ = write!(d, "L{:.2},{:.2}", xs[i], y.map(point.bands[slot].low));
            }
            d.push('Z');
            AreaPath {
                category: *category,
                d,
                color: color.color(*category),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DroughtLayerConfig;
    use crate::map_sync::MapSyncAdapter;
    use crate::testing::{FakeMapView, MemoryUrlStore, RecordingSurface};
    use crate::url_state::UrlStore;
    use chrono::TimeZone;
    use dm_core::record::DroughtRecord;
    use dm_data::stacking::stack;
    use DroughtCategory::*;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, d, 0, 0, 0).unwrap()
    }

    fn two_weeks() -> StackedSeries {
        stack(&[
            DroughtRecord::new(day(1), &[(D0, 10.0), (D1, 5.0)]),
            DroughtRecord::new(day(8), &[(D0, 20.0), (D1, 10.0), (D2, 5.0)]),
        ])
    }

    fn viewport() -> Viewport {
        Viewport::new(440.0, 300.0)
    }

    fn page() -> PagePosition {
        PagePosition {
            page_x: 100.0,
            page_y: 100.0,
            window_width: 1200.0,
        }
    }

    fn chart(config: ChartConfig, sync: Option<SharedSync>) -> (ChartHandle, RecordingSurface) {
        let surface = RecordingSurface::new();
        let handle = ChartRenderer::create(
            two_weeks(),
            &config,
            viewport(),
            Box::new(surface.clone()),
            sync,
        )
        .unwrap();
        (handle, surface)
    }

    #[test]
    fn test_create_attaches_and_draws() {
        let (handle, surface) = chart(ChartConfig::default(), None);
        assert!(handle.is_live());
        assert_eq!(surface.attach_count(), 1);
        assert_eq!(surface.draw_count(), 1);
        let frame = surface.last_frame().unwrap();
        let order: Vec<_> = frame.bars.iter().map(|b| b.category).collect();
        assert_eq!(order, vec![D1, D0, D2, D1, D0]);
        assert_eq!(frame.plot.bottom, 270.0);
        assert_eq!(frame.legend.len(), STACK_ORDER.len());
        assert!(frame.hover.is_none() && frame.tooltip.is_none());
    }

    #[test]
    fn test_bars_are_adjacent_within_a_point() {
        let (handle, _surface) = chart(ChartConfig::default(), None);
        let frame = handle.frame();
        let first_point: Vec<&BarRect> = frame.bars.iter().take(2).collect();
        assert!((first_point[0].y + first_point[0].height - 270.0).abs() < 1e-9);
        let gap = first_point[1].y + first_point[1].height - first_point[0].y;
        assert!(gap.abs() < 1e-9);
    }

    #[test]
    fn test_area_mode_builds_one_path_per_category() {
        let config = ChartConfig {
            mode: ChartMode::Area,
            ..ChartConfig::default()
        };
        let (handle, _surface) = chart(config, None);
        let frame = handle.frame();
        assert!(frame.bars.is_empty());
        let order: Vec<_> = frame.areas.iter().map(|a| a.category).collect();
        assert_eq!(order, STACK_ORDER.to_vec());
        assert!(frame.areas[0].d.starts_with("M40.00,270.00"));
        assert!(frame.areas.iter().all(|a| a.d.ends_with('Z')));
    }

    #[test]
    fn test_empty_series_draws_empty_frame() {
        let surface = RecordingSurface::new();
        let mut handle = ChartRenderer::create(
            StackedSeries::empty(),
            &ChartConfig::default(),
            viewport(),
            Box::new(surface.clone()),
            None,
        )
        .unwrap();
        let frame = surface.last_frame().unwrap();
        assert!(frame.bars.is_empty() && frame.areas.is_empty() && frame.x_ticks.is_empty());
        assert_eq!(handle.set_selection(day(1)).unwrap(), None);
    }

    #[test]
    fn test_hover_then_leave() {
        let (mut handle, surface) = chart(ChartConfig::default(), None);
        let moved = handle
            .handle(PointerEvent::Move {
                x: 100.0,
                y: 100.0,
                page: page(),
            })
            .unwrap();
        assert_eq!(moved, EventOutcome::Redrawn);
        let frame = surface.last_frame().unwrap();
        assert!(frame.hover.is_some());
        assert_eq!(frame.tooltip.unwrap().title, "Jan 01, 2023");

        assert_eq!(handle.handle(PointerEvent::Leave).unwrap(), EventOutcome::Redrawn);
        assert!(surface.last_frame().unwrap().hover.is_none());
        assert_eq!(handle.handle(PointerEvent::Leave).unwrap(), EventOutcome::Ignored);
    }

    #[test]
    fn test_click_selects_and_syncs_map() {
        let view = FakeMapView::new(true);
        let url = MemoryUrlStore::default();
        let sync = MapSyncAdapter::new(
            Box::new(view.clone()),
            Box::new(url.clone()),
            DroughtLayerConfig::default(),
        )
        .shared();
        let (mut handle, surface) = chart(ChartConfig::default(), Some(sync.clone()));

        let outcome = handle.handle(PointerEvent::Click { x: 400.0, y: 100.0 }).unwrap();
        let EventOutcome::Selected { date, sync: Some(synced) } = outcome else {
            panic!("expected a synced selection, got {:?}", outcome);
        };
        assert_eq!(date, day(8));
        assert_eq!(synced, SyncOutcome::Applied(dm_core::DateRange::ending_at(day(8))));
        assert_eq!(view.count_titled("Drought Intensity"), 1);
        assert_eq!(url.get("date").as_deref(), Some("1673136000000"));

        let frame = surface.last_frame().unwrap();
        assert!(frame.selection.is_some());
        assert_eq!(frame.label.unwrap().in_drought, 15.0);

        assert_eq!(
            handle.handle(PointerEvent::Click { x: 10.0, y: 100.0 }).unwrap(),
            EventOutcome::Ignored
        );
        assert_eq!(handle.selected_date(), Some(day(8)));
    }

    #[test]
    fn test_set_selection_snaps_to_nearest() {
        let (mut handle, _surface) = chart(ChartConfig::default(), None);
        let outcome = handle.set_selection(day(6)).unwrap();
        assert_eq!(
            outcome,
            Some(EventOutcome::Selected {
                date: day(8),
                sync: None
            })
        );
        assert_eq!(handle.selected_date(), Some(day(8)));
    }

    #[test]
    fn test_zoom_moves_marks_but_not_y_axis() {
        let (mut handle, surface) = chart(ChartConfig::default(), None);
        handle.set_selection(day(1)).unwrap();
        let before = surface.last_frame().unwrap();
        let zoomed = handle
            .handle(PointerEvent::Wheel {
                x: 40.0,
                delta_y: -500.0,
            })
            .unwrap();
        assert_eq!(zoomed, EventOutcome::Redrawn);
        assert!((handle.transform().k - 2.0).abs() < 1e-9);
        let after = surface.last_frame().unwrap();
        assert_eq!(before.y_ticks, after.y_ticks);
        let (b, a) = (before.selection.unwrap(), after.selection.unwrap());
        assert!((a.width - 2.0 * b.width).abs() < 1e-9);

        assert_eq!(handle.handle(PointerEvent::DoubleClick).unwrap(), EventOutcome::Redrawn);
        assert!(handle.transform().is_identity());
        assert_eq!(surface.last_frame().unwrap().selection, before.selection);
    }

    #[test]
    fn test_selection_marker_follows_translated_view() {
        let (mut handle, surface) = chart(ChartConfig::default(), None);
        handle.set_selection(day(8)).unwrap();
        let before = surface.last_frame().unwrap();
        let start = before.selection.unwrap().x;
        let mid = (before.plot.left + before.plot.right) / 2.0;

        handle
            .handle(PointerEvent::Wheel {
                x: mid,
                delta_y: -500.0,
            })
            .unwrap();
        assert_eq!(
            handle.handle(PointerEvent::Drag { dx: 30.0 }).unwrap(),
            EventOutcome::Redrawn
        );
        let transform = handle.transform();
        assert!((transform.k - 2.0).abs() < 1e-9);
        assert!(transform.x.abs() > 1.0);

        let after = surface.last_frame().unwrap().selection.unwrap();
        assert!((after.x - transform.apply_x(start)).abs() < 1e-9);
        assert!((after.width - 2.0 * before.selection.unwrap().width).abs() < 1e-9);
        assert_eq!(handle.selected_date(), Some(day(8)));
    }

    #[test]
    fn test_resize_relayouts_once() {
        let (mut handle, surface) = chart(ChartConfig::default(), None);
        assert!(!handle.resize(viewport()).unwrap());
        assert!(handle.resize(Viewport::new(800.0, 300.0)).unwrap());
        assert_eq!(surface.draw_count(), 2);
        assert_eq!(surface.last_frame().unwrap().width, 800.0);
    }

    #[test]
    fn test_destroy_detaches_exactly_once() {
        let (handle, surface) = chart(ChartConfig::default(), None);
        ChartRenderer::destroy(handle);
        assert_eq!(surface.detach_count(), 1);
        assert_eq!(surface.clear_count(), 1);
    }

    #[test]
    fn test_draw_failure_destroys_chart() {
        let (mut handle, surface) = chart(ChartConfig::default(), None);
        surface.fail_next_draw();
        let result = handle.handle(PointerEvent::Move {
            x: 100.0,
            y: 100.0,
            page: page(),
        });
        assert!(matches!(result, Err(DroughtError::Render(_))));
        assert!(!handle.is_live());
        assert_eq!(surface.detach_count(), 1);

        assert_eq!(
            handle.handle(PointerEvent::Click { x: 100.0, y: 100.0 }).unwrap(),
            EventOutcome::Ignored
        );
        assert_eq!(surface.draw_count(), 1);
        drop(handle);
        assert_eq!(surface.detach_count(), 1);
    }

    #[test]
    fn test_create_fails_when_first_draw_fails() {
        let surface = RecordingSurface::new();
        surface.fail_next_draw();
        let result = ChartRenderer::create(
            two_weeks(),
            &ChartConfig::default(),
            viewport(),
            Box::new(surface.clone()),
            None,
        );
        assert!(matches!(result, Err(DroughtError::Render(_))));
        assert_eq!(surface.attach_count(), 1);
        assert_eq!(surface.detach_count(), 1);
    }
}
