//! Chart geometry: viewport, horizontal/vertical scales, palette and ticks.
//!
//! [`ScaleManager`] derives [`Scales`] from a stacked series and a viewport and
//! keeps them until the viewport changes. Zoom never touches the cached
//! scales; it produces a transformed copy of the horizontal scale instead.

use crate::zoom::ViewTransform;
use chrono::{DateTime, Utc};
use dm_core::category::{DroughtCategory, STACK_ORDER};
use dm_data::stacking::StackedSeries;
use dm_utils::dates::format_axis_date;
use dm_utils::format::format_tick;
use serde::{Deserialize, Serialize};

/// Minimum horizontal distance between two x-axis labels.
pub const MIN_TICK_SPACING: f64 = 80.0;

/// Approximate number of y-axis ticks.
pub const Y_TICK_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Margins {
            top: 20.0,
            right: 20.0,
            bottom: 30.0,
            left: 40.0,
        }
    }
}

/// Pixel size of the chart surface and the margins reserved for axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub margins: Margins,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Viewport {
            width,
            height,
            margins: Margins::default(),
        }
    }

    /// The region inside the margins. Never inverted, even for tiny viewports.
    pub fn plot_area(&self) -> PlotArea {
        let left = self.margins.left;
        let top = self.margins.top;
        PlotArea {
            left,
            right: (self.width - self.margins.right).max(left),
            top,
            bottom: (self.height - self.margins.bottom).max(top),
        }
    }
}

/// Plotting rectangle in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlotArea {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl PlotArea {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Horizontal test is left-inclusive, right-exclusive.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x < self.right && y >= self.top && y <= self.bottom
    }
}

/// Bar chart (one band per date) or area chart (continuous time axis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartMode {
    #[default]
    Bar,
    Area,
}

/// Band padding as a fraction of the step, d3 style.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandPadding {
    pub inner: f64,
    pub outer: f64,
}

impl Default for BandPadding {
    fn default() -> Self {
        BandPadding {
            inner: 0.1,
            outer: 0.05,
        }
    }
}

/// Discrete band mapping from point index to pixel range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandScale {
    count: usize,
    range: (f64, f64),
    padding: BandPadding,
    start: f64,
    step: f64,
    bandwidth: f64,
}

impl BandScale {
    pub fn new(count: usize, range: (f64, f64), padding: BandPadding) -> Self {
        let (r0, r1) = range;
        if count == 0 {
            return BandScale {
                count,
                range,
                padding,
                start: r0,
                step: 0.0,
                bandwidth: 0.0,
            };
        }
        let inner = padding.inner.clamp(0.0, 1.0);
        let outer = padding.outer.max(0.0);
        let denom = (count as f64 - inner + 2.0 * outer).max(1e-6);
        let step = (r1 - r0).max(0.0) / denom;
        BandScale {
            count,
            range,
            padding,
            start: r0 + step * outer,
            step,
            bandwidth: step * (1.0 - inner),
        }
    }

    /// Same bands laid out over a different pixel range.
    pub fn with_range(&self, range: (f64, f64)) -> Self {
        BandScale::new(self.count, range, self.padding)
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn band_start(&self, index: usize) -> Option<f64> {
        (index < self.count).then(|| self.start + self.step * index as f64)
    }

    /// Band whose slot contains `x`.
    ///
    /// Each slot is one step wide and centred on its band, so the padding
    /// between two bands is split evenly between them. Slots are
    /// left-inclusive and right-exclusive: on a shared edge the right band wins.
    pub fn index_at(&self, x: f64) -> Option<usize> {
        if self.count == 0 || self.step <= 0.0 || !x.is_finite() {
            return None;
        }
        let gap = self.step - self.bandwidth;
        let offset = x - (self.start - gap / 2.0);
        if offset < 0.0 {
            return None;
        }
        let index = (offset / self.step).floor() as usize;
        (index < self.count).then_some(index)
    }
}

/// Continuous mapping from epoch milliseconds to pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl TimeScale {
    pub fn new(domain: (DateTime<Utc>, DateTime<Utc>), range: (f64, f64)) -> Self {
        TimeScale {
            domain: (
                domain.0.timestamp_millis() as f64,
                domain.1.timestamp_millis() as f64,
            ),
            range,
        }
    }

    pub fn from_millis(domain: (f64, f64), range: (f64, f64)) -> Self {
        TimeScale { domain, range }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    /// A single-instant domain maps to the middle of the range.
    pub fn map_millis(&self, millis: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        if span.abs() < 1e-9 {
            return (r0 + r1) / 2.0;
        }
        r0 + (millis - d0) / span * (r1 - r0)
    }

    pub fn map(&self, date: DateTime<Utc>) -> f64 {
        self.map_millis(date.timestamp_millis() as f64)
    }

    pub fn invert(&self, x: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = r1 - r0;
        if span.abs() < 1e-9 {
            return d0;
        }
        d0 + (x - r0) / span * (d1 - d0)
    }

    /// Domain visible through `transform`, over the same pixel range.
    pub fn rescale(&self, transform: &ViewTransform) -> Self {
        let (r0, r1) = self.range;
        TimeScale {
            domain: (
                self.invert(transform.invert_x(r0)),
                self.invert(transform.invert_x(r1)),
            ),
            range: self.range,
        }
    }
}

/// Linear value scale used for the vertical axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        LinearScale { domain, range }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    /// A zero-width domain maps everything onto the start of the range.
    pub fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        if span.abs() < 1e-12 {
            return r0;
        }
        r0 + (value - d0) / span * (r1 - r0)
    }

    pub fn invert(&self, px: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = r1 - r0;
        if span.abs() < 1e-12 {
            return d0;
        }
        d0 + (px - r0) / span * (d1 - d0)
    }

    /// Round-number ticks covering the domain, at most about `count` of them.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (d0, d1) = self.domain;
        if !d0.is_finite() || !d1.is_finite() || (d1 - d0).abs() < 1e-12 {
            return vec![d0];
        }
        let step = nice_step((d1 - d0) / count.max(1) as f64);
        let mut value = (d0 / step).ceil() * step;
        let mut ticks = Vec::new();
        while value <= d1 + step * 1e-9 {
            ticks.push(value);
            value += step;
        }
        ticks
    }
}

fn nice_step(raw: f64) -> f64 {
    if raw <= 0.0 || !raw.is_finite() {
        return 1.0;
    }
    let base = 10f64.powf(raw.log10().floor());
    let multiple = match raw / base {
        r if r <= 1.0 => 1.0,
        r if r <= 2.0 => 2.0,
        r if r <= 5.0 => 5.0,
        _ => 10.0,
    };
    multiple * base
}

/// Fixed category palette (US Drought Monitor colours).
///
/// This is the only place colours are defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorScale;

impl ColorScale {
    pub fn color(&self, category: DroughtCategory) -> &'static str {
        match category {
            DroughtCategory::D0 => "#FFFF00",
            DroughtCategory::D1 => "#FCD37F",
            DroughtCategory::D2 => "#FFAA00",
            DroughtCategory::D3 => "#E60000",
            DroughtCategory::D4 => "#730000",
            DroughtCategory::NoDrought => "#D9D9D9",
        }
    }

    /// Legend entries in stacking order.
    pub fn legend(&self) -> Vec<(DroughtCategory, &'static str)> {
        STACK_ORDER.iter().map(|c| (*c, self.color(*c))).collect()
    }
}

/// Horizontal scale for either chart mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum XScale {
    Band(BandScale),
    Time(TimeScale),
}

impl XScale {
    /// The scale as seen through a zoom transform.
    pub fn transformed(&self, transform: &ViewTransform) -> XScale {
        match self {
            XScale::Band(band) => {
                let (r0, r1) = band.range();
                XScale::Band(band.with_range((transform.apply_x(r0), transform.apply_x(r1))))
            }
            XScale::Time(time) => XScale::Time(time.rescale(transform)),
        }
    }

    /// Point under pixel `x`: containing band, or nearest date.
    pub fn index_at(&self, x: f64, series: &StackedSeries) -> Option<usize> {
        match self {
            XScale::Band(band) => band.index_at(x),
            XScale::Time(time) => {
                let millis = time.invert(x);
                if !millis.is_finite() {
                    return None;
                }
                DateTime::<Utc>::from_timestamp_millis(millis.round() as i64)
                    .and_then(|date| series.nearest_index(date))
            }
        }
    }

    /// Pixel `(x, width)` occupied by a point. Time scales give zero width.
    pub fn span(&self, index: usize, series: &StackedSeries) -> Option<(f64, f64)> {
        match self {
            XScale::Band(band) => band.band_start(index).map(|x| (x, band.bandwidth())),
            XScale::Time(time) => series.get(index).map(|p| (time.map(p.date()), 0.0)),
        }
    }

    /// Anchor used for tick labels: band centre or exact date position.
    pub fn anchor(&self, index: usize, series: &StackedSeries) -> Option<f64> {
        self.span(index, series).map(|(x, w)| x + w / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scales {
    pub x: XScale,
    pub y: LinearScale,
    pub color: ColorScale,
}

/// Derives and caches [`Scales`] for one dataset.
#[derive(Debug, Clone)]
pub struct ScaleManager {
    mode: ChartMode,
    padding: BandPadding,
    viewport: Viewport,
    scales: Scales,
}

impl ScaleManager {
    pub fn new(
        series: &StackedSeries,
        viewport: Viewport,
        mode: ChartMode,
        padding: BandPadding,
    ) -> Self {
        ScaleManager {
            mode,
            padding,
            viewport,
            scales: Self::compute(series, viewport, mode, padding),
        }
    }

    fn compute(
        series: &StackedSeries,
        viewport: Viewport,
        mode: ChartMode,
        padding: BandPadding,
    ) -> Scales {
        let plot = viewport.plot_area();
        let x_range = (plot.left, plot.right);
        let x = match mode {
            ChartMode::Bar => XScale::Band(BandScale::new(series.len(), x_range, padding)),
            ChartMode::Area => match series.extent() {
                Some(extent) => XScale::Time(TimeScale::new(extent, x_range)),
                None => XScale::Time(TimeScale::from_millis((0.0, 0.0), x_range)),
            },
        };
        Scales {
            x,
            y: LinearScale::new((0.0, series.max_high()), (plot.bottom, plot.top)),
            color: ColorScale,
        }
    }

    /// Recompute if the viewport changed. Returns whether it did.
    pub fn resize(&mut self, series: &StackedSeries, viewport: Viewport) -> bool {
        if viewport == self.viewport {
            return false;
        }
        self.viewport = viewport;
        self.scales = Self::compute(series, viewport, self.mode, self.padding);
        true
    }

    pub fn scales(&self) -> &Scales {
        &self.scales
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn mode(&self) -> ChartMode {
        self.mode
    }

    pub fn plot_area(&self) -> PlotArea {
        self.viewport.plot_area()
    }

    /// Horizontal scale under the current zoom.
    pub fn x_for(&self, transform: &ViewTransform) -> XScale {
        if transform.is_identity() {
            self.scales.x
        } else {
            self.scales.x.transformed(transform)
        }
    }
}

/// Axis tick with its pixel position and label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tick {
    pub position: f64,
    pub label: String,
}

/// Date ticks inside the plot area, thinned so labels keep
/// [`MIN_TICK_SPACING`] apart.
pub fn x_ticks(x: &XScale, series: &StackedSeries, plot: &PlotArea) -> Vec<Tick> {
    let mut ticks: Vec<Tick> = Vec::new();
    for (index, point) in series.points().iter().enumerate() {
        let Some(position) = x.anchor(index, series) else {
            continue;
        };
        if position < plot.left || position > plot.right {
            continue;
        }
        if let Some(last) = ticks.last() {
            if position - last.position < MIN_TICK_SPACING {
                continue;
            }
        }
        ticks.push(Tick {
            position,
            label: format_axis_date(&point.date()),
        });
    }
    ticks
}

/// Percentage ticks for the vertical axis.
pub fn y_ticks(y: &LinearScale) -> Vec<Tick> {
    y.ticks(Y_TICK_COUNT)
        .into_iter()
        .map(|value| Tick {
            position: y.map(value),
            label: format_tick(value),
        })
        .collect()
}
