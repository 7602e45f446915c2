//! Hover scrubbing and click selection.

use crate::scale::{ColorScale, PlotArea, XScale};
use chrono::{DateTime, Utc};
use dm_core::category::DroughtCategory;
use dm_data::stacking::{StackedPoint, StackedSeries};
use dm_utils::dates::format_display_date;
use dm_utils::format::format_percent;
use log::debug;
use serde::Serialize;

/// Distance from the window's right edge under which the tooltip flips left.
pub const TOOLTIP_EDGE_MARGIN: f64 = 150.0;
/// Vertical offset of the tooltip above the pointer.
pub const TOOLTIP_OFFSET_Y: f64 = 28.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SelectionState {
    /// Cleared on pointer-leave.
    pub hover_date: Option<DateTime<Utc>>,
    /// Kept until the next click.
    pub selected_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipRow {
    pub label: String,
    pub value: String,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    pub left: f64,
    pub top: f64,
    pub title: String,
    pub rows: Vec<TooltipRow>,
}

/// Pointer position in page coordinates plus the window width, as needed
/// for tooltip placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PagePosition {
    pub page_x: f64,
    pub page_y: f64,
    pub window_width: f64,
}

/// `(left, top)` of the tooltip for a pointer at `page_x, page_y`.
pub fn place_tooltip(position: PagePosition) -> (f64, f64) {
    let mut left = position.page_x;
    if position.window_width - position.page_x <= TOOLTIP_EDGE_MARGIN {
        left -= TOOLTIP_EDGE_MARGIN;
    }
    (left, position.page_y - TOOLTIP_OFFSET_Y)
}

fn tooltip_for(point: &StackedPoint, position: PagePosition) -> Tooltip {
    let (left, top) = place_tooltip(position);
    let rows = DroughtCategory::ALL
        .iter()
        .map(|category| TooltipRow {
            label: category.label().to_string(),
            value: format_percent(point.point.raw(*category)),
            color: ColorScale.color(*category),
        })
        .collect();
    Tooltip {
        left,
        top,
        title: format_display_date(&point.date()),
        rows,
    }
}

/// Text shown next to the chart for the selected date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionLabel {
    pub date: DateTime<Utc>,
    /// Share of area in D1 through D4.
    pub in_drought: f64,
}

impl SelectionLabel {
    pub fn text(&self) -> String {
        format!(
            "{}: {} in drought",
            format_display_date(&self.date),
            format_percent(Some(self.in_drought))
        )
    }
}

/// Tracks hover and selection for one chart.
///
/// Hover and selection are independent: leaving the chart clears the hover
/// but never the selection.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    state: SelectionState,
    hover_index: Option<usize>,
    selected_index: Option<usize>,
    tooltip: Option<Tooltip>,
    label: Option<SelectionLabel>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the hover from a pointer at plot coordinates `(x, y)`.
    /// Returns whether anything visible changed.
    pub fn pointer_move(
        &mut self,
        x: f64,
        y: f64,
        position: PagePosition,
        plot: &PlotArea,
        scale: &XScale,
        series: &StackedSeries,
    ) -> bool {
        let hit = if plot.contains(x, y) {
            scale.index_at(x, series)
        } else {
            None
        };
        let Some((index, point)) = hit.and_then(|i| series.get(i).map(|p| (i, p))) else {
            return self.pointer_leave();
        };
        let tooltip = tooltip_for(point, position);
        let changed = self.hover_index != Some(index) || self.tooltip.as_ref() != Some(&tooltip);
        self.hover_index = Some(index);
        self.state.hover_date = Some(point.date());
        self.tooltip = Some(tooltip);
        changed
    }

    /// Clear hover and tooltip. Returns whether there was anything to clear.
    pub fn pointer_leave(&mut self) -> bool {
        let had_hover = self.hover_index.is_some() || self.tooltip.is_some();
        self.hover_index = None;
        self.state.hover_date = None;
        self.tooltip = None;
        had_hover
    }

    /// Select the point under `(x, y)`. Clicks outside the plot or between
    /// data are ignored and return `None`.
    pub fn click(
        &mut self,
        x: f64,
        y: f64,
        plot: &PlotArea,
        scale: &XScale,
        series: &StackedSeries,
    ) -> Option<DateTime<Utc>> {
        if !plot.contains(x, y) {
            debug!("Ignoring click outside the plot at ({}, {})", x, y);
            return None;
        }
        let index = scale.index_at(x, series)?;
        self.select_index(index, series)
    }

    /// Mark point `index` as selected and return its date.
    pub fn select_index(&mut self, index: usize, series: &StackedSeries) -> Option<DateTime<Utc>> {
        let point = series.get(index)?;
        self.selected_index = Some(index);
        self.state.selected_date = Some(point.date());
        self.label = Some(SelectionLabel {
            date: point.date(),
            in_drought: point.point.in_drought(),
        });
        Some(point.date())
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn hover_index(&self) -> Option<usize> {
        self.hover_index
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected_index
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.as_ref()
    }

    pub fn label(&self) -> Option<SelectionLabel> {
        self.label
    }
}
