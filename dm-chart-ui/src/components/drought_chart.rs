//! SVG surface for the stacked drought chart.
//!
//! Paints the engine's current [`Frame`] and turns mouse input into
//! [`PointerEvent`]s. A transparent overlay on top of the marks receives all
//! input, so element coordinates are chart coordinates.

use crate::browser::window_width;
use crate::state::AppState;
use dioxus::prelude::*;
use dm_chart::interaction::PagePosition;
use dm_chart::render::{Frame, PointerEvent};

/// Mouse travel below which a press-release counts as a click, not a drag.
const CLICK_SLOP: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    last_x: f64,
    travelled: f64,
}

#[derive(Props, Clone, PartialEq)]
pub struct DroughtChartProps {
    /// DOM id of the wrapper, used to measure the available width
    pub id: String,
    pub on_pointer: EventHandler<PointerEvent>,
    #[props(default = 300)]
    pub min_height: u32,
}

#[component]
pub fn DroughtChart(props: DroughtChartProps) -> Element {
    let state = use_context::<AppState>();
    let mut drag = use_signal(|| None::<Drag>);
    let frame = (state.frame)();
    let on_pointer = props.on_pointer;
    let listening = move || *state.listening.peek();

    let on_mouse_down = move |evt: MouseEvent| {
        if !listening() {
            return;
        }
        let p = evt.element_coordinates();
        drag.set(Some(Drag {
            last_x: p.x,
            travelled: 0.0,
        }));
    };

    let on_mouse_move = move |evt: MouseEvent| {
        if !listening() {
            return;
        }
        let p = evt.element_coordinates();
        let current = *drag.peek();
        if let Some(mut d) = current {
            if evt.held_buttons().is_empty() {
                drag.set(None);
            } else {
                let dx = p.x - d.last_x;
                d.last_x = p.x;
                d.travelled += dx.abs();
                drag.set(Some(d));
                if dx != 0.0 {
                    on_pointer.call(PointerEvent::Drag { dx });
                }
                return;
            }
        }
        let page = evt.page_coordinates();
        on_pointer.call(PointerEvent::Move {
            x: p.x,
            y: p.y,
            page: PagePosition {
                page_x: page.x,
                page_y: page.y,
                window_width: window_width(),
            },
        });
    };

    let on_mouse_up = move |evt: MouseEvent| {
        if !listening() {
            return;
        }
        if let Some(d) = drag.take() {
            if d.travelled < CLICK_SLOP {
                let p = evt.element_coordinates();
                on_pointer.call(PointerEvent::Click { x: p.x, y: p.y });
            }
        }
    };

    let on_mouse_leave = move |_evt: MouseEvent| {
        drag.set(None);
        if listening() {
            on_pointer.call(PointerEvent::Leave);
        }
    };

    let on_double_click = move |_evt: MouseEvent| {
        if listening() {
            on_pointer.call(PointerEvent::DoubleClick);
        }
    };

    let on_wheel = move |evt: WheelEvent| {
        if !listening() {
            return;
        }
        evt.prevent_default();
        let delta_y = evt.delta().strip_units().y;
        let x = evt.element_coordinates().x;
        on_pointer.call(PointerEvent::Wheel { x, delta_y });
    };

    let wrapper_style = format!("min-height: {}px; width: 100%;", props.min_height);

    rsx! {
        div {
            id: "{props.id}",
            style: "{wrapper_style}",
            if let Some(frame) = frame {
                svg {
                    width: "{frame.width}",
                    height: "{frame.height}",
                    style: "display: block; user-select: none;",
                    FrameMarks { frame: frame.clone() }
                    FrameAxes { frame: frame.clone() }
                    rect {
                        x: "0",
                        y: "0",
                        width: "{frame.width}",
                        height: "{frame.height}",
                        fill: "transparent",
                        style: "cursor: crosshair;",
                        onmousedown: on_mouse_down,
                        onmousemove: on_mouse_move,
                        onmouseup: on_mouse_up,
                        onmouseleave: on_mouse_leave,
                        ondoubleclick: on_double_click,
                        onwheel: on_wheel,
                    }
                }
            }
        }
    }
}

/// Bars or areas plus hover/selection markers, clipped to the plot area.
#[component]
fn FrameMarks(frame: Frame) -> Element {
    let plot = frame.plot;
    let view_box = format!(
        "{} {} {} {}",
        plot.left,
        plot.top,
        plot.width(),
        plot.height()
    );

    rsx! {
        svg {
            x: "{plot.left}",
            y: "{plot.top}",
            width: "{plot.width()}",
            height: "{plot.height()}",
            view_box: "{view_box}",
            preserve_aspect_ratio: "none",
            for bar in frame.bars.iter() {
                rect {
                    x: "{bar.x}",
                    y: "{bar.y}",
                    width: "{bar.width}",
                    height: "{bar.height}",
                    fill: "{bar.color}",
                }
            }
            for area in frame.areas.iter() {
                path {
                    d: "{area.d}",
                    fill: "{area.color}",
                    stroke: "none",
                }
            }
            if let Some(hover) = frame.hover {
                rect {
                    x: "{hover.x - 1.0}",
                    y: "{hover.top}",
                    width: "{hover.width + 2.0}",
                    height: "{hover.bottom - hover.top}",
                    fill: "#000",
                    fill_opacity: "0.08",
                }
            }
            if let Some(selected) = frame.selection {
                rect {
                    x: "{selected.x - 1.0}",
                    y: "{selected.top}",
                    width: "{selected.width + 2.0}",
                    height: "{selected.bottom - selected.top}",
                    fill: "none",
                    stroke: "#1565C0",
                    stroke_width: "2",
                }
            }
        }
    }
}

#[component]
fn FrameAxes(frame: Frame) -> Element {
    let plot = frame.plot;

    rsx! {
        g {
            line {
                x1: "{plot.left}",
                x2: "{plot.right}",
                y1: "{plot.bottom}",
                y2: "{plot.bottom}",
                stroke: "#999",
            }
            for tick in frame.x_ticks.iter() {
                text {
                    x: "{tick.position}",
                    y: "{plot.bottom + 18.0}",
                    text_anchor: "middle",
                    font_size: "11",
                    fill: "#555",
                    "{tick.label}"
                }
            }
            line {
                x1: "{plot.left}",
                x2: "{plot.left}",
                y1: "{plot.top}",
                y2: "{plot.bottom}",
                stroke: "#999",
            }
            for tick in frame.y_ticks.iter() {
                text {
                    x: "{plot.left - 6.0}",
                    y: "{tick.position}",
                    text_anchor: "end",
                    dominant_baseline: "middle",
                    font_size: "11",
                    fill: "#555",
                    "{tick.label}"
                }
            }
        }
    }
}

/// Hover tooltip, positioned in page coordinates. Render it outside any
/// positioned container.
#[component]
pub fn ChartTooltip() -> Element {
    let state = use_context::<AppState>();
    let tooltip = (state.frame)().and_then(|f| f.tooltip);

    rsx! {
        if let Some(tooltip) = tooltip {
            div {
                style: "position: absolute; left: {tooltip.left}px; top: {tooltip.top}px; pointer-events: none; background: rgba(255, 255, 255, 0.95); border: 1px solid #BDBDBD; border-radius: 4px; padding: 6px 8px; font-size: 12px; box-shadow: 0 1px 4px rgba(0, 0, 0, 0.2); z-index: 10;",
                strong { "{tooltip.title}" }
                for row in tooltip.rows.iter() {
                    div {
                        style: "display: flex; align-items: center; gap: 6px;",
                        span {
                            style: "display: inline-block; width: 10px; height: 10px; background: {row.color};",
                        }
                        "{row.label}: {row.value}"
                    }
                }
            }
        }
    }
}
