//! Application state managed via Dioxus context.
//!
//! `AppState` bundles all reactive signals into a single struct provided via
//! `use_context_provider`. Child components retrieve it with `use_context::<AppState>()`.

use dioxus::prelude::*;
use dm_chart::render::Frame;
use dm_core::admin::AdminLevel;
use dm_core::record::Boundary;

/// Shared state of the drought chart app.
#[derive(Clone, Copy)]
pub struct AppState {
    /// A location query is in flight
    pub loading: Signal<bool>,
    /// Error message if something went wrong
    pub error_msg: Signal<Option<String>>,
    /// County or state statistics
    pub admin: Signal<AdminLevel>,
    /// Boundary the chart currently shows
    pub boundary: Signal<Option<Boundary>>,
    /// Last frame drawn by the chart engine; `None` when there is no chart
    pub frame: Signal<Option<Frame>>,
    /// Whether the chart accepts pointer input
    pub listening: Signal<bool>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            loading: Signal::new(false),
            error_msg: Signal::new(None),
            admin: Signal::new(AdminLevel::default()),
            boundary: Signal::new(None),
            frame: Signal::new(None),
            listening: Signal::new(false),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
