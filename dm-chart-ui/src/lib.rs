//! Browser side of the drought chart.
//!
//! This crate provides:
//! - `js_bridge`: the map view, reached through `js_sys::eval()` and a few
//!   `window.droughtMap` hooks the host page defines
//! - `browser`: `web_sys`/signal implementations of the engine's traits
//!   (URL store, map view, chart surface, error reporter)
//! - `feature_client`: feature-service queries over `fetch`
//! - `state`: reactive `AppState` with Dioxus Signals
//! - `components`: RSX components (SVG chart, legend, selectors, etc.)

pub mod browser;
pub mod components;
pub mod feature_client;
pub mod js_bridge;
pub mod state;
