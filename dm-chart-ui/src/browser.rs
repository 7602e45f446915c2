//! Browser implementations of the engine's collaborators.

use crate::js_bridge;
use dioxus::prelude::*;
use dm_chart::error::DroughtError;
use dm_chart::map_sync::{LayerInfo, LayerSpec, MapView};
use dm_chart::render::{ChartSurface, Frame};
use dm_chart::session::ErrorReporter;
use dm_chart::url_state::UrlStore;
use dm_core::admin::Extent;
use log::{error, warn};
use wasm_bindgen::JsValue;
use web_sys::UrlSearchParams;

/// Query string of the current page, rewritten with `history.replaceState`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserUrl;

impl BrowserUrl {
    fn params() -> Option<UrlSearchParams> {
        let search = web_sys::window()?.location().search().ok()?;
        UrlSearchParams::new_with_str(&search).ok()
    }

    fn replace(params: &UrlSearchParams) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let location = window.location();
        let path = location.pathname().unwrap_or_default();
        let hash = location.hash().unwrap_or_default();
        let query = String::from(params.to_string());
        let url = if query.is_empty() {
            format!("{}{}", path, hash)
        } else {
            format!("{}?{}{}", path, query, hash)
        };
        let result = window
            .history()
            .and_then(|history| history.replace_state_with_url(&JsValue::NULL, "", Some(&url)));
        if let Err(e) = result {
            warn!("Could not update URL: {:?}", e);
        }
    }

    fn update(change: impl FnOnce(&UrlSearchParams)) {
        if let Some(params) = Self::params() {
            change(&params);
            Self::replace(&params);
        }
    }
}

impl UrlStore for BrowserUrl {
    fn get(&self, key: &str) -> Option<String> {
        Self::params()?.get(key)
    }

    fn set(&self, key: &str, value: &str) {
        Self::update(|params| params.set(key, value));
    }

    fn remove(&self, key: &str) {
        Self::update(|params| params.delete(key));
    }

    fn set_many(&self, pairs: &[(&str, String)]) {
        Self::update(|params| {
            for (key, value) in pairs {
                params.set(key, value);
            }
        });
    }
}

/// The host page's ArcGIS view.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMapView;

impl MapView for WebMapView {
    fn is_ready(&self) -> bool {
        js_bridge::view_ready()
    }

    fn layers(&self) -> Result<Vec<LayerInfo>, DroughtError> {
        js_bridge::map_layers().map_err(DroughtError::Map)
    }

    fn remove_many(&mut self, ids: &[String]) -> Result<(), DroughtError> {
        js_bridge::remove_layers(ids).map_err(DroughtError::Map)
    }

    fn add(&mut self, layer: &LayerSpec, index: usize) -> Result<(), DroughtError> {
        js_bridge::add_layer(layer, index).map_err(DroughtError::Map)
    }

    fn go_to(&mut self, extent: &Extent) -> Result<(), DroughtError> {
        js_bridge::go_to(extent).map_err(DroughtError::Map)
    }
}

/// Chart surface backed by signals; `DroughtChart` renders whatever frame
/// is stored and only forwards pointer input while `listening` is set.
#[derive(Clone, Copy)]
pub struct SignalSurface {
    frame: Signal<Option<Frame>>,
    listening: Signal<bool>,
}

impl SignalSurface {
    pub fn new(frame: Signal<Option<Frame>>, listening: Signal<bool>) -> Self {
        SignalSurface { frame, listening }
    }
}

impl ChartSurface for SignalSurface {
    fn attach(&mut self) {
        self.listening.set(true);
    }

    fn detach(&mut self) {
        self.listening.set(false);
    }

    fn draw(&mut self, frame: &Frame) -> Result<(), DroughtError> {
        let mut slot = self
            .frame
            .try_write()
            .map_err(|e| DroughtError::Render(e.to_string()))?;
        *slot = Some(frame.clone());
        Ok(())
    }

    fn clear(&mut self) {
        self.frame.set(None);
    }
}

/// Shows reported errors through `ErrorDisplay`.
#[derive(Clone, Copy)]
pub struct SignalReporter {
    message: Signal<Option<String>>,
}

impl SignalReporter {
    pub fn new(message: Signal<Option<String>>) -> Self {
        SignalReporter { message }
    }
}

impl ErrorReporter for SignalReporter {
    fn report(&self, err: &DroughtError) {
        error!("{}", err);
        let mut message = self.message;
        message.set(Some(err.to_string()));
    }
}

/// Width of the element `id`, if it is in the document.
pub fn element_width(id: &str) -> Option<f64> {
    let element = web_sys::window()?.document()?.get_element_by_id(id)?;
    let width = element.client_width();
    (width > 0).then_some(width as f64)
}

/// `window.innerWidth`, for tooltip placement.
pub fn window_width() -> f64 {
    web_sys::window()
        .and_then(|w| w.inner_width().ok())
        .and_then(|w| w.as_f64())
        .unwrap_or(0.0)
}
