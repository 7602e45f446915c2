//! In-memory collaborators for unit tests.
//!
//! Every fake is a cheap handle over shared state, so a test can box one
//! clone into the engine and keep another to inspect what happened.

use crate::error::DroughtError;
use crate::map_sync::{LayerInfo, LayerSpec, MapView};
use crate::render::{ChartSurface, Frame};
use crate::session::ErrorReporter;
use crate::url_state::UrlStore;
use dm_core::admin::Extent;
use std::cell::RefCell;
use std::rc::Rc;

/// Ordered query parameters; `set` keeps a key's position.
#[derive(Debug, Clone, Default)]
pub struct MemoryUrlStore {
    params: Rc<RefCell<Vec<(String, String)>>>,
}

impl MemoryUrlStore {
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let store = MemoryUrlStore::default();
        for (key, value) in pairs {
            store.set(key, value);
        }
        store
    }

    pub fn query(&self) -> String {
        self.params
            .borrow()
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl UrlStore for MemoryUrlStore {
    fn get(&self, key: &str) -> Option<String> {
        self.params
            .borrow()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    fn set(&self, key: &str, value: &str) {
        let mut params = self.params.borrow_mut();
        match params.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => params.push((key.to_string(), value.to_string())),
        }
    }

    fn remove(&self, key: &str) {
        self.params.borrow_mut().retain(|(k, _)| k != key);
    }
}

#[derive(Debug, Default)]
struct MapState {
    ready: bool,
    layers: Vec<LayerInfo>,
    added: Vec<(LayerSpec, usize)>,
    next_id: usize,
    extent: Option<Extent>,
    fail_next_add: bool,
    fail_next_list: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FakeMapView {
    state: Rc<RefCell<MapState>>,
}

impl FakeMapView {
    pub fn new(ready: bool) -> Self {
        let view = FakeMapView::default();
        view.state.borrow_mut().ready = ready;
        view
    }

    pub fn set_ready(&self, ready: bool) {
        self.state.borrow_mut().ready = ready;
    }

    pub fn push_layer(&self, id: &str, title: &str) {
        self.state.borrow_mut().layers.push(LayerInfo {
            id: id.to_string(),
            title: title.to_string(),
        });
    }

    pub fn added(&self) -> Vec<(LayerSpec, usize)> {
        self.state.borrow().added.clone()
    }

    pub fn count_titled(&self, title: &str) -> usize {
        self.state
            .borrow()
            .layers
            .iter()
            .filter(|l| l.title == title)
            .count()
    }

    pub fn extent(&self) -> Option<Extent> {
        self.state.borrow().extent
    }

    pub fn fail_next_add(&self) {
        self.state.borrow_mut().fail_next_add = true;
    }

    pub fn fail_next_list(&self) {
        self.state.borrow_mut().fail_next_list = true;
    }
}

impl MapView for FakeMapView {
    fn is_ready(&self) -> bool {
        self.state.borrow().ready
    }

    fn layers(&self) -> Result<Vec<LayerInfo>, DroughtError> {
        let mut state = self.state.borrow_mut();
        if std::mem::take(&mut state.fail_next_list) {
            return Err(DroughtError::Map("layer list unavailable".to_string()));
        }
        Ok(state.layers.clone())
    }

    fn remove_many(&mut self, ids: &[String]) -> Result<(), DroughtError> {
        self.state
            .borrow_mut()
            .layers
            .retain(|l| !ids.contains(&l.id));
        Ok(())
    }

    fn add(&mut self, layer: &LayerSpec, index: usize) -> Result<(), DroughtError> {
        let mut state = self.state.borrow_mut();
        if std::mem::take(&mut state.fail_next_add) {
            return Err(DroughtError::Map("layer rejected".to_string()));
        }
        state.next_id += 1;
        let info = LayerInfo {
            id: format!("drought-{}", state.next_id),
            title: layer.title.clone(),
        };
        let at = index.min(state.layers.len());
        state.layers.insert(at, info);
        state.added.push((layer.clone(), index));
        Ok(())
    }

    fn go_to(&mut self, extent: &Extent) -> Result<(), DroughtError> {
        self.state.borrow_mut().extent = Some(*extent);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct SurfaceLog {
    frames: Vec<Frame>,
    attached: usize,
    detached: usize,
    cleared: usize,
    fail_next_draw: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    log: Rc<RefCell<SurfaceLog>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.log.borrow().frames.clone()
    }

    pub fn last_frame(&self) -> Option<Frame> {
        self.log.borrow().frames.last().cloned()
    }

    pub fn draw_count(&self) -> usize {
        self.log.borrow().frames.len()
    }

    pub fn attach_count(&self) -> usize {
        self.log.borrow().attached
    }

    pub fn detach_count(&self) -> usize {
        self.log.borrow().detached
    }

    pub fn clear_count(&self) -> usize {
        self.log.borrow().cleared
    }

    pub fn fail_next_draw(&self) {
        self.log.borrow_mut().fail_next_draw = true;
    }
}

impl ChartSurface for RecordingSurface {
    fn attach(&mut self) {
        self.log.borrow_mut().attached += 1;
    }

    fn detach(&mut self) {
        self.log.borrow_mut().detached += 1;
    }

    fn draw(&mut self, frame: &Frame) -> Result<(), DroughtError> {
        let mut log = self.log.borrow_mut();
        if std::mem::take(&mut log.fail_next_draw) {
            return Err(DroughtError::Render("surface lost".to_string()));
        }
        log.frames.push(frame.clone());
        Ok(())
    }

    fn clear(&mut self) {
        self.log.borrow_mut().cleared += 1;
    }
}

#[derive(Debug, Clone, Default)]
pub struct CollectingReporter {
    reports: Rc<RefCell<Vec<DroughtError>>>,
}

impl CollectingReporter {
    pub fn reports(&self) -> Vec<DroughtError> {
        self.reports.borrow().clone()
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, error: &DroughtError) {
        self.reports.borrow_mut().push(error.clone());
    }
}
