//! Keeps the map's drought layer and the URL in step with the chart selection.
//!
//! [`MapSyncAdapter`] is the only writer of the map's layer list. It is shared
//! between the chart handle (click selection) and the shell (view ready,
//! extent restore) as a [`SharedSync`].

use crate::config::DroughtLayerConfig;
use crate::error::DroughtError;
use crate::url_state::{UrlState, UrlStore};
use chrono::{DateTime, Utc};
use dm_core::admin::Extent;
use dm_core::date_range::DateRange;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// A layer currently in the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerInfo {
    pub id: String,
    pub title: String,
}

/// Description of the time-filtered drought layer to add.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerSpec {
    pub url: String,
    pub layer_id: u32,
    pub title: String,
    pub time_extent: DateRange,
    pub popup_enabled: bool,
}

/// The map view collaborator.
pub trait MapView {
    /// Whether the view has finished loading and accepts layer changes.
    fn is_ready(&self) -> bool;
    fn layers(&self) -> Result<Vec<LayerInfo>, DroughtError>;
    fn remove_many(&mut self, ids: &[String]) -> Result<(), DroughtError>;
    fn add(&mut self, layer: &LayerSpec, index: usize) -> Result<(), DroughtError>;
    fn go_to(&mut self, extent: &Extent) -> Result<(), DroughtError>;
}

/// Result of a date selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncOutcome {
    /// The layer now shows this range.
    Applied(DateRange),
    /// The view was not ready; the range is applied once it is.
    Deferred(DateRange),
}

impl SyncOutcome {
    pub fn range(&self) -> DateRange {
        match self {
            SyncOutcome::Applied(range) | SyncOutcome::Deferred(range) => *range,
        }
    }
}

pub type SharedSync = Rc<RefCell<MapSyncAdapter>>;

pub struct MapSyncAdapter {
    view: Box<dyn MapView>,
    url: Box<dyn UrlStore>,
    layer: DroughtLayerConfig,
    pending_date: Option<DateTime<Utc>>,
    pending_extent: Option<Extent>,
    active: Option<DateRange>,
}

impl MapSyncAdapter {
    pub fn new(view: Box<dyn MapView>, url: Box<dyn UrlStore>, layer: DroughtLayerConfig) -> Self {
        MapSyncAdapter {
            view,
            url,
            layer,
            pending_date: None,
            pending_extent: None,
            active: None,
        }
    }

    pub fn shared(self) -> SharedSync {
        Rc::new(RefCell::new(self))
    }

    /// Point the drought layer at the week ending on `date`, then persist
    /// `date` in the URL.
    ///
    /// Before the view is ready the date is queued (latest wins) and
    /// applied by [`MapSyncAdapter::on_view_ready`]; the URL is written
    /// right away in that case. A failed swap leaves the URL untouched.
    pub fn on_date_selected(&mut self, date: DateTime<Utc>) -> Result<SyncOutcome, DroughtError> {
        let range = DateRange::ending_at(date);

        if !self.view.is_ready() {
            info!("Map view not ready, deferring drought layer for {}", date);
            self.pending_date = Some(date);
            UrlState::write_date(self.url.as_ref(), date);
            return Ok(SyncOutcome::Deferred(range));
        }

        self.pending_date = None;
        self.swap_layer(range)?;
        UrlState::write_date(self.url.as_ref(), date);
        Ok(SyncOutcome::Applied(range))
    }

    /// Flush whatever was queued while the view was loading.
    pub fn on_view_ready(&mut self) -> Result<Option<SyncOutcome>, DroughtError> {
        if !self.view.is_ready() {
            return Err(DroughtError::MapNotReady);
        }
        if let Some(extent) = self.pending_extent.take() {
            self.view.go_to(&extent)?;
        }
        match self.pending_date.take() {
            Some(date) => {
                let range = DateRange::ending_at(date);
                self.swap_layer(range)?;
                Ok(Some(SyncOutcome::Applied(range)))
            }
            None => Ok(None),
        }
    }

    /// Navigate to `extent`, or queue it until the view is ready.
    /// Returns whether the navigation happened now.
    pub fn go_to(&mut self, extent: Extent) -> Result<bool, DroughtError> {
        if !self.view.is_ready() {
            self.pending_extent = Some(extent);
            return Ok(false);
        }
        self.view.go_to(&extent)?;
        Ok(true)
    }

    pub fn layer_spec(&self, range: DateRange) -> LayerSpec {
        LayerSpec {
            url: self.layer.url.clone(),
            layer_id: self.layer.layer_id,
            title: self.layer.title.clone(),
            time_extent: range,
            popup_enabled: false,
        }
    }

    fn swap_layer(&mut self, range: DateRange) -> Result<(), DroughtError> {
        let stale: Vec<String> = self
            .view
            .layers()?
            .into_iter()
            .filter(|layer| layer.title == self.layer.title)
            .map(|layer| layer.id)
            .collect();
        if !stale.is_empty() {
            debug!("Removing {} drought layer(s)", stale.len());
            self.view.remove_many(&stale)?;
            self.active = None;
        }
        let spec = self.layer_spec(range);
        self.view.add(&spec, self.layer.index)?;
        self.active = Some(range);
        info!(
            "Drought layer set to {} .. {}",
            range.start.format("%Y-%m-%d"),
            range.end.format("%Y-%m-%d")
        );
        Ok(())
    }
}
