//! Application configuration.
//!
//! Apps embed a JSON document (see `drought-chart/config/app.json`) and
//! parse it with [`AppConfig::from_json`]; every field has a default so a
//! partial document is enough.

use crate::error::DroughtError;
use crate::scale::{BandPadding, ChartMode, Margins, Viewport};
use dm_core::admin::AdminLevel;
use dm_core::record::{BoundaryFields, FieldMapping};
use serde::{Deserialize, Serialize};

/// Title the drought map layer is tagged with; used to find and replace it.
pub const DROUGHT_LAYER_TITLE: &str = "Drought Intensity";

/// Services and field names for one administrative level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Boundary polygons, queried with the clicked point.
    pub boundary_url: String,
    /// Weekly drought statistics per boundary.
    pub series_url: String,
    pub boundary_fields: BoundaryFields,
    pub fields: FieldMapping,
}

impl AdminConfig {
    fn defaults(admin: AdminLevel) -> Self {
        AdminConfig {
            boundary_url: String::new(),
            series_url: String::new(),
            boundary_fields: BoundaryFields::for_admin(admin),
            fields: FieldMapping::for_admin(admin),
        }
    }
}

/// The time-enabled drought layer swapped in on date selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DroughtLayerConfig {
    pub url: String,
    pub layer_id: u32,
    pub title: String,
    /// Position in the map's layer list.
    pub index: usize,
}

impl Default for DroughtLayerConfig {
    fn default() -> Self {
        DroughtLayerConfig {
            url: String::new(),
            layer_id: 0,
            title: DROUGHT_LAYER_TITLE.to_string(),
            index: 1,
        }
    }
}

/// Chart appearance that does not depend on the data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub mode: ChartMode,
    pub height: f64,
    pub margins: Margins,
    pub padding: BandPadding,
}

impl Default for ChartConfig {
    fn default() -> Self {
        ChartConfig {
            mode: ChartMode::Bar,
            height: 300.0,
            margins: Margins::default(),
            padding: BandPadding::default(),
        }
    }
}

impl ChartConfig {
    /// Viewport of the configured height and margins at `width` pixels.
    pub fn viewport(&self, width: f64) -> Viewport {
        Viewport {
            width,
            height: self.height,
            margins: self.margins,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub county: AdminConfig,
    pub state: AdminConfig,
    pub drought_layer: DroughtLayerConfig,
    pub chart: ChartConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            county: AdminConfig::defaults(AdminLevel::County),
            state: AdminConfig::defaults(AdminLevel::State),
            drought_layer: DroughtLayerConfig::default(),
            chart: ChartConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, DroughtError> {
        let config: AppConfig =
            serde_json::from_str(json).map_err(|e| DroughtError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn admin(&self, admin: AdminLevel) -> &AdminConfig {
        match admin {
            AdminLevel::County => &self.county,
            AdminLevel::State => &self.state,
        }
    }

    /// Every service URL must be set and the chart must have room to draw.
    pub fn validate(&self) -> Result<(), DroughtError> {
        for (name, admin) in [("county", &self.county), ("state", &self.state)] {
            if admin.boundary_url.is_empty() || admin.series_url.is_empty() {
                return Err(DroughtError::Config(format!(
                    "{} service URLs are not set",
                    name
                )));
            }
        }
        if self.drought_layer.url.is_empty() {
            return Err(DroughtError::Config(
                "drought layer URL is not set".to_string(),
            ));
        }
        if self.drought_layer.title.is_empty() {
            return Err(DroughtError::Config(
                "drought layer title must not be empty".to_string(),
            ));
        }
        let margins = self.chart.margins;
        if self.chart.height <= margins.top + margins.bottom {
            return Err(DroughtError::Config(format!(
                "chart height {} leaves no room between margins",
                self.chart.height
            )));
        }
        Ok(())
    }
}
