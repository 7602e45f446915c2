//! Application state persisted in the page URL.
//!
//! The query string is shared with the outer shell (admin level, map extent),
//! so writers only ever touch their own parameters through a [`UrlStore`],
//! which performs the read-modify-write on the full query string.

use chrono::{DateTime, Utc};
use dm_core::admin::{AdminLevel, Extent, MapPoint};
use dm_utils::dates::{from_epoch_millis, to_epoch_millis};
use log::warn;

pub const DATE_PARAM: &str = "date";
pub const ADMIN_PARAM: &str = "admin";
pub const XMIN_PARAM: &str = "xmin";
pub const YMIN_PARAM: &str = "ymin";
pub const XMAX_PARAM: &str = "xmax";
pub const YMAX_PARAM: &str = "ymax";
pub const X_PARAM: &str = "x";
pub const Y_PARAM: &str = "y";

/// Access to the page's query parameters.
///
/// Writes replace the current history entry: no reload, no new entry, and
/// every parameter other than the ones written is preserved.
pub trait UrlStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);

    /// Write several parameters. Implementations may batch them into a
    /// single history replace.
    fn set_many(&self, pairs: &[(&str, String)]) {
        for (key, value) in pairs {
            self.set(key, value);
        }
    }
}

/// Everything restorable from the URL on load.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UrlState {
    pub date: Option<DateTime<Utc>>,
    pub extent: Option<Extent>,
    pub admin: Option<AdminLevel>,
    /// Last clicked location, in Web Mercator.
    pub location: Option<MapPoint>,
}

impl UrlState {
    /// Read the state; malformed parameters are ignored with a warning.
    pub fn read(store: &dyn UrlStore) -> Self {
        let date = store.get(DATE_PARAM).and_then(|raw| {
            raw.trim()
                .parse::<i64>()
                .map_err(anyhow::Error::from)
                .and_then(from_epoch_millis)
                .map_err(|e| warn!("Ignoring invalid '{}' parameter {:?}: {}", DATE_PARAM, raw, e))
                .ok()
        });

        let admin = store.get(ADMIN_PARAM).and_then(|raw| {
            raw.parse::<AdminLevel>()
                .map_err(|e| warn!("Ignoring invalid '{}' parameter: {}", ADMIN_PARAM, e))
                .ok()
        });

        let bound = |key: &str| store.get(key).and_then(|v| v.trim().parse::<f64>().ok());
        let extent = match (
            bound(XMIN_PARAM),
            bound(YMIN_PARAM),
            bound(XMAX_PARAM),
            bound(YMAX_PARAM),
        ) {
            (Some(xmin), Some(ymin), Some(xmax), Some(ymax)) => {
                let extent = Extent::from_bounds(xmin, ymin, xmax, ymax);
                if extent.is_none() {
                    warn!("Ignoring invalid extent in URL");
                }
                extent
            }
            _ => None,
        };

        let location = match (bound(X_PARAM), bound(Y_PARAM)) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => {
                Some(MapPoint::web_mercator(x, y))
            }
            _ => None,
        };

        UrlState {
            date,
            extent,
            admin,
            location,
        }
    }

    /// Persist the selected date as epoch milliseconds.
    pub fn write_date(store: &dyn UrlStore, date: DateTime<Utc>) {
        store.set(DATE_PARAM, &to_epoch_millis(&date).to_string());
    }

    /// Persist the last stationary map extent.
    pub fn write_extent(store: &dyn UrlStore, extent: &Extent) {
        store.set_many(&[
            (XMIN_PARAM, extent.xmin.to_string()),
            (YMIN_PARAM, extent.ymin.to_string()),
            (XMAX_PARAM, extent.xmax.to_string()),
            (YMAX_PARAM, extent.ymax.to_string()),
        ]);
    }

    pub fn write_admin(store: &dyn UrlStore, admin: AdminLevel) {
        store.set(ADMIN_PARAM, admin.as_str());
    }

    pub fn write_location(store: &dyn UrlStore, point: &MapPoint) {
        store.set_many(&[(X_PARAM, point.x.to_string()), (Y_PARAM, point.y.to_string())]);
    }
}
