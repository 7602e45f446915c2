use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Administrative level the user is inspecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminLevel {
    #[default]
    County,
    State,
}

impl AdminLevel {
    /// Token used in the `admin` URL parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminLevel::County => "county",
            AdminLevel::State => "state",
        }
    }
}

impl fmt::Display for AdminLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "county" => Ok(AdminLevel::County),
            "state" => Ok(AdminLevel::State),
            other => Err(format!("unknown admin level: {}", other)),
        }
    }
}

/// A map extent in map units (Web Mercator metres for the default basemap).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Extent {
    /// Build an extent from the four URL parameters, rejecting non-finite
    /// or inverted bounds.
    pub fn from_bounds(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Option<Self> {
        let finite = [xmin, ymin, xmax, ymax].iter().all(|v| v.is_finite());
        (finite && xmin <= xmax && ymin <= ymax).then_some(Extent {
            xmin,
            ymin,
            xmax,
            ymax,
        })
    }
}

/// Well-known id of Web Mercator, the basemap's spatial reference.
pub const WEB_MERCATOR_WKID: u32 = 3857;

/// A clicked map location, in the map's spatial reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
    /// Well-known id of the spatial reference (3857 for Web Mercator).
    pub wkid: u32,
}

impl MapPoint {
    pub fn web_mercator(x: f64, y: f64) -> Self {
        MapPoint {
            x,
            y,
            wkid: WEB_MERCATOR_WKID,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_level_parse() {
        assert_eq!("county".parse::<AdminLevel>(), Ok(AdminLevel::County));
        assert_eq!(" State ".parse::<AdminLevel>(), Ok(AdminLevel::State));
        assert!("country".parse::<AdminLevel>().is_err());
        assert_eq!(AdminLevel::State.to_string(), "state");
    }

    #[test]
    fn test_extent_rejects_inverted_bounds() {
        assert!(Extent::from_bounds(0.0, 0.0, 10.0, 10.0).is_some());
        assert!(Extent::from_bounds(10.0, 0.0, 0.0, 10.0).is_none());
        assert!(Extent::from_bounds(0.0, f64::NAN, 10.0, 10.0).is_none());
    }
}
