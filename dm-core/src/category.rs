use serde::{Deserialize, Serialize};
use std::fmt;

/// US Drought Monitor intensity categories, plus the share of area with no drought.
///
/// The set is closed. `D0` (abnormally dry) is not drought proper; `D1`
/// through `D4` are the drought intensities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DroughtCategory {
    #[serde(rename = "none")]
    NoDrought,
    #[serde(rename = "d0")]
    D0,
    #[serde(rename = "d1")]
    D1,
    #[serde(rename = "d2")]
    D2,
    #[serde(rename = "d3")]
    D3,
    #[serde(rename = "d4")]
    D4,
}

/// Order in which categories are stacked, drawn and coloured, bottom to top.
///
/// Every consumer (stacking, bar/area rendering, palette lookup, legends)
/// iterates this one constant. `NoDrought` is carried in the data but never
/// stacked.
pub const STACK_ORDER: [DroughtCategory; 5] = [
    DroughtCategory::D4,
    DroughtCategory::D3,
    DroughtCategory::D2,
    DroughtCategory::D1,
    DroughtCategory::D0,
];

/// Categories that count towards the "in drought" aggregate.
pub const IN_DROUGHT: [DroughtCategory; 4] = [
    DroughtCategory::D1,
    DroughtCategory::D2,
    DroughtCategory::D3,
    DroughtCategory::D4,
];

impl DroughtCategory {
    /// Every category, in stacking order followed by `NoDrought`.
    pub const ALL: [DroughtCategory; 6] = [
        DroughtCategory::D4,
        DroughtCategory::D3,
        DroughtCategory::D2,
        DroughtCategory::D1,
        DroughtCategory::D0,
        DroughtCategory::NoDrought,
    ];

    /// Short key used in configuration and serialized payloads.
    pub fn key(&self) -> &'static str {
        match self {
            DroughtCategory::NoDrought => "none",
            DroughtCategory::D0 => "d0",
            DroughtCategory::D1 => "d1",
            DroughtCategory::D2 => "d2",
            DroughtCategory::D3 => "d3",
            DroughtCategory::D4 => "d4",
        }
    }

    /// Human readable label for tooltips and legends.
    pub fn label(&self) -> &'static str {
        match self {
            DroughtCategory::NoDrought => "No Drought",
            DroughtCategory::D0 => "D0 - Abnormally Dry",
            DroughtCategory::D1 => "D1 - Moderate Drought",
            DroughtCategory::D2 => "D2 - Severe Drought",
            DroughtCategory::D3 => "D3 - Extreme Drought",
            DroughtCategory::D4 => "D4 - Exceptional Drought",
        }
    }

    /// Position of this category in [`STACK_ORDER`], `None` for `NoDrought`.
    pub fn stack_index(&self) -> Option<usize> {
        STACK_ORDER.iter().position(|c| c == self)
    }
}

impl fmt::Display for DroughtCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
