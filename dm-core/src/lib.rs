//! Core types for county/state drought intensity data.
//!
//! - `category`: the closed set of drought categories and their stacking order
//! - `feature` / `query`: feature-service wire types and query parameters
//! - `record`: per-admin-level field mappings onto canonical categories
//! - `date_range`: the one-week map window derived from a selected date

pub mod admin;
pub mod category;
pub mod date_range;
pub mod feature;
pub mod query;
pub mod record;

pub use admin::{AdminLevel, Extent, MapPoint, WEB_MERCATOR_WKID};
pub use category::{DroughtCategory, IN_DROUGHT, STACK_ORDER};
pub use date_range::DateRange;
pub use feature::{Feature, FeatureSet};
pub use query::{FeatureQuery, QueryError};
pub use record::{Boundary, BoundaryFields, DroughtRecord, FieldMapping};
