//! Mapping from raw feature attributes onto canonical drought categories.
//!
//! County and state services publish the same statistics under different
//! field names, so each administrative level carries its own [`FieldMapping`].

use crate::admin::AdminLevel;
use crate::category::DroughtCategory;
use crate::feature::{Feature, FeatureSet};
use chrono::{DateTime, Utc};
use dm_utils::dates::parse_timestamp;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One dated observation, keyed by canonical category.
///
/// A category missing from `values` had no usable value in the source
/// feature. It is not the same as a recorded 0.
#[derive(Debug, Clone, PartialEq)]
pub struct DroughtRecord {
    pub date: DateTime<Utc>,
    pub values: BTreeMap<DroughtCategory, f64>,
}

impl DroughtRecord {
    /// Build a record from `(category, value)` pairs.
    pub fn new(date: DateTime<Utc>, values: &[(DroughtCategory, f64)]) -> Self {
        DroughtRecord {
            date,
            values: values.iter().copied().collect(),
        }
    }
}

/// Field names of the drought time-series service for one admin level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Attribute carrying the observation date (epoch ms or ISO text).
    pub date_field: String,
    /// Attribute used to select one boundary's rows in the `where` clause.
    pub id_field: String,
    /// Attribute name per category.
    pub categories: BTreeMap<DroughtCategory, String>,
}

impl FieldMapping {
    /// Default mapping for the given admin level.
    pub fn for_admin(admin: AdminLevel) -> Self {
        match admin {
            AdminLevel::County => FieldMapping {
                date_field: "ddate".to_string(),
                id_field: "admin_fips".to_string(),
                categories: Self::category_fields(["D0", "D1", "D2", "D3", "D4", "Nothing"]),
            },
            AdminLevel::State => FieldMapping {
                date_field: "ddate".to_string(),
                id_field: "state_abbr".to_string(),
                categories: Self::category_fields(["d0", "d1", "d2", "d3", "d4", "nothing"]),
            },
        }
    }

    fn category_fields(names: [&str; 6]) -> BTreeMap<DroughtCategory, String> {
        [
            DroughtCategory::D0,
            DroughtCategory::D1,
            DroughtCategory::D2,
            DroughtCategory::D3,
            DroughtCategory::D4,
            DroughtCategory::NoDrought,
        ]
        .into_iter()
        .zip(names)
        .map(|(category, name)| (category, name.to_string()))
        .collect()
    }

    /// Every attribute this mapping reads, for the query's `outFields`.
    pub fn out_fields(&self) -> Vec<String> {
        let mut fields = vec![self.date_field.clone()];
        fields.extend(self.categories.values().cloned());
        fields
    }

    /// Map one feature. Returns `None` only when the date is unusable.
    pub fn to_record(&self, feature: &Feature) -> Option<DroughtRecord> {
        let date = feature
            .attributes
            .get(&self.date_field)
            .and_then(date_value)?;
        let values = self
            .categories
            .iter()
            .filter_map(|(category, field)| feature.number(field).map(|v| (*category, v)))
            .collect();
        Some(DroughtRecord { date, values })
    }

    /// Map every feature of a response, skipping rows without a usable date.
    pub fn to_records(&self, set: &FeatureSet) -> Vec<DroughtRecord> {
        set.features
            .iter()
            .filter_map(|feature| {
                let record = self.to_record(feature);
                if record.is_none() {
                    warn!(
                        "Skipping feature without a usable '{}' attribute",
                        self.date_field
                    );
                }
                record
            })
            .collect()
    }
}

fn date_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::<Utc>::from_timestamp_millis),
        Value::String(s) => parse_timestamp(s).ok(),
        _ => None,
    }
}

/// Field names of the boundary service for one admin level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryFields {
    /// Value joined against [`FieldMapping::id_field`].
    pub id_field: String,
    /// Display name of the boundary.
    pub name_field: String,
}

impl BoundaryFields {
    pub fn for_admin(admin: AdminLevel) -> Self {
        match admin {
            AdminLevel::County => BoundaryFields {
                id_field: "FIPS".to_string(),
                name_field: "NAME".to_string(),
            },
            AdminLevel::State => BoundaryFields {
                id_field: "STATE_ABBR".to_string(),
                name_field: "STATE_NAME".to_string(),
            },
        }
    }

    /// Resolve `(id, name)` from the first boundary feature.
    pub fn resolve(&self, set: &FeatureSet) -> Option<Boundary> {
        let feature = set.features.first()?;
        Some(Boundary {
            id: feature.text(&self.id_field)?,
            name: feature
                .text(&self.name_field)
                .unwrap_or_else(|| "Unknown".to_string()),
        })
    }
}

/// A resolved administrative boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    pub id: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn feature(json: &str) -> Feature {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_county_mapping_reads_epoch_millis() {
        let mapping = FieldMapping::for_admin(AdminLevel::County);
        let record = mapping
            .to_record(&feature(
                r#"{"attributes":{"ddate":1672531200000,"D0":10,"D1":5,"D2":0,"Nothing":85}}"#,
            ))
            .unwrap();
        assert_eq!(record.date, Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(record.values.get(&DroughtCategory::D0), Some(&10.0));
        assert_eq!(record.values.get(&DroughtCategory::D2), Some(&0.0));
        assert_eq!(record.values.get(&DroughtCategory::D3), None);
        assert_eq!(record.values.get(&DroughtCategory::NoDrought), Some(&85.0));
    }

    #[test]
    fn test_state_mapping_reads_iso_dates() {
        let mapping = FieldMapping::for_admin(AdminLevel::State);
        let record = mapping
            .to_record(&feature(r#"{"attributes":{"ddate":"2023-01-08","d4":1.5}}"#))
            .unwrap();
        assert_eq!(record.date, Utc.with_ymd_and_hms(2023, 1, 8, 0, 0, 0).unwrap());
        assert_eq!(record.values.get(&DroughtCategory::D4), Some(&1.5));
    }

    #[test]
    fn test_feature_without_date_is_skipped() {
        let mapping = FieldMapping::for_admin(AdminLevel::County);
        let set = FeatureSet {
            features: vec![
                feature(r#"{"attributes":{"D0":1}}"#),
                feature(r#"{"attributes":{"ddate":1672531200000,"D0":2}}"#),
            ],
            error: None,
        };
        let records = mapping.to_records(&set);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].values.get(&DroughtCategory::D0), Some(&2.0));
    }

    #[test]
    fn test_out_fields_include_date_and_categories() {
        let fields = FieldMapping::for_admin(AdminLevel::County).out_fields();
        assert_eq!(fields[0], "ddate");
        assert_eq!(fields.len(), 7);
        assert!(fields.contains(&"Nothing".to_string()));
    }

    #[test]
    fn test_boundary_resolve() {
        let set = FeatureSet {
            features: vec![feature(r#"{"attributes":{"FIPS":"06019","NAME":"Fresno"}}"#)],
            error: None,
        };
        let boundary = BoundaryFields::for_admin(AdminLevel::County)
            .resolve(&set)
            .unwrap();
        assert_eq!(boundary.id, "06019");
        assert_eq!(boundary.name, "Fresno");
        assert!(BoundaryFields::for_admin(AdminLevel::County)
            .resolve(&FeatureSet::default())
            .is_none());
    }
}
