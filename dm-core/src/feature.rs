//! Wire types for feature-service query responses.
//!
//! The service answers `{ "features": [{ "attributes": {...}, "geometry": {...} }] }`,
//! or `{ "error": { "code": .., "message": .. } }` with a 200 status when the
//! query itself is rejected.

use crate::query::QueryError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of a query response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Value>,
}

impl Feature {
    /// Numeric attribute, `None` when missing, `null` or not a number.
    ///
    /// Numeric strings are accepted since some services emit percentages as text.
    pub fn number(&self, field: &str) -> Option<f64> {
        match self.attributes.get(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|v| v.is_finite())
    }

    /// String attribute; numbers are rendered so that numeric ids still work.
    pub fn text(&self, field: &str) -> Option<String> {
        match self.attributes.get(field)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Error object the service returns in place of features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// A full query response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ServiceError>,
}

impl FeatureSet {
    /// Parse a response body.
    pub fn from_json(body: &str) -> Result<Self, QueryError> {
        serde_json::from_str(body).map_err(|e| QueryError::Decode(e.to_string()))
    }

    /// Turn an embedded service error into `Err`.
    pub fn into_result(self) -> Result<Self, QueryError> {
        match self.error {
            Some(err) => Err(QueryError::Service {
                code: err.code,
                message: err.message,
            }),
            None => Ok(self),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_features() {
        let body = r#"{"features":[{"attributes":{"D0":12.5,"D1":null,"NAME":"Fresno","FIPS":6019}}]}"#;
        let set = FeatureSet::from_json(body).unwrap().into_result().unwrap();
        assert_eq!(set.features.len(), 1);
        let feature = &set.features[0];
        assert_eq!(feature.number("D0"), Some(12.5));
        assert_eq!(feature.number("D1"), None);
        assert_eq!(feature.number("D2"), None);
        assert_eq!(feature.text("NAME").as_deref(), Some("Fresno"));
        assert_eq!(feature.text("FIPS").as_deref(), Some("6019"));
    }

    #[test]
    fn test_service_error_becomes_err() {
        let body = r#"{"error":{"code":400,"message":"Invalid query"}}"#;
        let err = FeatureSet::from_json(body).unwrap().into_result().unwrap_err();
        assert_eq!(
            err,
            QueryError::Service {
                code: 400,
                message: "Invalid query".to_string()
            }
        );
    }

    #[test]
    fn test_numeric_text_is_accepted() {
        let body = r#"{"features":[{"attributes":{"D3":"4.25","D4":"n/a"}}]}"#;
        let set = FeatureSet::from_json(body).unwrap();
        assert_eq!(set.features[0].number("D3"), Some(4.25));
        assert_eq!(set.features[0].number("D4"), None);
    }

    #[test]
    fn test_garbage_body_is_decode_error() {
        assert!(matches!(
            FeatureSet::from_json("<html>"),
            Err(QueryError::Decode(_))
        ));
    }
}
