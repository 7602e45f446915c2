//! Feature-service query parameters and the native HTTP client.

use crate::admin::MapPoint;
use crate::feature::FeatureSet;
use crate::record::{BoundaryFields, FieldMapping};
use serde_json::json;
#[cfg(feature = "api")]
use log::{debug, warn};
#[cfg(feature = "api")]
use reqwest::Client;
#[cfg(feature = "api")]
use std::time::Duration;

/// Errors raised while querying the feature service.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error("Request failed: {0}")]
    Http(String),
    #[error("Service responded with HTTP {0}")]
    Status(u16),
    #[error("Service error {code}: {message}")]
    Service { code: i64, message: String },
    #[error("Could not decode response: {0}")]
    Decode(String),
}

/// Parameters of one feature-service `query` call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureQuery {
    pub return_geometry: bool,
    pub out_fields: Vec<String>,
    pub where_clause: String,
    pub order_by_fields: Vec<String>,
    pub geometry: Option<MapPoint>,
}

impl FeatureQuery {
    /// Boundary lookup: which county/state polygon contains `point`.
    pub fn boundary_at(point: MapPoint, fields: &BoundaryFields) -> Self {
        FeatureQuery {
            return_geometry: true,
            out_fields: vec![fields.id_field.clone(), fields.name_field.clone()],
            where_clause: "1=1".to_string(),
            order_by_fields: Vec::new(),
            geometry: Some(point),
        }
    }

    /// Drought time series for one boundary, oldest first.
    pub fn time_series(boundary_id: &str, mapping: &FieldMapping) -> Self {
        FeatureQuery {
            return_geometry: false,
            out_fields: mapping.out_fields(),
            where_clause: format!(
                "{} = '{}'",
                mapping.id_field,
                boundary_id.replace('\'', "''")
            ),
            order_by_fields: vec![format!("{} ASC", mapping.date_field)],
            geometry: None,
        }
    }

    /// REST parameters, ready to be URL-encoded by the caller's HTTP stack.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("f", "json".to_string()),
            ("returnGeometry", self.return_geometry.to_string()),
            ("outFields", self.out_fields.join(",")),
            ("where", self.where_clause.clone()),
        ];
        if !self.order_by_fields.is_empty() {
            params.push(("orderByFields", self.order_by_fields.join(",")));
        }
        if let Some(point) = self.geometry {
            let geometry = json!({
                "x": point.x,
                "y": point.y,
                "spatialReference": { "wkid": point.wkid },
            });
            params.push(("geometry", geometry.to_string()));
            params.push(("geometryType", "esriGeometryPoint".to_string()));
            params.push(("spatialRel", "esriSpatialRelIntersects".to_string()));
            params.push(("inSR", point.wkid.to_string()));
        }
        params
    }
}

/// `{layer_url}/query`, tolerating a trailing slash on the layer URL.
pub fn query_endpoint(layer_url: &str) -> String {
    format!("{}/query", layer_url.trim_end_matches('/'))
}

/// Native feature-service client used by the CLI.
#[cfg(feature = "api")]
#[derive(Clone)]
pub struct FeatureClient {
    client: Client,
}

#[cfg(feature = "api")]
impl FeatureClient {
    pub fn new() -> Result<Self, QueryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| QueryError::Http(e.to_string()))?;
        Ok(FeatureClient { client })
    }

    /// Run `query` against a layer URL.
    pub async fn query(&self, layer_url: &str, query: &FeatureQuery) -> Result<FeatureSet, QueryError> {
        let endpoint = query_endpoint(layer_url);
        debug!("Querying {} where {}", endpoint, query.where_clause);
        let response = self
            .client
            .get(&endpoint)
            .query(&query.to_params())
            .send()
            .await
            .map_err(|e| QueryError::Http(e.to_string()))?;
        if !response.status().is_success() {
            warn!("Bad response from {}: {}", endpoint, response.status());
            return Err(QueryError::Status(response.status().as_u16()));
        }
        let body = response
            .text()
            .await
            .map_err(|e| QueryError::Http(e.to_string()))?;
        FeatureSet::from_json(&body)?.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::AdminLevel;

    fn param<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_time_series_query() {
        let mapping = FieldMapping::for_admin(AdminLevel::County);
        let params = FeatureQuery::time_series("06019", &mapping).to_params();
        assert_eq!(param(&params, "where"), Some("admin_fips = '06019'"));
        assert_eq!(param(&params, "orderByFields"), Some("ddate ASC"));
        assert_eq!(param(&params, "returnGeometry"), Some("false"));
        assert_eq!(param(&params, "f"), Some("json"));
        assert_eq!(param(&params, "geometry"), None);
    }

    #[test]
    fn test_where_clause_escapes_quotes() {
        let mapping = FieldMapping::for_admin(AdminLevel::State);
        let query = FeatureQuery::time_series("O'Brien", &mapping);
        assert_eq!(query.where_clause, "state_abbr = 'O''Brien'");
    }

    #[test]
    fn test_boundary_query_has_point_geometry() {
        let point = MapPoint {
            x: -13_358_338.9,
            y: 4_439_106.8,
            wkid: 3857,
        };
        let fields = BoundaryFields::for_admin(AdminLevel::County);
        let params = FeatureQuery::boundary_at(point, &fields).to_params();
        let geometry: serde_json::Value =
            serde_json::from_str(param(&params, "geometry").unwrap()).unwrap();
        assert_eq!(geometry["spatialReference"]["wkid"], 3857);
        assert_eq!(param(&params, "outFields"), Some("FIPS,NAME"));
        assert_eq!(param(&params, "geometryType"), Some("esriGeometryPoint"));
        assert_eq!(param(&params, "orderByFields"), None);
    }

    #[test]
    fn test_query_endpoint() {
        assert_eq!(
            query_endpoint("https://services.example.com/FeatureServer/0/"),
            "https://services.example.com/FeatureServer/0/query"
        );
    }
}
