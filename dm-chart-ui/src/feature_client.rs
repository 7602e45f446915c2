//! Feature-service queries from the browser via `fetch`.

use dm_core::feature::FeatureSet;
use dm_core::query::{query_endpoint, FeatureQuery, QueryError};
use log::debug;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

fn js_error(err: JsValue) -> QueryError {
    QueryError::Http(format!("{:?}", err))
}

/// Full GET URL for `query` against the layer at `layer_url`.
pub fn query_url(layer_url: &str, query: &FeatureQuery) -> String {
    let params: Vec<String> = query
        .to_params()
        .into_iter()
        .map(|(key, value)| {
            let encoded = String::from(js_sys::encode_uri_component(&value));
            format!("{}={}", key, encoded)
        })
        .collect();
    format!("{}?{}", query_endpoint(layer_url), params.join("&"))
}

/// Run one query; service-reported errors come back as `Err`.
pub async fn query(layer_url: &str, query: &FeatureQuery) -> Result<FeatureSet, QueryError> {
    let url = query_url(layer_url, query);
    debug!("GET {}", url);

    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::Cors);
    let request = Request::new_with_str_and_init(&url, &opts).map_err(js_error)?;

    let window = web_sys::window().ok_or_else(|| QueryError::Http("no window".to_string()))?;
    let response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(js_error)?;
    let response: Response = response.dyn_into().map_err(js_error)?;
    if !response.ok() {
        return Err(QueryError::Status(response.status()));
    }

    let body = JsFuture::from(response.text().map_err(js_error)?)
        .await
        .map_err(js_error)?
        .as_string()
        .ok_or_else(|| QueryError::Decode("response body is not text".to_string()))?;
    FeatureSet::from_json(&body)?.into_result()
}
