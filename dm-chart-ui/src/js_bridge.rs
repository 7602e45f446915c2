//! Typed wrappers around the map view via `js_sys::eval()`.
//!
//! The host page owns the ArcGIS map widget and exposes it as
//! `window.droughtMap`:
//! - `view`: the `MapView`
//! - `createLayer(spec)`: builds the time-filtered drought layer from a
//!   serialized [`LayerSpec`] (camelCase, epoch-millisecond time extent)
//!
//! Rust callbacks are stashed on `window.__droughtCallbacks` so the evaluated
//! snippets can reach them, and live for the rest of the page.

use dm_chart::map_sync::{LayerInfo, LayerSpec};
use dm_core::admin::{Extent, MapPoint};
use js_sys::Reflect;
use log::warn;
use serde_json::json;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

const CALLBACKS: &str = "__droughtCallbacks";

/// Execute arbitrary JS, wrapping in try/catch to avoid panics.
pub fn call_js(code: &str) {
    let wrapped = format!(
        "try {{ {} }} catch(e) {{ console.warn('Drought map call failed:', e); }}",
        code
    );
    let _ = js_sys::eval(&wrapped);
}

fn describe(err: JsValue) -> String {
    if let Some(e) = err.dyn_ref::<js_sys::Error>() {
        return String::from(e.message());
    }
    err.as_string()
        .unwrap_or_else(|| "unknown JavaScript error".to_string())
}

/// Run `body` as a function body; a thrown error becomes `Err`.
fn eval_fn(body: &str) -> Result<JsValue, String> {
    js_sys::eval(&format!("(function() {{ {} }})()", body)).map_err(describe)
}

fn view_expr() -> &'static str {
    "var m = window.droughtMap; if (!m || !m.view) { throw new Error('map view is not available'); } var view = m.view;"
}

pub fn view_ready() -> bool {
    eval_fn("var m = window.droughtMap; return !!(m && m.view && m.view.ready);")
        .ok()
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

/// Id and title of every layer in the map.
pub fn map_layers() -> Result<Vec<LayerInfo>, String> {
    let body = format!(
        "{} return JSON.stringify(view.map.layers.toArray().map(function(l) {{ return {{ id: l.id, title: l.title || '' }}; }}));",
        view_expr()
    );
    let raw = eval_fn(&body)?
        .as_string()
        .ok_or_else(|| "layer list is not a string".to_string())?;
    serde_json::from_str(&raw).map_err(|e| e.to_string())
}

pub fn remove_layers(ids: &[String]) -> Result<(), String> {
    let ids = serde_json::to_string(ids).map_err(|e| e.to_string())?;
    let body = format!(
        "{} var ids = {}; view.map.removeMany(view.map.layers.filter(function(l) {{ return ids.indexOf(l.id) >= 0; }}).toArray());",
        view_expr(),
        ids
    );
    eval_fn(&body).map(|_| ())
}

pub fn add_layer(spec: &LayerSpec, index: usize) -> Result<(), String> {
    let spec = serde_json::to_string(spec).map_err(|e| e.to_string())?;
    let body = format!(
        "{} view.map.add(m.createLayer({}), {});",
        view_expr(),
        spec,
        index
    );
    eval_fn(&body).map(|_| ())
}

pub fn go_to(extent: &Extent) -> Result<(), String> {
    let target = json!({
        "type": "extent",
        "xmin": extent.xmin,
        "ymin": extent.ymin,
        "xmax": extent.xmax,
        "ymax": extent.ymax,
        "spatialReference": { "wkid": dm_core::admin::WEB_MERCATOR_WKID },
    });
    let body = format!(
        "{} view.goTo({}).catch(function(e) {{ console.warn('goTo failed:', e); }});",
        view_expr(),
        target
    );
    eval_fn(&body).map(|_| ())
}

/// Current view extent, `None` before the view exists.
pub fn view_extent() -> Option<Extent> {
    let raw = eval_fn(
        "var m = window.droughtMap; var e = m && m.view && m.view.extent; return e ? JSON.stringify({ xmin: e.xmin, ymin: e.ymin, xmax: e.xmax, ymax: e.ymax }) : null;",
    )
    .ok()?
    .as_string()?;
    serde_json::from_str(&raw).ok()
}

fn stash_callback(name: &str, callback: &JsValue) -> Result<(), String> {
    let window = web_sys::window().ok_or_else(|| "no window".to_string())?;
    let key = JsValue::from_str(CALLBACKS);
    let mut store = Reflect::get(window.as_ref(), &key).map_err(describe)?;
    if store.is_undefined() {
        store = js_sys::Object::new().into();
        Reflect::set(window.as_ref(), &key, &store).map_err(describe)?;
    }
    Reflect::set(&store, &JsValue::from_str(name), callback).map_err(describe)?;
    Ok(())
}

/// Poll until the view exists, then run `body` with `view` and `cb` bound.
fn with_view(callback: &str, body: &str) {
    call_js(&format!(
        r#"
        (function() {{
            var poll = setInterval(function() {{
                var m = window.droughtMap;
                if (m && m.view) {{
                    clearInterval(poll);
                    var view = m.view;
                    var cb = window.{CALLBACKS}['{callback}'];
                    {body}
                }}
            }}, 100);
        }})();
        "#,
    ));
}

/// Call `handler` once, when the view has loaded.
pub fn when_view_ready<F: FnMut() + 'static>(handler: F) {
    let closure = Closure::<dyn FnMut()>::new(handler);
    if let Err(e) = stash_callback("ready", closure.as_ref()) {
        warn!("Could not register view-ready callback: {}", e);
        return;
    }
    with_view("ready", "view.when(function() { cb(); });");
    closure.forget();
}

/// Call `handler` with the map point of every click on the map.
pub fn on_map_click<F: FnMut(MapPoint) + 'static>(mut handler: F) {
    let closure = Closure::<dyn FnMut(JsValue)>::new(move |raw: JsValue| {
        match raw.as_string().map(|s| serde_json::from_str::<MapPoint>(&s)) {
            Some(Ok(point)) => handler(point),
            _ => warn!("Ignoring map click without a usable map point"),
        }
    });
    if let Err(e) = stash_callback("click", closure.as_ref()) {
        warn!("Could not register map click callback: {}", e);
        return;
    }
    with_view(
        "click",
        "view.on('click', function(e) { var p = e.mapPoint; if (!p) { return; } cb(JSON.stringify({ x: p.x, y: p.y, wkid: (p.spatialReference && p.spatialReference.wkid) || 3857 })); });",
    );
    closure.forget();
}

/// Call `handler` with the view extent whenever the view comes to rest.
pub fn on_stationary<F: FnMut(Extent) + 'static>(mut handler: F) {
    let closure = Closure::<dyn FnMut()>::new(move || {
        if let Some(extent) = view_extent() {
            handler(extent);
        }
    });
    if let Err(e) = stash_callback("stationary", closure.as_ref()) {
        warn!("Could not register stationary callback: {}", e);
        return;
    }
    with_view(
        "stationary",
        "view.watch('stationary', function(still) { if (still) { cb(); } });",
    );
    closure.forget();
}
