//! Drought Intensity Chart
//!
//! Click a location on the host page's map and the app resolves the county
//! (or state) under it, fetches its weekly US Drought Monitor statistics and
//! draws them as a stacked chart. Clicking a week on the chart points the
//! map's drought layer at that week; the date, admin level, clicked location
//! and map extent are kept in the URL so a reload restores the view.
//!
//! Data flow:
//! 1. `config/app.json` is embedded with `include_str!` and parsed into
//!    `AppConfig` on mount.
//! 2. A map click queries the boundary service, then the statistics service,
//!    through `dm_chart_ui::feature_client`.
//! 3. The response is stacked and handed to `ChartSession::apply`, which
//!    drops stale responses and replaces the chart.
//! 4. Chart clicks go through `MapSyncAdapter`, which swaps the map layer and
//!    writes the `date` URL parameter.

use dioxus::prelude::*;
use dm_chart::config::{AdminConfig, AppConfig};
use dm_chart::error::DroughtError;
use dm_chart::map_sync::{MapSyncAdapter, SharedSync};
use dm_chart::render::{ChartSurface, PointerEvent};
use dm_chart::session::{build_series, ApplyOutcome, ChartSession, ErrorReporter, SurfaceFactory};
use dm_chart::url_state::UrlState;
use dm_chart_ui::browser::{element_width, BrowserUrl, SignalReporter, SignalSurface, WebMapView};
use dm_chart_ui::components::{
    AdminSelector, ChartHeader, ChartTooltip, DroughtChart, ErrorDisplay, Legend, LoadingSpinner,
    SelectedDateLabel,
};
use dm_chart_ui::state::AppState;
use dm_chart_ui::{feature_client, js_bridge};
use dm_core::admin::{AdminLevel, MapPoint};
use dm_core::query::FeatureQuery;
use dm_core::record::Boundary;
use dm_data::stacking::StackedSeries;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// Services, field names and chart settings.
const CONFIG_JSON: &str = include_str!("../config/app.json");

/// Chart wrapper DOM element ID, measured for the chart width.
const CHART_ID: &str = "drought-chart";

/// Width used until the chart wrapper can be measured.
const DEFAULT_WIDTH: f64 = 800.0;

fn main() {
    dioxus_logger::init(dioxus_logger::tracing::Level::INFO).expect("failed to init logger");
    dioxus::LaunchBuilder::new()
        .with_cfg(dioxus::web::Config::new().rootname("drought-chart-root"))
        .launch(App);
}

/// Everything that outlives a single render.
struct Engine {
    config: AppConfig,
    sync: SharedSync,
    session: RefCell<ChartSession>,
    reporter: SignalReporter,
}

fn build_engine(config: AppConfig, state: AppState) -> Rc<Engine> {
    let sync = MapSyncAdapter::new(
        Box::new(WebMapView),
        Box::new(BrowserUrl),
        config.drought_layer.clone(),
    )
    .shared();
    let surfaces: SurfaceFactory = Box::new(move || {
        Box::new(SignalSurface::new(state.frame, state.listening)) as Box<dyn ChartSurface>
    });
    let reporter = SignalReporter::new(state.error_msg);
    let session = ChartSession::new(
        config.chart,
        element_width(CHART_ID).unwrap_or(DEFAULT_WIDTH),
        surfaces,
        Some(sync.clone()),
        Box::new(reporter),
    );
    Rc::new(Engine {
        config,
        sync,
        session: RefCell::new(session),
        reporter,
    })
}

/// Boundary under `point`, then its drought history.
async fn fetch_location(
    admin: &AdminConfig,
    point: MapPoint,
) -> Result<(Boundary, StackedSeries), DroughtError> {
    let boundaries = feature_client::query(
        &admin.boundary_url,
        &FeatureQuery::boundary_at(point, &admin.boundary_fields),
    )
    .await?;
    let boundary = admin
        .boundary_fields
        .resolve(&boundaries)
        .ok_or(DroughtError::BoundaryNotFound)?;
    log::info!("Loading drought history for {} ({})", boundary.name, boundary.id);

    let response = feature_client::query(
        &admin.series_url,
        &FeatureQuery::time_series(&boundary.id, &admin.fields),
    )
    .await;
    let series = build_series(response, &admin.fields, &boundary.name)?;
    Ok((boundary, series))
}

async fn load_location(engine: Rc<Engine>, mut state: AppState, point: MapPoint) {
    let admin = *state.admin.peek();
    let admin_config = engine.config.admin(admin).clone();
    let Ok(token) = engine.session.try_borrow_mut().map(|mut s| s.begin_fetch()) else {
        log::warn!("Chart session busy, ignoring map click");
        return;
    };
    state.loading.set(true);
    state.error_msg.set(None);
    UrlState::write_location(&BrowserUrl, &point);

    let (boundary, series) = match fetch_location(&admin_config, point).await {
        Ok((boundary, series)) => (Some(boundary), Ok(series)),
        Err(e) => (None, Err(e)),
    };

    let outcome = match engine.session.try_borrow_mut() {
        Ok(mut session) => {
            if let Some(width) = element_width(CHART_ID) {
                session.resize(width);
            }
            session.apply(token, series)
        }
        Err(_) => {
            log::warn!("Chart session busy, dropping response");
            return;
        }
    };
    match outcome {
        ApplyOutcome::Stale => return,
        ApplyOutcome::Rendered | ApplyOutcome::Empty => state.boundary.set(boundary),
        ApplyOutcome::Failed => {}
    }
    state.loading.set(false);
}

/// Restore URL state and subscribe to the map view. Runs once.
fn connect_map(engine: Rc<Engine>, mut state: AppState) {
    let restored = UrlState::read(&BrowserUrl);
    if let Some(admin) = restored.admin {
        state.admin.set(admin);
    }
    if let Some(extent) = restored.extent {
        if let Err(e) = engine.sync.borrow_mut().go_to(extent) {
            engine.reporter.report(&e);
        }
    }
    if let Some(date) = restored.date {
        engine.session.borrow_mut().restore_selection(date);
    }

    {
        let engine = engine.clone();
        js_bridge::when_view_ready(move || {
            let result = match engine.sync.try_borrow_mut() {
                Ok(mut sync) => sync.on_view_ready(),
                Err(_) => return,
            };
            match result {
                Ok(Some(outcome)) => log::info!("Applied deferred map date {:?}", outcome.range()),
                Ok(None) => {}
                Err(e) => engine.reporter.report(&e),
            }
        });
    }
    {
        let engine = engine.clone();
        js_bridge::on_map_click(move |point| {
            wasm_bindgen_futures::spawn_local(load_location(engine.clone(), state, point));
        });
    }
    js_bridge::on_stationary(|extent| UrlState::write_extent(&BrowserUrl, &extent));

    if let Some(point) = restored.location {
        wasm_bindgen_futures::spawn_local(load_location(engine.clone(), state, point));
    }

    let on_resize = Closure::<dyn FnMut()>::new(move || {
        if let (Some(width), Ok(mut session)) =
            (element_width(CHART_ID), engine.session.try_borrow_mut())
        {
            session.resize(width);
        }
    });
    if let Some(window) = web_sys::window() {
        let _ = window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref());
    }
    on_resize.forget();
}

#[component]
fn App() -> Element {
    let mut state = use_context_provider(AppState::new);
    let engine = use_hook(move || AppConfig::from_json(CONFIG_JSON).map(|c| build_engine(c, state)));

    {
        let engine = engine.clone();
        use_hook(move || {
            if let Ok(engine) = engine {
                connect_map(engine, state);
            }
        });
    }

    let engine = match engine {
        Ok(engine) => engine,
        Err(e) => {
            return rsx! {
                div {
                    style: "padding: 16px; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;",
                    ErrorDisplay { message: e.to_string() }
                }
            };
        }
    };

    let on_pointer = {
        let engine = engine.clone();
        move |event: PointerEvent| {
            if let Ok(mut session) = engine.session.try_borrow_mut() {
                session.handle(event);
            }
        }
    };

    let on_admin_change = {
        let engine = engine.clone();
        move |admin: AdminLevel| {
            if admin == *state.admin.peek() {
                return;
            }
            state.admin.set(admin);
            state.boundary.set(None);
            UrlState::write_admin(&BrowserUrl, admin);
            if let Ok(mut session) = engine.session.try_borrow_mut() {
                session.clear();
            }
            if let Some(point) = UrlState::read(&BrowserUrl).location {
                wasm_bindgen_futures::spawn_local(load_location(engine.clone(), state, point));
            }
        }
    };

    let subtitle = match (state.boundary)() {
        Some(boundary) => boundary.name,
        None => "Click the map to choose a county or state".to_string(),
    };

    rsx! {
        div {
            style: "padding: 16px; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;",

            ChartHeader {
                title: "Drought Intensity".to_string(),
                subtitle: subtitle,
            }

            AdminSelector { on_change: on_admin_change }

            if let Some(err) = (state.error_msg)() {
                ErrorDisplay {
                    message: err,
                    on_dismiss: move |_| state.error_msg.set(None),
                }
            }

            if (state.loading)() {
                LoadingSpinner {}
            }

            DroughtChart {
                id: CHART_ID.to_string(),
                on_pointer: on_pointer,
                min_height: engine.config.chart.height as u32,
            }

            SelectedDateLabel {}
            Legend {}
            ChartTooltip {}
        }
    }
}
