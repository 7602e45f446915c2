//! Stacked drought chart engine.
//!
//! Browser-free: the chart surface, the map view, the URL and the error
//! alert are traits implemented by the shell (`dm-chart-ui`) and by the
//! in-memory fakes used in tests.

pub mod config;
pub mod error;
pub mod interaction;
pub mod map_sync;
pub mod render;
pub mod scale;
pub mod session;
pub mod url_state;
pub mod zoom;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{AdminConfig, AppConfig, ChartConfig, DroughtLayerConfig, DROUGHT_LAYER_TITLE};
pub use error::DroughtError;
pub use interaction::{
    place_tooltip, InteractionController, PagePosition, SelectionLabel, SelectionState, Tooltip,
    TooltipRow,
};
pub use map_sync::{LayerInfo, LayerSpec, MapSyncAdapter, MapView, SharedSync, SyncOutcome};
pub use render::{
    AreaPath, BarRect, ChartHandle, ChartRenderer, ChartSurface, EventOutcome, Frame,
    LegendEntry, Marker, PointerEvent,
};
pub use scale::{
    BandPadding, BandScale, ChartMode, ColorScale, LinearScale, Margins, PlotArea, ScaleManager,
    Scales, Tick, TimeScale, Viewport, XScale,
};
pub use session::{
    build_series, ApplyOutcome, ChartSession, ErrorReporter, FetchGeneration, FetchToken,
    SurfaceFactory,
};
pub use url_state::{UrlState, UrlStore};
pub use zoom::{ViewTransform, ZoomController, ZoomGesture};
