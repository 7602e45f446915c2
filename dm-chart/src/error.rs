use dm_core::query::QueryError;

/// Errors surfaced by the chart engine to the hosting shell.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DroughtError {
    #[error("Drought data query failed: {0}")]
    Query(#[from] QueryError),
    #[error("No county or state found at this location")]
    BoundaryNotFound,
    #[error("No drought data available for {0}")]
    NoData(String),
    #[error("Map view is not ready")]
    MapNotReady,
    #[error("Map update failed: {0}")]
    Map(String),
    #[error("Chart rendering failed: {0}")]
    Render(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
}
