//! Fetch one boundary's drought history and write it as CSV.

use anyhow::Context;
use dm_chart::config::{AdminConfig, AppConfig};
use dm_chart::session::build_series;
use dm_core::admin::{AdminLevel, MapPoint};
use dm_core::category::STACK_ORDER;
use dm_core::query::{FeatureClient, FeatureQuery};
use dm_core::record::Boundary;
use dm_data::stacking::StackedSeries;
use dm_utils::dates::format_date;
use log::info;
use std::io::Write;

/// Load and validate the app configuration at `path`.
pub fn load_config(path: &str) -> anyhow::Result<AppConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path))?;
    Ok(AppConfig::from_json(&json)?)
}

/// Resolve the boundary under `point` and fetch its stacked history.
pub async fn fetch_series(
    client: &FeatureClient,
    admin: &AdminConfig,
    point: MapPoint,
) -> anyhow::Result<(Boundary, StackedSeries)> {
    let boundaries = client
        .query(
            &admin.boundary_url,
            &FeatureQuery::boundary_at(point, &admin.boundary_fields),
        )
        .await?;
    let boundary = admin
        .boundary_fields
        .resolve(&boundaries)
        .ok_or(dm_chart::error::DroughtError::BoundaryNotFound)?;
    info!("Found {} ({})", boundary.name, boundary.id);

    let response = client
        .query(
            &admin.series_url,
            &FeatureQuery::time_series(&boundary.id, &admin.fields),
        )
        .await;
    let series = build_series(response, &admin.fields, &boundary.name)?;
    Ok((boundary, series))
}

/// Write `series` with a header row.
///
/// Columns are the date, each stacked category's reported value (empty when
/// the source had none) and the D1-D4 total.
pub fn write_series<W: Write>(series: &StackedSeries, writer: W) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["date".to_string()];
    header.extend(STACK_ORDER.iter().map(|c| c.key().to_string()));
    header.push("in_drought".to_string());
    wtr.write_record(&header)?;

    for point in series.points() {
        let mut row = vec![format_date(&point.date())];
        row.extend(STACK_ORDER.iter().map(|c| {
            point
                .point
                .raw(*c)
                .map(|v| v.to_string())
                .unwrap_or_default()
        }));
        row.push(point.point.in_drought().to_string());
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub async fn run_series(
    config_path: &str,
    admin: AdminLevel,
    x: f64,
    y: f64,
    output: Option<&str>,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let client = FeatureClient::new()?;
    let point = MapPoint::web_mercator(x, y);

    info!("Querying {} drought history at ({}, {})", admin, x, y);
    let (boundary, series) = fetch_series(&client, config.admin(admin), point).await?;

    match output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path))?;
            write_series(&series, file)?;
            info!(
                "Wrote {} weeks for {} to {}",
                series.len(),
                boundary.name,
                path
            );
        }
        None => write_series(&series, std::io::stdout().lock())?,
    }
    Ok(())
}
