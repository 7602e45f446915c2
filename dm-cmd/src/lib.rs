//! Command implementations for the drought monitor CLI.
//!
//! Provides subcommands for pulling one boundary's drought history out of
//! the feature services and for inspecting the map window of a date.

use clap::Subcommand;
use dm_core::admin::AdminLevel;

pub mod range;
pub mod series;

/// Configuration used when `--config` is not given.
pub const DEFAULT_CONFIG: &str = "drought-chart/config/app.json";

#[derive(Subcommand)]
pub enum Command {
    /// Resolve the boundary at a map point and write its stacked drought history as CSV
    Series {
        /// App configuration JSON with the service URLs
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: String,

        /// Administrative level: county or state
        #[arg(short, long, default_value = "county")]
        admin: AdminLevel,

        /// Web Mercator x of the point
        #[arg(short = 'x', long, allow_hyphen_values = true)]
        x: f64,

        /// Web Mercator y of the point
        #[arg(short = 'y', long, allow_hyphen_values = true)]
        y: f64,

        /// Output path for the CSV (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Print the map layer time window for a date
    Range {
        /// Epoch milliseconds, RFC 3339 or YYYY-MM-DD
        date: String,
    },
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Series {
            config,
            admin,
            x,
            y,
            output,
        } => series::run_series(&config, admin, x, y, output.as_deref()).await,
        Command::Range { date } => range::run_range(&date),
    }
}
