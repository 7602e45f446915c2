//! Drought monitor CLI - query county/state drought statistics from the command line.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "dm-cli",
    version,
    about = "County and state drought intensity toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: dm_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    dm_cmd::run(cli.command).await
}
