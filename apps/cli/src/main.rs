//! sectorwise CLI — staleness-aware topic retrieval and ranked search.
//!
//! Answers topic questions per subject sector from locally stored
//! knowledge, refreshed from upstream sources when stale and enriched
//! with academic resources.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
