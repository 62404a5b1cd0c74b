//! copydesk CLI: product copy from a catalog export.
//!
//! Looks up a product code in the latest catalog CSV and writes a templated
//! HTML description, spec table, meta description and title.

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
