//! docindex CLI: checks, formats, outlines and searches Documenter-style
//! `search_index.js` files, and keeps a local full-text database of them.

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
