//! ArticleSync CLI — offline driver for the article sync pipeline.
//!
//! Runs a batch file through the same pipeline the server uses, and hosts
//! config management.

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
