//! qagraph CLI: QA dataset reshaping and graph annotation.
//!
//! Flattens nested QA datasets, tags them through external NLP services, and
//! attaches fused dependency/coreference graphs to each context.

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
