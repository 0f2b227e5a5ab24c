//! mdpack CLI — bundle a folder of Markdown and images into one JSON manifest.
//!
//! Images can be embedded as base64 or replaced by descriptions from a
//! captioning service.

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
