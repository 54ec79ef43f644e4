//! readmegen CLI — README generation from repository facts and LLM output.
//!
//! Ingests a repository, dispatches batched prompts to the configured
//! model backend, and assembles the responses into a README file.

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
