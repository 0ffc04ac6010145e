//! Command-line entry point for the generative table execution core.

use clap::Parser;
use gentable::cli::{plan, serve, validate, Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let log_level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt().with_max_level(log_level).with_target(false).init();

    match cli.command {
        Commands::Validate { schema } => validate(&schema)?,
        Commands::Plan { schema, budget, to_generate, concurrent, multi_turn } => {
            plan(&schema, budget, to_generate, concurrent, multi_turn)?
        }
        Commands::Serve => serve().await?,
    }

    Ok(())
}
