use anyhow::Result;
use clap::Parser;

use geoextract::cli::{Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            input,
            locations,
            config,
            pretty,
        } => geoextract::cli::extract::run(
            input.as_deref(),
            &locations,
            config.as_deref(),
            pretty,
        ),
        Commands::Names {
            locations,
            config,
            field,
        } => geoextract::cli::names::run(&locations, config.as_deref(), &field),
    }
}
