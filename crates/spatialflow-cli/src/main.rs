//! spatialflow CLI - inspect and exercise the signal-flow engine.

mod commands;
mod demos;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use spatialflow_config::EngineConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spatialflow")]
#[command(author, version, about = "spatialflow signal-flow engine CLI", long_about = None)]
struct Cli {
    /// Engine configuration file (TOML)
    #[arg(long, short, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List parameter kinds, protocols and demo graphs
    Info(commands::info::InfoArgs),

    /// Show the flattened structure of a demo graph
    Inspect(commands::inspect::InspectArgs),

    /// Run a demo graph on ramp input and verify the output
    Run(commands::run::RunArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.to_ascii_lowercase().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(
        period = config.context.period,
        sample_rate = config.context.sample_rate,
        alignment = config.memory.alignment_bytes,
        "engine config"
    );

    match cli.command {
        Commands::Info(args) => commands::info::run(args, &config),
        Commands::Inspect(args) => commands::inspect::run(args, &config),
        Commands::Run(args) => commands::run::run(args, &config),
    }
}
