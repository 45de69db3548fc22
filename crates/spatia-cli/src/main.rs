//! Spatia CLI - render and inspect spatial audio scenes.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spatia")]
#[command(author, version, about = "Spatia spatial audio CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a moving test source to a WAV file
    Render(commands::render::RenderArgs),

    /// List panning strategies and their channel counts
    Strategies,

    /// Parse and validate a scene file
    CheckConfig(commands::check_config::CheckConfigArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => commands::render::run(args),
        Commands::Strategies => commands::strategies::run(),
        Commands::CheckConfig(args) => commands::check_config::run(args),
    }
}
