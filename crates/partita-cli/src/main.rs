//! Partita CLI - create, inspect and migrate partita project files.

mod commands;
mod media;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "partita")]
#[command(author, version, about = "Partita project file tool", long_about = None)]
struct Cli {
    /// Log debug events (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty project
    New(commands::new::NewArgs),

    /// Summarize a project file
    Info(commands::info::InfoArgs),

    /// Check a project's pointer integrity and schema version
    Verify(commands::verify::VerifyArgs),

    /// Upgrade a project to the current schema
    Migrate(commands::migrate::MigrateArgs),

    /// Save part of a project as a preset
    Export(commands::export::ExportArgs),

    /// Insert a preset into a project
    Import(commands::import::ImportArgs),

    /// List, delete and locate presets
    Presets(commands::presets::PresetsArgs),

    /// Show or create the settings file
    Config(commands::config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::New(args) => commands::new::run(args),
        Commands::Info(args) => commands::info::run(args),
        Commands::Verify(args) => commands::verify::run(args),
        Commands::Migrate(args) => commands::migrate::run(args),
        Commands::Export(args) => commands::export::run(args),
        Commands::Import(args) => commands::import::run(args),
        Commands::Presets(args) => commands::presets::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
