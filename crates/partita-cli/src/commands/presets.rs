//! Preset management commands.
//!
//! Lists, deletes and locates exported subgraph presets.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use partita_config::{PresetStore, config_file_path, user_config_dir};
use partita_core::read_header;

/// Manage stored presets.
#[derive(Args)]
pub struct PresetsArgs {
    /// Presets directory (defaults to the user presets directory)
    #[arg(long, global = true)]
    pub preset_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: PresetsCommand,
}

#[derive(Subcommand)]
enum PresetsCommand {
    /// List stored presets
    List,

    /// Delete a preset
    Delete {
        /// Preset name
        name: String,
    },

    /// Show settings and preset directories
    Paths,
}

/// Run the presets command.
pub fn run(args: PresetsArgs) -> anyhow::Result<()> {
    let store = args.preset_dir.map_or_else(PresetStore::user, PresetStore::new);
    match args.command {
        PresetsCommand::List => list(&store),
        PresetsCommand::Delete { name } => {
            store.remove(&name)?;
            println!("Deleted preset '{name}'.");
            Ok(())
        }
        PresetsCommand::Paths => {
            println!("Config dir:   {}", user_config_dir().display());
            println!("Settings:     {}", config_file_path().display());
            println!("Presets:      {}", store.dir().display());
            Ok(())
        }
    }
}

fn list(store: &PresetStore) -> anyhow::Result<()> {
    println!("Presets in {}:", store.dir().display());
    let names = store.names();
    if names.is_empty() {
        println!("  (none)");
        println!();
        println!("  Create one with: partita export <project> --root <id> --name <name>");
        return Ok(());
    }
    for name in names {
        match store.load(&name).ok().and_then(|bytes| read_header(&bytes).ok()) {
            Some(header) => println!(
                "  {name:20} v{}  {} node(s)",
                header.schema_version, header.node_count
            ),
            None => println!("  {name:20} (unreadable)"),
        }
    }
    Ok(())
}
