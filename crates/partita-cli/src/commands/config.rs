//! Show or create the settings file.

use clap::Args;
use partita_config::{EngineConfig, config_file_path, user_presets_dir};

/// Show the effective settings.
#[derive(Args)]
pub struct ConfigArgs {
    /// Write a settings file with default values
    #[arg(long)]
    pub init: bool,

    /// Overwrite an existing settings file with --init
    #[arg(long)]
    pub force: bool,
}

/// Run the config command.
pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    let path = config_file_path();

    if args.init {
        if path.exists() && !args.force {
            anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
        }
        EngineConfig::default().save(&path)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let config = EngineConfig::load_or_default_from(&path)?;
    let source = if path.is_file() { "" } else { " (not found, using defaults)" };
    println!("# Settings: {}{source}", path.display());
    println!("# Presets:  {}", user_presets_dir().display());
    println!();
    print!("{}", config.to_toml()?);
    Ok(())
}
