//! Insert a preset into a project.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use partita_config::PresetStore;
use partita_core::{Address, EntityId, import_package, read_subgraph};
use partita_migrate::NoMedia;
use partita_schema::keys::audio_unit;
use partita_schema::{BoxClass, project};
use tracing::info;

use super::common::{open_project, read_bytes, save_project, settings};

/// Insert a preset into a project.
#[derive(Args)]
pub struct ImportArgs {
    /// Path to the project file
    pub file: PathBuf,

    /// Preset name or path to a preset file
    pub preset: String,

    /// Write the result here instead of overwriting the input
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Presets directory (defaults to the user presets directory)
    #[arg(long)]
    pub preset_dir: Option<PathBuf>,
}

/// Run the import command.
pub fn run(args: ImportArgs) -> anyhow::Result<()> {
    let bytes = if Path::new(&args.preset).is_file() {
        read_bytes(Path::new(&args.preset))?
    } else {
        let store = args.preset_dir.clone().map_or_else(PresetStore::user, PresetStore::new);
        store.load(&args.preset)?
    };

    let config = settings()?;
    let mut graph = open_project(&args.file, &config, &NoMedia)?.graph;
    let root = project::find_root(&graph).context("project has no root")?;
    let package = read_subgraph(&graph, &bytes).with_context(|| format!("reading preset {}", args.preset))?;

    // The exported root never travels with a preset; bind it to ours.
    let bindings: BTreeMap<EntityId, EntityId> = package
        .boundary
        .iter()
        .filter(|(_, class)| *class == BoxClass::Root.id())
        .map(|&(id, _)| (id, root))
        .collect();

    let (imported, _) = graph
        .transaction(|g| {
            let table = import_package(g, package, &bindings)?;
            let new_units: Vec<EntityId> = table
                .iter()
                .map(|(_, new)| new)
                .filter(|&id| project::class_of(g, id) == Some(BoxClass::AudioUnit))
                .collect();
            let existing = project::audio_units(g, root).len().saturating_sub(new_units.len());
            for (offset, unit) in new_units.into_iter().enumerate() {
                let index = (existing + offset) as i32;
                g.set_value(&Address::compose(unit).append(audio_unit::INDEX), index)?;
            }
            Ok(table.len())
        })
        .with_context(|| format!("importing {}", args.preset))?;

    let out = args.out.unwrap_or_else(|| args.file.clone());
    save_project(&out, &graph)?;
    info!("imported {imported} node(s) into {}", out.display());
    println!("Imported {imported} node(s) from {} -> {}", args.preset, out.display());
    Ok(())
}
