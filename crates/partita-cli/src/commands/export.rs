//! Save part of a project as a preset.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use partita_config::PresetStore;
use partita_core::{EntityId, export_subgraph};
use partita_migrate::NoMedia;
use partita_schema::keys::audio_unit;
use partita_schema::{BoxClass, project};
use tracing::info;

use super::common::{format_bytes, open_project, settings, write_bytes};

/// Save nodes and everything they depend on as a preset.
#[derive(Args)]
pub struct ExportArgs {
    /// Path to the project file
    pub file: PathBuf,

    /// Id of a node to export (repeatable)
    #[arg(short, long = "root", required = true)]
    pub roots: Vec<EntityId>,

    /// Preset name (defaults to the first node's name)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Write to this file instead of the presets directory
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Presets directory (defaults to the user presets directory)
    #[arg(long)]
    pub preset_dir: Option<PathBuf>,
}

/// Run the export command.
pub fn run(args: ExportArgs) -> anyhow::Result<()> {
    let config = settings()?;
    let loaded = open_project(&args.file, &config, &NoMedia)?;
    let graph = &loaded.graph;
    for &id in &args.roots {
        if !graph.contains(id) {
            anyhow::bail!("{}: no node {id}", args.file.display());
        }
    }

    let options = project::preset_options(config.export.dependency_options());
    let (table, bytes) = export_subgraph(graph, &args.roots, &options).context("exporting subgraph")?;

    let path = if let Some(out) = &args.out {
        write_bytes(out, &bytes)?;
        out.clone()
    } else {
        let name = args
            .name
            .clone()
            .unwrap_or_else(|| default_name(graph, args.roots[0]));
        let store = args.preset_dir.clone().map_or_else(PresetStore::user, PresetStore::new);
        store.save(&name, &bytes)?
    };
    info!("exported {} node(s) to {}", table.len(), path.display());
    println!(
        "Exported {} node(s), {} -> {}",
        table.len(),
        format_bytes(bytes.len()),
        path.display()
    );
    Ok(())
}

fn default_name(graph: &partita_core::Graph, id: EntityId) -> String {
    let named = match project::class_of(graph, id) {
        Some(BoxClass::AudioUnit) => project::text(graph, id, audio_unit::NAME),
        _ => None,
    };
    named
        .filter(|n| !n.is_empty())
        .map_or_else(|| id.to_string(), str::to_string)
}
