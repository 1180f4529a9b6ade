//! Summarize a project file.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;
use partita_core::{Address, Graph};
use partita_schema::keys::{audio_file, audio_unit, device, instrument, root};
use partita_schema::{BoxClass, SCHEMA_VERSION, project};
use serde::Serialize;

use super::common::{decode_project, format_bytes};

/// Summarize a project file.
#[derive(Args)]
pub struct InfoArgs {
    /// Path to the project file
    pub file: PathBuf,

    /// Print machine-readable JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct ProjectInfo {
    file: String,
    size: u64,
    name: Option<String>,
    schema_version: u32,
    current_schema_version: u32,
    nodes: usize,
    classes: BTreeMap<&'static str, usize>,
    tempo: Option<f32>,
    units: Vec<UnitInfo>,
    files: Vec<FileInfo>,
}

#[derive(Serialize)]
struct UnitInfo {
    id: String,
    name: String,
    tracks: usize,
    instrument: Option<String>,
    effects: Vec<String>,
}

#[derive(Serialize)]
struct FileInfo {
    id: String,
    path: String,
    duration: f32,
}

/// Run the info command.
pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let graph = decode_project(&args.file)?;
    let size = std::fs::metadata(&args.file)?.len();
    let info = collect(&graph, args.file.display().to_string(), size);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("File:        {} ({})", info.file, format_bytes(info.size as usize));
    if let Some(name) = &info.name {
        println!("Name:        {name}");
    }
    let status = if info.schema_version < info.current_schema_version {
        " (needs migration)"
    } else {
        ""
    };
    println!("Schema:      v{}{status}", info.schema_version);
    if let Some(tempo) = info.tempo {
        println!("Tempo:       {tempo} BPM");
    }
    println!("Nodes:       {}", info.nodes);
    for (class, count) in &info.classes {
        println!("  {class:12} {count}");
    }
    if !info.units.is_empty() {
        println!();
        println!("Audio units:");
        for unit in &info.units {
            let source = unit.instrument.as_deref().unwrap_or("-");
            println!(
                "  {:20} tracks: {}  instrument: {}  effects: [{}]",
                unit.name,
                unit.tracks,
                source,
                unit.effects.join(", ")
            );
        }
    }
    if !info.files.is_empty() {
        println!();
        println!("Audio files:");
        for file in &info.files {
            let length = if file.duration > 0.0 {
                format!("{:.3}s", file.duration)
            } else {
                "unknown".to_string()
            };
            println!("  {}  {length}", file.path);
        }
    }
    Ok(())
}

fn collect(graph: &Graph, file: String, size: u64) -> ProjectInfo {
    let mut classes = BTreeMap::new();
    for node in graph.nodes() {
        let name = BoxClass::from_id(node.class()).map_or("unknown", BoxClass::name);
        *classes.entry(name).or_insert(0) += 1;
    }

    let root_id = project::find_root(graph);
    let units = root_id
        .map(|r| project::audio_units(graph, r))
        .unwrap_or_default()
        .into_iter()
        .map(|unit| UnitInfo {
            id: unit.to_string(),
            name: project::text(graph, unit, audio_unit::NAME).unwrap_or_default().to_string(),
            tracks: project::tracks(graph, unit).len(),
            instrument: project::instrument(graph, unit)
                .and_then(|i| project::text(graph, i, instrument::KIND))
                .map(str::to_string),
            effects: project::devices(graph, unit)
                .into_iter()
                .filter_map(|d| project::text(graph, d, device::KIND).map(str::to_string))
                .collect(),
        })
        .collect();

    let files = graph
        .nodes_of_class(BoxClass::AudioFile.id())
        .map(|node| FileInfo {
            id: node.id().to_string(),
            path: project::text(graph, node.id(), audio_file::PATH).unwrap_or_default().to_string(),
            duration: graph
                .value(&Address::compose(node.id()).append(audio_file::DURATION))
                .and_then(|v| v.as_f32())
                .unwrap_or(0.0),
        })
        .collect();

    ProjectInfo {
        file,
        size,
        name: root_id
            .and_then(|r| project::text(graph, r, root::NAME))
            .filter(|n| !n.is_empty())
            .map(str::to_string),
        schema_version: graph.schema_version(),
        current_schema_version: SCHEMA_VERSION,
        nodes: graph.len(),
        classes,
        tempo: root_id
            .and_then(|r| graph.value(&Address::compose(r).append(root::TEMPO)))
            .and_then(|v| v.as_f32()),
        units,
        files,
    }
}
