//! Shared CLI helpers used across multiple commands.

use std::path::Path;

use anyhow::Context;
use partita_config::EngineConfig;
use partita_core::{Graph, SchemaRegistry};
use partita_migrate::{Loaded, MigrationEngine, SampleResolver, load};
use std::sync::Arc;

/// The project schema registry.
pub fn schema() -> anyhow::Result<Arc<SchemaRegistry>> {
    partita_schema::registry().context("building project schema")
}

/// Settings from the user config file, or defaults.
pub fn settings() -> anyhow::Result<EngineConfig> {
    EngineConfig::load_or_default().context("reading settings")
}

/// Reads a file into memory.
pub fn read_bytes(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

/// Writes `bytes` to `path`.
pub fn write_bytes(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}

/// Decodes a project as stored, without migrating it.
pub fn decode_project(path: &Path) -> anyhow::Result<Graph> {
    let bytes = read_bytes(path)?;
    Graph::from_binary(&bytes, schema()?).with_context(|| format!("decoding {}", path.display()))
}

/// Decodes and migrates a project.
pub fn open_project(path: &Path, config: &EngineConfig, resolver: &dyn SampleResolver) -> anyhow::Result<Loaded> {
    let bytes = read_bytes(path)?;
    let engine = MigrationEngine::builtin().context("building migration set")?;
    load(&bytes, schema()?, &engine, resolver, config.load.options())
        .with_context(|| format!("loading {}", path.display()))
}

/// Writes a project back to disk.
pub fn save_project(path: &Path, graph: &Graph) -> anyhow::Result<()> {
    let bytes = graph.to_binary().context("encoding project")?;
    write_bytes(path, &bytes)
}

/// Human-readable byte count.
pub fn format_bytes(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
