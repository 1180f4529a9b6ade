//! Decode and migrate in one step.

use std::sync::Arc;

use partita_core::{EditController, Graph, SchemaRegistry};
use tracing::info;

use crate::engine::{MigrationEngine, MigrationReport};
use crate::error::LoadError;
use crate::migration::SampleResolver;

/// How [`load`] treats migration failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Fail the load if any migration step fails. When `false` the graph is
    /// returned at its stored version and the report lists the failures.
    pub strict_migrations: bool,
}

/// A decoded, migrated project.
#[derive(Debug)]
pub struct Loaded {
    /// The project graph.
    pub graph: Graph,
    /// What the migration engine did.
    pub report: MigrationReport,
}

/// Decodes a project snapshot and brings it up to the engine's target
/// version.
pub fn load(
    bytes: &[u8],
    registry: Arc<SchemaRegistry>,
    engine: &MigrationEngine,
    resolver: &dyn SampleResolver,
    options: LoadOptions,
) -> Result<Loaded, LoadError> {
    let graph = Graph::from_binary(bytes, registry)?;
    info!(
        "loaded project: {} nodes, schema v{}",
        graph.len(),
        graph.schema_version()
    );
    let mut edits = EditController::with_limit(graph, 0);
    let report = engine.run(&mut edits, resolver);
    if let Some(first) = report.failed.first().filter(|_| options.strict_migrations) {
        return Err(LoadError::Migration {
            count: report.failed.len(),
            first: first.error.clone(),
        });
    }
    Ok(Loaded {
        graph: edits.into_graph(),
        report,
    })
}
