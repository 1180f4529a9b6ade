//! Runs registered migrations against a loaded graph.

use partita_core::{EditController, EntityId};
use tracing::{debug, info, warn};

use crate::builtin::builtin_registry;
use crate::error::MigrationError;
use crate::migration::{Migration, MigrationContext, MigrationRegistry, SampleResolver};

/// One node upgraded by one migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    /// Migration name.
    pub migration: &'static str,
    /// Upgraded node.
    pub node: EntityId,
}

/// One node a migration could not upgrade. The node is unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationFailure {
    /// Migration name.
    pub migration: &'static str,
    /// Node left unmigrated.
    pub node: EntityId,
    /// Why.
    pub error: MigrationError,
}

/// Outcome of one engine run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationReport {
    /// Schema version the graph was stored at.
    pub from_version: u32,
    /// Schema version stamped after the run.
    pub to_version: u32,
    /// Successful steps, in execution order.
    pub applied: Vec<Applied>,
    /// Failed steps, in execution order.
    pub failed: Vec<MigrationFailure>,
}

impl MigrationReport {
    /// `true` if every applicable step succeeded.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// `true` if the run touched nothing.
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty() && self.failed.is_empty()
    }

    /// Number of nodes upgraded by `migration`.
    pub fn applied_count(&self, migration: &str) -> usize {
        self.applied.iter().filter(|a| a.migration == migration).count()
    }
}

/// Applies a [`MigrationRegistry`] up to a target schema version.
#[derive(Debug)]
pub struct MigrationEngine {
    registry: MigrationRegistry,
    target: u32,
}

impl MigrationEngine {
    /// Engine that upgrades graphs to `target`. Migrations gated above
    /// `target` never run.
    pub fn new(registry: MigrationRegistry, target: u32) -> Self {
        Self { registry, target }
    }

    /// Engine with every built-in project migration, targeting the current
    /// project schema version.
    pub fn builtin() -> Result<Self, MigrationError> {
        Ok(Self::new(builtin_registry()?, partita_schema::SCHEMA_VERSION))
    }

    /// Registered migrations.
    pub fn registry(&self) -> &MigrationRegistry {
        &self.registry
    }

    /// Version stamped on fully migrated graphs.
    pub fn target_version(&self) -> u32 {
        self.target
    }

    /// Upgrades the graph behind `edits`.
    ///
    /// Every migration with a version gate above the stored version runs in
    /// declared order, one transaction per node, none of them undoable. A
    /// failing node is logged, reported and left as it was; the remaining
    /// nodes still migrate. The stored version is raised to the target only
    /// when nothing failed, so the next load retries.
    pub fn run(&self, edits: &mut EditController, resolver: &dyn SampleResolver) -> MigrationReport {
        let from = edits.graph().schema_version();
        let mut report = MigrationReport {
            from_version: from,
            to_version: from,
            ..MigrationReport::default()
        };
        if from >= self.target {
            debug!("schema v{from} is current, nothing to migrate");
            return report;
        }

        let ctx = MigrationContext { resolver };
        for migration in self
            .registry
            .iter()
            .filter(|m| m.version() > from && m.version() <= self.target)
        {
            let pending: Vec<EntityId> = edits
                .graph()
                .nodes_of_class(migration.class())
                .filter(|n| migration.applies(n))
                .map(|n| n.id())
                .collect();
            debug!("{}: {} node(s) pending", migration.name(), pending.len());
            for node in pending {
                match migrate_node(edits, migration, node, &ctx) {
                    Ok(()) => report.applied.push(Applied {
                        migration: migration.name(),
                        node,
                    }),
                    Err(error) => {
                        warn!("{} left node {node} unmigrated: {error}", migration.name());
                        report.failed.push(MigrationFailure {
                            migration: migration.name(),
                            node,
                            error,
                        });
                    }
                }
            }
        }

        if report.is_complete() {
            edits.set_schema_version(self.target);
            report.to_version = self.target;
            info!(
                "migrated schema v{from} -> v{}: {} node(s) upgraded",
                self.target,
                report.applied.len()
            );
        } else {
            warn!(
                "migration incomplete: {} failure(s), schema stays at v{from}",
                report.failed.len()
            );
        }
        report
    }
}

fn migrate_node(
    edits: &mut EditController,
    migration: &dyn Migration,
    id: EntityId,
    ctx: &MigrationContext<'_>,
) -> Result<(), MigrationError> {
    let patch = {
        let node = edits
            .graph()
            .node(id)
            .ok_or(partita_core::GraphError::NodeNotFound(id))?;
        migration.prepare(node, ctx)?
    };
    edits.modify_with(false, |g| patch.apply(g))?;
    Ok(())
}
