//! Migration trait, write patches and the ordered registry.

use partita_core::{Address, ClassId, Graph, GraphError, Node, Value};

use crate::error::MigrationError;

/// Looks up facts about media outside the graph.
pub trait SampleResolver {
    /// Length in seconds of the sample at `path`.
    fn duration(&self, path: &str) -> Result<f32, MigrationError>;
}

impl<F> SampleResolver for F
where
    F: Fn(&str) -> Result<f32, MigrationError>,
{
    fn duration(&self, path: &str) -> Result<f32, MigrationError> {
        self(path)
    }
}

/// Resolver for loads without media access. Every lookup fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMedia;

impl SampleResolver for NoMedia {
    fn duration(&self, path: &str) -> Result<f32, MigrationError> {
        Err(MigrationError::unavailable(path, "no media source configured"))
    }
}

/// What a migration may consult while preparing a patch.
#[derive(Clone, Copy)]
pub struct MigrationContext<'a> {
    /// Media lookups.
    pub resolver: &'a dyn SampleResolver,
}

/// One upgrade step for one node class.
///
/// The engine calls [`applies`](Self::applies) on every node of
/// [`class`](Self::class), then [`prepare`](Self::prepare) on the matches.
/// `prepare` reads the graph and performs every external lookup; the
/// returned [`Patch`] is applied afterwards in its own transaction, so a
/// failed lookup never leaves a half-written node.
///
/// `applies` must return `false` once the patch has been applied.
pub trait Migration: Send + Sync {
    /// Stable name used in reports and logs.
    fn name(&self) -> &'static str;

    /// Node class this step upgrades.
    fn class(&self) -> ClassId;

    /// Schema version that introduced the change. The step runs for graphs
    /// stored at an older version.
    fn version(&self) -> u32;

    /// `true` if `node` still needs this step.
    fn applies(&self, node: &Node) -> bool;

    /// Computes the writes for `node`.
    fn prepare(&self, node: &Node, ctx: &MigrationContext<'_>) -> Result<Patch, MigrationError>;
}

#[derive(Debug, Clone, PartialEq)]
enum PatchOp {
    Set(Address, Value),
    Push(Address, Value),
}

/// Buffered writes produced by [`Migration::prepare`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    ops: Vec<PatchOp>,
}

impl Patch {
    /// Empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a primitive field.
    pub fn set(mut self, address: Address, value: impl Into<Value>) -> Self {
        self.ops.push(PatchOp::Set(address, value.into()));
        self
    }

    /// Appends an element to an array and sets it to `value`.
    pub fn push(mut self, array: Address, value: impl Into<Value>) -> Self {
        self.ops.push(PatchOp::Push(array, value.into()));
        self
    }

    /// Number of writes.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// `true` if the patch writes nothing.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Applies every write in order. Must run inside a transaction.
    pub fn apply(&self, graph: &mut Graph) -> Result<(), GraphError> {
        for op in &self.ops {
            match op {
                PatchOp::Set(address, value) => graph.set_value(address, value.clone())?,
                PatchOp::Push(array, value) => {
                    let element = graph.push_element(array)?;
                    graph.set_value(&element, value.clone())?;
                }
            }
        }
        Ok(())
    }
}

/// Append-only, ordered list of migrations.
///
/// Version gates never decrease along the list and names are unique, so the
/// declared order is also the order in which upgrades happened.
#[derive(Default)]
pub struct MigrationRegistry {
    entries: Vec<Box<dyn Migration>>,
}

impl MigrationRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a migration.
    pub fn register(&mut self, migration: impl Migration + 'static) -> Result<(), MigrationError> {
        let name = migration.name();
        if self.entries.iter().any(|m| m.name() == name) {
            return Err(MigrationError::Duplicate(name));
        }
        let latest = self.latest_version();
        if migration.version() < latest {
            return Err(MigrationError::OutOfOrder {
                name,
                version: migration.version(),
                latest,
            });
        }
        self.entries.push(Box::new(migration));
        Ok(())
    }

    /// Migrations in declared order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Migration> {
        self.entries.iter().map(|m| m.as_ref())
    }

    /// Looks up a migration by name.
    pub fn get(&self, name: &str) -> Option<&dyn Migration> {
        self.iter().find(|m| m.name() == name)
    }

    /// Newest version gate, or 0 when empty.
    pub fn latest_version(&self) -> u32 {
        self.entries.last().map_or(0, |m| m.version())
    }

    /// Returns the number of migrations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no migration is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl core::fmt::Debug for MigrationRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|m| (m.name(), m.version())))
            .finish()
    }
}
