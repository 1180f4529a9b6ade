//! Subgraph export and import.
//!
//! Export walks [`Graph::dependencies_of`] from a root set, gives every
//! included node a fresh id, rewrites internal pointers, and serializes the
//! result as a [`SnapshotKind::Subgraph`] together with the boundary table
//! (nodes referenced but not included). Boundary nodes of resource classes
//! travel in full under their original ids, so a preset that plays a sample
//! still works in a project that has never seen it. Import reverses this
//! into a live graph inside the caller's transaction.
//!
//! ```rust,ignore
//! let (table, bytes) = export_subgraph(&source, &[unit], &DependencyOptions::default())?;
//! let mut bindings = BTreeMap::new();
//! bindings.insert(source_root, destination_root);
//! destination.begin_transaction()?;
//! let imported = import_subgraph(&mut destination, &bytes, &bindings)?;
//! destination.end_transaction()?;
//! ```

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::address::{Address, EntityId};
use crate::codec::{self, DecodeError, EncodeError, Package, SnapshotKind};
use crate::error::{GraphError, IntegrityError};
use crate::field::PointerField;
use crate::graph::{DependencyOptions, Graph};
use crate::node::Node;
use crate::schema::ClassId;

/// Old id to new id, for every node that was copied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemapTable {
    map: BTreeMap<EntityId, EntityId>,
}

impl RemapTable {
    /// New id of `old`.
    pub fn get(&self, old: EntityId) -> Option<EntityId> {
        self.map.get(&old).copied()
    }

    /// Rewrites the entity of `address` if it was remapped.
    pub fn remap(&self, address: &Address) -> Option<Address> {
        self.get(address.entity()).map(|id| address.with_entity(id))
    }

    /// Pairs in old-id order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, EntityId)> + '_ {
        self.map.iter().map(|(a, b)| (*a, *b))
    }

    /// Number of remapped nodes.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// `true` if nothing was remapped.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn insert(&mut self, old: EntityId, new: EntityId) {
        self.map.insert(old, new);
    }
}

/// Errors raised by subgraph import.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// The package could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The package could not be encoded.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// The package could not be applied.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Package and destination use different schema versions.
    #[error("package has schema version {package}, graph has {graph}")]
    SchemaVersion {
        /// Version stored in the package.
        package: u32,
        /// Version of the destination graph.
        graph: u32,
    },
}

/// Serializes the dependency closure of `roots` with fresh ids.
pub fn export_subgraph(
    graph: &Graph,
    roots: &[EntityId],
    options: &DependencyOptions,
) -> Result<(RemapTable, Vec<u8>), TransferError> {
    let deps = graph.dependencies_of(roots, options)?;
    let mut table = RemapTable::default();
    for &id in &deps.order {
        table.insert(id, EntityId::generate());
    }
    let rewrite = |node: &Node, id: EntityId| {
        node.remapped(id, |_, pointer: &mut PointerField| {
            if let Some(moved) = pointer.target().and_then(|t| table.remap(t)) {
                pointer.replace_target(Some(moved));
            }
            Ok::<(), GraphError>(())
        })
    };
    let mut nodes = Vec::with_capacity(deps.order.len());
    for &id in &deps.order {
        let node = graph.node(id).ok_or(GraphError::NodeNotFound(id))?;
        let new_id = table.get(id).ok_or(GraphError::NodeNotFound(id))?;
        nodes.push(rewrite(node, new_id)?);
    }
    let mut boundary: Vec<(EntityId, ClassId)> = Vec::with_capacity(deps.boundary.len());
    let mut resources = Vec::new();
    for node in deps.boundary.iter().filter_map(|id| graph.node(*id)) {
        boundary.push((node.id(), node.class()));
        if graph.registry().class(node.class()).is_some_and(|c| c.resource) {
            resources.push(rewrite(node, node.id())?);
        }
    }
    let bytes = codec::encode(
        SnapshotKind::Subgraph,
        graph.schema_version(),
        nodes.iter(),
        &boundary,
        &resources,
    )?;
    #[cfg(feature = "tracing")]
    tracing::debug!(
        "export_subgraph: {} nodes, {} boundary ({} resources), {} bytes",
        nodes.len(),
        boundary.len(),
        resources.len(),
        bytes.len()
    );
    Ok((table, bytes))
}

/// Decodes a subgraph package without applying it.
pub fn read_subgraph(graph: &Graph, bytes: &[u8]) -> Result<Package, TransferError> {
    let package = codec::decode(bytes, graph.registry(), SnapshotKind::Subgraph)?;
    if package.header.schema_version != graph.schema_version() {
        return Err(TransferError::SchemaVersion {
            package: package.header.schema_version,
            graph: graph.schema_version(),
        });
    }
    Ok(package)
}

/// Inserts an exported subgraph under fresh ids.
///
/// Carried resources that are neither bound nor already present in the
/// destination are created under their original id; present ones are
/// reused as they are. Pointers are resolved in this order: to another
/// imported node (remapped), through `bindings` (package id to destination
/// id), to a node that exists in the destination or was just created from
/// the package (kept). Anything else is cleared if optional and fails with
/// [`IntegrityError::Dangling`] if mandatory. Requires an open transaction.
///
/// The returned table lists the remapped nodes only.
pub fn import_subgraph(
    graph: &mut Graph,
    bytes: &[u8],
    bindings: &BTreeMap<EntityId, EntityId>,
) -> Result<RemapTable, TransferError> {
    let package = read_subgraph(graph, bytes)?;
    Ok(import_package(graph, package, bindings)?)
}

/// Applies an already decoded package. See [`import_subgraph`].
pub fn import_package(
    graph: &mut Graph,
    package: Package,
    bindings: &BTreeMap<EntityId, EntityId>,
) -> Result<RemapTable, GraphError> {
    if !graph.in_transaction() {
        return Err(crate::error::StateError::NoTransaction.into());
    }
    let mut table = RemapTable::default();
    for node in &package.nodes {
        table.insert(node.id(), EntityId::generate());
    }
    let restored: BTreeSet<EntityId> = package
        .resources
        .iter()
        .map(Node::id)
        .filter(|id| !bindings.contains_key(id) && !graph.contains(*id))
        .collect();

    let resolve = |target: &Address| {
        table
            .remap(target)
            .or_else(|| bindings.get(&target.entity()).map(|id| target.with_entity(*id)))
            .or_else(|| {
                let entity = target.entity();
                (graph.contains(entity) || restored.contains(&entity)).then(|| target.clone())
            })
    };
    let mut links = Vec::new();
    let mut detached = Vec::with_capacity(package.nodes.len() + restored.len());
    for node in package.resources.iter().filter(|n| restored.contains(&n.id())) {
        detached.push(detach(node, node.id(), &resolve, &mut links)?);
    }
    for node in &package.nodes {
        let new_id = table.get(node.id()).ok_or(GraphError::NodeNotFound(node.id()))?;
        detached.push(detach(node, new_id, &resolve, &mut links)?);
    }

    for node in detached {
        graph.insert_node(node)?;
    }
    for (pointer, target) in links {
        graph.set_target(&pointer, &target)?;
    }
    #[cfg(feature = "tracing")]
    tracing::debug!(
        "import_subgraph: {} nodes, {} resources restored",
        table.len(),
        restored.len()
    );
    Ok(table)
}

/// Copy of `node` under `id` with every pointer unset. Resolvable targets
/// are queued in `links`; unresolvable mandatory ones fail.
fn detach(
    node: &Node,
    id: EntityId,
    resolve: &dyn Fn(&Address) -> Option<Address>,
    links: &mut Vec<(Address, Address)>,
) -> Result<Node, GraphError> {
    node.remapped(id, |address, pointer: &mut PointerField| {
        let Some(target) = pointer.target().cloned() else {
            return Ok(());
        };
        match resolve(&target) {
            Some(resolved) => links.push((address.clone(), resolved)),
            None if pointer.is_mandatory() => {
                return Err(GraphError::from(IntegrityError::Dangling {
                    pointer: address.clone(),
                    target,
                }));
            }
            None => {}
        }
        pointer.replace_target(None);
        Ok(())
    })
}
