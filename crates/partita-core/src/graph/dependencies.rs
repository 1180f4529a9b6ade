//! Dependency walk for subgraph extraction.
//!
//! [`Graph::dependencies_of`] computes the closed set of nodes reachable from
//! a root set by following pointers outward, optionally pulling in owned
//! nodes (owners of cascading pointers into the set). Nodes that are
//! excluded, or are resources while `stop_at_resources` is set, end the walk
//! and are reported as the boundary instead of being included.
//!
//! The walk is breadth-first over nodes in discovery order, fields in
//! address order, and hubs in address order, so the result is a pure
//! function of the graph state.

use std::collections::{BTreeSet, VecDeque};

use super::Graph;
use crate::address::EntityId;
use crate::error::GraphError;
use crate::node::Node;
use crate::schema::OnTargetDeleted;

/// Traversal policy for [`Graph::dependencies_of`].
pub struct DependencyOptions {
    /// Follow only mandatory pointers outward.
    pub follow_mandatory_only: bool,
    /// Resource nodes terminate the walk and land in the boundary.
    pub stop_at_resources: bool,
    /// Pull in nodes that own a cascading pointer into the set.
    pub include_owned: bool,
    /// Nodes for which this returns `true` are never included.
    pub exclude: Option<Box<dyn Fn(&Node) -> bool>>,
}

impl Default for DependencyOptions {
    fn default() -> Self {
        Self {
            follow_mandatory_only: false,
            stop_at_resources: true,
            include_owned: true,
            exclude: None,
        }
    }
}

impl DependencyOptions {
    /// Sets the exclusion predicate.
    #[must_use]
    pub fn excluding(mut self, predicate: impl Fn(&Node) -> bool + 'static) -> Self {
        self.exclude = Some(Box::new(predicate));
        self
    }
}

impl core::fmt::Debug for DependencyOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DependencyOptions")
            .field("follow_mandatory_only", &self.follow_mandatory_only)
            .field("stop_at_resources", &self.stop_at_resources)
            .field("include_owned", &self.include_owned)
            .field("exclude", &self.exclude.is_some())
            .finish()
    }
}

/// Result of a dependency walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies {
    /// Included nodes.
    pub nodes: BTreeSet<EntityId>,
    /// Included nodes in discovery order, roots first.
    pub order: Vec<EntityId>,
    /// Nodes reached but not included (excluded or resources).
    pub boundary: BTreeSet<EntityId>,
}

impl Dependencies {
    /// `true` if `id` is included.
    pub fn contains(&self, id: EntityId) -> bool {
        self.nodes.contains(&id)
    }

    /// Number of included nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// `true` if nothing is included.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Graph {
    /// Minimal closed subgraph reachable from `roots`.
    ///
    /// Every included node's pointers resolve to included or boundary nodes,
    /// unless `follow_mandatory_only` skipped an optional pointer.
    pub fn dependencies_of(
        &self,
        roots: &[EntityId],
        options: &DependencyOptions,
    ) -> Result<Dependencies, GraphError> {
        let mut deps = Dependencies::default();
        let mut queue = VecDeque::new();
        for &root in roots {
            if !self.nodes.contains_key(&root) {
                return Err(GraphError::NodeNotFound(root));
            }
            if deps.nodes.insert(root) {
                deps.order.push(root);
                queue.push_back(root);
            }
        }

        while let Some(id) = queue.pop_front() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            let mut reached = Vec::new();
            for (_, pointer) in node.pointers() {
                if options.follow_mandatory_only && !pointer.is_mandatory() {
                    continue;
                }
                if let Some(target) = pointer.target() {
                    reached.push(target.entity());
                }
            }
            if options.include_owned {
                for incoming in self.incoming_to_node(id) {
                    let owned = self
                        .pointer_at(&incoming)
                        .is_some_and(|p| p.rule().on_target_deleted == OnTargetDeleted::Cascade);
                    if owned {
                        reached.push(incoming.entity());
                    }
                }
            }
            for candidate in reached {
                if deps.nodes.contains(&candidate) || deps.boundary.contains(&candidate) {
                    continue;
                }
                let Some(candidate_node) = self.nodes.get(&candidate) else {
                    continue;
                };
                let excluded = options.exclude.as_ref().is_some_and(|f| f(candidate_node));
                let resource = options.stop_at_resources
                    && self
                        .registry
                        .class(candidate_node.class())
                        .is_some_and(|c| c.resource);
                if excluded || resource {
                    deps.boundary.insert(candidate);
                } else {
                    deps.nodes.insert(candidate);
                    deps.order.push(candidate);
                    queue.push_back(candidate);
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "dependencies_of: {} roots -> {} nodes, {} boundary",
            roots.len(),
            deps.nodes.len(),
            deps.boundary.len()
        );
        Ok(deps)
    }
}
