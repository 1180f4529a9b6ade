//! Node deletion with per-pointer policies.
//!
//! Deletion first computes the full set of doomed nodes: the requested node
//! plus, to a fixpoint, every node owning a [`OnTargetDeleted::Cascade`]
//! pointer into the set. Only then are `Reject` pointers from surviving nodes
//! checked; one such pointer aborts the whole deletion before anything has
//! changed. Otherwise `Clear` pointers from survivors are cleared, the
//! doomed nodes' own pointers are cleared, and the nodes are removed.

use std::collections::{BTreeSet, VecDeque};

use super::Graph;
use crate::address::{Address, EntityId};
use crate::error::{GraphError, IntegrityError};
use crate::schema::{OnTargetDeleted, PointerRule};
use crate::txn::Op;

impl Graph {
    /// Deletes `id` and everything that cascades from it.
    ///
    /// Returns the deleted ids in deletion order (the requested node first).
    pub fn delete_node(&mut self, id: EntityId) -> Result<Vec<EntityId>, GraphError> {
        self.require_transaction()?;
        if !self.nodes.contains_key(&id) {
            return Err(GraphError::NodeNotFound(id));
        }
        let (order, doomed) = self.deletion_set(id)?;

        let mut clears = Vec::new();
        for &victim in &order {
            for pointer in self.incoming_to_node(victim) {
                if !doomed.contains(&pointer.entity()) {
                    clears.push(pointer);
                }
            }
        }
        for pointer in clears {
            self.clear_pointer(&pointer)?;
        }

        for &victim in &order {
            let outgoing = self.nodes.get(&victim).map(|n| n.outgoing()).unwrap_or_default();
            for (pointer, _) in outgoing {
                self.clear_pointer(&pointer)?;
            }
        }

        for &victim in &order {
            let node = self.nodes.get(&victim).cloned().ok_or(GraphError::NodeNotFound(victim))?;
            self.record(Op::DeleteNode(Box::new(node)))?;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("delete_node: {id} ({} nodes removed)", order.len());
        Ok(order)
    }

    /// Cascade fixpoint followed by the reject check.
    fn deletion_set(&self, id: EntityId) -> Result<(Vec<EntityId>, BTreeSet<EntityId>), GraphError> {
        let mut order = vec![id];
        let mut doomed = BTreeSet::from([id]);
        let mut queue = VecDeque::from([id]);

        while let Some(current) = queue.pop_front() {
            for pointer in self.incoming_to_node(current) {
                let owner = pointer.entity();
                if doomed.contains(&owner) {
                    continue;
                }
                if self.rule_of(&pointer)?.on_target_deleted == OnTargetDeleted::Cascade {
                    doomed.insert(owner);
                    order.push(owner);
                    queue.push_back(owner);
                }
            }
        }

        for &victim in &order {
            for pointer in self.incoming_to_node(victim) {
                if doomed.contains(&pointer.entity()) {
                    continue;
                }
                if self.rule_of(&pointer)?.on_target_deleted == OnTargetDeleted::Reject {
                    return Err(IntegrityError::DeletionRejected {
                        target: victim,
                        pointer,
                    }
                    .into());
                }
            }
        }
        Ok((order, doomed))
    }

    fn rule_of(&self, pointer: &Address) -> Result<PointerRule, GraphError> {
        self.pointer_at(pointer)
            .map(|p| *p.rule())
            .ok_or_else(|| GraphError::FieldNotFound(pointer.clone()))
    }
}
