//! Micro-operations and transaction records.
//!
//! Every committed transaction yields a [`TransactionRecord`]: the ordered
//! list of micro-operations it applied. Each operation carries both the old
//! and the new state, so [`TransactionRecord::inverse`] is exact and
//! replaying the inverse restores the pre-transaction graph.

use crate::address::Address;
use crate::field::Field;
use crate::node::Node;
use crate::value::Value;

/// One reversible change to the graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// A node was inserted with this exact state.
    CreateNode(Box<Node>),
    /// A node with this exact state was removed.
    DeleteNode(Box<Node>),
    /// A primitive field changed.
    SetValue {
        /// Field address.
        address: Address,
        /// Value before.
        old: Value,
        /// Value after.
        new: Value,
    },
    /// A pointer field was retargeted or cleared.
    SetPointer {
        /// Pointer address.
        address: Address,
        /// Target before.
        old: Option<Address>,
        /// Target after.
        new: Option<Address>,
    },
    /// An element was appended to an array.
    PushElement {
        /// Array address.
        address: Address,
        /// The appended element.
        element: Field,
    },
    /// The last element of an array was removed.
    PopElement {
        /// Array address.
        address: Address,
        /// The removed element.
        element: Field,
    },
}

impl Op {
    /// Operation that undoes `self`.
    #[must_use]
    pub fn inverse(&self) -> Op {
        match self {
            Op::CreateNode(node) => Op::DeleteNode(node.clone()),
            Op::DeleteNode(node) => Op::CreateNode(node.clone()),
            Op::SetValue { address, old, new } => Op::SetValue {
                address: address.clone(),
                old: new.clone(),
                new: old.clone(),
            },
            Op::SetPointer { address, old, new } => Op::SetPointer {
                address: address.clone(),
                old: new.clone(),
                new: old.clone(),
            },
            Op::PushElement { address, element } => Op::PopElement {
                address: address.clone(),
                element: element.clone(),
            },
            Op::PopElement { address, element } => Op::PushElement {
                address: address.clone(),
                element: element.clone(),
            },
        }
    }

    /// Address the operation applies to.
    pub fn address(&self) -> Address {
        match self {
            Op::CreateNode(node) | Op::DeleteNode(node) => node.address(),
            Op::SetValue { address, .. }
            | Op::SetPointer { address, .. }
            | Op::PushElement { address, .. }
            | Op::PopElement { address, .. } => address.clone(),
        }
    }
}

/// Ordered operations of one committed transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionRecord {
    ops: Vec<Op>,
}

impl TransactionRecord {
    pub(crate) fn new(ops: Vec<Op>) -> Self {
        Self { ops }
    }

    /// Operations in application order.
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Record that undoes this one: inverted operations in reverse order.
    #[must_use]
    pub fn inverse(&self) -> TransactionRecord {
        TransactionRecord {
            ops: self.ops.iter().rev().map(Op::inverse).collect(),
        }
    }

    /// `true` if the transaction changed nothing.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::EntityId;

    #[test]
    fn inverse_reverses_and_swaps() {
        let a = Address::with_path(EntityId::from_u128(1), &[1]);
        let record = TransactionRecord::new(vec![
            Op::SetValue {
                address: a.clone(),
                old: Value::Int32(1),
                new: Value::Int32(2),
            },
            Op::SetPointer {
                address: a.clone(),
                old: None,
                new: Some(a.node()),
            },
        ]);
        let inverse = record.inverse();
        assert_eq!(inverse.len(), 2);
        assert!(matches!(&inverse.ops()[0], Op::SetPointer { new: None, .. }));
        assert!(matches!(&inverse.ops()[1], Op::SetValue { new: Value::Int32(1), .. }));
        assert_eq!(inverse.inverse(), record);
    }
}
