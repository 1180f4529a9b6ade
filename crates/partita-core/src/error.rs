//! Error types for graph operations.

use thiserror::Error;

use crate::address::{Address, EntityId};

/// Errors raised by graph mutation and lookup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A node with this id already exists.
    #[error("address {0} is already occupied")]
    DuplicateAddress(EntityId),

    /// Referential integrity would be violated.
    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    /// Transaction discipline was violated.
    #[error(transparent)]
    State(#[from] StateError),

    /// The class id is not registered.
    #[error("unknown node class {0}")]
    UnknownClass(u16),

    /// No live node has this id.
    #[error("node {0} not found")]
    NodeNotFound(EntityId),

    /// The node exists but has no field at this address.
    #[error("field {0} not found")]
    FieldNotFound(Address),

    /// The field at this address has a different shape or kind.
    #[error("field {address} is {found}, expected {expected}")]
    TypeMismatch {
        /// Offending field.
        address: Address,
        /// Expected kind.
        expected: &'static str,
        /// Actual kind.
        found: &'static str,
    },

    /// An array cannot grow past `u16::MAX` elements.
    #[error("array {0} is full")]
    ArrayFull(Address),
}

impl GraphError {
    /// Create a type mismatch error.
    pub fn type_mismatch(address: &Address, expected: &'static str, found: &'static str) -> Self {
        GraphError::TypeMismatch {
            address: address.clone(),
            expected,
            found,
        }
    }

    /// `true` for [`GraphError::Integrity`].
    pub fn is_integrity(&self) -> bool {
        matches!(self, GraphError::Integrity(_))
    }
}

/// Pointer and hub invariant violations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    /// The target address does not accept pointers (or does not exist).
    #[error("{target} is not a pointer target (from {pointer})")]
    NotATarget {
        /// Pointer field.
        pointer: Address,
        /// Requested target.
        target: Address,
    },

    /// The target's accept set does not contain the pointer's tag.
    #[error("{target} does not accept tag {tag} (from {pointer})")]
    TagRejected {
        /// Pointer field.
        pointer: Address,
        /// Requested target.
        target: Address,
        /// Pointer tag.
        tag: u8,
    },

    /// A mandatory pointer of a live node is unset at commit.
    #[error("mandatory pointer {0} is unset")]
    MandatoryUnset(Address),

    /// Deleting the node would leave a rejecting pointer dangling.
    #[error("cannot delete {target}: still referenced by {pointer}")]
    DeletionRejected {
        /// Node being deleted.
        target: EntityId,
        /// Pointer that rejects the deletion.
        pointer: Address,
    },

    /// Popping the element would leave a pointer dangling.
    #[error("cannot remove element {element}: still referenced by {pointer}")]
    ElementTargeted {
        /// Element being removed.
        element: Address,
        /// Pointer into the element.
        pointer: Address,
    },

    /// A pointer resolves to nothing.
    #[error("pointer {pointer} dangles at {target}")]
    Dangling {
        /// Pointer field.
        pointer: Address,
        /// Missing target.
        target: Address,
    },

    /// A hub's incoming set differs from the pointers that target it.
    #[error("pointer hub at {0} is out of sync")]
    HubMismatch(Address),
}

/// Transaction discipline violations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    /// A mutation was attempted outside a transaction.
    #[error("mutation outside of a transaction")]
    NoTransaction,

    /// A transaction was started while one is open.
    #[error("a transaction is already open")]
    NestedTransaction,
}
