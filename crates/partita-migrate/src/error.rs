//! Error types for migrations and loading.

use partita_core::{DecodeError, EntityId, GraphError};
use thiserror::Error;

/// A migration step could not complete, or the registry was misused.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MigrationError {
    /// An external lookup failed; the node was left untouched.
    #[error("resource '{path}' is unavailable: {reason}")]
    ResourceUnavailable {
        /// Path or identifier of the resource.
        path: String,
        /// What went wrong.
        reason: String,
    },

    /// The node does not have the shape the migration expects.
    #[error("node {node} is malformed: {detail}")]
    Malformed {
        /// Offending node.
        node: EntityId,
        /// Description.
        detail: String,
    },

    /// Applying the patch was rejected by the graph.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A migration was registered behind one with a newer version gate.
    #[error("migration '{name}' (v{version}) registered after v{latest}")]
    OutOfOrder {
        /// Migration name.
        name: &'static str,
        /// Its version gate.
        version: u32,
        /// Newest gate already registered.
        latest: u32,
    },

    /// Two migrations share a name.
    #[error("migration '{0}' is already registered")]
    Duplicate(&'static str),
}

impl MigrationError {
    /// Create a resource unavailable error.
    pub fn unavailable(path: impl Into<String>, reason: impl Into<String>) -> Self {
        MigrationError::ResourceUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a malformed node error.
    pub fn malformed(node: EntityId, detail: impl Into<String>) -> Self {
        MigrationError::Malformed {
            node,
            detail: detail.into(),
        }
    }
}

/// Errors returned by [`load`](crate::load).
#[derive(Debug, Error)]
pub enum LoadError {
    /// The snapshot could not be decoded.
    #[error("failed to decode project: {0}")]
    Decode(#[from] DecodeError),

    /// Strict loading and at least one migration step failed.
    #[error("{count} migration step(s) failed, first: {first}")]
    Migration {
        /// Number of failed steps.
        count: usize,
        /// First failure in registry order.
        #[source]
        first: MigrationError,
    },
}
