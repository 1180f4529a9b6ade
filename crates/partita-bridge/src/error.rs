//! Error types for the bridge.

use thiserror::Error;

/// Errors raised on the edit side of the bridge.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BridgeError {
    /// The graph has no root node to project.
    #[error("graph has no project root")]
    NoRoot,

    /// The render side has been dropped.
    #[error("render side disconnected")]
    Disconnected,
}
