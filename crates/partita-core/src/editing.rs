//! Undo/redo over graph transactions.
//!
//! [`EditController`] owns a [`Graph`] and runs every edit as one
//! transaction. Captured transactions land on the undo stack; undo replays
//! the inverse record as a new transaction whose own record moves to the
//! redo stack, and vice versa.
//!
//! ```rust,ignore
//! let mut edits = EditController::new(graph);
//! edits.modify(|g| g.set_value(&gain, 0.5f32))?;
//! edits.undo()?;
//! edits.redo()?;
//! ```

use std::collections::VecDeque;

use crate::error::GraphError;
use crate::graph::Graph;
use crate::txn::TransactionRecord;

/// Undo depth used by [`EditController::new`].
pub const DEFAULT_UNDO_LIMIT: usize = 100;

/// Transactional editing with bounded undo history.
#[derive(Debug)]
pub struct EditController {
    graph: Graph,
    undo: VecDeque<TransactionRecord>,
    redo: Vec<TransactionRecord>,
    limit: usize,
}

impl EditController {
    /// Wraps `graph` with the default undo depth.
    pub fn new(graph: Graph) -> Self {
        Self::with_limit(graph, DEFAULT_UNDO_LIMIT)
    }

    /// Wraps `graph` keeping at most `limit` undo steps (0 = unlimited).
    pub fn with_limit(graph: Graph, limit: usize) -> Self {
        Self {
            graph,
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit,
        }
    }

    /// Runs `f` as one undoable transaction.
    pub fn modify<R, F>(&mut self, f: F) -> Result<R, GraphError>
    where
        F: FnOnce(&mut Graph) -> Result<R, GraphError>,
    {
        self.modify_with(true, f)
    }

    /// Runs `f` as one transaction.
    ///
    /// With `capture_undo` false the edit is applied but never becomes
    /// undoable and leaves the redo stack alone (migrations, previews).
    /// Empty transactions are never recorded.
    pub fn modify_with<R, F>(&mut self, capture_undo: bool, f: F) -> Result<R, GraphError>
    where
        F: FnOnce(&mut Graph) -> Result<R, GraphError>,
    {
        let (value, record) = self.graph.transaction(f)?;
        if capture_undo && !record.is_empty() {
            self.push_undo(record);
            self.redo.clear();
        }
        Ok(value)
    }

    /// Reverts the most recent captured edit. Returns `false` if there was none.
    pub fn undo(&mut self) -> Result<bool, GraphError> {
        let Some(record) = self.undo.pop_back() else {
            return Ok(false);
        };
        match self.replay(&record.inverse()) {
            Ok(applied) => {
                self.redo.push(applied);
                #[cfg(feature = "tracing")]
                tracing::debug!("undo: {} ops, {} left", record.len(), self.undo.len());
                Ok(true)
            }
            Err(err) => {
                self.undo.push_back(record);
                Err(err)
            }
        }
    }

    /// Re-applies the most recently undone edit. Returns `false` if there was none.
    pub fn redo(&mut self) -> Result<bool, GraphError> {
        let Some(record) = self.redo.pop() else {
            return Ok(false);
        };
        match self.replay(&record.inverse()) {
            Ok(applied) => {
                self.push_undo(applied);
                #[cfg(feature = "tracing")]
                tracing::debug!("redo: {} ops, {} left", record.len(), self.redo.len());
                Ok(true)
            }
            Err(err) => {
                self.redo.push(record);
                Err(err)
            }
        }
    }

    fn replay(&mut self, record: &TransactionRecord) -> Result<TransactionRecord, GraphError> {
        self.graph.transaction(|g| g.apply(record)).map(|((), applied)| applied)
    }

    fn push_undo(&mut self, record: TransactionRecord) {
        self.undo.push_back(record);
        if self.limit > 0 {
            while self.undo.len() > self.limit {
                self.undo.pop_front();
            }
        }
    }

    /// `true` if [`undo`](Self::undo) would do something.
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// `true` if [`redo`](Self::redo) would do something.
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Number of undo steps available.
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    /// Number of redo steps available.
    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    /// Drops both stacks.
    pub fn clear_history(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// Maximum undo depth (0 = unlimited).
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// The edited graph.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Stamps the graph's schema version. Not an edit; never undoable.
    pub fn set_schema_version(&mut self, version: u32) {
        self.graph.set_schema_version(version);
    }

    /// Releases the graph, discarding history.
    pub fn into_graph(self) -> Graph {
        self.graph
    }
}
