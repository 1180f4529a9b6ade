//! Partita Core - document graph engine
//!
//! This crate holds the single source of truth for a project: a strongly
//! typed, referentially integral graph of nodes whose fields are addressed by
//! stable [`Address`] values. Every edit runs inside a transaction, every
//! committed transaction can be undone exactly, and the whole graph (or a
//! closed part of it) serializes to a versioned binary snapshot.
//!
//! # Core Abstractions
//!
//! ## Addressing
//!
//! - [`EntityId`] - 128-bit node identity, generated and never reused
//! - [`Address`] - entity id plus a path of field keys, totally ordered
//!
//! ## Schema
//!
//! - [`SchemaRegistry`] - the closed set of node classes, built once and shared
//! - [`ClassSchema`] / [`FieldSchema`] - field layout, defaults and accept sets
//! - [`PointerRule`] - pointer tag, mandatory flag and [`OnTargetDeleted`] policy
//!
//! ## Graph
//!
//! - [`Graph`] - node arena, pointer hubs, transactions, deletion, events
//! - [`Field`] - primitive, pointer, array or object; traversed with [`FieldVisitor`]
//! - [`PointerHub`] - reverse index of pointers targeting a field
//! - [`TransactionRecord`] - invertible log of one committed transaction
//!
//! ## Editing & Transfer
//!
//! - [`EditController`] - undo/redo stacks over graph transactions
//! - [`export_subgraph`] / [`import_subgraph`] - presets and copy between projects
//! - [`Graph::to_binary`] / [`Graph::from_binary`] - project snapshots
//!
//! # Example
//!
//! ```rust,ignore
//! use partita_core::{EditController, Graph};
//!
//! let mut edits = EditController::new(Graph::new(registry));
//! let track = edits.modify(|g| {
//!     let track = g.create(TRACK)?;
//!     g.set_target(&track_host(track), &unit_tracks(unit))?;
//!     Ok(track)
//! })?;
//! edits.undo()?;
//! ```
//!
//! # Logging
//!
//! Enable the `tracing` feature to get `debug!` events for mutations,
//! commits, rollbacks and (de)serialization.

pub mod address;
pub mod codec;
pub mod editing;
pub mod error;
pub mod field;
pub mod graph;
pub mod hub;
pub mod node;
pub mod schema;
pub mod transfer;
pub mod txn;
pub mod value;

#[cfg(test)]
mod fixtures;

pub use address::{Address, EntityId, FieldKey, FieldPath};
pub use codec::{DecodeError, EncodeError, FORMAT_VERSION, Header, MAGIC, Package, SnapshotKind, decode, read_header};
pub use editing::{DEFAULT_UNDO_LIMIT, EditController};
pub use error::{GraphError, IntegrityError, StateError};
pub use field::{ArrayField, Field, FieldVisitor, ObjectField, PointerField};
pub use graph::{Dependencies, DependencyOptions, FieldChange, Graph, GraphEvent, Subscription};
pub use hub::PointerHub;
pub use node::Node;
pub use schema::{
    AcceptSet, ClassId, ClassSchema, FieldSchema, FieldType, OnTargetDeleted, PointerRule, PointerTag,
    SchemaError, SchemaRegistry,
};
pub use transfer::{RemapTable, TransferError, export_subgraph, import_package, import_subgraph, read_subgraph};
pub use txn::{Op, TransactionRecord};
pub use value::{PrimitiveKind, Value};
