//! Schema migrations for partita projects.
//!
//! Snapshots keep the schema version they were written with. Loading an
//! older snapshot decodes it against the current registry (new fields take
//! their defaults) and then hands it to the [`MigrationEngine`], which runs
//! every registered [`Migration`] whose version gate is newer than the
//! stored version.
//!
//! # Migration Contract
//!
//! - **Ordered**: the [`MigrationRegistry`] is append-only and version gates
//!   never decrease, so migrations replay in the order the schema evolved
//! - **Idempotent**: a migration's predicate turns false once it has been
//!   applied, so running the set twice equals running it once
//! - **Lookups before writes**: [`Migration::prepare`] does every external
//!   lookup and returns a [`Patch`]; only a complete patch is applied, in
//!   its own non-undoable transaction
//! - **Retry on failure**: a failed node stays as it was and the stored
//!   version is not raised, so the next load tries again
//!
//! # Example
//!
//! ```rust,ignore
//! use partita_migrate::{LoadOptions, MigrationEngine, NoMedia, load};
//!
//! let engine = MigrationEngine::builtin()?;
//! let loaded = load(&bytes, partita_schema::registry()?, &engine, &NoMedia, LoadOptions::default())?;
//! for failure in &loaded.report.failed {
//!     eprintln!("{}: {}", failure.migration, failure.error);
//! }
//! ```

pub mod builtin;
pub mod engine;
mod error;
mod load;
pub mod migration;

pub use builtin::{AudioFileDuration, ParameterSlots, builtin_registry};
pub use engine::{Applied, MigrationEngine, MigrationFailure, MigrationReport};
pub use error::{LoadError, MigrationError};
pub use load::{LoadOptions, Loaded, load};
pub use migration::{Migration, MigrationContext, MigrationRegistry, NoMedia, Patch, SampleResolver};
