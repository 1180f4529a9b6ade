//! Edit-thread to render-thread synchronization for partita projects.
//!
//! The project graph lives on the edit thread and is never shared. The render
//! thread works from an immutable [`RenderSnapshot`] and talks back through a
//! pair of non-blocking channels.
//!
//! # Architecture
//!
//! | Concern | Edit side | Render side |
//! |---------|-----------|-------------|
//! | Project state | [`GraphMirror`] publishes on commit | [`SnapshotReader::load`] |
//! | Transport, clip scheduling | [`EditEndpoint::send`] | [`RenderEndpoint::try_command`] |
//! | Media requests, position | [`EditEndpoint::drain`] | [`RenderEndpoint::notify`] |
//! | Cycle latency | [`ClockValidator::poll`] | [`ClockProbe`] |
//!
//! [`RenderContext`] bundles the render side and drives one block per call.
//!
//! ```rust,ignore
//! let mut mirror = GraphMirror::attach(&graph, DEFAULT_RETENTION)?;
//! let (edit, render) = EngineLink::new().split();
//! let clock = ClockValidator::default();
//! let mut ctx = RenderContext::new(mirror.reader(), render, clock.probe());
//! std::thread::spawn(move || loop { ctx.process(256) });
//!
//! edits.modify(|g| /* ... */)?;
//! mirror.sync_and_notify(edits.graph(), &edit)?;
//! ```
//!
//! # Real-time rules
//!
//! Nothing reachable from [`RenderContext::process`] locks, blocks, logs or
//! allocates. Dropped client messages are counted atomically and reported
//! with `tracing::warn!` from the edit side.

pub mod channel;
pub mod clock;
mod error;
pub mod mirror;
pub mod protocol;
pub mod render;
pub mod snapshot;

pub use channel::{DEFAULT_RETENTION, SnapshotChannel, SnapshotReader};
pub use clock::{ClockProbe, ClockValidator, DEFAULT_WINDOW, LatencyStats, Reading};
pub use error::BridgeError;
pub use mirror::GraphMirror;
pub use protocol::{ClientMessage, DEFAULT_CLIENT_CAPACITY, EditEndpoint, EngineCommand, EngineLink, RenderEndpoint};
pub use render::{MAX_SCHEDULED, RenderContext};
pub use snapshot::{DeviceState, FileState, RegionContent, RegionState, RenderSnapshot, UnitState};
