//! Command and client message channels between edit and render threads.
//!
//! Commands flow edit → render over an unbounded channel: the edit thread
//! may allocate, and the render thread drains with `try_recv`, so neither
//! side ever blocks. Client messages flow render → edit over a bounded
//! channel with `try_send`; when it is full the message is dropped and
//! counted, because the render thread must not wait or allocate. The edit
//! side reports drops when it next drains.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use partita_core::EntityId;
use tracing::warn;

use crate::error::BridgeError;

/// Client messages buffered before the render side starts dropping.
pub const DEFAULT_CLIENT_CAPACITY: usize = 64;

/// Edit → render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCommand {
    /// Start the transport.
    Play,
    /// Stop the transport.
    Stop,
    /// Move the playhead, in ticks.
    SetPosition(i64),
    /// Start `region` when the playhead reaches `at` ticks.
    ScheduleClipPlay {
        /// Region to start.
        region: EntityId,
        /// Start time in ticks.
        at: i64,
    },
    /// A new snapshot generation is published; reload it and drop
    /// schedules for regions that no longer exist.
    ReplaceSnapshot {
        /// Generation published on the snapshot channel.
        generation: u64,
    },
}

/// Render → edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMessage {
    /// The engine needs sample data for a file.
    FetchAudio {
        /// File node id.
        file: EntityId,
    },
    /// The engine adopted a snapshot taken at this graph revision.
    NotifyChanges {
        /// Graph revision.
        revision: u64,
    },
    /// The render loop is running.
    Ready,
    /// Playhead position in ticks.
    Position(i64),
}

/// A connected pair of endpoints. Keep the edit endpoint on the edit thread
/// and move the render endpoint to the render thread.
#[derive(Debug)]
pub struct EngineLink {
    /// Edit-thread side.
    pub edit: EditEndpoint,
    /// Render-thread side.
    pub render: RenderEndpoint,
}

impl EngineLink {
    /// Link with the default client capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CLIENT_CAPACITY)
    }

    /// Link buffering at most `capacity` client messages.
    pub fn with_capacity(capacity: usize) -> Self {
        let (command_tx, command_rx) = unbounded();
        let (client_tx, client_rx) = bounded(capacity);
        let dropped = Arc::new(AtomicU64::new(0));
        Self {
            edit: EditEndpoint {
                commands: command_tx,
                client: client_rx,
                dropped: Arc::clone(&dropped),
                reported: 0,
            },
            render: RenderEndpoint {
                commands: command_rx,
                client: client_tx,
                dropped,
            },
        }
    }

    /// Separates the two endpoints.
    pub fn split(self) -> (EditEndpoint, RenderEndpoint) {
        (self.edit, self.render)
    }
}

impl Default for EngineLink {
    fn default() -> Self {
        Self::new()
    }
}

/// Edit side of an [`EngineLink`].
#[derive(Debug)]
pub struct EditEndpoint {
    commands: Sender<EngineCommand>,
    client: Receiver<ClientMessage>,
    dropped: Arc<AtomicU64>,
    reported: u64,
}

impl EditEndpoint {
    /// Queues a command for the render thread (non-blocking).
    pub fn send(&self, command: EngineCommand) -> Result<(), BridgeError> {
        self.commands.send(command).map_err(|_| BridgeError::Disconnected)
    }

    /// Takes every pending client message.
    pub fn drain(&mut self) -> Vec<ClientMessage> {
        let messages: Vec<ClientMessage> = self.client.try_iter().collect();
        let dropped = self.dropped.load(Ordering::Relaxed);
        if dropped > self.reported {
            warn!(
                "render side dropped {} client message(s), {dropped} total",
                dropped - self.reported
            );
            self.reported = dropped;
        }
        messages
    }

    /// Client messages the render side had to drop so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Render side of an [`EngineLink`]. Never blocks, never allocates.
#[derive(Debug)]
pub struct RenderEndpoint {
    commands: Receiver<EngineCommand>,
    client: Sender<ClientMessage>,
    dropped: Arc<AtomicU64>,
}

impl RenderEndpoint {
    /// Next pending command, if any.
    #[inline]
    pub fn try_command(&self) -> Option<EngineCommand> {
        self.commands.try_recv().ok()
    }

    /// Sends a client message, dropping it if the queue is full.
    /// Returns `false` when the message was dropped.
    #[inline]
    pub fn notify(&self, message: ClientMessage) -> bool {
        if self.client.try_send(message).is_ok() {
            true
        } else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            false
        }
    }
}
