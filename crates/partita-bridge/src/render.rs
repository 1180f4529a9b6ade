//! Render-thread state.

use partita_core::EntityId;

use crate::channel::SnapshotReader;
use crate::clock::ClockProbe;
use crate::protocol::{ClientMessage, EngineCommand, RenderEndpoint};
use crate::snapshot::RegionContent;

/// Scheduled clip starts held without reallocating.
pub const MAX_SCHEDULED: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Scheduled {
    region: EntityId,
    at: i64,
}

/// Everything the audio callback owns.
///
/// Built on the edit thread, then moved to the render thread. Each call to
/// [`process`](Self::process) drains commands, reads the current snapshot
/// and advances the transport; none of it blocks, and allocation only
/// happens up front in [`new`](Self::new).
#[derive(Debug)]
pub struct RenderContext {
    snapshots: SnapshotReader,
    link: RenderEndpoint,
    probe: ClockProbe,
    playing: bool,
    position: i64,
    scheduled: Vec<Scheduled>,
    adopted: u64,
    ready_sent: bool,
    overflowed: u64,
}

impl RenderContext {
    /// Render state over a snapshot reader, a link endpoint and a clock probe.
    pub fn new(snapshots: SnapshotReader, link: RenderEndpoint, probe: ClockProbe) -> Self {
        Self {
            snapshots,
            link,
            probe,
            playing: false,
            position: 0,
            scheduled: Vec::with_capacity(MAX_SCHEDULED),
            adopted: 0,
            ready_sent: false,
            overflowed: 0,
        }
    }

    /// Runs one block of `ticks` length.
    pub fn process(&mut self, ticks: i64) {
        self.probe.begin();
        if !self.ready_sent {
            self.ready_sent = self.link.notify(ClientMessage::Ready);
        }
        while let Some(command) = self.link.try_command() {
            self.apply(command);
        }
        if self.playing {
            let end = self.position.saturating_add(ticks);
            self.start_due(end);
            self.position = end;
            self.link.notify(ClientMessage::Position(self.position));
        }
        self.probe.end();
    }

    fn apply(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::Play => self.playing = true,
            EngineCommand::Stop => self.playing = false,
            EngineCommand::SetPosition(ticks) => self.position = ticks,
            EngineCommand::ScheduleClipPlay { region, at } => {
                if self.scheduled.len() < self.scheduled.capacity() {
                    self.scheduled.push(Scheduled { region, at });
                } else {
                    self.overflowed += 1;
                }
            }
            EngineCommand::ReplaceSnapshot { generation } => {
                let snapshot = self.snapshots.load();
                self.scheduled.retain(|s| snapshot.region(s.region).is_some());
                self.adopted = generation;
                self.link.notify(ClientMessage::NotifyChanges {
                    revision: snapshot.revision,
                });
            }
        }
    }

    /// Starts every scheduled clip due before `end`.
    fn start_due(&mut self, end: i64) {
        let snapshot = self.snapshots.load();
        let mut i = 0;
        while i < self.scheduled.len() {
            let clip = self.scheduled[i];
            if clip.at < end {
                self.scheduled.swap_remove(i);
                let content = snapshot.region(clip.region).map(|r| &r.content);
                if let Some(RegionContent::Audio { file, .. }) = content {
                    self.link.notify(ClientMessage::FetchAudio { file: *file });
                }
            } else {
                i += 1;
            }
        }
    }

    /// `true` while the transport runs.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Playhead in ticks.
    pub fn position(&self) -> i64 {
        self.position
    }

    /// Clip starts waiting for the playhead.
    pub fn scheduled(&self) -> usize {
        self.scheduled.len()
    }

    /// Last snapshot generation adopted through a replace command.
    pub fn adopted_generation(&self) -> u64 {
        self.adopted
    }

    /// Schedules rejected because the queue was full.
    pub fn overflowed(&self) -> u64 {
        self.overflowed
    }
}
