//! Keeps the snapshot channel in step with a graph.

use std::cell::Cell;
use std::rc::Rc;

use partita_core::{Graph, Subscription};
use tracing::debug;

use crate::channel::{SnapshotChannel, SnapshotReader};
use crate::error::BridgeError;
use crate::protocol::{EditEndpoint, EngineCommand};
use crate::snapshot::RenderSnapshot;

/// Edit-thread observer that republishes the render snapshot after commits.
///
/// The mirror subscribes to every committed event and only marks itself
/// dirty; the projection runs in [`sync`](Self::sync), so a burst of
/// transactions between two UI frames costs one snapshot.
pub struct GraphMirror {
    channel: SnapshotChannel,
    dirty: Rc<Cell<bool>>,
    events: Rc<Cell<u64>>,
    _subscription: Subscription,
}

impl GraphMirror {
    /// Captures `graph` and starts observing it.
    pub fn attach(graph: &Graph, retention: usize) -> Result<Self, BridgeError> {
        let channel = SnapshotChannel::with_retention(RenderSnapshot::capture(graph)?, retention);
        let dirty = Rc::new(Cell::new(false));
        let events = Rc::new(Cell::new(0));
        let subscription = {
            let dirty = Rc::clone(&dirty);
            let events = Rc::clone(&events);
            graph.subscribe_all(move |_| {
                dirty.set(true);
                events.set(events.get() + 1);
            })
        };
        Ok(Self {
            channel,
            dirty,
            events,
            _subscription: subscription,
        })
    }

    /// Handle for the render thread.
    pub fn reader(&self) -> SnapshotReader {
        self.channel.reader()
    }

    /// The publishing side.
    pub fn channel(&self) -> &SnapshotChannel {
        &self.channel
    }

    /// `true` if the graph changed since the last publish.
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Committed events observed so far.
    pub fn events_seen(&self) -> u64 {
        self.events.get()
    }

    /// Publishes a fresh snapshot if the graph changed. `graph` must be the
    /// graph the mirror was attached to. Returns the new generation.
    pub fn sync(&mut self, graph: &Graph) -> Result<Option<u64>, BridgeError> {
        if !self.dirty.get() {
            return Ok(None);
        }
        let snapshot = RenderSnapshot::capture(graph)?;
        let revision = snapshot.revision;
        let generation = self.channel.publish(snapshot);
        self.dirty.set(false);
        debug!("published snapshot generation {generation} at revision {revision}");
        Ok(Some(generation))
    }

    /// [`sync`](Self::sync), then tells the render thread about the new
    /// generation.
    pub fn sync_and_notify(&mut self, graph: &Graph, link: &EditEndpoint) -> Result<Option<u64>, BridgeError> {
        let published = self.sync(graph)?;
        if let Some(generation) = published {
            link.send(EngineCommand::ReplaceSnapshot { generation })?;
        }
        Ok(published)
    }
}

impl core::fmt::Debug for GraphMirror {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GraphMirror")
            .field("channel", &self.channel)
            .field("dirty", &self.dirty.get())
            .field("events", &self.events.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partita_core::Address;
    use partita_schema::keys::audio_unit;
    use partita_schema::{project, registry};

    #[test]
    fn publishes_only_after_commits() {
        let (mut graph, root) = project::new_project(registry().unwrap()).unwrap();
        let mut mirror = GraphMirror::attach(&graph, 2).unwrap();
        let reader = mirror.reader();
        assert_eq!(mirror.sync(&graph).unwrap(), None);

        let (unit, _) = graph.transaction(|g| project::add_audio_unit(g, root, "Bass")).unwrap();
        graph
            .transaction(|g| g.set_value(&Address::compose(unit).append(audio_unit::VOLUME), 0.5f32))
            .unwrap();
        assert!(mirror.is_dirty());
        assert_eq!(mirror.sync(&graph).unwrap(), Some(1));
        assert!(!mirror.is_dirty());
        assert_eq!(reader.load().unit(unit).map(|u| u.volume), Some(0.5));
        assert_eq!(reader.load().revision, graph.revision());
    }

    #[test]
    fn aborted_transactions_are_invisible() {
        let (mut graph, root) = project::new_project(registry().unwrap()).unwrap();
        let mut mirror = GraphMirror::attach(&graph, 2).unwrap();
        graph.begin_transaction().unwrap();
        project::add_audio_unit(&mut graph, root, "Temp").unwrap();
        graph.abort_transaction().unwrap();
        assert!(!mirror.is_dirty());
        assert_eq!(mirror.sync(&graph).unwrap(), None);
    }

    #[test]
    fn dropping_the_mirror_unsubscribes() {
        let (graph, _) = project::new_project(registry().unwrap()).unwrap();
        let before = graph.subscriber_count();
        let mirror = GraphMirror::attach(&graph, 1).unwrap();
        assert_eq!(graph.subscriber_count(), before + 1);
        drop(mirror);
        assert_eq!(graph.subscriber_count(), before);
    }
}
