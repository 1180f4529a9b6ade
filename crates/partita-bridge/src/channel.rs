//! Single-producer snapshot handoff.
//!
//! The edit thread publishes complete [`RenderSnapshot`]s; the render thread
//! loads whichever one is current without blocking or allocating. A reader
//! that finds nothing new simply keeps rendering the last snapshot it saw.
//!
//! Replaced snapshots are parked in a small retention ring on the edit side.
//! A render thread still holding a guard to an old snapshot therefore never
//! ends up dropping the last reference, which would free memory on the
//! audio thread.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::{ArcSwap, Guard};

use crate::snapshot::RenderSnapshot;

/// Snapshots kept alive on the edit side after being replaced.
pub const DEFAULT_RETENTION: usize = 4;

struct Shared {
    current: ArcSwap<RenderSnapshot>,
    generation: AtomicU64,
}

/// Edit-side publisher.
pub struct SnapshotChannel {
    shared: Arc<Shared>,
    retained: VecDeque<Arc<RenderSnapshot>>,
    retention: usize,
}

impl SnapshotChannel {
    /// Channel starting at `initial` with the default retention.
    pub fn new(initial: RenderSnapshot) -> Self {
        Self::with_retention(initial, DEFAULT_RETENTION)
    }

    /// Channel keeping the last `retention` replaced snapshots alive.
    pub fn with_retention(initial: RenderSnapshot, retention: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                current: ArcSwap::from_pointee(initial),
                generation: AtomicU64::new(0),
            }),
            retained: VecDeque::with_capacity(retention + 1),
            retention,
        }
    }

    /// Makes `snapshot` current. Returns the new generation.
    pub fn publish(&mut self, snapshot: RenderSnapshot) -> u64 {
        let previous = self.shared.current.swap(Arc::new(snapshot));
        self.retained.push_back(previous);
        while self.retained.len() > self.retention {
            self.retained.pop_front();
        }
        self.shared.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Handle for the render thread.
    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            shared: Arc::clone(&self.shared),
        }
    }

    /// The current snapshot.
    pub fn latest(&self) -> Arc<RenderSnapshot> {
        self.shared.current.load_full()
    }

    /// Number of publishes so far.
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::Acquire)
    }

    /// Number of replaced snapshots still held.
    pub fn retained(&self) -> usize {
        self.retained.len()
    }

    /// Retention capacity.
    pub fn retention(&self) -> usize {
        self.retention
    }
}

impl core::fmt::Debug for SnapshotChannel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SnapshotChannel")
            .field("generation", &self.generation())
            .field("retained", &self.retained.len())
            .field("retention", &self.retention)
            .finish()
    }
}

/// Render-side handle. Cheap to clone, `Send`, never blocks.
#[derive(Clone)]
pub struct SnapshotReader {
    shared: Arc<Shared>,
}

impl SnapshotReader {
    /// Wait-free access to the current snapshot.
    #[inline]
    pub fn load(&self) -> Guard<Arc<RenderSnapshot>> {
        self.shared.current.load()
    }

    /// Generation of the current snapshot.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::Acquire)
    }
}

impl core::fmt::Debug for SnapshotReader {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SnapshotReader")
            .field("generation", &self.generation())
            .finish()
    }
}
