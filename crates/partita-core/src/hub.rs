//! Reverse index of pointers per target address.

use std::collections::BTreeSet;

use crate::address::Address;
use crate::schema::{AcceptSet, PointerTag};

/// Incoming pointers of one target-capable address.
///
/// The hub is a derived cache: its set always equals the addresses of live
/// pointer fields resolving to this target. The graph updates it in the same
/// step that sets, clears, creates, or destroys a pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointerHub {
    accepts: AcceptSet,
    incoming: BTreeSet<Address>,
}

impl PointerHub {
    /// Empty hub accepting `accepts`.
    pub fn new(accepts: AcceptSet) -> Self {
        Self {
            accepts,
            incoming: BTreeSet::new(),
        }
    }

    /// Tags this target accepts.
    pub fn accepts(&self) -> AcceptSet {
        self.accepts
    }

    /// `true` if a pointer with `tag` may target this address.
    pub fn accepts_tag(&self, tag: PointerTag) -> bool {
        self.accepts.contains(tag)
    }

    /// Incoming pointer addresses in address order.
    pub fn incoming(&self) -> impl Iterator<Item = &Address> {
        self.incoming.iter()
    }

    /// Number of incoming pointers.
    pub fn len(&self) -> usize {
        self.incoming.len()
    }

    /// `true` if nothing points here.
    pub fn is_empty(&self) -> bool {
        self.incoming.is_empty()
    }

    /// `true` if `pointer` targets this hub.
    pub fn contains(&self, pointer: &Address) -> bool {
        self.incoming.contains(pointer)
    }

    pub(crate) fn link(&mut self, pointer: Address) {
        self.incoming.insert(pointer);
    }

    pub(crate) fn unlink(&mut self, pointer: &Address) {
        self.incoming.remove(pointer);
    }
}
