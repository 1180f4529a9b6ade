//! Change notification.
//!
//! Events are derived from the operations of a committed transaction and
//! delivered after the commit, so observers only ever see complete states.
//! Subscriptions are scoped: a field subscriber only hears about changes at
//! or below its address, a deletion subscriber only about its entity.
//! Dropping the [`Subscription`] handle stops delivery, immediately if the
//! registry is free and otherwise at the end of the current dispatch.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::{Rc, Weak};

use crate::address::{Address, EntityId};
use crate::txn::Op;
use crate::value::Value;

/// What happened to a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldChange {
    /// A primitive value changed.
    Value {
        /// Value before.
        old: Value,
        /// Value after.
        new: Value,
    },
    /// A pointer was retargeted or cleared.
    Pointer {
        /// Target before.
        old: Option<Address>,
        /// Target after.
        new: Option<Address>,
    },
    /// An element was appended to the array.
    ElementAdded,
    /// The last element of the array was removed.
    ElementRemoved,
}

/// A committed change.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    /// A node was created.
    Created(EntityId),
    /// A node was deleted.
    Deleted(EntityId),
    /// A field of a live node changed.
    FieldChanged {
        /// Field address.
        address: Address,
        /// The change.
        change: FieldChange,
    },
}

impl GraphEvent {
    /// Entity the event concerns.
    pub fn entity(&self) -> EntityId {
        match self {
            GraphEvent::Created(id) | GraphEvent::Deleted(id) => *id,
            GraphEvent::FieldChanged { address, .. } => address.entity(),
        }
    }
}

#[derive(Debug, Clone)]
enum Scope {
    All,
    Field(Address),
    Deletion(EntityId),
}

impl Scope {
    fn matches(&self, event: &GraphEvent) -> bool {
        match (self, event) {
            (Scope::All, _) => true,
            (Scope::Field(scope), GraphEvent::FieldChanged { address, .. }) => address.is_within(scope),
            (Scope::Deletion(scope), GraphEvent::Deleted(id)) => scope == id,
            _ => false,
        }
    }
}

type Handler = Rc<RefCell<dyn FnMut(&GraphEvent)>>;

#[derive(Default)]
struct ObserverTable {
    next_id: u64,
    entries: BTreeMap<u64, (Scope, Handler)>,
}

#[derive(Default)]
struct Registry {
    table: RefCell<ObserverTable>,
    /// Cancellations that arrived while `table` was borrowed.
    cancelled: RefCell<BTreeSet<u64>>,
    dispatching: Cell<bool>,
}

impl Registry {
    fn cancel(&self, id: u64) {
        match self.table.try_borrow_mut() {
            Ok(mut table) if !self.dispatching.get() => {
                table.entries.remove(&id);
            }
            _ => {
                self.cancelled.borrow_mut().insert(id);
            }
        }
    }

    fn is_live(&self, id: u64) -> bool {
        !self.cancelled.borrow().contains(&id) && self.table.borrow().entries.contains_key(&id)
    }

    fn sweep(&self) {
        let cancelled = std::mem::take(&mut *self.cancelled.borrow_mut());
        if cancelled.is_empty() {
            return;
        }
        let mut table = self.table.borrow_mut();
        for id in cancelled {
            table.entries.remove(&id);
        }
    }
}

/// Subscriber registry shared between a graph and its subscription handles.
#[derive(Clone, Default)]
pub(crate) struct Observers(Rc<Registry>);

impl Observers {
    fn add(&self, scope: Scope, handler: Handler) -> Subscription {
        let mut table = self.0.table.borrow_mut();
        let id = table.next_id;
        table.next_id += 1;
        table.entries.insert(id, (scope, handler));
        Subscription {
            registry: Rc::downgrade(&self.0),
            id,
        }
    }

    pub(crate) fn field<F>(&self, address: Address, handler: F) -> Subscription
    where
        F: FnMut(&GraphEvent) + 'static,
    {
        self.add(Scope::Field(address), Rc::new(RefCell::new(handler)))
    }

    pub(crate) fn deletion<F>(&self, entity: EntityId, handler: F) -> Subscription
    where
        F: FnMut(&GraphEvent) + 'static,
    {
        self.add(Scope::Deletion(entity), Rc::new(RefCell::new(handler)))
    }

    pub(crate) fn all<F>(&self, handler: F) -> Subscription
    where
        F: FnMut(&GraphEvent) + 'static,
    {
        self.add(Scope::All, Rc::new(RefCell::new(handler)))
    }

    pub(crate) fn len(&self) -> usize {
        let pending = self.0.cancelled.borrow();
        let table = self.0.table.borrow();
        table.entries.keys().filter(|id| !pending.contains(id)).count()
    }

    pub(crate) fn dispatch(&self, events: &[GraphEvent]) {
        // Nested dispatch from inside a handler leaves the sweep to the outer call.
        let outer = !self.0.dispatching.replace(true);
        for event in events {
            let targets: Vec<(u64, Handler)> = self
                .0
                .table
                .borrow()
                .entries
                .iter()
                .filter(|(_, (scope, _))| scope.matches(event))
                .map(|(id, (_, handler))| (*id, Rc::clone(handler)))
                .collect();
            for (id, handler) in targets {
                // An earlier handler may have cancelled this one.
                if !self.0.is_live(id) {
                    continue;
                }
                if let Ok(mut handler) = handler.try_borrow_mut() {
                    (&mut *handler)(event);
                }
            }
        }
        if outer {
            self.0.dispatching.set(false);
            self.0.sweep();
        }
    }
}

/// Handle of an active subscription. Dropping it cancels delivery.
#[must_use = "dropping a subscription cancels it"]
pub struct Subscription {
    registry: Weak<Registry>,
    id: u64,
}

impl Subscription {
    /// Cancels the subscription.
    pub fn cancel(self) {}

    /// `true` while the subscription can still receive events.
    pub fn is_active(&self) -> bool {
        self.registry.upgrade().is_some_and(|registry| registry.is_live(self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.cancel(self.id);
        }
    }
}

impl core::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Events for a committed list of operations.
///
/// Nodes created and deleted within the same transaction produce nothing,
/// and field changes of nodes that did not survive the commit are dropped.
pub(crate) fn events_for(ops: &[Op], is_live: impl Fn(EntityId) -> bool) -> Vec<GraphEvent> {
    let created: BTreeSet<EntityId> = ops
        .iter()
        .filter_map(|op| match op {
            Op::CreateNode(node) => Some(node.id()),
            _ => None,
        })
        .collect();
    let mut deleted = BTreeSet::new();
    let mut events = Vec::new();
    for op in ops {
        match op {
            Op::CreateNode(node) => {
                if is_live(node.id()) {
                    events.push(GraphEvent::Created(node.id()));
                }
            }
            Op::DeleteNode(node) => {
                let id = node.id();
                if !created.contains(&id) && !is_live(id) && deleted.insert(id) {
                    events.push(GraphEvent::Deleted(id));
                }
            }
            Op::SetValue { address, old, new } => {
                if is_live(address.entity()) {
                    events.push(GraphEvent::FieldChanged {
                        address: address.clone(),
                        change: FieldChange::Value {
                            old: old.clone(),
                            new: new.clone(),
                        },
                    });
                }
            }
            Op::SetPointer { address, old, new } => {
                if is_live(address.entity()) {
                    events.push(GraphEvent::FieldChanged {
                        address: address.clone(),
                        change: FieldChange::Pointer {
                            old: old.clone(),
                            new: new.clone(),
                        },
                    });
                }
            }
            Op::PushElement { address, .. } => {
                if is_live(address.entity()) {
                    events.push(GraphEvent::FieldChanged {
                        address: address.clone(),
                        change: FieldChange::ElementAdded,
                    });
                }
            }
            Op::PopElement { address, .. } => {
                if is_live(address.entity()) {
                    events.push(GraphEvent::FieldChanged {
                        address: address.clone(),
                        change: FieldChange::ElementRemoved,
                    });
                }
            }
        }
    }
    events
}
