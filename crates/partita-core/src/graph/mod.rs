//! The document graph.
//!
//! [`Graph`] owns every [`Node`] in a flat table keyed by [`EntityId`], plus
//! one [`PointerHub`] per pointer-target address. Pointers are plain
//! [`Address`] values looked up on demand, so reference cycles between nodes
//! need no special ownership handling.
//!
//! # Transactions
//!
//! All mutation happens between [`begin_transaction`](Graph::begin_transaction)
//! and [`end_transaction`](Graph::end_transaction). Each mutation is checked
//! before it touches anything, applied immediately, and logged as an [`Op`].
//! Commit validates the mandatory pointers of every node the transaction
//! touched; on failure every logged op is reverted and the graph is exactly
//! as it was before `begin_transaction`. Observers hear about a transaction
//! only after it committed.
//!
//! ```rust,ignore
//! graph.begin_transaction()?;
//! let track = graph.create(TRACK)?;
//! graph.set_target(&Address::compose(track).append(OWNER), &unit_tracks)?;
//! graph.set_value(&Address::compose(track).append(INDEX), 3)?;
//! let record = graph.end_transaction()?;
//! ```
//!
//! Nesting is not supported: a second `begin_transaction` fails with
//! [`StateError::NestedTransaction`].

mod delete;
mod dependencies;
pub(crate) mod events;

pub use dependencies::{Dependencies, DependencyOptions};
pub use events::{FieldChange, GraphEvent, Subscription};

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::address::{Address, EntityId, FieldKey};
use crate::codec::DecodeError;
use crate::error::{GraphError, IntegrityError, StateError};
use crate::field::{Field, PointerField};
use crate::hub::PointerHub;
use crate::node::Node;
use crate::schema::{ClassId, ClassSchema, FieldSchema, FieldType, PointerTag, SchemaRegistry};
use crate::txn::{Op, TransactionRecord};
use crate::value::Value;

use events::Observers;

#[derive(Default)]
struct Pending {
    ops: Vec<Op>,
    touched: BTreeSet<EntityId>,
}

/// In-memory, strongly typed, referentially integral object graph.
pub struct Graph {
    registry: Arc<SchemaRegistry>,
    schema_version: u32,
    nodes: BTreeMap<EntityId, Node>,
    hubs: BTreeMap<Address, PointerHub>,
    pending: Option<Pending>,
    observers: Observers,
    revision: u64,
}

impl Graph {
    /// Empty graph stamped with the registry's current schema version.
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        let version = registry.version();
        Self::with_version(registry, version)
    }

    /// Empty graph stamped with an explicit schema version.
    pub fn with_version(registry: Arc<SchemaRegistry>, schema_version: u32) -> Self {
        Self {
            registry,
            schema_version,
            nodes: BTreeMap::new(),
            hubs: BTreeMap::new(),
            pending: None,
            observers: Observers::default(),
            revision: 0,
        }
    }

    /// Schema registry this graph was built against.
    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// Schema version of the stored data.
    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Stamps a new schema version. Used by the migration engine once a
    /// loaded graph has been brought up to date.
    pub fn set_schema_version(&mut self, version: u32) {
        self.schema_version = version;
    }

    /// Number of committed, non-empty transactions since construction.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // --- queries ---

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// `true` if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// `true` if a node with `id` is live.
    pub fn contains(&self, id: EntityId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Live node by id.
    pub fn node(&self, id: EntityId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Live nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Live nodes of one class in id order.
    pub fn nodes_of_class(&self, class: ClassId) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(move |n| n.class() == class)
    }

    /// Schema of a live node.
    pub fn class_of(&self, id: EntityId) -> Option<&ClassSchema> {
        self.nodes.get(&id).and_then(|n| self.registry.class(n.class()))
    }

    /// Field at `address`.
    pub fn field(&self, address: &Address) -> Option<&Field> {
        self.nodes.get(&address.entity())?.field_at(address.path())
    }

    /// Primitive value at `address`.
    pub fn value(&self, address: &Address) -> Option<&Value> {
        self.field(address).and_then(Field::as_value)
    }

    /// Target of the pointer at `address`.
    pub fn target(&self, address: &Address) -> Option<&Address> {
        self.field(address).and_then(Field::as_pointer).and_then(PointerField::target)
    }

    /// Pointer hub of a target address.
    pub fn hub(&self, address: &Address) -> Option<&PointerHub> {
        self.hubs.get(address)
    }

    /// Pointers currently targeting `address`.
    pub fn incoming(&self, address: &Address) -> Vec<Address> {
        self.hubs
            .get(address)
            .map(|hub| hub.incoming().cloned().collect())
            .unwrap_or_default()
    }

    /// Pointers targeting `id` or any field inside it.
    pub fn incoming_to_node(&self, id: EntityId) -> Vec<Address> {
        self.hubs_within(&Address::compose(id))
            .flat_map(|(_, hub)| hub.incoming().cloned())
            .collect()
    }

    fn hubs_within<'a>(&'a self, scope: &'a Address) -> impl Iterator<Item = (&'a Address, &'a PointerHub)> + 'a {
        self.hubs
            .range(scope.clone()..)
            .take_while(move |(address, _)| address.is_within(scope))
    }

    fn pointer_at(&self, address: &Address) -> Option<&PointerField> {
        self.field(address).and_then(Field::as_pointer)
    }

    fn locate(&self, address: &Address) -> Result<&Field, GraphError> {
        let node = self
            .nodes
            .get(&address.entity())
            .ok_or(GraphError::NodeNotFound(address.entity()))?;
        node.field_at(address.path())
            .ok_or_else(|| GraphError::FieldNotFound(address.clone()))
    }

    fn locate_mut(&mut self, address: &Address) -> Result<&mut Field, GraphError> {
        let node = self
            .nodes
            .get_mut(&address.entity())
            .ok_or(GraphError::NodeNotFound(address.entity()))?;
        node.field_at_mut(address.path())
            .ok_or_else(|| GraphError::FieldNotFound(address.clone()))
    }

    // --- subscriptions ---

    /// Delivers committed changes at or below `address`.
    pub fn subscribe<F>(&self, address: Address, handler: F) -> Subscription
    where
        F: FnMut(&GraphEvent) + 'static,
    {
        self.observers.field(address, handler)
    }

    /// Delivers the deletion of `entity`.
    pub fn subscribe_deletion<F>(&self, entity: EntityId, handler: F) -> Subscription
    where
        F: FnMut(&GraphEvent) + 'static,
    {
        self.observers.deletion(entity, handler)
    }

    /// Delivers every committed event.
    pub fn subscribe_all<F>(&self, handler: F) -> Subscription
    where
        F: FnMut(&GraphEvent) + 'static,
    {
        self.observers.all(handler)
    }

    /// Number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.observers.len()
    }

    // --- transactions ---

    /// Opens a transaction.
    pub fn begin_transaction(&mut self) -> Result<(), StateError> {
        if self.pending.is_some() {
            return Err(StateError::NestedTransaction);
        }
        self.pending = Some(Pending::default());
        Ok(())
    }

    /// `true` while a transaction is open.
    pub fn in_transaction(&self) -> bool {
        self.pending.is_some()
    }

    /// Validates and commits the open transaction.
    ///
    /// Every live node touched by the transaction must have all mandatory
    /// pointers resolved. Otherwise the transaction is rolled back and an
    /// [`IntegrityError`] is returned.
    pub fn end_transaction(&mut self) -> Result<TransactionRecord, GraphError> {
        let pending = self.pending.take().ok_or(StateError::NoTransaction)?;
        if let Err(err) = self.validate_touched(&pending.touched) {
            #[cfg(feature = "tracing")]
            tracing::debug!("transaction rolled back: {err}");
            self.revert(&pending.ops);
            return Err(err.into());
        }
        let record = TransactionRecord::new(pending.ops);
        if !record.is_empty() {
            self.revision += 1;
            #[cfg(feature = "tracing")]
            tracing::debug!(
                "transaction committed: {} ops, revision {}",
                record.len(),
                self.revision
            );
            let events = events::events_for(record.ops(), |id| self.nodes.contains_key(&id));
            self.observers.dispatch(&events);
        }
        Ok(record)
    }

    /// Reverts everything done since `begin_transaction`. No events are emitted.
    pub fn abort_transaction(&mut self) -> Result<(), StateError> {
        let pending = self.pending.take().ok_or(StateError::NoTransaction)?;
        self.revert(&pending.ops);
        #[cfg(feature = "tracing")]
        tracing::debug!("transaction aborted: {} ops reverted", pending.ops.len());
        Ok(())
    }

    /// Runs `f` inside a transaction: commits on success, aborts on error.
    pub fn transaction<R, F>(&mut self, f: F) -> Result<(R, TransactionRecord), GraphError>
    where
        F: FnOnce(&mut Graph) -> Result<R, GraphError>,
    {
        self.begin_transaction()?;
        match f(self) {
            Ok(value) => Ok((value, self.end_transaction()?)),
            Err(err) => {
                self.abort_transaction()?;
                Err(err)
            }
        }
    }

    fn require_transaction(&self) -> Result<(), StateError> {
        if self.pending.is_some() {
            Ok(())
        } else {
            Err(StateError::NoTransaction)
        }
    }

    fn validate_touched(&self, touched: &BTreeSet<EntityId>) -> Result<(), IntegrityError> {
        for id in touched {
            if let Some(node) = self.nodes.get(id) {
                for (address, pointer) in node.pointers() {
                    match pointer.target() {
                        None if pointer.is_mandatory() => return Err(IntegrityError::MandatoryUnset(address)),
                        Some(target) if !self.hubs.contains_key(target) => {
                            return Err(IntegrityError::Dangling {
                                pointer: address,
                                target: target.clone(),
                            });
                        }
                        _ => {}
                    }
                }
            }
        }
        Ok(())
    }

    fn revert(&mut self, ops: &[Op]) {
        for op in ops.iter().rev() {
            // Inverses of ops that were just applied always succeed.
            if let Err(_err) = self.apply_op(&op.inverse()) {
                #[cfg(feature = "tracing")]
                tracing::debug!("revert of {} failed: {_err}", op.address());
            }
        }
    }

    /// Applies and logs `op` in the open transaction.
    fn record(&mut self, op: Op) -> Result<(), GraphError> {
        self.require_transaction()?;
        self.apply_op(&op)?;
        if let Some(pending) = self.pending.as_mut() {
            pending.touched.insert(op.address().entity());
            pending.ops.push(op);
        }
        Ok(())
    }

    // --- mutation ---

    /// Creates a node of `class` at `id` with all fields defaulted.
    pub fn create_node(&mut self, class: ClassId, id: EntityId) -> Result<EntityId, GraphError> {
        self.require_transaction()?;
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateAddress(id));
        }
        let schema = self.registry.class(class).ok_or(GraphError::UnknownClass(class.0))?;
        let node = Node::new(id, schema);
        #[cfg(feature = "tracing")]
        tracing::debug!("create_node: {} {id}", schema.name);
        self.record(Op::CreateNode(Box::new(node)))?;
        Ok(id)
    }

    /// Creates a node of `class` under a freshly generated id.
    pub fn create(&mut self, class: ClassId) -> Result<EntityId, GraphError> {
        self.create_node(class, EntityId::generate())
    }

    /// Inserts a fully built node whose pointers are all unset.
    pub(crate) fn insert_node(&mut self, node: Node) -> Result<(), GraphError> {
        self.require_transaction()?;
        if self.nodes.contains_key(&node.id()) {
            return Err(GraphError::DuplicateAddress(node.id()));
        }
        self.record(Op::CreateNode(Box::new(node)))
    }

    /// Assigns a primitive value.
    pub fn set_value(&mut self, address: &Address, value: impl Into<Value>) -> Result<(), GraphError> {
        self.require_transaction()?;
        let value = value.into();
        let old = match self.locate(address)? {
            Field::Primitive(old) if old.kind() == value.kind() => old.clone(),
            Field::Primitive(old) => {
                return Err(GraphError::type_mismatch(address, old.kind().name(), value.kind().name()));
            }
            other => return Err(GraphError::type_mismatch(address, "primitive", other.kind_name())),
        };
        if old == value {
            return Ok(());
        }
        self.record(Op::SetValue {
            address: address.clone(),
            old,
            new: value,
        })
    }

    /// Points the pointer at `address` to `target`.
    ///
    /// Fails with [`IntegrityError`] if `target` is not a live pointer target
    /// or does not accept the pointer's tag. The graph is unchanged on error.
    pub fn set_target(&mut self, address: &Address, target: &Address) -> Result<(), GraphError> {
        self.require_transaction()?;
        let old = self.current_target(address)?;
        if old.as_ref() == Some(target) {
            return Ok(());
        }
        self.record(Op::SetPointer {
            address: address.clone(),
            old,
            new: Some(target.clone()),
        })
    }

    /// Clears the pointer at `address`.
    ///
    /// Clearing a mandatory pointer is a staging step: the transaction must
    /// retarget it or delete its owner before commit.
    pub fn clear_pointer(&mut self, address: &Address) -> Result<(), GraphError> {
        self.require_transaction()?;
        let old = self.current_target(address)?;
        if old.is_none() {
            return Ok(());
        }
        self.record(Op::SetPointer {
            address: address.clone(),
            old,
            new: None,
        })
    }

    fn current_target(&self, address: &Address) -> Result<Option<Address>, GraphError> {
        match self.locate(address)? {
            Field::Pointer(pointer) => Ok(pointer.target().cloned()),
            other => Err(GraphError::type_mismatch(address, "pointer", other.kind_name())),
        }
    }

    /// Appends a defaulted element to the array at `address` and returns the
    /// new element's address.
    pub fn push_element(&mut self, address: &Address) -> Result<Address, GraphError> {
        self.require_transaction()?;
        let len = match self.locate(address)? {
            Field::Array(array) => array.len(),
            other => return Err(GraphError::type_mismatch(address, "array", other.kind_name())),
        };
        if len >= usize::from(FieldKey::MAX) {
            return Err(GraphError::ArrayFull(address.clone()));
        }
        let element = self.element_schema(address)?.instantiate();
        self.record(Op::PushElement {
            address: address.clone(),
            element,
        })?;
        Ok(address.append(len as FieldKey))
    }

    /// Removes the last element of the array at `address`.
    ///
    /// Returns `false` if the array was empty. Fails with [`IntegrityError`]
    /// while a pointer from outside the element targets it.
    pub fn pop_element(&mut self, address: &Address) -> Result<bool, GraphError> {
        self.require_transaction()?;
        let element = match self.locate(address)? {
            Field::Array(array) => match array.iter().last() {
                Some(last) => last.clone(),
                None => return Ok(false),
            },
            other => return Err(GraphError::type_mismatch(address, "array", other.kind_name())),
        };
        self.record(Op::PopElement {
            address: address.clone(),
            element,
        })?;
        Ok(true)
    }

    /// Replays `record` in the open transaction.
    ///
    /// Used by undo/redo with the inverse of a committed record.
    pub fn apply(&mut self, record: &TransactionRecord) -> Result<(), GraphError> {
        self.require_transaction()?;
        for op in record.ops() {
            self.record(op.clone())?;
        }
        Ok(())
    }

    fn element_schema(&self, array: &Address) -> Result<&FieldSchema, GraphError> {
        let class = self
            .class_of(array.entity())
            .ok_or(GraphError::NodeNotFound(array.entity()))?;
        match class.field_schema(array.path()).map(|s| &s.ty) {
            Some(FieldType::Array { element, .. }) => Ok(element),
            _ => Err(GraphError::FieldNotFound(array.clone())),
        }
    }

    // --- checked primitive application ---

    /// Applies one op after checking its preconditions. Does not log.
    fn apply_op(&mut self, op: &Op) -> Result<(), GraphError> {
        match op {
            Op::CreateNode(node) => self.attach_node((**node).clone()),
            Op::DeleteNode(node) => self.detach_node(node.id()).map(drop),
            Op::SetValue { address, new, .. } => {
                let field = self.locate_mut(address)?;
                match field {
                    Field::Primitive(value) if value.kind() == new.kind() => {
                        *value = new.clone();
                        Ok(())
                    }
                    other => Err(GraphError::type_mismatch(address, new.kind().name(), other.kind_name())),
                }
            }
            Op::SetPointer { address, new, .. } => self.retarget(address, new.clone()),
            Op::PushElement { address, element } => self.attach_element(address, element.clone()),
            Op::PopElement { address, .. } => self.detach_element(address).map(drop),
        }
    }

    fn check_target(&self, pointer: &Address, tag: PointerTag, target: &Address) -> Result<(), IntegrityError> {
        let hub = self.hubs.get(target).ok_or_else(|| IntegrityError::NotATarget {
            pointer: pointer.clone(),
            target: target.clone(),
        })?;
        if !hub.accepts_tag(tag) {
            return Err(IntegrityError::TagRejected {
                pointer: pointer.clone(),
                target: target.clone(),
                tag: tag.0,
            });
        }
        Ok(())
    }

    fn retarget(&mut self, address: &Address, new: Option<Address>) -> Result<(), GraphError> {
        let rule = match self.locate(address)? {
            Field::Pointer(pointer) => *pointer.rule(),
            other => return Err(GraphError::type_mismatch(address, "pointer", other.kind_name())),
        };
        if let Some(target) = &new {
            self.check_target(address, rule.tag, target)?;
        }
        let Field::Pointer(pointer) = self.locate_mut(address)? else {
            return Err(GraphError::FieldNotFound(address.clone()));
        };
        let old = pointer.replace_target(new.clone());
        if let Some(old) = old {
            if let Some(hub) = self.hubs.get_mut(&old) {
                hub.unlink(address);
            }
        }
        if let Some(target) = new {
            if let Some(hub) = self.hubs.get_mut(&target) {
                hub.link(address.clone());
            }
        }
        Ok(())
    }

    /// Inserts a node, creates its hubs, and links its set pointers.
    fn attach_node(&mut self, node: Node) -> Result<(), GraphError> {
        let id = node.id();
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateAddress(id));
        }
        let schema = self
            .registry
            .class(node.class())
            .ok_or(GraphError::UnknownClass(node.class().0))?;
        let targets = schema.targets(&node.address(), node.field_table());
        let outgoing = node.outgoing();
        for (address, accepts) in targets {
            self.hubs.insert(address, PointerHub::new(accepts));
        }
        self.nodes.insert(id, node);
        if let Err(err) = self.link_all(&outgoing) {
            self.unlink_all(&outgoing);
            self.drop_hubs_within(&Address::compose(id));
            self.nodes.remove(&id);
            return Err(err.into());
        }
        Ok(())
    }

    /// Removes a node that no outside pointer targets.
    fn detach_node(&mut self, id: EntityId) -> Result<Node, GraphError> {
        let scope = Address::compose(id);
        let node = self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))?;
        if let Some(pointer) = self
            .hubs_within(&scope)
            .flat_map(|(_, hub)| hub.incoming())
            .find(|p| p.entity() != id)
        {
            return Err(IntegrityError::DeletionRejected {
                target: id,
                pointer: pointer.clone(),
            }
            .into());
        }
        let outgoing = node.outgoing();
        self.unlink_all(&outgoing);
        self.drop_hubs_within(&scope);
        self.nodes.remove(&id).ok_or(GraphError::NodeNotFound(id))
    }

    fn attach_element(&mut self, array: &Address, element: Field) -> Result<(), GraphError> {
        let element_schema = self.element_schema(array)?.clone();
        let index = match self.locate(array)? {
            Field::Array(a) => a.len(),
            other => return Err(GraphError::type_mismatch(array, "array", other.kind_name())),
        };
        let element_address = array.append(index as FieldKey);
        let mut targets = Vec::new();
        element_schema.collect_targets(&element, &element_address, &mut targets);
        let outgoing = field_outgoing(&element, &element_address);
        if let Field::Array(a) = self.locate_mut(array)? {
            a.push(element);
        }
        for (address, accepts) in targets {
            self.hubs.insert(address, PointerHub::new(accepts));
        }
        if let Err(err) = self.link_all(&outgoing) {
            self.unlink_all(&outgoing);
            self.drop_hubs_within(&element_address);
            if let Field::Array(a) = self.locate_mut(array)? {
                a.pop();
            }
            return Err(err.into());
        }
        Ok(())
    }

    fn detach_element(&mut self, array: &Address) -> Result<Field, GraphError> {
        let len = match self.locate(array)? {
            Field::Array(a) => a.len(),
            other => return Err(GraphError::type_mismatch(array, "array", other.kind_name())),
        };
        let Some(index) = len.checked_sub(1) else {
            return Err(GraphError::FieldNotFound(array.append(0)));
        };
        let element_address = array.append(index as FieldKey);
        if let Some(pointer) = self
            .hubs_within(&element_address)
            .flat_map(|(_, hub)| hub.incoming())
            .find(|p| !p.is_within(&element_address))
        {
            return Err(IntegrityError::ElementTargeted {
                element: element_address.clone(),
                pointer: pointer.clone(),
            }
            .into());
        }
        let element = match self.locate_mut(array)? {
            Field::Array(a) => a.pop(),
            _ => None,
        }
        .ok_or_else(|| GraphError::FieldNotFound(element_address.clone()))?;
        let outgoing = field_outgoing(&element, &element_address);
        self.unlink_all(&outgoing);
        self.drop_hubs_within(&element_address);
        Ok(element)
    }

    fn link_all(&mut self, outgoing: &[(Address, Address)]) -> Result<(), IntegrityError> {
        for (pointer, target) in outgoing {
            let tag = self
                .pointer_at(pointer)
                .map(|p| p.rule().tag)
                .ok_or_else(|| IntegrityError::Dangling {
                    pointer: pointer.clone(),
                    target: target.clone(),
                })?;
            self.check_target(pointer, tag, target)?;
            if let Some(hub) = self.hubs.get_mut(target) {
                hub.link(pointer.clone());
            }
        }
        Ok(())
    }

    fn unlink_all(&mut self, outgoing: &[(Address, Address)]) {
        for (pointer, target) in outgoing {
            if let Some(hub) = self.hubs.get_mut(target) {
                hub.unlink(pointer);
            }
        }
    }

    fn drop_hubs_within(&mut self, scope: &Address) {
        let doomed: Vec<Address> = self.hubs_within(scope).map(|(a, _)| a.clone()).collect();
        for address in doomed {
            self.hubs.remove(&address);
        }
    }

    // --- integrity ---

    /// Re-derives every hub and pointer resolution and reports the first
    /// inconsistency.
    pub fn verify(&self) -> Result<(), IntegrityError> {
        let mut expected: BTreeMap<Address, PointerHub> = BTreeMap::new();
        for node in self.nodes.values() {
            let schema = self
                .registry
                .class(node.class())
                .ok_or_else(|| IntegrityError::HubMismatch(node.address()))?;
            for (address, accepts) in schema.targets(&node.address(), node.field_table()) {
                expected.insert(address, PointerHub::new(accepts));
            }
        }
        for node in self.nodes.values() {
            for (address, pointer) in node.pointers() {
                match pointer.target() {
                    None if pointer.is_mandatory() => return Err(IntegrityError::MandatoryUnset(address)),
                    None => {}
                    Some(target) => {
                        let hub = expected.get_mut(target).ok_or_else(|| IntegrityError::Dangling {
                            pointer: address.clone(),
                            target: target.clone(),
                        })?;
                        if !hub.accepts_tag(pointer.rule().tag) {
                            return Err(IntegrityError::TagRejected {
                                pointer: address,
                                target: target.clone(),
                                tag: pointer.rule().tag.0,
                            });
                        }
                        hub.link(address);
                    }
                }
            }
        }
        if expected.len() != self.hubs.len() {
            let missing = expected
                .keys()
                .find(|a| !self.hubs.contains_key(*a))
                .or_else(|| self.hubs.keys().find(|a| !expected.contains_key(*a)));
            if let Some(address) = missing {
                return Err(IntegrityError::HubMismatch(address.clone()));
            }
        }
        for (address, hub) in &expected {
            if self.hubs.get(address) != Some(hub) {
                return Err(IntegrityError::HubMismatch(address.clone()));
            }
        }
        Ok(())
    }

    /// Builds a graph from decoded nodes, deriving hubs and checking every
    /// pointer.
    pub(crate) fn assemble(
        registry: Arc<SchemaRegistry>,
        schema_version: u32,
        nodes: Vec<Node>,
    ) -> Result<Self, DecodeError> {
        let mut graph = Self::with_version(registry, schema_version);
        let mut outgoing = Vec::new();
        for node in nodes {
            let id = node.id();
            if graph.nodes.contains_key(&id) {
                return Err(DecodeError::DuplicateNode(id));
            }
            let schema = graph
                .registry
                .class(node.class())
                .ok_or(DecodeError::UnknownClass(node.class().0))?;
            for (address, accepts) in schema.targets(&node.address(), node.field_table()) {
                graph.hubs.insert(address, PointerHub::new(accepts));
            }
            outgoing.extend(node.outgoing());
            graph.nodes.insert(id, node);
        }
        graph.link_all(&outgoing)?;
        graph.verify()?;
        Ok(graph)
    }
}

/// Set pointers below `field`, with their targets.
fn field_outgoing(field: &Field, address: &Address) -> Vec<(Address, Address)> {
    let mut out = Vec::new();
    field.walk(address, &mut |a, f| {
        if let Some(target) = f.as_pointer().and_then(PointerField::target) {
            out.push((a.clone(), target.clone()));
        }
    });
    out
}

/// Observational equality: schema version and node table. Hubs are derived
/// and subscriptions are not part of the document.
impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.schema_version == other.schema_version && self.nodes == other.nodes
    }
}

impl core::fmt::Debug for Graph {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Graph")
            .field("schema_version", &self.schema_version)
            .field("nodes", &self.nodes.len())
            .field("hubs", &self.hubs.len())
            .field("in_transaction", &self.pending.is_some())
            .field("revision", &self.revision)
            .finish()
    }
}
