//! Static node schemas and the registry that holds them.
//!
//! A [`ClassSchema`] declares the fixed field layout of one node class. The
//! set of classes is registered once at startup in a [`SchemaRegistry`],
//! which is handed to every [`Graph`](crate::Graph) by reference. There is no
//! global registry.
//!
//! # Pointers and targets
//!
//! Pointer fields carry a [`PointerRule`]: the [`PointerTag`] they present,
//! whether they are mandatory, and what happens to them when their target is
//! deleted ([`OnTargetDeleted`]). Any field, and the node itself, can declare
//! an [`AcceptSet`] of tags; such addresses are pointer targets and get a
//! [`PointerHub`](crate::PointerHub).
//!
//! ```rust
//! use partita_core::{
//!     AcceptSet, ClassId, ClassSchema, FieldSchema, PointerRule, PointerTag, SchemaRegistry,
//! };
//!
//! const OWNER: PointerTag = PointerTag(0);
//!
//! let mut registry = SchemaRegistry::new(1);
//! registry
//!     .register(
//!         ClassSchema::new(ClassId(0), "folder")
//!             .field(FieldSchema::object(1, "children", vec![]).accepting(AcceptSet::of(&[OWNER]))),
//!     )
//!     .unwrap();
//! registry
//!     .register(
//!         ClassSchema::new(ClassId(1), "file")
//!             .field(FieldSchema::pointer(1, "parent", PointerRule::mandatory(OWNER).cascading()))
//!             .field(FieldSchema::primitive(2, "name", "untitled")),
//!     )
//!     .unwrap();
//! assert_eq!(registry.len(), 2);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::address::{Address, FieldKey};
use crate::field::{ArrayField, Field, ObjectField, PointerField};
use crate::value::{PrimitiveKind, Value};

/// Tag presented by a pointer field. Valid tags are `0..64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointerTag(pub u8);

impl PointerTag {
    /// Number of distinct tags an [`AcceptSet`] can hold.
    pub const LIMIT: u8 = 64;
}

/// Set of pointer tags a target accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AcceptSet(u64);

impl AcceptSet {
    /// Accepts nothing; the field is not a pointer target.
    pub const NONE: AcceptSet = AcceptSet(0);

    /// Set containing exactly `tags`.
    pub const fn of(tags: &[PointerTag]) -> Self {
        let mut bits = 0u64;
        let mut i = 0;
        while i < tags.len() {
            bits |= 1u64 << (tags[i].0 % PointerTag::LIMIT);
            i += 1;
        }
        Self(bits)
    }

    /// Returns a copy with `tag` added.
    pub const fn with(self, tag: PointerTag) -> Self {
        Self(self.0 | 1u64 << (tag.0 % PointerTag::LIMIT))
    }

    /// `true` if `tag` is accepted.
    pub const fn contains(self, tag: PointerTag) -> bool {
        tag.0 < PointerTag::LIMIT && self.0 & (1u64 << tag.0) != 0
    }

    /// `true` if no tag is accepted.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Raw bitmask.
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Iterates over the accepted tags in ascending order.
    pub fn iter(self) -> impl Iterator<Item = PointerTag> {
        (0..PointerTag::LIMIT)
            .filter(move |t| self.0 & (1u64 << t) != 0)
            .map(PointerTag)
    }
}

/// What happens to a pointer when its target node is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OnTargetDeleted {
    /// Deleting the target fails with an integrity error.
    Reject,
    /// The pointer is cleared. Only valid for optional pointers.
    Clear,
    /// The node owning the pointer is deleted too (recursively).
    Cascade,
}

/// Declared behaviour of a pointer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerRule {
    /// Tag presented to targets.
    pub tag: PointerTag,
    /// Mandatory pointers must resolve at every commit.
    pub mandatory: bool,
    /// Deletion policy.
    pub on_target_deleted: OnTargetDeleted,
}

impl PointerRule {
    /// Mandatory pointer; deleting its target is rejected.
    pub const fn mandatory(tag: PointerTag) -> Self {
        Self {
            tag,
            mandatory: true,
            on_target_deleted: OnTargetDeleted::Reject,
        }
    }

    /// Optional pointer; cleared when its target is deleted.
    pub const fn optional(tag: PointerTag) -> Self {
        Self {
            tag,
            mandatory: false,
            on_target_deleted: OnTargetDeleted::Clear,
        }
    }

    /// Deleting the target deletes the owner of this pointer.
    pub const fn cascading(self) -> Self {
        Self {
            on_target_deleted: OnTargetDeleted::Cascade,
            ..self
        }
    }

    /// Deleting the target is rejected while this pointer is set.
    pub const fn rejecting(self) -> Self {
        Self {
            on_target_deleted: OnTargetDeleted::Reject,
            ..self
        }
    }
}

/// Shape of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// Scalar with the given default value (which also fixes the kind).
    Primitive(Value),
    /// Typed reference to another address.
    Pointer(PointerRule),
    /// Homogeneous, growable sequence.
    Array {
        /// Schema of every element. Its key is ignored; elements are keyed by index.
        element: Box<FieldSchema>,
        /// Number of elements a new node starts with.
        initial_len: u16,
    },
    /// Fixed-shape nested struct.
    Object(Vec<FieldSchema>),
}

/// Declaration of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    /// Key within the parent.
    pub key: FieldKey,
    /// Human-readable name.
    pub name: &'static str,
    /// Shape.
    pub ty: FieldType,
    /// Tags this field accepts as a pointer target.
    pub accepts: AcceptSet,
}

impl FieldSchema {
    /// Primitive field with a default value.
    pub fn primitive(key: FieldKey, name: &'static str, default: impl Into<Value>) -> Self {
        Self {
            key,
            name,
            ty: FieldType::Primitive(default.into()),
            accepts: AcceptSet::NONE,
        }
    }

    /// Pointer field.
    pub fn pointer(key: FieldKey, name: &'static str, rule: PointerRule) -> Self {
        Self {
            key,
            name,
            ty: FieldType::Pointer(rule),
            accepts: AcceptSet::NONE,
        }
    }

    /// Array field whose elements follow `element`.
    pub fn array(key: FieldKey, name: &'static str, element: FieldSchema, initial_len: u16) -> Self {
        Self {
            key,
            name,
            ty: FieldType::Array {
                element: Box::new(element),
                initial_len,
            },
            accepts: AcceptSet::NONE,
        }
    }

    /// Object field with fixed children.
    pub fn object(key: FieldKey, name: &'static str, children: Vec<FieldSchema>) -> Self {
        Self {
            key,
            name,
            ty: FieldType::Object(children),
            accepts: AcceptSet::NONE,
        }
    }

    /// Marks this field as a pointer target for `accepts`.
    #[must_use]
    pub fn accepting(mut self, accepts: AcceptSet) -> Self {
        self.accepts = accepts;
        self
    }

    /// Builds a field holding this schema's defaults.
    pub fn instantiate(&self) -> Field {
        match &self.ty {
            FieldType::Primitive(default) => Field::Primitive(default.clone()),
            FieldType::Pointer(rule) => Field::Pointer(PointerField::new(*rule)),
            FieldType::Array {
                element,
                initial_len,
            } => Field::Array(ArrayField::from_elements(
                (0..*initial_len).map(|_| element.instantiate()).collect(),
            )),
            FieldType::Object(children) => Field::Object(ObjectField::from_fields(
                children.iter().map(|c| (c.key, c.instantiate())).collect(),
            )),
        }
    }

    /// Primitive kind, if this is a primitive field.
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match &self.ty {
            FieldType::Primitive(v) => Some(v.kind()),
            _ => None,
        }
    }

    /// Child schema for `key` (object child or array element).
    pub fn child(&self, key: FieldKey) -> Option<&FieldSchema> {
        match &self.ty {
            FieldType::Object(children) => children.iter().find(|c| c.key == key),
            FieldType::Array { element, .. } => Some(element),
            FieldType::Primitive(_) | FieldType::Pointer(_) => None,
        }
    }

    /// Appends every pointer-target address below (and including) `address`.
    pub(crate) fn collect_targets(
        &self,
        field: &Field,
        address: &Address,
        out: &mut Vec<(Address, AcceptSet)>,
    ) {
        if !self.accepts.is_empty() {
            out.push((address.clone(), self.accepts));
        }
        match (&self.ty, field) {
            (FieldType::Array { element, .. }, Field::Array(array)) => {
                for (index, child) in array.iter().enumerate() {
                    element.collect_targets(child, &address.append(index as FieldKey), out);
                }
            }
            (FieldType::Object(children), Field::Object(object)) => {
                for child_schema in children {
                    if let Some(child) = object.get(child_schema.key) {
                        child_schema.collect_targets(child, &address.append(child_schema.key), out);
                    }
                }
            }
            _ => {}
        }
    }

    fn validate(&self, class: &'static str) -> Result<(), SchemaError> {
        match &self.ty {
            FieldType::Primitive(_) => Ok(()),
            FieldType::Pointer(rule) => validate_rule(class, self.name, rule),
            FieldType::Array { element, .. } => element.validate(class),
            FieldType::Object(children) => validate_fields(class, children),
        }
    }
}

fn validate_rule(
    class: &'static str,
    field: &'static str,
    rule: &PointerRule,
) -> Result<(), SchemaError> {
    if rule.tag.0 >= PointerTag::LIMIT {
        return Err(SchemaError::TagOutOfRange {
            class,
            field,
            tag: rule.tag.0,
        });
    }
    if rule.mandatory && rule.on_target_deleted == OnTargetDeleted::Clear {
        return Err(SchemaError::MandatoryClear { class, field });
    }
    Ok(())
}

fn validate_fields(class: &'static str, fields: &[FieldSchema]) -> Result<(), SchemaError> {
    let mut seen = BTreeSet::new();
    for field in fields {
        if !seen.insert(field.key) {
            return Err(SchemaError::DuplicateFieldKey {
                class,
                key: field.key,
            });
        }
        field.validate(class)?;
    }
    Ok(())
}

/// Identifier of a node class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(pub u16);

/// Static layout of one node class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassSchema {
    /// Class identifier.
    pub id: ClassId,
    /// Class name.
    pub name: &'static str,
    /// Tags the node address itself accepts.
    pub accepts: AcceptSet,
    /// Externally preserved resource: dependency walks stop here.
    pub resource: bool,
    /// Top-level fields.
    pub fields: Vec<FieldSchema>,
}

impl ClassSchema {
    /// Empty class schema.
    pub fn new(id: ClassId, name: &'static str) -> Self {
        Self {
            id,
            name,
            accepts: AcceptSet::NONE,
            resource: false,
            fields: Vec::new(),
        }
    }

    /// Adds a top-level field.
    #[must_use]
    pub fn field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    /// Makes the node address a pointer target.
    #[must_use]
    pub fn accepting(mut self, accepts: AcceptSet) -> Self {
        self.accepts = accepts;
        self
    }

    /// Flags the class as an externally preserved resource.
    #[must_use]
    pub fn resource(mut self) -> Self {
        self.resource = true;
        self
    }

    /// Schema of the field at `path` (array indices resolve to the element schema).
    pub fn field_schema(&self, path: &[FieldKey]) -> Option<&FieldSchema> {
        let (first, rest) = path.split_first()?;
        let mut current = self.fields.iter().find(|f| f.key == *first)?;
        for key in rest {
            current = current.child(*key)?;
        }
        Some(current)
    }

    /// Builds the default field table for a new node.
    pub(crate) fn instantiate_fields(&self) -> BTreeMap<FieldKey, Field> {
        self.fields.iter().map(|f| (f.key, f.instantiate())).collect()
    }

    /// All pointer-target addresses of a node of this class.
    pub(crate) fn targets(
        &self,
        node_address: &Address,
        fields: &BTreeMap<FieldKey, Field>,
    ) -> Vec<(Address, AcceptSet)> {
        let mut out = Vec::new();
        if !self.accepts.is_empty() {
            out.push((node_address.clone(), self.accepts));
        }
        for schema in &self.fields {
            if let Some(field) = fields.get(&schema.key) {
                schema.collect_targets(field, &node_address.append(schema.key), &mut out);
            }
        }
        out
    }
}

/// Errors raised while registering schemas.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Two classes share an id.
    #[error("class id {0} registered twice")]
    DuplicateClass(u16),

    /// Two fields at the same level share a key.
    #[error("class '{class}' declares field key {key} twice")]
    DuplicateFieldKey {
        /// Class name.
        class: &'static str,
        /// Repeated key.
        key: FieldKey,
    },

    /// A mandatory pointer declared the `Clear` deletion policy.
    #[error("mandatory pointer '{class}.{field}' cannot be cleared on target deletion")]
    MandatoryClear {
        /// Class name.
        class: &'static str,
        /// Field name.
        field: &'static str,
    },

    /// A pointer tag does not fit in an accept set.
    #[error("pointer '{class}.{field}' uses tag {tag}, limit is 64")]
    TagOutOfRange {
        /// Class name.
        class: &'static str,
        /// Field name.
        field: &'static str,
        /// Offending tag.
        tag: u8,
    },
}

/// Registry of every node class a graph may contain.
///
/// Constructed once at startup and shared (usually behind an `Arc`) with all
/// graphs built from it. The registry's `version` is the current schema
/// version new graphs are stamped with.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    version: u32,
    classes: BTreeMap<ClassId, ClassSchema>,
}

impl SchemaRegistry {
    /// Empty registry for schema `version`.
    pub fn new(version: u32) -> Self {
        Self {
            version,
            classes: BTreeMap::new(),
        }
    }

    /// Current schema version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Registers a class after validating its layout.
    pub fn register(&mut self, class: ClassSchema) -> Result<(), SchemaError> {
        if self.classes.contains_key(&class.id) {
            return Err(SchemaError::DuplicateClass(class.id.0));
        }
        validate_fields(class.name, &class.fields)?;
        self.classes.insert(class.id, class);
        Ok(())
    }

    /// Looks up a class.
    pub fn class(&self, id: ClassId) -> Option<&ClassSchema> {
        self.classes.get(&id)
    }

    /// Looks up a class by name.
    pub fn class_by_name(&self, name: &str) -> Option<&ClassSchema> {
        self.classes.values().find(|c| c.name == name)
    }

    /// Iterates over all classes in id order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassSchema> {
        self.classes.values()
    }

    /// Number of registered classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// `true` if no class is registered.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
