//! Typed, addressable bundles of fields.

use std::collections::BTreeMap;

use crate::address::{Address, EntityId, FieldKey};
use crate::field::{Field, PointerField};
use crate::schema::{ClassId, ClassSchema};

/// One entity in the document.
///
/// The field table is fixed by the node's [`ClassSchema`] at creation and
/// never changes shape; only the values inside it do.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: EntityId,
    class: ClassId,
    fields: BTreeMap<FieldKey, Field>,
}

impl Node {
    /// Node of `schema` with every field at its default.
    pub fn new(id: EntityId, schema: &ClassSchema) -> Self {
        Self {
            id,
            class: schema.id,
            fields: schema.instantiate_fields(),
        }
    }

    pub(crate) fn from_parts(id: EntityId, class: ClassId, fields: BTreeMap<FieldKey, Field>) -> Self {
        Self { id, class, fields }
    }

    /// Entity id.
    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Class id.
    #[inline]
    pub fn class(&self) -> ClassId {
        self.class
    }

    /// Address of the node itself.
    pub fn address(&self) -> Address {
        Address::compose(self.id)
    }

    /// Top-level field for `key`.
    pub fn field(&self, key: FieldKey) -> Option<&Field> {
        self.fields.get(&key)
    }

    /// Field at `path` (empty path yields `None`).
    pub fn field_at(&self, path: &[FieldKey]) -> Option<&Field> {
        let (first, rest) = path.split_first()?;
        let mut current = self.fields.get(first)?;
        for key in rest {
            current = current.child(*key)?;
        }
        Some(current)
    }

    pub(crate) fn field_at_mut(&mut self, path: &[FieldKey]) -> Option<&mut Field> {
        let (first, rest) = path.split_first()?;
        let mut current = self.fields.get_mut(first)?;
        for key in rest {
            current = current.child_mut(*key)?;
        }
        Some(current)
    }

    /// Copy of this node under `id`, with every pointer passed through `rewrite`.
    pub(crate) fn remapped<E, F>(&self, id: EntityId, mut rewrite: F) -> Result<Node, E>
    where
        F: FnMut(&Address, &mut PointerField) -> Result<(), E>,
    {
        let mut node = Node {
            id,
            class: self.class,
            fields: self.fields.clone(),
        };
        let base = node.address();
        for (key, field) in &mut node.fields {
            field.try_for_each_pointer_mut(&base.append(*key), &mut rewrite)?;
        }
        Ok(node)
    }

    /// Top-level fields in key order.
    pub fn fields(&self) -> impl Iterator<Item = (FieldKey, &Field)> {
        self.fields.iter().map(|(k, f)| (*k, f))
    }

    pub(crate) fn field_table(&self) -> &BTreeMap<FieldKey, Field> {
        &self.fields
    }

    /// Pre-order walk over every field of the node.
    pub fn walk<F>(&self, mut f: F)
    where
        F: FnMut(&Address, &Field),
    {
        let base = self.address();
        for (key, field) in &self.fields {
            field.walk(&base.append(*key), &mut f);
        }
    }

    /// Every pointer field with its address, in address order.
    pub fn pointers(&self) -> Vec<(Address, PointerField)> {
        let mut out = Vec::new();
        self.walk(|address, field| {
            if let Field::Pointer(pointer) = field {
                out.push((address.clone(), pointer.clone()));
            }
        });
        out
    }

    /// Set pointers with their targets, in address order.
    pub fn outgoing(&self) -> Vec<(Address, Address)> {
        self.pointers()
            .into_iter()
            .filter_map(|(address, pointer)| pointer.target().cloned().map(|t| (address, t)))
            .collect()
    }
}
