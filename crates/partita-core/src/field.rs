//! Field variants and the visitor contract.
//!
//! A [`Field`] is a closed sum type with four variants: primitive, pointer,
//! array, and object. Generic algorithms (the binary codec, deep copies,
//! change broadcasting) traverse heterogeneous field trees through
//! [`FieldVisitor`], whose four handlers have no defaults: adding a variant
//! breaks every visitor at compile time instead of silently skipping data.
//!
//! Fields are owned by their node. Pointer fields only hold the target's
//! [`Address`]; they never own or keep alive what they point at.

use std::collections::BTreeMap;

use crate::address::{Address, FieldKey};
use crate::schema::PointerRule;
use crate::value::Value;

/// A typed slot inside a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// One scalar value.
    Primitive(Value),
    /// Optional typed reference to another address.
    Pointer(PointerField),
    /// Ordered, homogeneous children keyed by index.
    Array(ArrayField),
    /// Fixed-shape children keyed by schema key.
    Object(ObjectField),
}

impl Field {
    /// Dispatches to the visitor handler for this variant.
    pub fn accept<V: FieldVisitor + ?Sized>(&self, address: &Address, visitor: &mut V) -> V::Output {
        match self {
            Field::Primitive(value) => visitor.visit_primitive(address, value),
            Field::Pointer(pointer) => visitor.visit_pointer(address, pointer),
            Field::Array(array) => visitor.visit_array(address, array),
            Field::Object(object) => visitor.visit_object(address, object),
        }
    }

    /// Pre-order walk over this field and all descendants.
    pub fn walk<F>(&self, address: &Address, f: &mut F)
    where
        F: FnMut(&Address, &Field),
    {
        f(address, self);
        match self {
            Field::Array(array) => {
                for (index, child) in array.iter().enumerate() {
                    child.walk(&address.append(index as FieldKey), f);
                }
            }
            Field::Object(object) => {
                for (key, child) in object.iter() {
                    child.walk(&address.append(key), f);
                }
            }
            Field::Primitive(_) | Field::Pointer(_) => {}
        }
    }

    /// Direct child for `key`.
    pub fn child(&self, key: FieldKey) -> Option<&Field> {
        match self {
            Field::Array(array) => array.get(key as usize),
            Field::Object(object) => object.get(key),
            Field::Primitive(_) | Field::Pointer(_) => None,
        }
    }

    pub(crate) fn child_mut(&mut self, key: FieldKey) -> Option<&mut Field> {
        match self {
            Field::Array(array) => array.elements.get_mut(key as usize),
            Field::Object(object) => object.fields.get_mut(&key),
            Field::Primitive(_) | Field::Pointer(_) => None,
        }
    }

    /// Visits every pointer below this field mutably, stopping at the first error.
    pub(crate) fn try_for_each_pointer_mut<E, F>(&mut self, address: &Address, f: &mut F) -> Result<(), E>
    where
        F: FnMut(&Address, &mut PointerField) -> Result<(), E>,
    {
        match self {
            Field::Pointer(pointer) => f(address, pointer),
            Field::Array(array) => {
                for (index, child) in array.elements.iter_mut().enumerate() {
                    child.try_for_each_pointer_mut(&address.append(index as FieldKey), f)?;
                }
                Ok(())
            }
            Field::Object(object) => {
                for (key, child) in &mut object.fields {
                    child.try_for_each_pointer_mut(&address.append(*key), f)?;
                }
                Ok(())
            }
            Field::Primitive(_) => Ok(()),
        }
    }

    /// Primitive value, if this is a primitive field.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Field::Primitive(value) => Some(value),
            _ => None,
        }
    }

    /// Pointer payload, if this is a pointer field.
    pub fn as_pointer(&self) -> Option<&PointerField> {
        match self {
            Field::Pointer(pointer) => Some(pointer),
            _ => None,
        }
    }

    /// Array payload, if this is an array field.
    pub fn as_array(&self) -> Option<&ArrayField> {
        match self {
            Field::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Object payload, if this is an object field.
    pub fn as_object(&self) -> Option<&ObjectField> {
        match self {
            Field::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Variant name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Field::Primitive(_) => "primitive",
            Field::Pointer(_) => "pointer",
            Field::Array(_) => "array",
            Field::Object(_) => "object",
        }
    }
}

/// One handler per field variant, all required.
pub trait FieldVisitor {
    /// Result of visiting one field.
    type Output;

    /// Handles a primitive field.
    fn visit_primitive(&mut self, address: &Address, value: &Value) -> Self::Output;

    /// Handles a pointer field.
    fn visit_pointer(&mut self, address: &Address, pointer: &PointerField) -> Self::Output;

    /// Handles an array field. Recursing into elements is up to the visitor.
    fn visit_array(&mut self, address: &Address, array: &ArrayField) -> Self::Output;

    /// Handles an object field. Recursing into children is up to the visitor.
    fn visit_object(&mut self, address: &Address, object: &ObjectField) -> Self::Output;
}

/// Pointer payload: declared rule plus optional target.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerField {
    rule: PointerRule,
    target: Option<Address>,
}

impl PointerField {
    /// Unset pointer with the given rule.
    pub fn new(rule: PointerRule) -> Self {
        Self { rule, target: None }
    }

    /// Declared rule.
    pub fn rule(&self) -> &PointerRule {
        &self.rule
    }

    /// Current target.
    pub fn target(&self) -> Option<&Address> {
        self.target.as_ref()
    }

    /// `true` when mandatory.
    pub fn is_mandatory(&self) -> bool {
        self.rule.mandatory
    }

    pub(crate) fn replace_target(&mut self, target: Option<Address>) -> Option<Address> {
        core::mem::replace(&mut self.target, target)
    }

    pub(crate) fn with_target(rule: PointerRule, target: Option<Address>) -> Self {
        Self { rule, target }
    }
}

/// Array payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayField {
    elements: Vec<Field>,
}

impl ArrayField {
    /// Array holding `elements`.
    pub fn from_elements(elements: Vec<Field>) -> Self {
        Self { elements }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// `true` if empty.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Element at `index`.
    pub fn get(&self, index: usize) -> Option<&Field> {
        self.elements.get(index)
    }

    /// Iterates over elements in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.elements.iter()
    }

    pub(crate) fn push(&mut self, element: Field) {
        self.elements.push(element);
    }

    pub(crate) fn pop(&mut self) -> Option<Field> {
        self.elements.pop()
    }
}

/// Object payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectField {
    fields: BTreeMap<FieldKey, Field>,
}

impl ObjectField {
    /// Object holding `fields`.
    pub fn from_fields(fields: BTreeMap<FieldKey, Field>) -> Self {
        Self { fields }
    }

    /// Child for `key`.
    pub fn get(&self, key: FieldKey) -> Option<&Field> {
        self.fields.get(&key)
    }

    /// Iterates over children in key order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &Field)> {
        self.fields.iter().map(|(k, f)| (*k, f))
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `true` if there are no children.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::EntityId;
    use crate::schema::PointerTag;

    fn sample() -> Field {
        let mut children = BTreeMap::new();
        children.insert(1, Field::Primitive(Value::Int32(4)));
        children.insert(
            2,
            Field::Array(ArrayField::from_elements(vec![
                Field::Primitive(Value::Float32(0.5)),
                Field::Pointer(PointerField::new(PointerRule::optional(PointerTag(1)))),
            ])),
        );
        Field::Object(ObjectField::from_fields(children))
    }

    struct Counter {
        counts: [usize; 4],
    }

    impl FieldVisitor for Counter {
        type Output = ();

        fn visit_primitive(&mut self, _: &Address, _: &Value) {
            self.counts[0] += 1;
        }

        fn visit_pointer(&mut self, _: &Address, _: &PointerField) {
            self.counts[1] += 1;
        }

        fn visit_array(&mut self, address: &Address, array: &ArrayField) {
            self.counts[2] += 1;
            for (i, child) in array.iter().enumerate() {
                child.accept(&address.append(i as FieldKey), self);
            }
        }

        fn visit_object(&mut self, address: &Address, object: &ObjectField) {
            self.counts[3] += 1;
            for (key, child) in object.iter() {
                child.accept(&address.append(key), self);
            }
        }
    }

    #[test]
    fn visitor_reaches_every_variant() {
        let mut counter = Counter { counts: [0; 4] };
        sample().accept(&Address::compose(EntityId::from_u128(1)), &mut counter);
        assert_eq!(counter.counts, [2, 1, 1, 1]);
    }

    #[test]
    fn walk_visits_in_pre_order_with_addresses() {
        let root = Address::compose(EntityId::from_u128(1)).append(9);
        let mut seen = Vec::new();
        sample().walk(&root, &mut |addr, field| {
            seen.push((addr.path().to_vec(), field.kind_name()));
        });
        assert_eq!(
            seen,
            vec![
                (vec![9], "object"),
                (vec![9, 1], "primitive"),
                (vec![9, 2], "array"),
                (vec![9, 2, 0], "primitive"),
                (vec![9, 2, 1], "pointer"),
            ]
        );
    }

    #[test]
    fn child_lookup() {
        let field = sample();
        assert!(field.child(1).and_then(Field::as_value).is_some());
        let array = field.child(2).unwrap();
        assert!(array.child(1).and_then(Field::as_pointer).is_some());
        assert!(array.child(5).is_none());
    }
}
