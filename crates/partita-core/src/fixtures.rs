//! Small schema shared by unit tests.

use std::sync::Arc;

use crate::address::{Address, EntityId, FieldKey};
use crate::graph::Graph;
use crate::schema::{AcceptSet, ClassId, ClassSchema, FieldSchema, PointerRule, PointerTag, SchemaRegistry};

pub const T_OWNER: PointerTag = PointerTag(0);
pub const T_LINK: PointerTag = PointerTag(1);
pub const T_PIN: PointerTag = PointerTag(2);

pub const PARENT: ClassId = ClassId(0);
pub const CHILD: ClassId = ClassId(1);
pub const PLAIN: ClassId = ClassId(2);
pub const HOLDER: ClassId = ClassId(3);
pub const RESOURCE: ClassId = ClassId(4);

// parent / child
pub const CHILDREN: FieldKey = 1;
pub const NAME: FieldKey = 2;
pub const OWNER: FieldKey = 1;
pub const LINK: FieldKey = 2;
// plain
pub const TITLE: FieldKey = 1;
pub const PARAMS: FieldKey = 2;
pub const LEVEL: FieldKey = 3;
// holder
pub const PIN: FieldKey = 1;

pub fn registry() -> Arc<SchemaRegistry> {
    let mut registry = SchemaRegistry::new(1);
    let socket = |key| FieldSchema::object(key, "children", vec![]).accepting(AcceptSet::of(&[T_OWNER]));
    let classes = [
        ClassSchema::new(PARENT, "parent")
            .field(socket(CHILDREN))
            .field(FieldSchema::primitive(NAME, "name", "")),
        ClassSchema::new(CHILD, "child")
            .accepting(AcceptSet::of(&[T_PIN, T_LINK]))
            .field(FieldSchema::pointer(OWNER, "owner", PointerRule::mandatory(T_OWNER).cascading()))
            .field(FieldSchema::pointer(LINK, "link", PointerRule::optional(T_LINK)))
            .field(socket(3)),
        ClassSchema::new(PLAIN, "plain")
            .accepting(AcceptSet::of(&[T_LINK, T_PIN]))
            .field(FieldSchema::primitive(TITLE, "title", ""))
            .field(FieldSchema::array(
                PARAMS,
                "params",
                FieldSchema::primitive(0, "param", 0.0f32).accepting(AcceptSet::of(&[T_LINK])),
                0,
            ))
            .field(FieldSchema::primitive(LEVEL, "level", 0)),
        ClassSchema::new(HOLDER, "holder")
            .field(FieldSchema::pointer(PIN, "pin", PointerRule::mandatory(T_PIN)))
            .field(FieldSchema::pointer(LINK, "link", PointerRule::optional(T_LINK))),
        ClassSchema::new(RESOURCE, "resource")
            .accepting(AcceptSet::of(&[T_LINK]))
            .resource(),
    ];
    for class in classes {
        registry.register(class).unwrap();
    }
    Arc::new(registry)
}

pub fn at(id: EntityId, key: FieldKey) -> Address {
    Address::compose(id).append(key)
}

/// Parent with one owned child.
pub fn parent_child() -> (Graph, EntityId, EntityId) {
    let mut graph = Graph::new(registry());
    let (parent, child) = graph
        .transaction(|g| {
            let parent = g.create(PARENT)?;
            let child = g.create(CHILD)?;
            g.set_target(&at(child, OWNER), &at(parent, CHILDREN))?;
            Ok((parent, child))
        })
        .unwrap()
        .0;
    (graph, parent, child)
}
