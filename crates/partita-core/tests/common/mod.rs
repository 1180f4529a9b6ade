//! Small studio schema shared by the integration and property tests.
#![allow(dead_code)]

use std::sync::Arc;

use partita_core::{
    AcceptSet, Address, ClassId, ClassSchema, EntityId, FieldKey, FieldSchema, Graph, GraphError,
    PointerRule, PointerTag, SchemaRegistry,
};

pub const HOST: PointerTag = PointerTag(0);
pub const OUTPUT: PointerTag = PointerTag(1);
pub const SAMPLE: PointerTag = PointerTag(2);
pub const LANE: PointerTag = PointerTag(3);

pub const ROOT: ClassId = ClassId(0);
pub const UNIT: ClassId = ClassId(1);
pub const CLIP: ClassId = ClassId(2);
pub const SAMPLE_FILE: ClassId = ClassId(3);
pub const METER: ClassId = ClassId(4);

// root
pub const UNITS: FieldKey = 1;
pub const NAME: FieldKey = 2;
// unit
pub const HOSTED_BY: FieldKey = 1;
pub const OUT: FieldKey = 2;
pub const VOLUME: FieldKey = 3;
pub const CLIPS: FieldKey = 4;
pub const SENDS: FieldKey = 5;
// clip
pub const LANE_OF: FieldKey = 1;
pub const SAMPLE_REF: FieldKey = 2;
pub const GAIN: FieldKey = 3;
pub const LABEL: FieldKey = 4;
pub const POSITION: FieldKey = 5;
// sample file
pub const PATH: FieldKey = 1;
pub const FRAMES: FieldKey = 2;
// meter
pub const WATCHES: FieldKey = 1;

pub fn registry() -> Arc<SchemaRegistry> {
    let mut registry = SchemaRegistry::new(1);
    let classes = [
        ClassSchema::new(ROOT, "root")
            .field(FieldSchema::object(UNITS, "units", vec![]).accepting(AcceptSet::of(&[HOST])))
            .field(FieldSchema::primitive(NAME, "name", "untitled")),
        ClassSchema::new(UNIT, "unit")
            .accepting(AcceptSet::of(&[OUTPUT]))
            .field(FieldSchema::pointer(HOSTED_BY, "host", PointerRule::mandatory(HOST).cascading()))
            .field(FieldSchema::pointer(OUT, "output", PointerRule::optional(OUTPUT)))
            .field(FieldSchema::primitive(VOLUME, "volume", 1.0f32))
            .field(FieldSchema::object(CLIPS, "clips", vec![]).accepting(AcceptSet::of(&[LANE])))
            .field(FieldSchema::array(
                SENDS,
                "sends",
                FieldSchema::pointer(0, "send", PointerRule::optional(OUTPUT)),
                0,
            )),
        ClassSchema::new(CLIP, "clip")
            .field(FieldSchema::pointer(LANE_OF, "lane", PointerRule::mandatory(LANE).cascading()))
            .field(FieldSchema::pointer(SAMPLE_REF, "sample", PointerRule::optional(SAMPLE)))
            .field(FieldSchema::primitive(GAIN, "gain", 1.0f32))
            .field(FieldSchema::primitive(LABEL, "label", ""))
            .field(FieldSchema::primitive(POSITION, "position", 0i64)),
        ClassSchema::new(SAMPLE_FILE, "sample")
            .accepting(AcceptSet::of(&[SAMPLE]))
            .resource()
            .field(FieldSchema::primitive(PATH, "path", ""))
            .field(FieldSchema::primitive(FRAMES, "frames", 0i64)),
        ClassSchema::new(METER, "meter")
            .field(FieldSchema::pointer(WATCHES, "watches", PointerRule::mandatory(OUTPUT))),
    ];
    for class in classes {
        registry.register(class).expect("test schema is valid");
    }
    Arc::new(registry)
}

pub fn at(id: EntityId, key: FieldKey) -> Address {
    Address::compose(id).append(key)
}

pub fn add_unit(graph: &mut Graph, root: EntityId) -> Result<EntityId, GraphError> {
    let unit = graph.create(UNIT)?;
    graph.set_target(&at(unit, HOSTED_BY), &at(root, UNITS))?;
    Ok(unit)
}

pub fn add_clip(graph: &mut Graph, unit: EntityId) -> Result<EntityId, GraphError> {
    let clip = graph.create(CLIP)?;
    graph.set_target(&at(clip, LANE_OF), &at(unit, CLIPS))?;
    Ok(clip)
}

/// Root with two units, a clip on the first, and a sample the clip plays.
pub struct Studio {
    pub graph: Graph,
    pub root: EntityId,
    pub units: [EntityId; 2],
    pub clip: EntityId,
    pub sample: EntityId,
}

pub fn studio() -> Studio {
    let mut graph = Graph::new(registry());
    let ((root, units, clip, sample), _) = graph
        .transaction(|g| {
            let root = g.create(ROOT)?;
            let a = add_unit(g, root)?;
            let b = add_unit(g, root)?;
            g.set_target(&at(a, OUT), &Address::compose(b))?;
            let clip = add_clip(g, a)?;
            let sample = g.create(SAMPLE_FILE)?;
            g.set_value(&at(sample, PATH), "kick.wav")?;
            g.set_value(&at(sample, FRAMES), 44_100i64)?;
            g.set_target(&at(clip, SAMPLE_REF), &Address::compose(sample))?;
            g.set_value(&at(clip, LABEL), "kick")?;
            Ok((root, [a, b], clip, sample))
        })
        .expect("studio builds");
    Studio {
        graph,
        root,
        units,
        clip,
        sample,
    }
}
