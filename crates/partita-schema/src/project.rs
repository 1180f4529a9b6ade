//! Typed construction and read helpers for project graphs.
//!
//! Builders must run inside an open transaction; they wire the owner pointer
//! of every new node so the transaction commits cleanly. Readers return
//! children sorted by their `index` field, then by id.

use std::sync::Arc;

use partita_core::{Address, DependencyOptions, EntityId, FieldKey, Graph, GraphError, SchemaRegistry};

use crate::devices::DeviceDescriptor;
use crate::keys::{audio_file, audio_region, audio_unit, device, instrument, note, note_region, root, selection, track};
use crate::BoxClass;

/// One note event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    /// MIDI pitch.
    pub pitch: i32,
    /// Velocity, 0..1.
    pub velocity: f32,
    /// Start relative to the region, in ticks.
    pub position: i64,
    /// Length in ticks.
    pub duration: i64,
}

fn at(id: EntityId, key: FieldKey) -> Address {
    Address::compose(id).append(key)
}

/// Empty project with a root node, stamped with the registry's version.
pub fn new_project(registry: Arc<SchemaRegistry>) -> Result<(Graph, EntityId), GraphError> {
    let mut graph = Graph::new(registry);
    let (root, _) = graph.transaction(create_root)?;
    Ok((graph, root))
}

/// Creates a root node.
pub fn create_root(graph: &mut Graph) -> Result<EntityId, GraphError> {
    graph.create(BoxClass::Root.id())
}

/// Appends an audio unit to the mixer, routed to the master bus.
pub fn add_audio_unit(graph: &mut Graph, root: EntityId, name: &str) -> Result<EntityId, GraphError> {
    let index = audio_units(graph, root).len() as i32;
    let unit = graph.create(BoxClass::AudioUnit.id())?;
    graph.set_target(&at(unit, audio_unit::COLLECTION), &at(root, root::AUDIO_UNITS))?;
    graph.set_target(&at(unit, audio_unit::OUTPUT), &at(root, root::MASTER))?;
    graph.set_value(&at(unit, audio_unit::INDEX), index)?;
    graph.set_value(&at(unit, audio_unit::NAME), name)?;
    Ok(unit)
}

/// Appends a track to `unit`.
pub fn add_track(graph: &mut Graph, unit: EntityId) -> Result<EntityId, GraphError> {
    let index = tracks(graph, unit).len() as i32;
    let track = graph.create(BoxClass::Track.id())?;
    graph.set_target(&at(track, track::UNIT), &at(unit, audio_unit::TRACKS))?;
    graph.set_value(&at(track, track::INDEX), index)?;
    Ok(track)
}

/// Registers an audio file. A `duration` of `0` means unknown.
pub fn add_audio_file(graph: &mut Graph, path: &str, duration: f32) -> Result<EntityId, GraphError> {
    let file = graph.create(BoxClass::AudioFile.id())?;
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    graph.set_value(&at(file, audio_file::PATH), path)?;
    graph.set_value(&at(file, audio_file::NAME), name)?;
    graph.set_value(&at(file, audio_file::DURATION), duration)?;
    Ok(file)
}

/// Places a region playing `file` on `track`.
pub fn add_audio_region(
    graph: &mut Graph,
    track: EntityId,
    file: EntityId,
    position: i64,
    duration: i64,
) -> Result<EntityId, GraphError> {
    let region = graph.create(BoxClass::AudioRegion.id())?;
    graph.set_target(&at(region, audio_region::TRACK), &at(track, track::REGIONS))?;
    graph.set_target(&at(region, audio_region::FILE), &Address::compose(file))?;
    graph.set_value(&at(region, audio_region::POSITION), position)?;
    graph.set_value(&at(region, audio_region::DURATION), duration)?;
    Ok(region)
}

/// Places an empty note region on `track`.
pub fn add_note_region(
    graph: &mut Graph,
    track: EntityId,
    position: i64,
    duration: i64,
) -> Result<EntityId, GraphError> {
    let region = graph.create(BoxClass::NoteRegion.id())?;
    graph.set_target(&at(region, note_region::TRACK), &at(track, track::REGIONS))?;
    graph.set_value(&at(region, note_region::POSITION), position)?;
    graph.set_value(&at(region, note_region::DURATION), duration)?;
    Ok(region)
}

/// Appends a note to a note region; returns the element address.
pub fn add_note(graph: &mut Graph, region: EntityId, event: Note) -> Result<Address, GraphError> {
    let element = graph.push_element(&at(region, note_region::NOTES))?;
    graph.set_value(&element.append(note::PITCH), event.pitch)?;
    graph.set_value(&element.append(note::VELOCITY), event.velocity)?;
    graph.set_value(&element.append(note::POSITION), event.position)?;
    graph.set_value(&element.append(note::DURATION), event.duration)?;
    Ok(element)
}

/// Appends an effect to the end of `unit`'s chain with default parameters.
pub fn add_device(graph: &mut Graph, unit: EntityId, kind: &DeviceDescriptor) -> Result<EntityId, GraphError> {
    let index = devices(graph, unit).len() as i32;
    let dev = graph.create(BoxClass::Device.id())?;
    graph.set_target(&at(dev, device::HOST), &at(unit, audio_unit::EFFECTS))?;
    graph.set_value(&at(dev, device::KIND), kind.id)?;
    graph.set_value(&at(dev, device::INDEX), index)?;
    graph.set_value(&at(dev, device::LABEL), kind.name)?;
    fill_params(graph, &at(dev, device::PARAMS), kind)?;
    Ok(dev)
}

/// Replaces `unit`'s instrument.
pub fn set_instrument(graph: &mut Graph, unit: EntityId, kind: &DeviceDescriptor) -> Result<EntityId, GraphError> {
    if let Some(previous) = instrument(graph, unit) {
        graph.delete_node(previous)?;
    }
    let inst = graph.create(BoxClass::Instrument.id())?;
    graph.set_target(&at(inst, instrument::HOST), &at(unit, audio_unit::INPUT))?;
    graph.set_value(&at(inst, instrument::KIND), kind.id)?;
    graph.set_value(&at(inst, instrument::LABEL), kind.name)?;
    fill_params(graph, &at(inst, instrument::PARAMS), kind)?;
    Ok(inst)
}

fn fill_params(graph: &mut Graph, params: &Address, kind: &DeviceDescriptor) -> Result<(), GraphError> {
    for spec in kind.params {
        let slot = graph.push_element(params)?;
        graph.set_value(&slot, spec.default)?;
    }
    Ok(())
}

/// Adds `target` to the selection.
pub fn select(graph: &mut Graph, root: EntityId, target: EntityId) -> Result<EntityId, GraphError> {
    let entry = graph.create(BoxClass::Selection.id())?;
    graph.set_target(&at(entry, selection::OWNER), &at(root, root::SELECTION))?;
    graph.set_target(&at(entry, selection::TARGET), &Address::compose(target))?;
    Ok(entry)
}

/// Narrows `options` for presets: the project root and selection entries
/// become boundary nodes instead of being exported.
pub fn preset_options(options: DependencyOptions) -> DependencyOptions {
    options.excluding(|node| {
        matches!(
            BoxClass::from_id(node.class()),
            Some(BoxClass::Root | BoxClass::Selection)
        )
    })
}

// --- readers ---

/// The project root, if the graph has one.
pub fn find_root(graph: &Graph) -> Option<EntityId> {
    graph.nodes_of_class(BoxClass::Root.id()).map(|n| n.id()).next()
}

/// Class of a node.
pub fn class_of(graph: &Graph, id: EntityId) -> Option<BoxClass> {
    graph.node(id).and_then(|n| BoxClass::from_id(n.class()))
}

fn owned(graph: &Graph, socket: Address, index_key: Option<FieldKey>) -> Vec<EntityId> {
    let mut children: Vec<(i32, EntityId)> = graph
        .incoming(&socket)
        .into_iter()
        .map(|pointer| {
            let id = pointer.entity();
            let index = index_key
                .and_then(|key| graph.value(&at(id, key)))
                .and_then(|v| v.as_i32())
                .unwrap_or(0);
            (index, id)
        })
        .collect();
    children.sort();
    children.into_iter().map(|(_, id)| id).collect()
}

/// Audio units in mixer order.
pub fn audio_units(graph: &Graph, root: EntityId) -> Vec<EntityId> {
    owned(graph, at(root, root::AUDIO_UNITS), Some(audio_unit::INDEX))
}

/// Tracks of a unit in lane order.
pub fn tracks(graph: &Graph, unit: EntityId) -> Vec<EntityId> {
    owned(graph, at(unit, audio_unit::TRACKS), Some(track::INDEX))
}

/// Effects of a unit in chain order.
pub fn devices(graph: &Graph, unit: EntityId) -> Vec<EntityId> {
    owned(graph, at(unit, audio_unit::EFFECTS), Some(device::INDEX))
}

/// The unit's instrument.
pub fn instrument(graph: &Graph, unit: EntityId) -> Option<EntityId> {
    owned(graph, at(unit, audio_unit::INPUT), None).into_iter().next()
}

/// Regions on a track, ordered by id.
pub fn regions(graph: &Graph, track: EntityId) -> Vec<EntityId> {
    owned(graph, at(track, track::REGIONS), None)
}

/// Currently selected nodes.
pub fn selected(graph: &Graph, root: EntityId) -> Vec<EntityId> {
    owned(graph, at(root, root::SELECTION), None)
        .into_iter()
        .filter_map(|entry| graph.target(&at(entry, selection::TARGET)).map(Address::entity))
        .collect()
}

/// A string field.
pub fn text(graph: &Graph, id: EntityId, key: FieldKey) -> Option<&str> {
    graph.value(&at(id, key)).and_then(|v| v.as_str())
}
