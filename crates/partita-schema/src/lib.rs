//! Project schema for partita documents.
//!
//! This crate declares the closed set of node classes a project graph may
//! contain, the pointer tags that wire them together, and the device catalog
//! that decides how many parameter slots a device carries.
//!
//! # Node Classes
//!
//! ```text
//! Root ─ audio_units ◄── AudioUnit ─ tracks  ◄── Track ─ regions ◄── AudioRegion ──► AudioFile
//!      │                           ├ effects ◄── Device               └──────────◄── NoteRegion
//!      │                           └ input   ◄── Instrument
//!      └ selection   ◄── Selection ──► (Track | AudioRegion | NoteRegion | Device | Instrument)
//! ```
//!
//! Every arrow is a mandatory pointer with the cascade policy, so deleting a
//! container deletes its contents. `AudioFile` is a resource: dependency
//! walks stop there and presets keep referencing the file in place.
//! Regions point at their file with a rejecting pointer, so a file in use
//! cannot be deleted.
//!
//! # Example
//!
//! ```rust,ignore
//! use partita_schema::{project, registry};
//!
//! let (mut graph, root) = project::new_project(registry()?)?;
//! graph.transaction(|g| {
//!     let unit = project::add_audio_unit(g, root, "Bass")?;
//!     project::add_device(g, unit, "compressor")
//! })?;
//! ```

pub mod devices;
pub mod keys;
pub mod project;
pub mod tags;

use std::sync::Arc;

use partita_core::{
    AcceptSet, ClassId, ClassSchema, FieldSchema, PointerRule, SchemaError, SchemaRegistry,
};

pub use devices::{DeviceCatalog, DeviceCategory, DeviceDescriptor, ParamSpec};

/// Current project schema version.
///
/// - v1: initial layout
/// - v2: `AudioFile.duration` is stored instead of decoded on every load
/// - v3: devices carry one slot per catalog parameter
pub const SCHEMA_VERSION: u32 = 3;

/// Every node class of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BoxClass {
    /// Project root: owns audio units and the selection.
    Root,
    /// Channel strip: tracks, effect chain, optional instrument.
    AudioUnit,
    /// Timeline lane inside an audio unit.
    Track,
    /// Region playing an audio file.
    AudioRegion,
    /// Region holding note events.
    NoteRegion,
    /// Externally stored sample data.
    AudioFile,
    /// Effect in an audio unit's chain.
    Device,
    /// Sound source of an audio unit.
    Instrument,
    /// One selected item.
    Selection,
}

impl BoxClass {
    /// All classes in id order.
    pub const ALL: [BoxClass; 9] = [
        BoxClass::Root,
        BoxClass::AudioUnit,
        BoxClass::Track,
        BoxClass::AudioRegion,
        BoxClass::NoteRegion,
        BoxClass::AudioFile,
        BoxClass::Device,
        BoxClass::Instrument,
        BoxClass::Selection,
    ];

    /// Stable class id used in snapshots.
    pub const fn id(self) -> ClassId {
        ClassId(self as u16)
    }

    /// Class for a stored id.
    pub fn from_id(id: ClassId) -> Option<Self> {
        Self::ALL.get(usize::from(id.0)).copied()
    }

    /// Class name.
    pub const fn name(self) -> &'static str {
        match self {
            BoxClass::Root => "Root",
            BoxClass::AudioUnit => "AudioUnit",
            BoxClass::Track => "Track",
            BoxClass::AudioRegion => "AudioRegion",
            BoxClass::NoteRegion => "NoteRegion",
            BoxClass::AudioFile => "AudioFile",
            BoxClass::Device => "Device",
            BoxClass::Instrument => "Instrument",
            BoxClass::Selection => "Selection",
        }
    }

    /// `true` for classes whose nodes can be selected.
    pub const fn is_selectable(self) -> bool {
        matches!(
            self,
            BoxClass::Track
                | BoxClass::AudioRegion
                | BoxClass::NoteRegion
                | BoxClass::Device
                | BoxClass::Instrument
        )
    }

    /// Field layout of this class.
    pub fn schema(self) -> ClassSchema {
        use keys::*;
        use tags::*;

        let socket = |key, name, tag| FieldSchema::object(key, name, vec![]).accepting(AcceptSet::of(&[tag]));
        let owner = |key, name, tag| FieldSchema::pointer(key, name, PointerRule::mandatory(tag).cascading());
        let automatable = |key, name, default: f32| {
            FieldSchema::primitive(key, name, default).accepting(AcceptSet::of(&[AUTOMATION]))
        };
        let selectable = AcceptSet::of(&[SELECTABLE]);

        let class = ClassSchema::new(self.id(), self.name());
        match self {
            BoxClass::Root => class
                .field(socket(root::AUDIO_UNITS, "audio_units", AUDIO_UNIT_HOST))
                .field(socket(root::SELECTION, "selection", SELECTION))
                .field(socket(root::MASTER, "master", AUDIO_OUTPUT))
                .field(FieldSchema::primitive(root::NAME, "name", "Untitled"))
                .field(FieldSchema::primitive(root::TEMPO, "tempo", 120.0f32)),
            BoxClass::AudioUnit => class
                .accepting(AcceptSet::of(&[AUDIO_OUTPUT]))
                .field(owner(audio_unit::COLLECTION, "collection", AUDIO_UNIT_HOST))
                .field(FieldSchema::pointer(
                    audio_unit::OUTPUT,
                    "output",
                    PointerRule::optional(AUDIO_OUTPUT),
                ))
                .field(socket(audio_unit::TRACKS, "tracks", TRACK_HOST))
                .field(socket(audio_unit::EFFECTS, "effects", EFFECT_HOST))
                .field(socket(audio_unit::INPUT, "input", INSTRUMENT_HOST))
                .field(FieldSchema::primitive(audio_unit::INDEX, "index", 0))
                .field(automatable(audio_unit::VOLUME, "volume", 1.0))
                .field(automatable(audio_unit::PANNING, "panning", 0.0))
                .field(FieldSchema::primitive(audio_unit::MUTE, "mute", false))
                .field(FieldSchema::primitive(audio_unit::NAME, "name", "")),
            BoxClass::Track => class
                .accepting(selectable)
                .field(owner(track::UNIT, "unit", TRACK_HOST))
                .field(socket(track::REGIONS, "regions", REGION_HOST))
                .field(FieldSchema::primitive(track::INDEX, "index", 0))
                .field(FieldSchema::primitive(track::ENABLED, "enabled", true))
                .field(FieldSchema::pointer(
                    track::AUTOMATES,
                    "automates",
                    PointerRule::optional(AUTOMATION),
                )),
            BoxClass::AudioRegion => class
                .accepting(selectable)
                .field(owner(audio_region::TRACK, "track", REGION_HOST))
                .field(FieldSchema::pointer(
                    audio_region::FILE,
                    "file",
                    PointerRule::mandatory(AUDIO_FILE),
                ))
                .field(FieldSchema::primitive(audio_region::POSITION, "position", 0i64))
                .field(FieldSchema::primitive(audio_region::DURATION, "duration", 0i64))
                .field(FieldSchema::primitive(audio_region::GAIN, "gain", 1.0f32))
                .field(FieldSchema::primitive(audio_region::LABEL, "label", "")),
            BoxClass::NoteRegion => class
                .accepting(selectable)
                .field(owner(note_region::TRACK, "track", REGION_HOST))
                .field(FieldSchema::primitive(note_region::POSITION, "position", 0i64))
                .field(FieldSchema::primitive(note_region::DURATION, "duration", 0i64))
                .field(FieldSchema::array(
                    note_region::NOTES,
                    "notes",
                    FieldSchema::object(
                        0,
                        "note",
                        vec![
                            FieldSchema::primitive(note::PITCH, "pitch", 60),
                            FieldSchema::primitive(note::VELOCITY, "velocity", 0.8f32),
                            FieldSchema::primitive(note::POSITION, "position", 0i64),
                            FieldSchema::primitive(note::DURATION, "duration", 0i64),
                        ],
                    ),
                    0,
                ))
                .field(FieldSchema::primitive(note_region::LABEL, "label", "")),
            BoxClass::AudioFile => class
                .accepting(AcceptSet::of(&[AUDIO_FILE]))
                .resource()
                .field(FieldSchema::primitive(audio_file::PATH, "path", ""))
                .field(FieldSchema::primitive(audio_file::NAME, "name", ""))
                .field(FieldSchema::primitive(audio_file::DURATION, "duration", 0.0f32)),
            BoxClass::Device => class
                .accepting(selectable)
                .field(owner(device::HOST, "host", EFFECT_HOST))
                .field(FieldSchema::primitive(device::KIND, "kind", ""))
                .field(FieldSchema::primitive(device::INDEX, "index", 0))
                .field(FieldSchema::primitive(device::ENABLED, "enabled", true))
                .field(FieldSchema::array(
                    device::PARAMS,
                    "params",
                    automatable(0, "param", 0.0),
                    0,
                ))
                .field(FieldSchema::primitive(device::LABEL, "label", "")),
            BoxClass::Instrument => class
                .accepting(selectable)
                .field(owner(instrument::HOST, "host", INSTRUMENT_HOST))
                .field(FieldSchema::primitive(instrument::KIND, "kind", ""))
                .field(FieldSchema::array(
                    instrument::PARAMS,
                    "params",
                    automatable(0, "param", 0.0),
                    0,
                ))
                .field(FieldSchema::primitive(instrument::LABEL, "label", "")),
            BoxClass::Selection => class
                .field(owner(selection::OWNER, "owner", SELECTION))
                .field(owner(selection::TARGET, "target", SELECTABLE)),
        }
    }
}

impl From<BoxClass> for ClassId {
    fn from(class: BoxClass) -> Self {
        class.id()
    }
}

/// Builds the registry of all project classes at [`SCHEMA_VERSION`].
pub fn build_registry() -> Result<SchemaRegistry, SchemaError> {
    let mut registry = SchemaRegistry::new(SCHEMA_VERSION);
    for class in BoxClass::ALL {
        registry.register(class.schema())?;
    }
    Ok(registry)
}

/// Shared registry handle for graphs.
pub fn registry() -> Result<Arc<SchemaRegistry>, SchemaError> {
    build_registry().map(Arc::new)
}
