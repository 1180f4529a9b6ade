//! Pointer tags of the project schema.
//!
//! A pointer presents one tag; a target accepts a set of them.

use partita_core::PointerTag;

/// `AudioUnit.collection` into `Root.audio_units`.
pub const AUDIO_UNIT_HOST: PointerTag = PointerTag(0);
/// `Track.unit` into `AudioUnit.tracks`.
pub const TRACK_HOST: PointerTag = PointerTag(1);
/// Region `track` pointers into `Track.regions`.
pub const REGION_HOST: PointerTag = PointerTag(2);
/// `Device.host` into `AudioUnit.effects`.
pub const EFFECT_HOST: PointerTag = PointerTag(3);
/// `Instrument.host` into `AudioUnit.input`.
pub const INSTRUMENT_HOST: PointerTag = PointerTag(4);
/// Signal routing into an audio unit or `Root.master`.
pub const AUDIO_OUTPUT: PointerTag = PointerTag(5);
/// Automation lanes onto automatable parameters.
pub const AUTOMATION: PointerTag = PointerTag(6);
/// `AudioRegion.file` onto an `AudioFile`.
pub const AUDIO_FILE: PointerTag = PointerTag(7);
/// `Selection.owner` into `Root.selection`.
pub const SELECTION: PointerTag = PointerTag(8);
/// `Selection.target` onto any selectable node.
pub const SELECTABLE: PointerTag = PointerTag(9);
