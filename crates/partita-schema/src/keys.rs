//! Field keys, one module per node class.
//!
//! Keys are part of the snapshot format: never renumber, only append.

use partita_core::FieldKey;

/// `Root` fields.
pub mod root {
    use super::FieldKey;
    /// Socket owning audio units.
    pub const AUDIO_UNITS: FieldKey = 1;
    /// Socket owning selection entries.
    pub const SELECTION: FieldKey = 2;
    /// Master bus input.
    pub const MASTER: FieldKey = 3;
    /// Project name.
    pub const NAME: FieldKey = 4;
    /// Tempo in BPM.
    pub const TEMPO: FieldKey = 5;
}

/// `AudioUnit` fields.
pub mod audio_unit {
    use super::FieldKey;
    /// Owner pointer into `Root.audio_units`.
    pub const COLLECTION: FieldKey = 1;
    /// Where the unit's signal goes.
    pub const OUTPUT: FieldKey = 2;
    /// Socket owning tracks.
    pub const TRACKS: FieldKey = 3;
    /// Socket owning effect devices.
    pub const EFFECTS: FieldKey = 4;
    /// Socket owning the instrument.
    pub const INPUT: FieldKey = 5;
    /// Mixer position.
    pub const INDEX: FieldKey = 6;
    /// Linear gain.
    pub const VOLUME: FieldKey = 7;
    /// Stereo position, -1..1.
    pub const PANNING: FieldKey = 8;
    /// Mute switch.
    pub const MUTE: FieldKey = 9;
    /// Display name.
    pub const NAME: FieldKey = 10;
}

/// `Track` fields.
pub mod track {
    use super::FieldKey;
    /// Owner pointer into `AudioUnit.tracks`.
    pub const UNIT: FieldKey = 1;
    /// Socket owning regions.
    pub const REGIONS: FieldKey = 2;
    /// Lane position within the unit.
    pub const INDEX: FieldKey = 3;
    /// Playback switch.
    pub const ENABLED: FieldKey = 4;
    /// Automated parameter, for automation tracks.
    pub const AUTOMATES: FieldKey = 5;
}

/// `AudioRegion` fields.
pub mod audio_region {
    use super::FieldKey;
    /// Owner pointer into `Track.regions`.
    pub const TRACK: FieldKey = 1;
    /// Played file.
    pub const FILE: FieldKey = 2;
    /// Start in ticks.
    pub const POSITION: FieldKey = 3;
    /// Length in ticks.
    pub const DURATION: FieldKey = 4;
    /// Linear gain.
    pub const GAIN: FieldKey = 5;
    /// Display label.
    pub const LABEL: FieldKey = 6;
}

/// `NoteRegion` fields.
pub mod note_region {
    use super::FieldKey;
    /// Owner pointer into `Track.regions`.
    pub const TRACK: FieldKey = 1;
    /// Start in ticks.
    pub const POSITION: FieldKey = 2;
    /// Length in ticks.
    pub const DURATION: FieldKey = 3;
    /// Note events, see [`note`](super::note).
    pub const NOTES: FieldKey = 4;
    /// Display label.
    pub const LABEL: FieldKey = 5;
}

/// Fields of one `NoteRegion.notes` element.
pub mod note {
    use super::FieldKey;
    /// MIDI pitch.
    pub const PITCH: FieldKey = 1;
    /// Velocity, 0..1.
    pub const VELOCITY: FieldKey = 2;
    /// Start relative to the region, in ticks.
    pub const POSITION: FieldKey = 3;
    /// Length in ticks.
    pub const DURATION: FieldKey = 4;
}

/// `AudioFile` fields.
pub mod audio_file {
    use super::FieldKey;
    /// Media location.
    pub const PATH: FieldKey = 1;
    /// Display name.
    pub const NAME: FieldKey = 2;
    /// Length in seconds; `0` means not yet known.
    pub const DURATION: FieldKey = 3;
}

/// `Device` fields.
pub mod device {
    use super::FieldKey;
    /// Owner pointer into `AudioUnit.effects`.
    pub const HOST: FieldKey = 1;
    /// Catalog id, see [`DeviceCatalog`](crate::DeviceCatalog).
    pub const KIND: FieldKey = 2;
    /// Position in the chain.
    pub const INDEX: FieldKey = 3;
    /// Bypass switch (inverted).
    pub const ENABLED: FieldKey = 4;
    /// Parameter values, one per catalog parameter.
    pub const PARAMS: FieldKey = 5;
    /// Display label.
    pub const LABEL: FieldKey = 6;
}

/// `Instrument` fields.
pub mod instrument {
    use super::FieldKey;
    /// Owner pointer into `AudioUnit.input`.
    pub const HOST: FieldKey = 1;
    /// Catalog id.
    pub const KIND: FieldKey = 2;
    /// Parameter values.
    pub const PARAMS: FieldKey = 3;
    /// Display label.
    pub const LABEL: FieldKey = 4;
}

/// `Selection` fields.
pub mod selection {
    use super::FieldKey;
    /// Owner pointer into `Root.selection`.
    pub const OWNER: FieldKey = 1;
    /// Selected node.
    pub const TARGET: FieldKey = 2;
}
