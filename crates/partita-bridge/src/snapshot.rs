//! Render-side projection of a project graph.
//!
//! The graph is single-threaded and keeps `Rc` observers, so it never
//! crosses to the audio thread. What crosses is a [`RenderSnapshot`]: plain
//! owned data covering exactly what playback needs, built on the edit
//! thread after a commit.

use partita_core::{Address, EntityId, FieldKey, Graph};
use partita_schema::keys::{audio_file, audio_region, audio_unit, device, instrument, note, note_region, root};
use partita_schema::{BoxClass, project};

use crate::error::BridgeError;

/// Effect or instrument as the engine sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceState {
    /// Node id.
    pub id: EntityId,
    /// Catalog id.
    pub kind: String,
    /// Bypass flag, inverted.
    pub enabled: bool,
    /// Parameter values in slot order.
    pub params: Vec<f32>,
}

/// What a region plays.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionContent {
    /// An audio file.
    Audio {
        /// File node id.
        file: EntityId,
        /// Linear gain.
        gain: f32,
    },
    /// Note events as `(pitch, velocity, position, duration)`.
    Notes(Vec<(i32, f32, i64, i64)>),
}

/// A region on the timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionState {
    /// Node id.
    pub id: EntityId,
    /// Start in ticks.
    pub position: i64,
    /// Length in ticks.
    pub duration: i64,
    /// Payload.
    pub content: RegionContent,
}

/// One mixer channel.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitState {
    /// Node id.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Linear volume.
    pub volume: f32,
    /// Pan, -1..1.
    pub panning: f32,
    /// Mute flag.
    pub mute: bool,
    /// Sound source, if any.
    pub instrument: Option<DeviceState>,
    /// Effect chain in processing order.
    pub effects: Vec<DeviceState>,
    /// Regions of every enabled track, by start position.
    pub regions: Vec<RegionState>,
}

/// Sample file known to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct FileState {
    /// Node id.
    pub id: EntityId,
    /// Media path.
    pub path: String,
    /// Length in seconds, 0 if unknown.
    pub duration: f32,
}

/// Immutable view of a project for the render thread.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderSnapshot {
    /// Graph revision the snapshot was taken at.
    pub revision: u64,
    /// Tempo in BPM.
    pub tempo: f32,
    /// Mixer channels in mixer order.
    pub units: Vec<UnitState>,
    /// Sample files, ordered by id.
    pub files: Vec<FileState>,
}

impl RenderSnapshot {
    /// Projects the project rooted at the graph's root node.
    pub fn capture(graph: &Graph) -> Result<Self, BridgeError> {
        let root = project::find_root(graph).ok_or(BridgeError::NoRoot)?;
        let units = project::audio_units(graph, root)
            .into_iter()
            .map(|unit| unit_state(graph, unit))
            .collect();
        let files = graph
            .nodes_of_class(BoxClass::AudioFile.id())
            .map(|file| FileState {
                id: file.id(),
                path: text(graph, file.id(), audio_file::PATH),
                duration: float(graph, file.id(), audio_file::DURATION, 0.0),
            })
            .collect();
        Ok(Self {
            revision: graph.revision(),
            tempo: float(graph, root, root::TEMPO, 120.0),
            units,
            files,
        })
    }

    /// Finds a unit by id.
    pub fn unit(&self, id: EntityId) -> Option<&UnitState> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Finds a region by id across all units.
    pub fn region(&self, id: EntityId) -> Option<&RegionState> {
        self.units.iter().flat_map(|u| &u.regions).find(|r| r.id == id)
    }

    /// Finds a file by id.
    pub fn file(&self, id: EntityId) -> Option<&FileState> {
        self.files.iter().find(|f| f.id == id)
    }
}

fn at(id: EntityId, key: FieldKey) -> Address {
    Address::compose(id).append(key)
}

fn float(graph: &Graph, id: EntityId, key: FieldKey, default: f32) -> f32 {
    graph.value(&at(id, key)).and_then(|v| v.as_f32()).unwrap_or(default)
}

fn int64(graph: &Graph, id: EntityId, key: FieldKey) -> i64 {
    graph.value(&at(id, key)).and_then(|v| v.as_i64()).unwrap_or(0)
}

fn flag(graph: &Graph, id: EntityId, key: FieldKey, default: bool) -> bool {
    graph.value(&at(id, key)).and_then(|v| v.as_bool()).unwrap_or(default)
}

fn text(graph: &Graph, id: EntityId, key: FieldKey) -> String {
    project::text(graph, id, key).unwrap_or_default().to_owned()
}

fn params(graph: &Graph, array: &Address) -> Vec<f32> {
    graph
        .field(array)
        .and_then(|f| f.as_array())
        .map(|a| {
            a.iter()
                .map(|slot| slot.as_value().and_then(|v| v.as_f32()).unwrap_or(0.0))
                .collect()
        })
        .unwrap_or_default()
}

fn device_state(graph: &Graph, id: EntityId, kind: FieldKey, array: FieldKey, enabled: Option<FieldKey>) -> DeviceState {
    DeviceState {
        id,
        kind: text(graph, id, kind),
        enabled: enabled.is_none_or(|key| flag(graph, id, key, true)),
        params: params(graph, &at(id, array)),
    }
}

fn unit_state(graph: &Graph, unit: EntityId) -> UnitState {
    let mut regions: Vec<RegionState> = project::tracks(graph, unit)
        .into_iter()
        .filter(|&track| flag(graph, track, partita_schema::keys::track::ENABLED, true))
        .flat_map(|track| project::regions(graph, track))
        .filter_map(|region| region_state(graph, region))
        .collect();
    regions.sort_by_key(|r| (r.position, r.id));
    UnitState {
        id: unit,
        name: text(graph, unit, audio_unit::NAME),
        volume: float(graph, unit, audio_unit::VOLUME, 1.0),
        panning: float(graph, unit, audio_unit::PANNING, 0.0),
        mute: flag(graph, unit, audio_unit::MUTE, false),
        instrument: project::instrument(graph, unit)
            .map(|id| device_state(graph, id, instrument::KIND, instrument::PARAMS, None)),
        effects: project::devices(graph, unit)
            .into_iter()
            .map(|id| device_state(graph, id, device::KIND, device::PARAMS, Some(device::ENABLED)))
            .collect(),
        regions,
    }
}

fn region_state(graph: &Graph, region: EntityId) -> Option<RegionState> {
    let (position, duration, content) = match project::class_of(graph, region)? {
        BoxClass::AudioRegion => (
            int64(graph, region, audio_region::POSITION),
            int64(graph, region, audio_region::DURATION),
            RegionContent::Audio {
                file: graph.target(&at(region, audio_region::FILE))?.entity(),
                gain: float(graph, region, audio_region::GAIN, 1.0),
            },
        ),
        BoxClass::NoteRegion => {
            let notes = graph
                .field(&at(region, note_region::NOTES))
                .and_then(|f| f.as_array())
                .map(|array| {
                    (0..array.len())
                        .map(|i| {
                            let element = at(region, note_region::NOTES).append(i as FieldKey);
                            let read = |key| graph.value(&element.append(key));
                            (
                                read(note::PITCH).and_then(|v| v.as_i32()).unwrap_or(60),
                                read(note::VELOCITY).and_then(|v| v.as_f32()).unwrap_or(0.8),
                                read(note::POSITION).and_then(|v| v.as_i64()).unwrap_or(0),
                                read(note::DURATION).and_then(|v| v.as_i64()).unwrap_or(0),
                            )
                        })
                        .collect()
                })
                .unwrap_or_default();
            (
                int64(graph, region, note_region::POSITION),
                int64(graph, region, note_region::DURATION),
                RegionContent::Notes(notes),
            )
        }
        _ => return None,
    };
    Some(RegionState {
        id: region,
        position,
        duration,
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use partita_schema::{DeviceCatalog, registry};

    #[test]
    fn empty_graph_has_no_root() {
        let graph = Graph::new(registry().unwrap());
        assert_eq!(RenderSnapshot::capture(&graph), Err(BridgeError::NoRoot));
    }

    #[test]
    fn captures_units_devices_and_regions() {
        let catalog = DeviceCatalog::new();
        let (mut graph, root) = project::new_project(registry().unwrap()).unwrap();
        let ((unit, late, early, file), _) = graph
            .transaction(|g| {
                let unit = project::add_audio_unit(g, root, "Lead")?;
                project::set_instrument(g, unit, catalog.get("sampler").unwrap())?;
                project::add_device(g, unit, catalog.get("delay").unwrap())?;
                let track = project::add_track(g, unit)?;
                let file = project::add_audio_file(g, "/a/hit.wav", 0.5)?;
                let late = project::add_audio_region(g, track, file, 960, 480)?;
                let early = project::add_note_region(g, track, 0, 960)?;
                project::add_note(
                    g,
                    early,
                    project::Note {
                        pitch: 64,
                        velocity: 1.0,
                        position: 0,
                        duration: 240,
                    },
                )?;
                Ok((unit, late, early, file))
            })
            .unwrap();

        let snapshot = RenderSnapshot::capture(&graph).unwrap();
        assert_eq!(snapshot.revision, graph.revision());
        assert_eq!(snapshot.tempo, 120.0);
        let lead = snapshot.unit(unit).unwrap();
        assert_eq!(lead.name, "Lead");
        assert_eq!(lead.instrument.as_ref().map(|i| i.kind.as_str()), Some("sampler"));
        assert_eq!(lead.effects.len(), 1);
        assert_eq!(lead.effects[0].params.len(), 4);
        let order: Vec<_> = lead.regions.iter().map(|r| r.id).collect();
        assert_eq!(order, vec![early, late]);
        assert_eq!(
            snapshot.region(early).map(|r| &r.content),
            Some(&RegionContent::Notes(vec![(64, 1.0, 0, 240)]))
        );
        assert_eq!(snapshot.file(file).map(|f| f.path.as_str()), Some("/a/hit.wav"));
    }
}
