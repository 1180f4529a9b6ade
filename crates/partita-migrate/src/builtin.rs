//! Upgrade steps for the project schema.

use partita_core::{Address, ClassId, FieldKey, Node};
use partita_schema::keys::{audio_file, device, instrument};
use partita_schema::{BoxClass, DeviceCatalog};

use crate::error::MigrationError;
use crate::migration::{Migration, MigrationContext, MigrationRegistry, Patch};

/// v2: stores the length of every audio file instead of decoding it on load.
///
/// Files saved before v2 carry a duration of `0`. The step decodes the
/// referenced media through the [`SampleResolver`](crate::SampleResolver);
/// when the media is unavailable the file keeps its unknown duration.
#[derive(Debug, Clone, Copy, Default)]
pub struct AudioFileDuration;

impl Migration for AudioFileDuration {
    fn name(&self) -> &'static str {
        "audio-file-duration"
    }

    fn class(&self) -> ClassId {
        BoxClass::AudioFile.id()
    }

    fn version(&self) -> u32 {
        2
    }

    fn applies(&self, node: &Node) -> bool {
        value_f32(node, audio_file::DURATION).is_none_or(|d| d <= 0.0)
    }

    fn prepare(&self, node: &Node, ctx: &MigrationContext<'_>) -> Result<Patch, MigrationError> {
        let path = node
            .field(audio_file::PATH)
            .and_then(|f| f.as_value())
            .and_then(|v| v.as_str())
            .ok_or_else(|| MigrationError::malformed(node.id(), "audio file has no path"))?;
        if path.is_empty() {
            return Err(MigrationError::unavailable(path, "empty path"));
        }
        let duration = ctx.resolver.duration(path)?;
        if duration.is_nan() || duration <= 0.0 {
            return Err(MigrationError::unavailable(path, "media has no frames"));
        }
        Ok(Patch::new().set(node.address().append(audio_file::DURATION), duration))
    }
}

/// v3: grows parameter arrays to one slot per catalog parameter.
///
/// Registered once for `Device` and once for `Instrument` nodes. Kinds
/// missing from the catalog are left alone.
#[derive(Debug, Clone)]
pub struct ParameterSlots {
    name: &'static str,
    class: BoxClass,
    kind: FieldKey,
    params: FieldKey,
    catalog: DeviceCatalog,
}

impl ParameterSlots {
    /// Step for effect devices.
    pub fn devices(catalog: DeviceCatalog) -> Self {
        Self {
            name: "device-parameter-slots",
            class: BoxClass::Device,
            kind: device::KIND,
            params: device::PARAMS,
            catalog,
        }
    }

    /// Step for instruments.
    pub fn instruments(catalog: DeviceCatalog) -> Self {
        Self {
            name: "instrument-parameter-slots",
            class: BoxClass::Instrument,
            kind: instrument::KIND,
            params: instrument::PARAMS,
            catalog,
        }
    }

    fn slots(&self, node: &Node) -> Option<(usize, usize)> {
        let kind = node.field(self.kind)?.as_value()?.as_str()?;
        let descriptor = self.catalog.get(kind)?;
        let present = node.field(self.params)?.as_array()?.len();
        Some((present, descriptor.param_count()))
    }
}

impl Migration for ParameterSlots {
    fn name(&self) -> &'static str {
        self.name
    }

    fn class(&self) -> ClassId {
        self.class.id()
    }

    fn version(&self) -> u32 {
        3
    }

    fn applies(&self, node: &Node) -> bool {
        self.slots(node).is_some_and(|(present, wanted)| present < wanted)
    }

    fn prepare(&self, node: &Node, _ctx: &MigrationContext<'_>) -> Result<Patch, MigrationError> {
        let kind = node
            .field(self.kind)
            .and_then(|f| f.as_value())
            .and_then(|v| v.as_str())
            .and_then(|k| self.catalog.get(k))
            .ok_or_else(|| MigrationError::malformed(node.id(), "unknown device kind"))?;
        let (present, _) = self
            .slots(node)
            .ok_or_else(|| MigrationError::malformed(node.id(), "parameter array missing"))?;
        let array = node.address().append(self.params);
        let patch = kind
            .params
            .get(present..)
            .unwrap_or_default()
            .iter()
            .fold(Patch::new(), |patch, spec| patch.push(array.clone(), spec.default));
        Ok(patch)
    }
}

fn value_f32(node: &Node, key: FieldKey) -> Option<f32> {
    node.field(key)?.as_value()?.as_f32()
}

/// Registry with every project upgrade step in declared order.
pub fn builtin_registry() -> Result<MigrationRegistry, MigrationError> {
    let catalog = DeviceCatalog::new();
    let mut registry = MigrationRegistry::new();
    registry.register(AudioFileDuration)?;
    registry.register(ParameterSlots::devices(catalog.clone()))?;
    registry.register(ParameterSlots::instruments(catalog))?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::NoMedia;
    use partita_core::Graph;
    use partita_schema::{project, registry};

    fn ctx(resolver: &dyn crate::SampleResolver) -> MigrationContext<'_> {
        MigrationContext { resolver }
    }

    fn graph_with<F>(build: F) -> (Graph, partita_core::EntityId)
    where
        F: FnOnce(&mut Graph) -> Result<partita_core::EntityId, partita_core::GraphError>,
    {
        let mut graph = Graph::new(registry().unwrap());
        let id = graph.transaction(build).unwrap().0;
        (graph, id)
    }

    #[test]
    fn duration_applies_only_to_unknown_lengths() {
        let (graph, known) = graph_with(|g| project::add_audio_file(g, "a.wav", 1.5));
        assert!(!AudioFileDuration.applies(graph.node(known).unwrap()));
        let (graph, unknown) = graph_with(|g| project::add_audio_file(g, "a.wav", 0.0));
        assert!(AudioFileDuration.applies(graph.node(unknown).unwrap()));
    }

    #[test]
    fn duration_patch_sets_resolved_length() {
        let (graph, file) = graph_with(|g| project::add_audio_file(g, "a.wav", 0.0));
        let resolver = |_: &str| Ok::<f32, MigrationError>(4.25);
        let patch = AudioFileDuration
            .prepare(graph.node(file).unwrap(), &ctx(&resolver))
            .unwrap();
        assert_eq!(
            patch,
            Patch::new().set(Address::compose(file).append(audio_file::DURATION), 4.25f32)
        );
    }

    #[test]
    fn duration_lookup_failure_yields_no_patch() {
        let (graph, file) = graph_with(|g| project::add_audio_file(g, "gone.wav", 0.0));
        let err = AudioFileDuration
            .prepare(graph.node(file).unwrap(), &ctx(&NoMedia))
            .unwrap_err();
        assert!(matches!(err, MigrationError::ResourceUnavailable { ref path, .. } if path == "gone.wav"));

        let silent = |_: &str| Ok::<f32, MigrationError>(0.0);
        assert!(AudioFileDuration.prepare(graph.node(file).unwrap(), &ctx(&silent)).is_err());
    }

    #[test]
    fn parameter_slots_fill_missing_defaults() {
        let catalog = DeviceCatalog::new();
        let compressor = catalog.get("compressor").unwrap().clone();
        let (mut graph, dev) = graph_with(|g| {
            let root = project::create_root(g)?;
            let unit = project::add_audio_unit(g, root, "Bus")?;
            project::add_device(g, unit, &compressor)
        });
        let params = Address::compose(dev).append(device::PARAMS);
        graph
            .transaction(|g| {
                g.pop_element(&params)?;
                g.pop_element(&params)
            })
            .unwrap();

        let step = ParameterSlots::devices(catalog);
        let node = graph.node(dev).unwrap();
        assert!(step.applies(node));
        let patch = step.prepare(node, &ctx(&NoMedia)).unwrap();
        assert_eq!(
            patch,
            Patch::new()
                .push(params.clone(), compressor.params[4].default)
                .push(params.clone(), compressor.params[5].default)
        );
        graph.transaction(|g| patch.apply(g)).unwrap();
        assert!(!step.applies(graph.node(dev).unwrap()));
        assert_eq!(graph.value(&params.append(5)).and_then(|v| v.as_f32()), Some(0.0));
    }

    #[test]
    fn unknown_kinds_are_skipped() {
        let (mut graph, dev) = graph_with(|g| {
            let root = project::create_root(g)?;
            let unit = project::add_audio_unit(g, root, "Bus")?;
            project::add_device(g, unit, DeviceCatalog::new().get("gain").unwrap())
        });
        graph
            .transaction(|g| g.set_value(&Address::compose(dev).append(device::KIND), "vintage-box"))
            .unwrap();
        let step = ParameterSlots::devices(DeviceCatalog::new());
        assert!(!step.applies(graph.node(dev).unwrap()));
    }

    #[test]
    fn builtin_registry_is_ordered() {
        let registry = builtin_registry().unwrap();
        let names: Vec<_> = registry.iter().map(|m| (m.name(), m.version())).collect();
        assert_eq!(
            names,
            vec![
                ("audio-file-duration", 2),
                ("device-parameter-slots", 3),
                ("instrument-parameter-slots", 3),
            ]
        );
        assert_eq!(registry.latest_version(), partita_schema::SCHEMA_VERSION);
    }
}
