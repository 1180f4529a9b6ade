//! Device catalog.
//!
//! A `Device` or `Instrument` node stores its catalog id in `kind` and one
//! parameter slot per catalog parameter. Parameters added after a device
//! first shipped record the schema version that introduced them, which is
//! what the parameter-slot migration uses to grow older devices.

/// Broad grouping of devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceCategory {
    /// Insert effect in an audio unit's chain.
    Effect,
    /// Sound source at the start of a chain.
    Instrument,
}

impl DeviceCategory {
    /// Returns a human-readable name for the category.
    pub const fn name(&self) -> &'static str {
        match self {
            DeviceCategory::Effect => "Effect",
            DeviceCategory::Instrument => "Instrument",
        }
    }
}

/// One parameter of a device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    /// Parameter name.
    pub name: &'static str,
    /// Value of a fresh slot.
    pub default: f32,
    /// Schema version that introduced the parameter.
    pub since: u32,
}

impl ParamSpec {
    const fn v1(name: &'static str, default: f32) -> Self {
        Self {
            name,
            default,
            since: 1,
        }
    }

    const fn added(name: &'static str, default: f32, since: u32) -> Self {
        Self {
            name,
            default,
            since,
        }
    }
}

/// Describes a device in the catalog.
#[derive(Debug, Clone)]
pub struct DeviceDescriptor {
    /// Unique identifier (lowercase, no spaces).
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Category.
    pub category: DeviceCategory,
    /// Parameters in slot order.
    pub params: &'static [ParamSpec],
}

impl DeviceDescriptor {
    /// Number of parameter slots at the current schema version.
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Number of parameter slots a device saved at `version` carried.
    pub fn param_count_at(&self, version: u32) -> usize {
        self.params.iter().filter(|p| p.since <= version).count()
    }
}

const COMPRESSOR: &[ParamSpec] = &[
    ParamSpec::v1("threshold", -18.0),
    ParamSpec::v1("ratio", 4.0),
    ParamSpec::v1("attack", 10.0),
    ParamSpec::v1("release", 100.0),
    ParamSpec::added("knee", 6.0, 3),
    ParamSpec::added("makeup", 0.0, 3),
];

const DELAY: &[ParamSpec] = &[
    ParamSpec::v1("time", 375.0),
    ParamSpec::v1("feedback", 0.4),
    ParamSpec::v1("mix", 0.3),
    ParamSpec::added("ping_pong", 0.0, 3),
];

const REVERB: &[ParamSpec] = &[
    ParamSpec::v1("room_size", 0.5),
    ParamSpec::v1("damping", 0.5),
    ParamSpec::v1("mix", 0.3),
    ParamSpec::v1("predelay", 10.0),
];

const EQ: &[ParamSpec] = &[
    ParamSpec::v1("low_gain", 0.0),
    ParamSpec::v1("mid_gain", 0.0),
    ParamSpec::v1("mid_freq", 1000.0),
    ParamSpec::v1("high_gain", 0.0),
];

const GAIN: &[ParamSpec] = &[ParamSpec::v1("gain", 0.0)];

const SUBTRACTIVE: &[ParamSpec] = &[
    ParamSpec::v1("cutoff", 2000.0),
    ParamSpec::v1("resonance", 0.2),
    ParamSpec::v1("attack", 5.0),
    ParamSpec::v1("release", 200.0),
    ParamSpec::added("glide", 0.0, 3),
];

const SAMPLER: &[ParamSpec] = &[ParamSpec::v1("gain", 0.0), ParamSpec::v1("tune", 0.0)];

/// Catalog of all device kinds.
#[derive(Debug, Clone)]
pub struct DeviceCatalog {
    entries: Vec<DeviceDescriptor>,
}

impl Default for DeviceCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceCatalog {
    /// Creates a catalog with all built-in devices.
    pub fn new() -> Self {
        let mut catalog = Self {
            entries: Vec::with_capacity(7),
        };
        catalog.register_builtin_devices();
        catalog
    }

    fn register_builtin_devices(&mut self) {
        use DeviceCategory::{Effect, Instrument};
        let builtin = [
            ("compressor", "Compressor", Effect, COMPRESSOR),
            ("delay", "Delay", Effect, DELAY),
            ("reverb", "Reverb", Effect, REVERB),
            ("eq", "Equalizer", Effect, EQ),
            ("gain", "Gain", Effect, GAIN),
            ("subtractive", "Subtractive Synth", Instrument, SUBTRACTIVE),
            ("sampler", "Sampler", Instrument, SAMPLER),
        ];
        for (id, name, category, params) in builtin {
            self.register(DeviceDescriptor {
                id,
                name,
                category,
                params,
            });
        }
    }

    /// Adds a device. A later registration with the same id replaces it.
    pub fn register(&mut self, descriptor: DeviceDescriptor) {
        self.entries.retain(|d| d.id != descriptor.id);
        self.entries.push(descriptor);
    }

    /// All devices in registration order.
    pub fn all(&self) -> &[DeviceDescriptor] {
        &self.entries
    }

    /// Devices of one category.
    pub fn in_category(&self, category: DeviceCategory) -> Vec<&DeviceDescriptor> {
        self.entries.iter().filter(|d| d.category == category).collect()
    }

    /// Looks up a device by id.
    pub fn get(&self, id: &str) -> Option<&DeviceDescriptor> {
        self.entries.iter().find(|d| d.id == id)
    }

    /// Returns the number of devices.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
