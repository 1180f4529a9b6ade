//! Engine settings file.

use serde::{Deserialize, Serialize};
use std::path::Path;

use partita_core::{DEFAULT_UNDO_LIMIT, DependencyOptions};
use partita_migrate::LoadOptions;

use crate::error::ConfigError;
use crate::paths::config_file_path;

/// Engine settings.
///
/// Every section and key is optional; missing values take their defaults.
///
/// # TOML Format
///
/// ```toml
/// [history]
/// max_undo = 100          # 0 keeps every edit
///
/// [load]
/// strict_migrations = false
///
/// [export]
/// follow_mandatory_only = false
/// stop_at_resources = true
/// include_owned = true
///
/// [bridge]
/// retain_snapshots = 4
/// clock_window = 64
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Undo history.
    pub history: HistoryConfig,
    /// Project loading.
    pub load: LoadConfig,
    /// Subgraph export.
    pub export: ExportConfig,
    /// Edit/render bridge.
    pub bridge: BridgeConfig,
}

/// `[history]`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HistoryConfig {
    /// Captured edits kept for undo; `0` means unlimited.
    pub max_undo: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_undo: DEFAULT_UNDO_LIMIT,
        }
    }
}

/// `[load]`
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoadConfig {
    /// Refuse to open a project if any migration step fails.
    pub strict_migrations: bool,
}

impl LoadConfig {
    /// Options for [`partita_migrate::load`].
    pub fn options(&self) -> LoadOptions {
        LoadOptions {
            strict_migrations: self.strict_migrations,
        }
    }
}

/// `[export]`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExportConfig {
    /// Follow only mandatory pointers out of the exported nodes.
    pub follow_mandatory_only: bool,
    /// Leave resource nodes (audio files) out of presets.
    pub stop_at_resources: bool,
    /// Pull in nodes owned by the exported ones.
    pub include_owned: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        let walk = DependencyOptions::default();
        Self {
            follow_mandatory_only: walk.follow_mandatory_only,
            stop_at_resources: walk.stop_at_resources,
            include_owned: walk.include_owned,
        }
    }
}

impl ExportConfig {
    /// Dependency walk options for export.
    pub fn dependency_options(&self) -> DependencyOptions {
        DependencyOptions {
            follow_mandatory_only: self.follow_mandatory_only,
            stop_at_resources: self.stop_at_resources,
            include_owned: self.include_owned,
            ..DependencyOptions::default()
        }
    }
}

/// `[bridge]`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BridgeConfig {
    /// Replaced snapshots kept alive on the edit side.
    pub retain_snapshots: usize,
    /// Accepted latency measurements kept for statistics.
    pub clock_window: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            retain_snapshots: 4,
            clock_window: 64,
        }
    }
}

impl EngineConfig {
    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load settings from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path`, or returns the defaults if the file does not exist.
    pub fn load_or_default_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.is_file() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads the user config file, or returns the defaults if there is none.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        Self::load_or_default_from(config_file_path())
    }

    /// Save the settings to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
        std::fs::write(path, self.to_toml()?).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Convert the settings to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bridge.clock_window == 0 {
            return Err(ConfigError::invalid("bridge.clock_window", "must be at least 1"));
        }
        Ok(())
    }
}
