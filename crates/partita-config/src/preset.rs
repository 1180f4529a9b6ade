//! Preset files on disk.
//!
//! A preset is an exported subgraph package stored verbatim as
//! `<name>.preset`. This module only moves bytes; decoding and schema
//! checks happen when the package is imported into a graph.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::paths::{PRESET_EXTENSION, list_presets_in_dir, preset_name_from_path, user_presets_dir};

/// A directory of preset files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetStore {
    dir: PathBuf,
}

impl PresetStore {
    /// Store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store in the user presets directory.
    pub fn user() -> Self {
        Self::new(user_presets_dir())
    }

    /// Directory holding the presets.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for `name`.
    pub fn path_of(&self, name: &str) -> Result<PathBuf, ConfigError> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{name}.{PRESET_EXTENSION}")))
    }

    /// `true` if a preset called `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.path_of(name).is_ok_and(|p| p.is_file())
    }

    /// Writes `bytes` as preset `name`, replacing any existing one.
    pub fn save(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, ConfigError> {
        let path = self.path_of(name)?;
        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir).map_err(|e| ConfigError::create_dir(&self.dir, e))?;
        }
        std::fs::write(&path, bytes).map_err(|e| ConfigError::write_file(&path, e))?;
        Ok(path)
    }

    /// Reads preset `name`.
    pub fn load(&self, name: &str) -> Result<Vec<u8>, ConfigError> {
        let path = self.path_of(name)?;
        if !path.is_file() {
            return Err(ConfigError::PresetNotFound(name.to_string()));
        }
        std::fs::read(&path).map_err(|e| ConfigError::read_file(&path, e))
    }

    /// Deletes preset `name`.
    pub fn remove(&self, name: &str) -> Result<(), ConfigError> {
        let path = self.path_of(name)?;
        if !path.is_file() {
            return Err(ConfigError::PresetNotFound(name.to_string()));
        }
        std::fs::remove_file(&path).map_err(|e| ConfigError::write_file(&path, e))
    }

    /// Names of all presets, sorted.
    pub fn names(&self) -> Vec<String> {
        list_presets_in_dir(&self.dir)
            .iter()
            .filter_map(|p| preset_name_from_path(p))
            .collect()
    }
}

fn validate_name(name: &str) -> Result<(), ConfigError> {
    let bad = name.is_empty()
        || name.starts_with('.')
        || name.chars().any(|c| matches!(c, '/' | '\\' | ':') || c.is_control());
    if bad {
        return Err(ConfigError::InvalidPresetName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_then_load() {
        let temp = TempDir::new().unwrap();
        let store = PresetStore::new(temp.path().join("presets"));
        let path = store.save("warm pad", b"PRTA\x01").unwrap();
        assert!(path.ends_with("warm pad.preset"));
        assert!(store.contains("warm pad"));
        assert_eq!(store.load("warm pad").unwrap(), b"PRTA\x01");
        assert_eq!(store.names(), vec!["warm pad"]);
    }

    #[test]
    fn missing_preset() {
        let temp = TempDir::new().unwrap();
        let store = PresetStore::new(temp.path());
        assert!(matches!(store.load("ghost"), Err(ConfigError::PresetNotFound(n)) if n == "ghost"));
        assert!(matches!(store.remove("ghost"), Err(ConfigError::PresetNotFound(_))));
    }

    #[test]
    fn names_that_escape_the_directory_are_rejected() {
        let store = PresetStore::new("/tmp/unused");
        for name in ["", "../x", "a/b", "a\\b", ".hidden"] {
            assert!(
                matches!(store.path_of(name), Err(ConfigError::InvalidPresetName(_))),
                "accepted {name:?}"
            );
        }
    }

    #[test]
    fn remove_deletes_the_file() {
        let temp = TempDir::new().unwrap();
        let store = PresetStore::new(temp.path());
        store.save("a", b"1").unwrap();
        store.remove("a").unwrap();
        assert!(!store.contains("a"));
        assert!(store.names().is_empty());
    }
}
