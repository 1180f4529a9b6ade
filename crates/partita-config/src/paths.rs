//! Platform-specific paths for settings and presets.
//!
//! - **User config**: `~/.config/partita/` (Linux), `~/Library/Application Support/partita/` (macOS), `%APPDATA%\partita\` (Windows)
//! - **Settings file**: `<user config>/config.toml`
//! - **User presets**: `<user config>/presets/`

use std::path::{Path, PathBuf};

/// Application name used for directory paths.
const APP_NAME: &str = "partita";

/// Subdirectory name for presets.
const PRESETS_SUBDIR: &str = "presets";

/// Settings file name.
const CONFIG_FILE: &str = "config.toml";

/// Extension of preset files.
pub const PRESET_EXTENSION: &str = "preset";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join(APP_NAME)
}

/// Returns the path of the user settings file.
pub fn config_file_path() -> PathBuf {
    user_config_dir().join(CONFIG_FILE)
}

/// Returns the user-specific presets directory.
pub fn user_presets_dir() -> PathBuf {
    user_config_dir().join(PRESETS_SUBDIR)
}

/// Lists preset files in `dir`, sorted by path. A missing directory has none.
pub fn list_presets_in_dir(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut presets: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == PRESET_EXTENSION))
        .collect();
    presets.sort();
    presets
}

/// Extract the preset name from a path.
pub fn preset_name_from_path(path: &Path) -> Option<String> {
    path.file_stem().and_then(|s| s.to_str()).map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn user_dirs_are_named_after_the_app() {
        assert!(user_config_dir().to_string_lossy().contains("partita"));
        assert!(user_presets_dir().ends_with("partita/presets"));
        assert!(config_file_path().ends_with("partita/config.toml"));
    }

    #[test]
    fn list_presets_filters_by_extension() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("b.preset"), b"").unwrap();
        fs::write(temp_dir.path().join("a.preset"), b"").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), b"").unwrap();
        let presets = list_presets_in_dir(temp_dir.path());
        let names: Vec<_> = presets.iter().filter_map(|p| preset_name_from_path(p)).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn list_presets_nonexistent_dir() {
        assert!(list_presets_in_dir(Path::new("/nonexistent/path/12345")).is_empty());
    }

    #[test]
    fn preset_name_strips_extension() {
        assert_eq!(
            preset_name_from_path(Path::new("/p/bass_stack.preset")),
            Some("bass_stack".to_string())
        );
    }
}
