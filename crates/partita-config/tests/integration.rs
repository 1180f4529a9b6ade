//! Integration tests for settings files and preset storage.

use std::fs;

use partita_config::{ConfigError, EngineConfig, PresetStore};
use tempfile::TempDir;

#[test]
fn save_and_reload_settings() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("config.toml");

    let mut config = EngineConfig::default();
    config.history.max_undo = 250;
    config.load.strict_migrations = true;
    config.save(&path).unwrap();

    let loaded = EngineConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("[history]"));
    assert!(text.contains("max_undo = 250"));
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let temp = TempDir::new().unwrap();
    let config = EngineConfig::load_or_default_from(temp.path().join("absent.toml")).unwrap();
    assert_eq!(config, EngineConfig::default());
}

#[test]
fn broken_file_is_an_error_not_a_default() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    fs::write(&path, "[history\nmax_undo = 3").unwrap();
    assert!(matches!(
        EngineConfig::load_or_default_from(&path),
        Err(ConfigError::TomlParse(_))
    ));
}

#[test]
fn unreadable_path_reports_the_path() {
    let err = EngineConfig::load("/nonexistent/partita/config.toml").unwrap_err();
    assert!(err.to_string().contains("/nonexistent/partita/config.toml"));
}

#[test]
fn presets_share_a_directory() {
    let temp = TempDir::new().unwrap();
    let store = PresetStore::new(temp.path());
    store.save("bass", b"one").unwrap();
    store.save("lead", b"two").unwrap();
    store.save("bass", b"three").unwrap();
    fs::write(temp.path().join("readme.md"), "not a preset").unwrap();

    assert_eq!(store.names(), vec!["bass", "lead"]);
    assert_eq!(store.load("bass").unwrap(), b"three");
    assert_eq!(store.path_of("lead").unwrap(), temp.path().join("lead.preset"));
    assert_eq!(
        partita_config::list_presets_in_dir(temp.path()),
        vec![temp.path().join("bass.preset"), temp.path().join("lead.preset")]
    );
}
