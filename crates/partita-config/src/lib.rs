//! Settings and preset storage for partita.
//!
//! # Features
//!
//! - **Engine settings**: undo depth, migration strictness, export walk and
//!   bridge sizing, read from `config.toml`
//! - **Paths**: platform-specific config and preset directories
//! - **Presets**: exported subgraph packages stored as files
//!
//! Settings are plain values; callers hand them to the components that use
//! them (`EditController::with_limit`, `DependencyOptions`, `LoadOptions`,
//! `SnapshotChannel::with_retention`, `ClockValidator::new`).
//!
//! # Example
//!
//! ```rust,no_run
//! use partita_config::{EngineConfig, PresetStore};
//!
//! let config = EngineConfig::load_or_default().unwrap();
//! let walk = config.export.dependency_options();
//!
//! let store = PresetStore::user();
//! for name in store.names() {
//!     println!("{name}");
//! }
//! ```

mod error;
mod preset;
mod settings;

/// Platform-specific paths for settings and presets.
pub mod paths;

pub use error::ConfigError;
pub use paths::{
    PRESET_EXTENSION, config_file_path, list_presets_in_dir, preset_name_from_path, user_config_dir,
    user_presets_dir,
};
pub use preset::PresetStore;
pub use settings::{BridgeConfig, EngineConfig, ExportConfig, HistoryConfig, LoadConfig};
