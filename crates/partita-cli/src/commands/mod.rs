//! CLI command implementations.

pub mod common;
pub mod config;
pub mod export;
pub mod import;
pub mod info;
pub mod migrate;
pub mod new;
pub mod presets;
pub mod verify;
