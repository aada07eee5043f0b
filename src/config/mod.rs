//! Configuration — `AppConfig` with per-subsystem sub-configs, `AppPaths`
//! for platform directories, and TOML persistence via `AppConfig::load` /
//! `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, AudioConfig, RecognitionConfig, UiConfig};
