//! Camflow Settings Crate
//!
//! Handles application configuration: logging, G-code export, generation defaults and the
//! plugins to skip.

pub mod config;
pub mod error;

pub use config::{
    default_config_path, Config, ExportSettings, GenerationSettings, LogFormat, LoggingSettings,
    PluginSettings,
};
pub use error::{SettingsError, SettingsResult};
