//! Configuration management for camflow
//!
//! Supports JSON and TOML files; the default file lives in the platform configuration
//! directory. Configuration is organized into sections:
//! - Logging (filter directive, output format)
//! - G-code export defaults
//! - Toolpath generation defaults
//! - Plugins that should not be loaded

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{SettingsError, SettingsResult};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive, e.g. `info` or `camflow_core=debug`
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// G-code export settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Height for rapid moves in mm
    pub safety_height: f64,
    /// Decimal places of coordinates
    pub decimal_places: usize,
    /// Prefix lines with `N` numbers
    pub line_numbers: bool,
    /// Write a comment header
    pub header_comment: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            safety_height: 25.0,
            decimal_places: 3,
            line_numbers: false,
            header_comment: true,
        }
    }
}

/// Toolpath generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Concatenate the results of several tasks feeding one toolpath
    pub merge_task_results: bool,
    /// Step down used when a process does not set one, in mm
    pub default_step_down: f64,
    /// Overlap used when a process does not set one
    pub default_overlap: f64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            merge_task_results: false,
            default_step_down: 1.0,
            default_overlap: 0.1,
        }
    }
}

/// Plugin settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginSettings {
    /// Names of plugins that are not loaded
    pub disabled: Vec<String>,
}

/// Complete application configuration
///
/// Aggregates all settings sections and provides file I/O operations. Missing sections and
/// keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Logging settings
    pub logging: LoggingSettings,
    /// Export settings
    pub export: ExportSettings,
    /// Generation settings
    pub generation: GenerationSettings,
    /// Plugin settings
    pub plugins: PluginSettings,
}

/// Supported file formats, chosen by extension
enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> SettingsResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            _ => Err(SettingsError::UnsupportedFormat(format!(
                "{} (config file must be .json or .toml)",
                path.display()
            ))),
        }
    }
}

/// Default location of the configuration file
pub fn default_config_path() -> SettingsResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("camflow").join("config.toml"))
        .ok_or_else(|| {
            SettingsError::ConfigDirectory("no configuration directory on this platform".into())
        })
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = Format::of(path)?;
        let content = std::fs::read_to_string(path)?;
        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load `path`, or the default file; a file that does not exist yields the defaults
    pub fn load_or_default(path: Option<&Path>) -> SettingsResult<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Ok(path) => path,
                Err(e) => {
                    info!("Using default configuration: {}", e);
                    return Ok(Self::default());
                }
            },
        };
        if !path.exists() {
            info!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from_file(&path)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;
        let content = match Format::of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        if self.logging.level.trim().is_empty() {
            return Err(SettingsError::invalid("logging.level", "must not be empty"));
        }

        if self.export.safety_height <= 0.0 {
            return Err(SettingsError::invalid("export.safety_height", "must be > 0"));
        }
        if !(1..=6).contains(&self.export.decimal_places) {
            return Err(SettingsError::invalid(
                "export.decimal_places",
                "must be between 1 and 6",
            ));
        }

        if self.generation.default_step_down <= 0.0 {
            return Err(SettingsError::invalid(
                "generation.default_step_down",
                "must be > 0",
            ));
        }
        if !(0.0..1.0).contains(&self.generation.default_overlap) {
            return Err(SettingsError::invalid(
                "generation.default_overlap",
                "must be in [0, 1)",
            ));
        }

        Ok(())
    }

    /// Whether the plugin `name` is disabled
    pub fn is_disabled(&self, name: &str) -> bool {
        self.plugins.disabled.iter().any(|d| d == name)
    }
}
