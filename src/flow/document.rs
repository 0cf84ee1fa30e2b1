//! Specification documents
//!
//! A document is a mapping with the optional sections `tools`, `processes`, `bounds`,
//! `tasks`, `models`, `toolpaths` and `exports`. JSON, TOML and YAML are accepted; the
//! format follows the file extension, anything else is tried as JSON, TOML and YAML in turn.

use serde_json::Value;
use std::path::{Path, PathBuf};

use super::FlowError;

/// Document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// JSON
    Json,
    /// TOML
    Toml,
    /// YAML
    Yaml,
}

impl Format {
    /// Format implied by the extension of `path`
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// A parsed specification document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Value,
    base_dir: PathBuf,
}

impl Document {
    /// Read and parse the document at `path`
    ///
    /// Relative locations inside the document resolve against its directory.
    pub fn load(path: &Path) -> Result<Self, FlowError> {
        let text = std::fs::read_to_string(path).map_err(|source| FlowError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self::parse(&text, Format::from_path(path), base_dir)
    }

    /// Parse `text`; without a format JSON is tried first, then TOML, then YAML
    pub fn parse(text: &str, format: Option<Format>, base_dir: PathBuf) -> Result<Self, FlowError> {
        let root = match format {
            Some(Format::Json) => serde_json::from_str(text)
                .map_err(|e| FlowError::Parse(format!("invalid JSON: {}", e)))?,
            Some(Format::Toml) => toml::from_str(text)
                .map_err(|e| FlowError::Parse(format!("invalid TOML: {}", e)))?,
            Some(Format::Yaml) => serde_yaml::from_str(text)
                .map_err(|e| FlowError::Parse(format!("invalid YAML: {}", e)))?,
            None => Self::guess(text)?,
        };
        match root {
            Value::Object(_) => Ok(Self { root, base_dir }),
            Value::Null => Ok(Self {
                root: Value::Object(Default::default()),
                base_dir,
            }),
            _ => Err(FlowError::Parse(
                "a specification must be a mapping of sections".to_string(),
            )),
        }
    }

    fn guess(text: &str) -> Result<Value, FlowError> {
        let json = match serde_json::from_str(text) {
            Ok(root) => return Ok(root),
            Err(e) => e,
        };
        let toml = match toml::from_str(text) {
            Ok(root) => return Ok(root),
            Err(e) => e,
        };
        serde_yaml::from_str(text).map_err(|yaml| {
            FlowError::Parse(format!(
                "neither JSON ({}) nor TOML ({}) nor YAML ({})",
                json, toml, yaml
            ))
        })
    }

    /// A top-level section; absent sections read as `None`
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.root.get(name).filter(|value| !value.is_null())
    }

    /// Directory relative locations resolve against
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}
