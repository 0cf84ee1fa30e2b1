//! Flow interpreter
//!
//! Turns a specification [`Document`] into entities, generates the toolpaths it declares and
//! runs its exports. A broken entry is logged and skipped; it never aborts the run.

mod document;
mod export;
mod interpreter;

pub use document::{Document, Format};
pub use interpreter::FlowInterpreter;

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use camflow_camtools::CamToolError;
use camflow_core::{CollectionError, EntityError};

/// Errors of the flow interpreter
///
/// Only [`FlowError::Read`] and [`FlowError::Parse`] reach callers of
/// [`Document::load`]; everything else concerns one entry and is logged where that entry is
/// skipped.
#[derive(Error, Debug)]
pub enum FlowError {
    /// The document could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        /// Document location.
        path: PathBuf,
        /// Underlying failure.
        source: std::io::Error,
    },

    /// The document is not a valid specification
    #[error("Invalid specification: {0}")]
    Parse(String),

    /// A section has the wrong shape
    #[error("Section '{section}' must be {expected}")]
    Section {
        /// Section name.
        section: String,
        /// Expected shape.
        expected: &'static str,
    },

    /// A required key of an entry is absent
    #[error("Missing '{key}' attribute of {entry}")]
    MissingKey {
        /// The entry.
        entry: String,
        /// Dotted key path.
        key: &'static str,
    },

    /// A key holds a value the interpreter cannot use
    #[error("Unsupported '{key}' of {entry}: {value}")]
    Unsupported {
        /// The entry.
        entry: String,
        /// Dotted key path.
        key: &'static str,
        /// The offending value.
        value: String,
    },

    /// A capability needed by the entry is not published
    #[error("Capability '{0}' is not available")]
    Unavailable(String),

    /// An export target could not be created
    #[error("Failed to open {}: {source}", path.display())]
    Target {
        /// Target location.
        path: PathBuf,
        /// Underlying failure.
        source: std::io::Error,
    },

    /// Malformed entity entry
    #[error(transparent)]
    Entity(#[from] EntityError),

    /// Collection error
    #[error(transparent)]
    Collection(#[from] CollectionError),

    /// Export failure
    #[error(transparent)]
    Export(#[from] CamToolError),
}

/// What one run of the interpreter produced
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlowReport {
    /// Entities added to the collections
    pub entities: usize,
    /// Entries skipped as malformed or unresolvable
    pub skipped: usize,
    /// Names of the generated toolpaths, in document order
    pub toolpaths: Vec<String>,
    /// Files written by exports, in document order
    pub exports: Vec<PathBuf>,
}
