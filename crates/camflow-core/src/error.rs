//! Error handling for the Camflow kernel
//!
//! Provides the error types for every layer of the kernel:
//! - Registry errors (events, sections, chains, namespace, strategies)
//! - Collection errors (naming, indexing, lookup)
//! - Entity errors (malformed specification entries)
//! - Plugin errors (lifecycle and dependencies)
//!
//! None of these abort a run. They are returned so callers can inspect them and are
//! logged where the affected item gets skipped.

use thiserror::Error;

/// Registry misuse error type
///
/// Raised by the name-keyed registries when a name is registered twice or an
/// operation refers to a name nobody registered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Event name has never been subscribed to
    #[error("Unknown event: {event}")]
    UnknownEvent {
        /// The event name.
        event: String,
    },

    /// Extension section has not been declared
    #[error("Unknown section: {section}")]
    UnknownSection {
        /// The section name.
        section: String,
    },

    /// Object was already contributed to the section
    #[error("Object '{label}' already contributed to section {section}")]
    DuplicateContribution {
        /// The section name.
        section: String,
        /// The label of the rejected contribution.
        label: String,
    },

    /// Chain name has not been declared
    #[error("Unknown chain: {chain}")]
    UnknownChain {
        /// The chain name.
        chain: String,
    },

    /// Namespace key is already taken
    #[error("Namespace key already published: {key}")]
    DuplicateKey {
        /// The namespace key.
        key: String,
    },

    /// Namespace key is absent
    #[error("Unknown namespace key: {key}")]
    UnknownKey {
        /// The namespace key.
        key: String,
    },

    /// Strategy (kind, name) pair registered twice
    #[error("Strategy '{name}' already registered for kind '{kind}'")]
    DuplicateStrategy {
        /// The task kind.
        kind: String,
        /// The strategy name.
        name: String,
    },

    /// Strategy (kind, name) pair not registered
    #[error("Unknown strategy '{name}' for kind '{kind}'")]
    UnknownStrategy {
        /// The task kind.
        kind: String,
        /// The strategy name.
        name: String,
    },

    /// No parameter controls attached for the kind
    #[error("No parameter group registered for kind '{kind}'")]
    NoParameterGroup {
        /// The task kind.
        kind: String,
    },
}

/// Collection error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// Name already used by another entity of the collection
    #[error("Name '{name}' already exists in {collection}")]
    DuplicateName {
        /// The collection key.
        collection: String,
        /// The conflicting name.
        name: String,
    },

    /// Index outside the collection
    #[error("Index {index} out of range for {collection} (length {len})")]
    IndexOutOfRange {
        /// The collection key.
        collection: String,
        /// The requested index.
        index: usize,
        /// The collection length.
        len: usize,
    },

    /// No entity with that name
    #[error("'{name}' not found in {collection}")]
    NotFound {
        /// The collection key.
        collection: String,
        /// The requested name.
        name: String,
    },

    /// The owning plugin of the collection is not loaded
    #[error("Collection {collection} is not available")]
    Unavailable {
        /// The collection key.
        collection: String,
    },
}

/// Entity construction error type
///
/// Represents a malformed entry of a specification document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EntityError {
    /// Required field missing
    #[error("Missing required field '{field}' of '{entity}' in {collection}")]
    MissingField {
        /// The collection key.
        collection: String,
        /// The entity name.
        entity: String,
        /// The field name.
        field: String,
    },

    /// Field present but unusable
    #[error("Invalid field '{field}' of '{entity}' in {collection}: {reason}")]
    InvalidField {
        /// The collection key.
        collection: String,
        /// The entity name.
        entity: String,
        /// The field name.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Model source could not be loaded
    #[error("Failed to load model '{entity}' from {location}: {reason}")]
    ModelLoad {
        /// The entity name.
        entity: String,
        /// The source location.
        location: String,
        /// The underlying failure.
        reason: String,
    },
}

/// Plugin lifecycle error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    /// A plugin with that name is already loaded
    #[error("Plugin already loaded: {name}")]
    AlreadyLoaded {
        /// The plugin name.
        name: String,
    },

    /// A dependency of the plugin is not loaded
    #[error("Plugin {name} requires {dependency}")]
    MissingDependency {
        /// The plugin name.
        name: String,
        /// The missing dependency.
        dependency: String,
    },

    /// Another loaded plugin still depends on this one
    #[error("Plugin {name} is required by {dependent}")]
    StillRequired {
        /// The plugin name.
        name: String,
        /// The loaded dependent.
        dependent: String,
    },

    /// Plugin is not loaded
    #[error("Plugin not loaded: {name}")]
    NotLoaded {
        /// The plugin name.
        name: String,
    },

    /// Plugin setup refused to run
    #[error("Setup of plugin {name} failed: {reason}")]
    SetupFailed {
        /// The plugin name.
        name: String,
        /// The reason given by the plugin.
        reason: String,
    },
}

/// Main error type for the kernel
#[derive(Error, Debug)]
pub enum Error {
    /// Registry misuse
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Collection error
    #[error(transparent)]
    Collection(#[from] CollectionError),

    /// Malformed entity
    #[error(transparent)]
    Entity(#[from] EntityError),

    /// Plugin lifecycle error
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this error reports a name that did not resolve
    pub fn is_unresolved_reference(&self) -> bool {
        matches!(
            self,
            Error::Collection(CollectionError::NotFound { .. })
                | Error::Registry(RegistryError::UnknownStrategy { .. })
        )
    }

    /// Check if this error reports malformed input
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, Error::Entity(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EntityError::MissingField {
            collection: "tools".to_string(),
            entity: "mill".to_string(),
            field: "radius".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Missing required field 'radius' of 'mill' in tools"
        );

        let err = RegistryError::DuplicateStrategy {
            kind: "process".to_string(),
            name: "slice".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Strategy 'slice' already registered for kind 'process'"
        );
    }

    #[test]
    fn test_classification() {
        let err: Error = CollectionError::NotFound {
            collection: "tasks".to_string(),
            name: "rough".to_string(),
        }
        .into();
        assert!(err.is_unresolved_reference());
        assert!(!err.is_malformed_input());

        let err: Error = EntityError::MissingField {
            collection: "tools".to_string(),
            entity: "t".to_string(),
            field: "shape".to_string(),
        }
        .into();
        assert!(err.is_malformed_input());
    }
}
