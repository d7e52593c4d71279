//! # Error Hierarchy
//!
//! Structured error types shared by every crate in the workspace, built with
//! `thiserror`. No `Box<dyn Error>`, no `.unwrap()` outside tests.
//!
//! Each variant carries the context an author needs to fix the dictionary:
//! the file that failed to load, the pointer that did not parse, the entity
//! the model forgot to declare.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading a YAML or JSON document from disk.
#[derive(Error, Debug)]
pub enum LoadError {
    /// A required file was not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: PathBuf,
    },

    /// YAML parsing failed.
    #[error("failed to parse YAML at {path}: {source}")]
    YamlParse {
        /// File being parsed.
        path: PathBuf,
        /// Underlying parser error.
        source: serde_yaml::Error,
    },

    /// JSON parsing failed.
    #[error("failed to parse JSON at {path}: {source}")]
    JsonParse {
        /// File being parsed.
        path: PathBuf,
        /// Underlying parser error.
        source: serde_json::Error,
    },

    /// A YAML value could not be represented as JSON.
    #[error("{path}: YAML value is not representable as JSON: {detail}")]
    NotJsonCompatible {
        /// File being converted.
        path: PathBuf,
        /// What could not be converted.
        detail: String,
    },

    /// The document parsed, but its top level is not a mapping.
    #[error("{path}: document is not a mapping")]
    NotAMapping {
        /// File that was loaded.
        path: PathBuf,
    },

    /// A document could not be serialized for writing.
    #[error("failed to serialize {path}: {reason}")]
    Serialize {
        /// Destination file.
        path: PathBuf,
        /// Serializer message.
        reason: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors in the structured input model consumed by the entity builder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The requested entity is not declared in the model.
    #[error("entity '{0}' is not declared in the model's entity list")]
    EntityNotFound(String),

    /// Two entities share a name.
    #[error("entity '{0}' is declared more than once")]
    DuplicateEntity(String),

    /// Two properties of one entity share a name.
    #[error("entity '{entity}' declares property '{property}' more than once")]
    DuplicateProperty {
        /// Owning entity.
        entity: String,
        /// Repeated property name.
        property: String,
    },

    /// A link names an entity the model does not declare.
    #[error("link {parent} -> {child} references undeclared entity '{missing}'")]
    UnknownLinkEndpoint {
        /// Parent side of the link.
        parent: String,
        /// Child side of the link.
        child: String,
        /// The endpoint that is not declared.
        missing: String,
    },

    /// An `enum` property carries no values, or repeats one.
    #[error("enum property '{entity}.{property}' {reason}")]
    InvalidEnum {
        /// Owning entity.
        entity: String,
        /// Property name.
        property: String,
        /// What is wrong with the values.
        reason: String,
    },

    /// An entity or property name is not lowercase snake_case.
    #[error("invalid identifier \"{0}\" (expected lowercase snake_case, e.g. lipidomics_file)")]
    InvalidIdentifier(String),
}

/// Errors loading a model file.
#[derive(Error, Debug)]
pub enum ModelLoadError {
    /// The file could not be read or parsed.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The file parsed but does not have the model's shape.
    #[error("{path} is not a valid input model: {reason}")]
    Shape {
        /// Model file.
        path: String,
        /// Deserializer message.
        reason: String,
    },
}

/// Errors parsing a reference pointer string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PointerError {
    /// The pointer has no `#` separating file from path.
    #[error("invalid pointer \"{0}\" (expected <file>#/<path>)")]
    MissingFragment(String),

    /// The path part does not start with `/`.
    #[error("invalid pointer \"{0}\" (path after '#' must start with '/')")]
    RelativePath(String),
}

/// Errors manipulating an entity document through its typed view.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// The document (or a field of it) is not a mapping.
    #[error("{context} is not a mapping")]
    NotAMapping {
        /// What was expected to be a mapping.
        context: String,
    },

    /// A property name collides with a reserved system property.
    #[error("property '{property}' on entity '{entity}' collides with a reserved system property; rename it")]
    ReservedProperty {
        /// Entity receiving the property.
        entity: String,
        /// Offending name.
        property: String,
    },

    /// A typed value could not be encoded into the document.
    #[error("failed to encode '{field}': {reason}")]
    Encode {
        /// Field being written.
        field: String,
        /// Serializer message.
        reason: String,
    },
}
