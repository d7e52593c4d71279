//! # Engine Errors
//!
//! One `thiserror` enum per subsystem, plus [`DictionaryError`] for callers
//! that drive several subsystems and want a single error type.

use std::path::PathBuf;

use gen3sd_core::{DocumentError, LoadError, ModelError};
use thiserror::Error;

use crate::rules::RuleViolation;
use crate::validate::{MetaSchemaError, StructureError};

/// Errors reading, splitting or writing a bundle.
#[derive(Error, Debug)]
pub enum BundleError {
    /// The directory holds no matching documents.
    #[error("no documents found in {}", .directory.display())]
    NoDocumentsFound {
        /// Directory that was scanned.
        directory: PathBuf,
    },

    /// A member document failed to load.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The bundled document, or one of its members, is not a mapping.
    #[error("bundle member '{name}' is not a mapping")]
    NotAMapping {
        /// Member name, or `<bundle>` for the outer document.
        name: String,
    },

    /// A member name is not a plain `.yaml`, `.yml` or `.json` file name.
    #[error("bundle member name '{name}' is not a plain .yaml, .yml or .json file name")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// An entity is listed but no document file holds it.
    #[error("no .yaml, .yml or .json document holds entity '{name}'")]
    MissingEntity {
        /// Logical entity name.
        name: String,
    },

    /// The bundle could not be serialized.
    #[error("failed to serialize bundle to {}: {reason}", .path.display())]
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

/// Errors raised while replacing `$ref` pointers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// A path segment does not exist in the target document.
    #[error("{document}: broken reference \"{pointer}\": no key '{segment}' in {target}")]
    BrokenReference {
        /// Document containing the pointer.
        document: String,
        /// The pointer as written.
        pointer: String,
        /// Document the pointer was followed into.
        target: String,
        /// First segment that could not be found.
        segment: String,
    },

    /// The pointer names a document that is not in the pool.
    #[error("{document}: reference \"{pointer}\" names unknown document '{file}'")]
    MissingDocument {
        /// Document containing the pointer.
        document: String,
        /// The pointer as written.
        pointer: String,
        /// The document that could not be found.
        file: String,
    },

    /// The pointer value is not a well-formed pointer string.
    #[error("{document}: invalid reference: {reason}")]
    InvalidPointer {
        /// Document containing the pointer.
        document: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Sibling keys were given next to a pointer whose target is not a mapping.
    #[error("{document}: reference \"{pointer}\" has sibling keys but its target is not a mapping")]
    UnmergeableTarget {
        /// Document containing the pointer.
        document: String,
        /// The pointer as written.
        pointer: String,
    },

    /// Expanding a pointer led back to itself.
    #[error("{document}: circular reference: {}", .chain.join(" -> "))]
    CircularReference {
        /// Document where expansion started.
        document: String,
        /// Pointers being expanded, outermost first, ending with the repeat.
        chain: Vec<String>,
    },

    /// Pointer expansion nested deeper than the configured limit.
    #[error("{document}: reference nesting exceeds {limit} levels")]
    DepthExceeded {
        /// Document where expansion started.
        document: String,
        /// Configured limit.
        limit: usize,
    },
}

/// Errors ordering entities by their link dependencies.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// The link graph has a cycle.
    #[error("cyclic link dependency among entities: {}", .remaining.join(", "))]
    CyclicDependency {
        /// Entities that never reached zero unmet dependencies, sorted.
        remaining: Vec<String>,
    },
}

/// Errors building entity documents from an input model.
#[derive(Error, Debug)]
pub enum BuildError {
    /// The model is inconsistent, or names an undeclared entity.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A generated property was refused by the entity document.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// The template or an embedded auxiliary document is unusable.
    #[error("invalid template: {0}")]
    Template(String),
}

/// Top-level error for callers that drive the whole engine.
#[derive(Error, Debug)]
pub enum DictionaryError {
    /// Loading a file failed.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Bundling or splitting failed.
    #[error(transparent)]
    Bundle(#[from] BundleError),

    /// Reference resolution failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Dependency ordering failed.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Entity building failed.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// A document is not shaped like an entity.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// The meta-schema could not be loaded or compiled.
    #[error(transparent)]
    MetaSchema(#[from] MetaSchemaError),

    /// A document failed structural validation.
    #[error(transparent)]
    Structure(#[from] StructureError),

    /// A document broke a domain rule.
    #[error(transparent)]
    Rule(#[from] RuleViolation),
}
