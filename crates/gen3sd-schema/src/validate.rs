//! # Structural Validation
//!
//! Checks resolved entity documents against the meta-schema: the JSON
//! Schema (draft 4) describing what an entity document itself may contain.
//! Allowed categories, link and link-group shapes, property shapes.
//!
//! The meta-schema is compiled once by [`MetaSchemaValidator::new`]; the
//! embedded copy ships in `schemas/metaschema.json` and can be replaced at
//! run time with [`MetaSchemaValidator::from_path`].
//!
//! Documents must be resolved first: the meta-schema knows nothing about
//! `$ref` pointers into `_definitions.yaml`.

use std::fmt;
use std::path::Path;

use gen3sd_core::parser::load_document;
use gen3sd_core::LoadError;
use jsonschema::{Draft, Validator};
use serde_json::Value;
use thiserror::Error;

/// The embedded meta-schema, as shipped.
pub const METASCHEMA_JSON: &str = include_str!("../schemas/metaschema.json");

/// Parse the embedded meta-schema.
pub fn builtin_metaschema() -> Result<Value, MetaSchemaError> {
    serde_json::from_str(METASCHEMA_JSON).map_err(|e| MetaSchemaError::Compile {
        reason: format!("embedded meta-schema is not valid JSON: {e}"),
    })
}

/// Errors obtaining a usable meta-schema.
#[derive(Error, Debug)]
pub enum MetaSchemaError {
    /// The meta-schema file could not be read.
    #[error("failed to load meta-schema: {0}")]
    Load(#[from] LoadError),

    /// The meta-schema is not a valid draft-4 schema.
    #[error("failed to compile meta-schema: {reason}")]
    Compile {
        /// Compiler message.
        reason: String,
    },
}

/// A single meta-schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer to the violating value in the document.
    pub instance_path: String,
    /// JSON Pointer to the failing constraint in the meta-schema.
    pub schema_path: String,
    /// The failing keyword, e.g. `enum` or `required`.
    pub keyword: String,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = if self.instance_path.is_empty() {
            "(root)"
        } else {
            &self.instance_path
        };
        write!(f, "{at}: [{}] {}", self.keyword, self.message)
    }
}

/// A document that does not conform to the meta-schema.
///
/// Holds every violation; the display leads with the first one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct StructureError {
    /// Entity `id` (or file name) of the document.
    pub entity: String,
    /// All violations, in validator order. Never empty.
    pub violations: Vec<Violation>,
}

impl StructureError {
    /// The first violation.
    pub fn first(&self) -> Option<&Violation> {
        self.violations.first()
    }
}

impl fmt::Display for StructureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} does not match the meta-schema", self.entity)?;
        if let Some(first) = self.first() {
            write!(f, " at {first}")?;
        }
        if self.violations.len() > 1 {
            write!(f, " (and {} more)", self.violations.len() - 1)?;
        }
        Ok(())
    }
}

/// A compiled meta-schema.
pub struct MetaSchemaValidator {
    schema: Value,
    validator: Validator,
}

impl fmt::Debug for MetaSchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaSchemaValidator")
            .field("title", &self.schema.get("title"))
            .finish_non_exhaustive()
    }
}

impl MetaSchemaValidator {
    /// Compile `schema` as a draft-4 JSON Schema.
    pub fn new(schema: Value) -> Result<Self, MetaSchemaError> {
        let validator = jsonschema::options()
            .with_draft(Draft::Draft4)
            .build(&schema)
            .map_err(|e| MetaSchemaError::Compile {
                reason: e.to_string(),
            })?;
        Ok(Self { schema, validator })
    }

    /// Compile the embedded meta-schema.
    pub fn builtin() -> Result<Self, MetaSchemaError> {
        Self::new(builtin_metaschema()?)
    }

    /// Load and compile a meta-schema file (YAML or JSON by extension).
    pub fn from_path(path: &Path) -> Result<Self, MetaSchemaError> {
        tracing::debug!(path = %path.display(), "loading meta-schema");
        Self::new(load_document(path)?)
    }

    /// The uncompiled meta-schema.
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Check one resolved document.
    ///
    /// # Errors
    ///
    /// [`StructureError`] carrying every violation found.
    pub fn validate_structure(&self, document: &Value) -> Result<(), StructureError> {
        let violations: Vec<Violation> = self
            .validator
            .iter_errors(document)
            .map(|e| {
                let schema_path = e.schema_path.to_string();
                Violation {
                    instance_path: e.instance_path.to_string(),
                    keyword: schema_path.rsplit('/').next().unwrap_or_default().to_string(),
                    schema_path,
                    message: e.to_string(),
                }
            })
            .collect();

        if violations.is_empty() {
            return Ok(());
        }
        let entity = document
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("<unknown>")
            .to_string();
        Err(StructureError { entity, violations })
    }
}
