//! # Validation Pipeline
//!
//! Bundle, then shared documents resolved, then entities ordered; each
//! entity is then resolved and checked against the meta-schema and the rules.
//!
//! Within one entity the checks stop at the first failing stage; the rule
//! stage reports every rule the entity breaks. Across entities
//! the [`FailurePolicy`] decides: by default every entity is checked and
//! reported; with [`FailurePolicy::FailFast`] the run stops after the first
//! failing entity.
//!
//! Problems that affect the whole dictionary (a broken shared document, a
//! cyclic link graph) are returned as errors rather than per-entity
//! failures.

use std::fmt;

use gen3sd_core::{EntityDocument, METADATA_COLLECTION};
use serde_json::Value;
use thiserror::Error;

use crate::builder::DEFINITIONS_FILE;
use crate::bundle::Bundle;
use crate::error::{DictionaryError, ResolveError};
use crate::graph::{dependency_edges, order_with};
use crate::resolve::{entity_pool, resolve_shared, Resolver, ResolverConfig};
use crate::rules::RuleViolations;
use crate::validate::{MetaSchemaValidator, StructureError};

/// What to do after an entity fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Check every entity and report all failures.
    #[default]
    CollectAll,
    /// Stop after the first failing entity.
    FailFast,
}

/// Pipeline settings.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Shared definitions document entities point into.
    pub definitions_file: String,
    /// Entity pinned to the end of the order.
    pub metadata_entity: String,
    /// Run the rule battery after structural validation.
    pub run_rules: bool,
    /// Cross-entity failure policy.
    pub policy: FailurePolicy,
    /// Resolver settings.
    pub resolver: ResolverConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            definitions_file: DEFINITIONS_FILE.to_string(),
            metadata_entity: METADATA_COLLECTION.to_string(),
            run_rules: true,
            policy: FailurePolicy::default(),
            resolver: ResolverConfig::default(),
        }
    }
}

/// Why one entity failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntityFailure {
    /// A pointer could not be resolved.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The resolved document is not a mapping.
    #[error("{file} is not a mapping")]
    NotAMapping {
        /// Source file.
        file: String,
    },

    /// The document's `id` differs from its file name.
    #[error("{file}: id '{found}' does not match the file name; set id: {expected}")]
    IdMismatch {
        /// Source file.
        file: String,
        /// Name derived from the file.
        expected: String,
        /// The `id` field as written.
        found: String,
    },

    /// Meta-schema validation failed.
    #[error(transparent)]
    Structure(#[from] StructureError),

    /// One or more domain rules failed.
    #[error(transparent)]
    Rules(#[from] RuleViolations),

    /// The entity is listed but no document file holds it.
    #[error("no .yaml, .yml or .json document holds entity '{name}'")]
    MissingDocument {
        /// Logical entity name.
        name: String,
    },
}

/// Outcome for one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityReport {
    /// Logical entity name.
    pub name: String,
    /// Source file name.
    pub file: String,
    /// The first failure, if any.
    pub failure: Option<EntityFailure>,
}

impl EntityReport {
    /// Whether the entity passed every check.
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    /// Per-entity outcomes, in dependency order. Shorter than the number of
    /// entities when a fail-fast run stopped early.
    pub entities: Vec<EntityReport>,
}

impl ValidationReport {
    /// Entities checked.
    pub fn total(&self) -> usize {
        self.entities.len()
    }

    /// Entities that passed.
    pub fn passed(&self) -> usize {
        self.entities.iter().filter(|e| e.passed()).count()
    }

    /// Entities that failed.
    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    /// Whether every checked entity passed.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// The failing entities.
    pub fn failures(&self) -> impl Iterator<Item = &EntityReport> {
        self.entities.iter().filter(|e| !e.passed())
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entities checked: {} passed, {} failed",
            self.total(),
            self.passed(),
            self.failed()
        )
    }
}

/// Check one resolved document: structure, then its `id`, then the rules.
pub fn check_entity(
    file: &str,
    expected_id: &str,
    resolved: Value,
    meta: &MetaSchemaValidator,
    run_rules: bool,
) -> Result<(), EntityFailure> {
    if !resolved.is_object() {
        return Err(EntityFailure::NotAMapping {
            file: file.to_string(),
        });
    }
    meta.validate_structure(&resolved)?;

    let doc = EntityDocument::from_value(resolved).map_err(|_| EntityFailure::NotAMapping {
        file: file.to_string(),
    })?;
    if doc.id() != expected_id {
        return Err(EntityFailure::IdMismatch {
            file: file.to_string(),
            expected: expected_id.to_string(),
            found: doc.id().to_string(),
        });
    }
    if run_rules {
        if let Some(violations) = RuleViolations::collect(&doc) {
            return Err(violations.into());
        }
    }
    Ok(())
}

/// Resolve and validate every entity of `bundle`.
///
/// # Errors
///
/// Dictionary-wide problems only: a shared document that does not resolve,
/// or a cyclic link graph. Per-entity failures land in the report.
pub fn validate_bundle(
    bundle: &Bundle,
    meta: &MetaSchemaValidator,
    config: &PipelineConfig,
) -> Result<ValidationReport, DictionaryError> {
    if bundle.get(&config.definitions_file).is_none() {
        tracing::warn!(file = %config.definitions_file, "bundle has no shared definitions document");
    }

    let shared = resolve_shared(bundle, &config.resolver)?;
    let pool = entity_pool(bundle, &shared);
    let resolver = Resolver::with_config(&pool, &config.resolver);
    let order = order_with(
        &bundle.entity_names(),
        &dependency_edges(bundle),
        Some(config.metadata_entity.as_str()),
    )?;

    let mut report = ValidationReport::default();
    for name in order {
        let (file, outcome) = match (bundle.entity_file(&name), bundle.entity(&name)) {
            (Some(file), Some(raw)) => (
                file.to_string(),
                resolver
                    .resolve(file, raw)
                    .map_err(EntityFailure::from)
                    .and_then(|resolved| check_entity(file, &name, resolved, meta, config.run_rules)),
            ),
            _ => (
                name.clone(),
                Err(EntityFailure::MissingDocument { name: name.clone() }),
            ),
        };

        match &outcome {
            Ok(()) => tracing::debug!(entity = %name, "entity valid"),
            Err(e) => tracing::debug!(entity = %name, error = %e, "entity invalid"),
        }
        let failed = outcome.is_err();
        report.entities.push(EntityReport {
            name,
            file,
            failure: outcome.err(),
        });
        if failed && config.policy == FailurePolicy::FailFast {
            break;
        }
    }

    tracing::info!(
        total = report.total(),
        passed = report.passed(),
        failed = report.failed(),
        "validation finished"
    );
    Ok(report)
}
