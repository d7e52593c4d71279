//! # gen3sd-schema: Resolution and Validation Engine
//!
//! Everything between a directory of raw entity documents and a verdict on
//! whether they form a valid Gen3 dictionary.
//!
//! ## Pipeline
//!
//! 1. [`bundle`] loads documents into a [`Bundle`] keyed by file name.
//! 2. [`graph`] derives `(parent, child)` edges from each entity's links and
//!    orders entities parents-first, metadata collection last.
//! 3. [`resolve`] replaces every `$ref` pointer. Shared documents are made
//!    pointer-free first, then each entity is resolved against itself and
//!    the shared pool.
//! 4. [`validate`] checks each resolved entity against the draft-4
//!    meta-schema.
//! 5. [`rules`] runs the domain rule battery the meta-schema cannot express.
//!
//! [`pipeline::validate_bundle`] drives steps 2 to 5 and returns a
//! [`ValidationReport`].
//!
//! [`builder`] is the other way in: it emits raw entity documents from a
//! structured [`gen3sd_core::DataModel`], ready for the same pipeline.
//!
//! ## Crate Policy
//!
//! - Depends only on `gen3sd-core` internally.
//! - Never prints. Findings are returned as values; `tracing` carries
//!   progress for whoever installs a subscriber.

pub mod builder;
pub mod bundle;
pub mod error;
pub mod graph;
pub mod pipeline;
pub mod resolve;
pub mod rules;
pub mod validate;

pub use builder::{
    auxiliary_documents, generate, populate, BuiltEntity, Diagnostic, Generated, Template,
    DEFINITIONS_FILE, SETTINGS_FILE, TERMS_FILE,
};
pub use bundle::{bundle, bundle_with, load_bundle, split, write_bundle, write_split, Bundle, BundleOptions};
pub use error::{BuildError, BundleError, DictionaryError, OrderError, ResolveError};
pub use graph::{
    dependency_edges, edges_to_csv, edges_to_json, graph_edges, order, order_bundle, order_with,
    GraphEdge,
};
pub use pipeline::{
    check_entity, validate_bundle, EntityFailure, EntityReport, FailurePolicy, PipelineConfig,
    ValidationReport,
};
pub use resolve::{
    contains_pointer, resolve, resolve_bundle, resolve_shared, ResolvedBundle, ResolvedEntity,
    Resolver, ResolverConfig,
};
pub use rules::{check_all, Rule, RuleViolation, RuleViolations};
pub use validate::{MetaSchemaError, MetaSchemaValidator, StructureError, Violation};
