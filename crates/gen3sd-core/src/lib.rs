#![deny(missing_docs)]

//! # gen3sd-core: Foundational Types for Gen3 Schema Development
//!
//! This crate defines the vocabulary every other crate in the workspace
//! speaks: what an entity document is, what a link looks like, how a `$ref`
//! pointer is spelled, and what the structured input model contains. It has
//! no internal crate dependencies.
//!
//! ## Design Principles
//!
//! 1. **One value model.** Every document is a `serde_json::Value`. YAML is
//!    converted on load by [`parser`], so resolution and validation never
//!    care where a document came from.
//!
//! 2. **Typed views, not dynamic attributes.** [`EntityDocument`] wraps the
//!    backing mapping with explicit accessors, and setters that refuse
//!    reserved property names.
//!
//! 3. **Closed vocabularies are enums.** [`Category`] and [`Multiplicity`]
//!    are exhaustive; the meta-schema carries the same lists.
//!
//! 4. **Structured errors.** `thiserror` enums in [`error`], no `.unwrap()`
//!    outside tests.

pub mod category;
pub mod entity;
pub mod error;
pub mod link;
pub mod model;
pub mod naming;
pub mod parser;
pub mod pointer;

pub use category::Category;
pub use entity::{
    is_system_property, EntityDocument, BOOTSTRAP_ENTITIES, DATA_FILE_PROPERTIES,
    METADATA_COLLECTION, METADATA_COLLECTION_LINK, SYSTEM_PROPERTIES,
};
pub use error::{DocumentError, LoadError, ModelError, ModelLoadError, PointerError};
pub use link::{group_links, Link, LinkEntry, LinkGroup, Multiplicity};
pub use model::{DataModel, EnumValue, ModelEntity, ModelLink, ModelProperty, PropertyType};
pub use naming::pluralize;
pub use pointer::{Pointer, POINTER_KEY};
