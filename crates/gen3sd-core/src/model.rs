//! # Structured Input Model
//!
//! The high-level description of a dictionary that the entity builder
//! turns into schema documents:
//!
//! ```yaml
//! entities:
//!   - name: sample
//!     description: A biological sample.
//!     category: biospecimen
//!     properties:
//!       - name: sample_type
//!         type: enum
//!         enums: [blood, tissue]
//!         required: true
//! links:
//!   - parent: subject
//!     child: sample
//!     multiplicity: many_to_one
//! ```
//!
//! Keys an entity carries beyond the ones modelled here land in
//! [`ModelEntity::extra`]; the builder decides whether they survive.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::category::Category;
use crate::entity::METADATA_COLLECTION;
use crate::error::{ModelError, ModelLoadError};
use crate::link::Multiplicity;
use crate::naming::is_snake_case;
use crate::parser::load_document;

/// The whole input model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataModel {
    /// Declared entities.
    pub entities: Vec<ModelEntity>,
    /// Parent/child relationships between entities.
    #[serde(default)]
    pub links: Vec<ModelLink>,
}

/// One entity of the input model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEntity {
    /// Entity name; becomes the document `id`.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Entity category.
    pub category: Category,
    /// Declared properties, in output order.
    #[serde(default)]
    pub properties: Vec<ModelProperty>,
    /// Any other keys, passed to the builder for verbatim write-through.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Kind of a model property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    /// Free text.
    String,
    /// Whole number.
    Integer,
    /// Any number.
    Number,
    /// True or false.
    Boolean,
    /// Timestamp; rendered as a pointer to the shared datetime definition.
    Datetime,
    /// One of a closed list of values.
    Enum,
}

impl PropertyType {
    /// The JSON-schema `type` for scalar kinds.
    pub fn scalar_type(&self) -> Option<&'static str> {
        match self {
            Self::String => Some("string"),
            Self::Integer => Some("integer"),
            Self::Number => Some("number"),
            Self::Boolean => Some("boolean"),
            Self::Datetime | Self::Enum => None,
        }
    }
}

/// One property of a model entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelProperty {
    /// Property name.
    pub name: String,
    /// Property kind.
    #[serde(rename = "type")]
    pub kind: PropertyType,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Whether instances must populate the property.
    #[serde(default)]
    pub required: bool,
    /// Allowed values for `enum` properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enums: Option<Vec<EnumValue>>,
}

/// An enum value, optionally annotated with where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumValue {
    /// Bare value.
    Plain(String),
    /// Value with provenance.
    Sourced {
        /// The value itself.
        value: String,
        /// Ontology or vocabulary it was taken from.
        #[serde(default)]
        source: Option<String>,
        /// Term identifier within the source.
        #[serde(default)]
        term_id: Option<String>,
        /// Source version.
        #[serde(default)]
        version: Option<String>,
    },
}

impl EnumValue {
    /// The enumeration string.
    pub fn value(&self) -> &str {
        match self {
            Self::Plain(v) => v,
            Self::Sourced { value, .. } => value,
        }
    }

    /// Whether any provenance is attached.
    pub fn has_provenance(&self) -> bool {
        match self {
            Self::Plain(_) => false,
            Self::Sourced {
                source,
                term_id,
                version,
                ..
            } => source.is_some() || term_id.is_some() || version.is_some(),
        }
    }
}

/// A parent/child relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelLink {
    /// Parent entity.
    pub parent: String,
    /// Child entity; the one that declares the link.
    pub child: String,
    /// Cardinality.
    pub multiplicity: Multiplicity,
}

impl DataModel {
    /// Load a model from a YAML or JSON file. The result is not validated.
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let value = load_document(path)?;
        serde_json::from_value(value).map_err(|e| ModelLoadError::Shape {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Look up an entity by name.
    pub fn entity(&self, name: &str) -> Result<&ModelEntity, ModelError> {
        self.entities
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| ModelError::EntityNotFound(name.to_string()))
    }

    /// Links where `name` is the child, in model order.
    pub fn parent_links(&self, name: &str) -> impl Iterator<Item = &ModelLink> + '_ {
        let name = name.to_string();
        self.links.iter().filter(move |l| l.child == name)
    }

    /// Check the model's internal consistency.
    ///
    /// The metadata-collection entity counts as declared even when the model
    /// omits it, since the generator always emits it.
    pub fn validate(&self) -> Result<(), ModelError> {
        let mut names = BTreeSet::new();
        for entity in &self.entities {
            if !is_snake_case(&entity.name) {
                return Err(ModelError::InvalidIdentifier(entity.name.clone()));
            }
            if !names.insert(entity.name.as_str()) {
                return Err(ModelError::DuplicateEntity(entity.name.clone()));
            }
            let mut props = BTreeSet::new();
            for prop in &entity.properties {
                if !is_snake_case(&prop.name) {
                    return Err(ModelError::InvalidIdentifier(prop.name.clone()));
                }
                if !props.insert(prop.name.as_str()) {
                    return Err(ModelError::DuplicateProperty {
                        entity: entity.name.clone(),
                        property: prop.name.clone(),
                    });
                }
                if prop.kind == PropertyType::Enum {
                    check_enum(&entity.name, prop)?;
                }
            }
        }

        for link in &self.links {
            for endpoint in [&link.parent, &link.child] {
                if !names.contains(endpoint.as_str()) && endpoint != METADATA_COLLECTION {
                    return Err(ModelError::UnknownLinkEndpoint {
                        parent: link.parent.clone(),
                        child: link.child.clone(),
                        missing: endpoint.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn check_enum(entity: &str, prop: &ModelProperty) -> Result<(), ModelError> {
    let invalid = |reason: &str| ModelError::InvalidEnum {
        entity: entity.to_string(),
        property: prop.name.clone(),
        reason: reason.to_string(),
    };
    let values = match &prop.enums {
        Some(v) if !v.is_empty() => v,
        _ => return Err(invalid("declares no values")),
    };
    let mut seen = BTreeSet::new();
    for v in values {
        if !seen.insert(v.value()) {
            return Err(invalid(&format!("repeats value \"{}\"", v.value())));
        }
    }
    Ok(())
}
