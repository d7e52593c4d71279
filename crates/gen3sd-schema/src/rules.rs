//! # Domain Rules
//!
//! Checks on a single resolved entity document that the meta-schema cannot
//! express: cross-field consistency between `links` and `properties`,
//! reserved names, and the obligations of data-file entities and of the
//! metadata-collection entity.
//!
//! [`validate`] runs the battery in [`Rule::ALL`] order and stops at the
//! first violation. [`check_all`] collects every violation instead.

use std::fmt;

use gen3sd_core::{
    is_system_property, EntityDocument, BOOTSTRAP_ENTITIES, DATA_FILE_PROPERTIES,
    METADATA_COLLECTION, METADATA_COLLECTION_LINK, POINTER_KEY,
};
use serde_json::Value;
use thiserror::Error;

/// One domain rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// Data-file entities link to the metadata collection.
    DataFileLinkCoreMetadata,
    /// Every link name is also a property.
    LinkPropsExist,
    /// No property reuses a reserved system name.
    PropsCannotBeSystemProps,
    /// Every inline property declares `type` or `enum`.
    PropsMustHaveType,
    /// Every array property declares `items`.
    TypeArrayNeedsItems,
    /// The metadata collection has a required link.
    CoreMetadataRequiredLink,
    /// Data-file entities declare the data properties.
    DataFilePropsNeedDataProps,
}

impl Rule {
    /// The battery, in execution order.
    pub const ALL: [Rule; 7] = [
        Self::DataFileLinkCoreMetadata,
        Self::LinkPropsExist,
        Self::PropsCannotBeSystemProps,
        Self::PropsMustHaveType,
        Self::TypeArrayNeedsItems,
        Self::CoreMetadataRequiredLink,
        Self::DataFilePropsNeedDataProps,
    ];

    /// Stable rule name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DataFileLinkCoreMetadata => "data_file_link_core_metadata",
            Self::LinkPropsExist => "link_props_exist",
            Self::PropsCannotBeSystemProps => "props_cannot_be_system_props",
            Self::PropsMustHaveType => "props_must_have_type",
            Self::TypeArrayNeedsItems => "type_array_needs_items",
            Self::CoreMetadataRequiredLink => "core_metadata_required_link",
            Self::DataFilePropsNeedDataProps => "data_file_props_need_data_props",
        }
    }

    /// Run this rule alone.
    pub fn check(&self, doc: &EntityDocument) -> Result<(), RuleViolation> {
        match self {
            Self::DataFileLinkCoreMetadata => data_file_link_core_metadata(doc),
            Self::LinkPropsExist => link_props_exist(doc),
            Self::PropsCannotBeSystemProps => props_cannot_be_system_props(doc),
            Self::PropsMustHaveType => props_must_have_type(doc),
            Self::TypeArrayNeedsItems => type_array_needs_items(doc),
            Self::CoreMetadataRequiredLink => core_metadata_required_link(doc),
            Self::DataFilePropsNeedDataProps => data_file_props_need_data_props(doc),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A broken domain rule, naming the entity, the field and the fix.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("[{rule}] entity '{entity}', field '{field}': {message}")]
pub struct RuleViolation {
    /// The rule that failed.
    pub rule: Rule,
    /// Entity `id`.
    pub entity: String,
    /// Offending field or property.
    pub field: String,
    /// What is wrong and how to fix it.
    pub message: String,
}

impl RuleViolation {
    fn new(rule: Rule, doc: &EntityDocument, field: &str, message: String) -> Self {
        Self {
            rule,
            entity: doc.id().to_string(),
            field: field.to_string(),
            message,
        }
    }
}

/// Run the whole battery, stopping at the first violation.
pub fn validate(doc: &EntityDocument) -> Result<bool, RuleViolation> {
    for rule in Rule::ALL {
        rule.check(doc)?;
    }
    Ok(true)
}

/// Run the whole battery and return every violation, in battery order.
pub fn check_all(doc: &EntityDocument) -> Vec<RuleViolation> {
    Rule::ALL.iter().filter_map(|r| r.check(doc).err()).collect()
}

/// Every rule an entity breaks, in battery order.
///
/// Displays as the first violation, with a count of the rest.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct RuleViolations {
    first: RuleViolation,
    rest: Vec<RuleViolation>,
}

impl RuleViolations {
    /// Run the whole battery; `None` when the entity passes every rule.
    pub fn collect(doc: &EntityDocument) -> Option<Self> {
        let mut all = check_all(doc).into_iter();
        let first = all.next()?;
        Some(Self {
            first,
            rest: all.collect(),
        })
    }

    /// The violation [`validate`] raises for the same document.
    pub fn first(&self) -> &RuleViolation {
        &self.first
    }

    /// All violations, first included.
    pub fn iter(&self) -> impl Iterator<Item = &RuleViolation> {
        std::iter::once(&self.first).chain(self.rest.iter())
    }

    /// Number of violations. At least one.
    pub fn count(&self) -> usize {
        1 + self.rest.len()
    }
}

impl From<RuleViolation> for RuleViolations {
    fn from(first: RuleViolation) -> Self {
        Self {
            first,
            rest: Vec::new(),
        }
    }
}

impl fmt::Display for RuleViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first)?;
        if !self.rest.is_empty() {
            write!(f, " (and {} more)", self.rest.len())?;
        }
        Ok(())
    }
}

fn data_file_link_core_metadata(doc: &EntityDocument) -> Result<(), RuleViolation> {
    if !doc.is_data_file() || doc.link_names().contains(&METADATA_COLLECTION_LINK) {
        return Ok(());
    }
    Err(RuleViolation::new(
        Rule::DataFileLinkCoreMetadata,
        doc,
        "links",
        format!(
            "data_file entities must link to {METADATA_COLLECTION}; add a link named \
             '{METADATA_COLLECTION_LINK}' with target_type '{METADATA_COLLECTION}'"
        ),
    ))
}

fn link_props_exist(doc: &EntityDocument) -> Result<(), RuleViolation> {
    for name in doc.link_names() {
        if !doc.has_property(name) {
            return Err(RuleViolation::new(
                Rule::LinkPropsExist,
                doc,
                name,
                format!(
                    "link '{name}' has no matching property; add properties.{name} \
                     (e.g. $ref: _definitions.yaml#/to_one or #/to_many)"
                ),
            ));
        }
    }
    Ok(())
}

fn props_cannot_be_system_props(doc: &EntityDocument) -> Result<(), RuleViolation> {
    if BOOTSTRAP_ENTITIES.contains(&doc.id()) {
        return Ok(());
    }
    for name in doc.properties().keys() {
        if is_system_property(name) {
            return Err(RuleViolation::new(
                Rule::PropsCannotBeSystemProps,
                doc,
                name,
                format!("'{name}' is a reserved system property; rename it (e.g. '{}_{name}')", doc.id()),
            ));
        }
    }
    Ok(())
}

fn props_must_have_type(doc: &EntityDocument) -> Result<(), RuleViolation> {
    for (name, definition) in &doc.properties() {
        let Some(map) = definition.as_object() else {
            continue;
        };
        if map.contains_key(POINTER_KEY) || map.contains_key("type") || map.contains_key("enum") {
            continue;
        }
        return Err(RuleViolation::new(
            Rule::PropsMustHaveType,
            doc,
            name,
            format!("property '{name}' declares neither 'type' nor 'enum'; add one of them"),
        ));
    }
    Ok(())
}

fn is_array_type(definition: &Value) -> bool {
    match definition.get("type") {
        Some(Value::String(t)) => t == "array",
        Some(Value::Array(types)) => types.iter().any(|t| t == "array"),
        _ => false,
    }
}

fn type_array_needs_items(doc: &EntityDocument) -> Result<(), RuleViolation> {
    for (name, definition) in &doc.properties() {
        if is_array_type(definition) && definition.get("items").is_none() {
            return Err(RuleViolation::new(
                Rule::TypeArrayNeedsItems,
                doc,
                name,
                format!("property '{name}' has type 'array' but no 'items'; declare the element schema under items"),
            ));
        }
    }
    Ok(())
}

fn core_metadata_required_link(doc: &EntityDocument) -> Result<(), RuleViolation> {
    if doc.id() != METADATA_COLLECTION {
        return Ok(());
    }
    let has_required = doc
        .flat_links()
        .iter()
        .any(|l| l.get("required").and_then(Value::as_bool) == Some(true));
    if has_required {
        return Ok(());
    }
    Err(RuleViolation::new(
        Rule::CoreMetadataRequiredLink,
        doc,
        "links",
        "no link is required; set required: true on at least one link (usually 'projects')".to_string(),
    ))
}

fn data_file_props_need_data_props(doc: &EntityDocument) -> Result<(), RuleViolation> {
    if !doc.is_data_file() {
        return Ok(());
    }
    let missing: Vec<&str> = DATA_FILE_PROPERTIES
        .iter()
        .copied()
        .filter(|p| !doc.has_property(p))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(RuleViolation::new(
        Rule::DataFilePropsNeedDataProps,
        doc,
        "properties",
        format!(
            "data_file entities must declare {}; missing {}",
            DATA_FILE_PROPERTIES.join(", "),
            missing.join(", ")
        ),
    ))
}
