//! # Entity Documents
//!
//! [`EntityDocument`] is a typed view over the mapping that describes one
//! node type of a Gen3 dictionary. Reads go through accessors that tolerate
//! malformed content (the validators need to report on broken documents,
//! not choke on them). Writes go through setters that enforce the
//! invariants an author would otherwise violate by hand.

use serde_json::{Map, Value};

use crate::category::Category;
use crate::error::DocumentError;
use crate::link::{flatten_raw_links, LinkEntry};

/// Property names reserved for system use on every entity.
pub const SYSTEM_PROPERTIES: &[&str] = &[
    "id",
    "project_id",
    "type",
    "submitter_id",
    "state",
    "created_datetime",
    "updated_datetime",
    "file_state",
    "error_type",
    "label",
];

/// Bootstrap entities exempt from the reserved-name restriction.
pub const BOOTSTRAP_ENTITIES: &[&str] = &["program", "project"];

/// Id of the shared metadata-collection entity.
pub const METADATA_COLLECTION: &str = "core_metadata_collection";

/// Link name every data-file entity uses to reach the metadata collection.
pub const METADATA_COLLECTION_LINK: &str = "core_metadata_collections";

/// Properties every data-file entity must declare.
pub const DATA_FILE_PROPERTIES: &[&str] = &["data_type", "data_format", "data_category"];

/// Whether `name` is one of the reserved system property names.
pub fn is_system_property(name: &str) -> bool {
    SYSTEM_PROPERTIES.contains(&name)
}

/// A typed view over one entity document.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDocument {
    fields: Map<String, Value>,
}

impl EntityDocument {
    /// Wrap a document value. Fails if it is not a mapping.
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(DocumentError::NotAMapping {
                context: "entity document".to_string(),
            }),
        }
    }

    /// Borrow the backing mapping.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Unwrap into a plain value.
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    /// The `id` field, or `"<unknown>"` when absent so diagnostics always
    /// name something.
    pub fn id(&self) -> &str {
        self.fields
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("<unknown>")
    }

    /// Set the `id` field.
    pub fn set_id(&mut self, id: &str) {
        self.fields.insert("id".to_string(), Value::String(id.to_string()));
    }

    /// The raw `category` string, if any.
    pub fn category_str(&self) -> Option<&str> {
        self.fields.get("category").and_then(Value::as_str)
    }

    /// The parsed category. `None` when absent or not a known category.
    pub fn category(&self) -> Option<Category> {
        self.category_str().and_then(|c| c.parse().ok())
    }

    /// Whether the entity is a data file.
    pub fn is_data_file(&self) -> bool {
        self.category() == Some(Category::DataFile)
    }

    /// Set the `category` field.
    pub fn set_category(&mut self, category: Category) {
        self.fields.insert(
            "category".to_string(),
            Value::String(category.as_str().to_string()),
        );
    }

    /// Set the `description` field.
    pub fn set_description(&mut self, description: &str) {
        self.fields.insert(
            "description".to_string(),
            Value::String(description.to_string()),
        );
    }

    /// The `properties` mapping. Empty when absent or malformed.
    pub fn properties(&self) -> Map<String, Value> {
        self.fields
            .get("properties")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether `properties` has a key `name`.
    pub fn has_property(&self, name: &str) -> bool {
        self.fields
            .get("properties")
            .and_then(Value::as_object)
            .is_some_and(|p| p.contains_key(name))
    }

    /// Insert a property definition.
    ///
    /// Reserved system names are refused unless this is a bootstrap entity.
    pub fn insert_property(&mut self, name: &str, definition: Value) -> Result<(), DocumentError> {
        if is_system_property(name) && !BOOTSTRAP_ENTITIES.contains(&self.id()) {
            return Err(DocumentError::ReservedProperty {
                entity: self.id().to_string(),
                property: name.to_string(),
            });
        }
        let entry = self
            .fields
            .entry("properties")
            .or_insert_with(|| Value::Object(Map::new()));
        let props = entry
            .as_object_mut()
            .ok_or_else(|| DocumentError::NotAMapping {
                context: "properties".to_string(),
            })?;
        props.insert(name.to_string(), definition);
        Ok(())
    }

    /// The raw `links` value (`Null` when absent).
    pub fn raw_links(&self) -> &Value {
        self.fields.get("links").unwrap_or(&Value::Null)
    }

    /// All link mappings, with any link group flattened.
    pub fn flat_links(&self) -> Vec<&Map<String, Value>> {
        flatten_raw_links(self.raw_links())
    }

    /// Names of all links, flattened.
    pub fn link_names(&self) -> Vec<&str> {
        self.flat_links()
            .into_iter()
            .filter_map(|l| l.get("name").and_then(Value::as_str))
            .collect()
    }

    /// Replace the `links` field.
    pub fn set_links(&mut self, links: &[LinkEntry]) -> Result<(), DocumentError> {
        let value = serde_json::to_value(links).map_err(|e| DocumentError::Encode {
            field: "links".to_string(),
            reason: e.to_string(),
        })?;
        self.fields.insert("links".to_string(), value);
        Ok(())
    }

    /// The `required` names, in document order.
    pub fn required(&self) -> Vec<&str> {
        self.fields
            .get("required")
            .and_then(Value::as_array)
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Replace the `required` field, dropping duplicates but keeping first
    /// occurrence order.
    pub fn set_required<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = Vec::<String>::new();
        for name in names {
            let name = name.into();
            if !seen.contains(&name) {
                seen.push(name);
            }
        }
        self.fields.insert(
            "required".to_string(),
            Value::Array(seen.into_iter().map(Value::String).collect()),
        );
    }

    /// Set an arbitrary field verbatim.
    pub fn set_field(&mut self, key: &str, value: Value) {
        self.fields.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::{Link, Multiplicity};
    use serde_json::json;

    fn doc(value: Value) -> EntityDocument {
        EntityDocument::from_value(value).unwrap()
    }

    #[test]
    fn rejects_non_mapping() {
        assert!(EntityDocument::from_value(json!(["x"])).is_err());
    }

    #[test]
    fn accessors_tolerate_missing_fields() {
        let d = doc(json!({}));
        assert_eq!(d.id(), "<unknown>");
        assert_eq!(d.category(), None);
        assert!(d.properties().is_empty());
        assert!(d.flat_links().is_empty());
        assert!(d.required().is_empty());
    }

    #[test]
    fn category_parses_known_values_only() {
        assert!(doc(json!({"category": "data_file"})).is_data_file());
        let d = doc(json!({"category": "made_up"}));
        assert_eq!(d.category_str(), Some("made_up"));
        assert_eq!(d.category(), None);
    }

    #[test]
    fn insert_property_refuses_reserved_names() {
        let mut d = doc(json!({"id": "demographic"}));
        let err = d.insert_property("state", json!({"type": "string"})).unwrap_err();
        assert!(matches!(err, DocumentError::ReservedProperty { .. }));
        d.insert_property("gender", json!({"enum": ["f", "m"]})).unwrap();
        assert!(d.has_property("gender"));
    }

    #[test]
    fn bootstrap_entities_may_use_reserved_names() {
        let mut d = doc(json!({"id": "project"}));
        d.insert_property("state", json!({"type": "string"})).unwrap();
        assert!(d.has_property("state"));
    }

    #[test]
    fn link_names_flatten_groups() {
        let d = doc(json!({"links": [{"exclusive": false, "required": true, "subgroup": [
            {"name": "samples"}, {"name": "core_metadata_collections"}
        ]}]}));
        assert_eq!(d.link_names(), vec!["samples", "core_metadata_collections"]);
    }

    #[test]
    fn set_links_serializes_entries() {
        let mut d = doc(json!({"id": "aliquot"}));
        d.set_links(&[LinkEntry::Single(Link {
            name: "samples".to_string(),
            backref: "aliquots".to_string(),
            label: "part_of".to_string(),
            target_type: "sample".to_string(),
            multiplicity: Multiplicity::ManyToOne,
            required: true,
        })])
        .unwrap();
        assert_eq!(d.fields()["links"][0]["multiplicity"], "many_to_one");
        assert_eq!(d.link_names(), vec!["samples"]);
    }

    #[test]
    fn set_required_dedups_in_order() {
        let mut d = doc(json!({}));
        d.set_required(["type", "submitter_id", "type", "age"]);
        assert_eq!(d.required(), vec!["type", "submitter_id", "age"]);
    }
}
