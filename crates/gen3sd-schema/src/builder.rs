//! # Entity Builder
//!
//! Turns a [`DataModel`] into raw (unresolved) entity documents.
//!
//! Each document starts as a copy of a [`Template`], whose structural
//! fields carry the meta-schema's declared defaults, and is then filled
//! from the model:
//!
//! - `id`, `category` and `description` come from the model entity.
//! - Each model property becomes a property definition. `enum` properties
//!   carry the value list (plus `enumDef` when any value has provenance),
//!   `datetime` properties point at the shared datetime definition, and
//!   scalars carry `type` and `description`.
//! - Each link where the entity is the child becomes a [`Link`] and a
//!   `to_one`/`to_many` property. Data-file entities also get a link to the
//!   metadata collection. More than one link is wrapped in a single group.
//! - `required` lists `type`, `submitter_id`, then the required properties.
//! - Any other model key is copied verbatim when the template has that
//!   field; otherwise it is dropped with a [`Diagnostic`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use gen3sd_core::parser::parse_yaml_str;
use gen3sd_core::{
    group_links, pluralize, Category, DataModel, EntityDocument, EnumValue, Link, ModelProperty,
    Multiplicity, PropertyType, METADATA_COLLECTION, METADATA_COLLECTION_LINK,
};
use serde_json::{json, Map, Value};

use crate::error::BuildError;
use crate::validate::builtin_metaschema;

/// File name of the shared definitions document.
pub const DEFINITIONS_FILE: &str = "_definitions.yaml";
/// File name of the shared terms document.
pub const TERMS_FILE: &str = "_terms.yaml";
/// File name of the dictionary settings document.
pub const SETTINGS_FILE: &str = "_settings.yaml";

const AUXILIARY: [(&str, &str); 4] = [
    (DEFINITIONS_FILE, include_str!("../templates/_definitions.yaml")),
    (TERMS_FILE, include_str!("../templates/_terms.yaml")),
    (SETTINGS_FILE, include_str!("../templates/_settings.yaml")),
    (
        "core_metadata_collection.yaml",
        include_str!("../templates/core_metadata_collection.yaml"),
    ),
];

const LINK_LABEL: &str = "part_of";

/// Skeleton entity document holding a default for every structural field.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    skeleton: Map<String, Value>,
}

impl Template {
    /// Build a template from the `default` of each top-level property of a
    /// meta-schema.
    pub fn from_metaschema(meta: &Value) -> Result<Self, BuildError> {
        let properties = meta
            .get("properties")
            .and_then(Value::as_object)
            .ok_or_else(|| BuildError::Template("meta-schema has no 'properties' mapping".to_string()))?;
        let skeleton = properties
            .iter()
            .filter_map(|(key, schema)| schema.get("default").map(|d| (key.clone(), d.clone())))
            .collect();
        Ok(Self { skeleton })
    }

    /// The template derived from the embedded meta-schema.
    pub fn builtin() -> Result<Self, BuildError> {
        let meta = builtin_metaschema().map_err(|e| BuildError::Template(e.to_string()))?;
        Self::from_metaschema(&meta)
    }

    /// The skeleton fields.
    pub fn skeleton(&self) -> &Map<String, Value> {
        &self.skeleton
    }

    /// Whether the template declares `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.skeleton.contains_key(field)
    }
}

/// A non-fatal finding from the builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Entity being built.
    pub entity: String,
    /// Model key concerned.
    pub key: String,
    /// What happened.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}: {}", self.entity, self.key, self.message)
    }
}

/// A populated entity document plus any diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltEntity {
    /// The raw entity document.
    pub document: EntityDocument,
    /// Keys the builder dropped.
    pub diagnostics: Vec<Diagnostic>,
}

fn definition_ref(name: &str) -> Value {
    json!({ "$ref": format!("{DEFINITIONS_FILE}#/{name}") })
}

fn link_property(multiplicity: Multiplicity) -> Value {
    definition_ref(if multiplicity.is_to_many() { "to_many" } else { "to_one" })
}

fn property_definition(prop: &ModelProperty) -> Value {
    match prop.kind {
        PropertyType::Datetime => definition_ref("datetime"),
        PropertyType::Enum => {
            let values = prop.enums.as_deref().unwrap_or_default();
            let mut def = Map::new();
            def.insert("description".to_string(), json!(prop.description));
            def.insert(
                "enum".to_string(),
                Value::Array(values.iter().map(|v| json!(v.value())).collect()),
            );
            if values.iter().any(EnumValue::has_provenance) {
                def.insert(
                    "enumDef".to_string(),
                    Value::Array(values.iter().map(enum_def).collect()),
                );
            }
            Value::Object(def)
        }
        scalar => json!({
            "type": scalar.scalar_type(),
            "description": prop.description,
        }),
    }
}

fn enum_def(value: &EnumValue) -> Value {
    let mut def = Map::new();
    def.insert("enumeration".to_string(), json!(value.value()));
    if let EnumValue::Sourced {
        source,
        term_id,
        version,
        ..
    } = value
    {
        for (key, field) in [("source", source), ("term_id", term_id), ("version", version)] {
            if let Some(v) = field {
                def.insert(key.to_string(), json!(v));
            }
        }
    }
    Value::Object(def)
}

/// Build the raw document for entity `name`.
///
/// # Errors
///
/// [`BuildError::Model`] if `name` is not declared; [`BuildError::Document`]
/// if a property reuses a reserved system name.
pub fn populate(name: &str, model: &DataModel, template: &Template) -> Result<BuiltEntity, BuildError> {
    let entity = model.entity(name)?;
    let mut doc = EntityDocument::from_value(Value::Object(template.skeleton().clone()))?;
    doc.set_id(&entity.name);
    doc.set_category(entity.category);
    doc.set_description(&entity.description);
    doc.set_field("properties", Value::Object(Map::new()));

    for prop in &entity.properties {
        doc.insert_property(&prop.name, property_definition(prop))?;
    }

    let mut links = Vec::new();
    for model_link in model.parent_links(name) {
        let link_name = pluralize(&model_link.parent);
        doc.insert_property(&link_name, link_property(model_link.multiplicity))?;
        links.push(Link {
            name: link_name,
            backref: pluralize(&entity.name),
            label: LINK_LABEL.to_string(),
            target_type: model_link.parent.clone(),
            multiplicity: model_link.multiplicity,
            required: true,
        });
    }
    let has_collection_link = links.iter().any(|l| l.name == METADATA_COLLECTION_LINK);
    if entity.category == Category::DataFile && !has_collection_link {
        doc.insert_property(METADATA_COLLECTION_LINK, link_property(Multiplicity::OneToOne))?;
        links.push(Link {
            name: METADATA_COLLECTION_LINK.to_string(),
            backref: pluralize(&entity.name),
            label: LINK_LABEL.to_string(),
            target_type: METADATA_COLLECTION.to_string(),
            multiplicity: Multiplicity::OneToOne,
            required: false,
        });
    }
    doc.set_links(&group_links(links))?;

    let required = ["type", "submitter_id"]
        .into_iter()
        .map(String::from)
        .chain(entity.properties.iter().filter(|p| p.required).map(|p| p.name.clone()));
    doc.set_required(required);

    let mut diagnostics = Vec::new();
    for (key, value) in &entity.extra {
        if template.has_field(key) {
            doc.set_field(key, value.clone());
        } else {
            tracing::warn!(entity = %entity.name, key = %key, "dropping model key with no template field");
            diagnostics.push(Diagnostic {
                entity: entity.name.clone(),
                key: key.clone(),
                message: "not a template field; dropped".to_string(),
            });
        }
    }

    tracing::debug!(entity = %entity.name, properties = doc.properties().len(), "populated entity");
    Ok(BuiltEntity {
        document: doc,
        diagnostics,
    })
}

/// The four auxiliary documents every dictionary ships, keyed by file name.
pub fn auxiliary_documents() -> Result<BTreeMap<String, Value>, BuildError> {
    AUXILIARY
        .iter()
        .map(|(name, text)| {
            parse_yaml_str(text, Path::new(name))
                .map(|doc| (name.to_string(), doc))
                .map_err(|e| BuildError::Template(e.to_string()))
        })
        .collect()
}

/// Every document generated from a model.
#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    /// Documents keyed by file name (`<entity>.yaml` and the auxiliaries).
    pub documents: BTreeMap<String, Value>,
    /// Diagnostics from all entities.
    pub diagnostics: Vec<Diagnostic>,
}

/// Validate `model`, populate every entity, and add the auxiliary documents.
///
/// An entity the model declares under an auxiliary name replaces the
/// shipped document.
pub fn generate(model: &DataModel, template: &Template) -> Result<Generated, BuildError> {
    model.validate()?;
    let mut documents = auxiliary_documents()?;
    let mut diagnostics = Vec::new();
    for entity in &model.entities {
        let built = populate(&entity.name, model, template)?;
        let file = format!("{}.yaml", entity.name);
        if documents.contains_key(&file) {
            tracing::info!(file = %file, "model entity replaces shipped document");
        }
        documents.insert(file, built.document.into_value());
        diagnostics.extend(built.diagnostics);
    }
    tracing::info!(documents = documents.len(), "generated dictionary");
    Ok(Generated {
        documents,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gen3sd_core::{LinkEntry, ModelError};

    fn model(value: Value) -> DataModel {
        serde_json::from_value(value).unwrap()
    }

    fn file_model() -> DataModel {
        model(json!({
            "entities": [
                {"name": "sample", "category": "biospecimen", "properties": []},
                {"name": "reads_file", "category": "data_file", "description": "Sequencing reads.",
                 "properties": [
                    {"name": "data_type", "type": "string", "required": true},
                    {"name": "read_length", "type": "integer"},
                    {"name": "sequenced_on", "type": "datetime"},
                    {"name": "platform", "type": "enum", "description": "Instrument.",
                     "enums": ["illumina", {"value": "pacbio", "source": "NCIt", "term_id": "C125894"}]}
                 ]}
            ],
            "links": [{"parent": "sample", "child": "reads_file", "multiplicity": "one_to_many"}]
        }))
    }

    #[test]
    fn template_takes_meta_schema_defaults() {
        let t = Template::builtin().unwrap();
        assert_eq!(t.skeleton()["program"], "*");
        assert_eq!(t.skeleton()["additionalProperties"], false);
        assert_eq!(t.skeleton()["uniqueKeys"], json!([["id"], ["project_id", "submitter_id"]]));
        assert!(t.has_field("namespace"));
        assert!(!t.has_field("definitions"));
    }

    #[test]
    fn template_needs_properties() {
        assert!(matches!(
            Template::from_metaschema(&json!({"type": "object"})),
            Err(BuildError::Template(_))
        ));
    }

    #[test]
    fn data_file_gets_grouped_links() {
        let built = populate("reads_file", &file_model(), &Template::builtin().unwrap()).unwrap();
        let doc = built.document;

        let links: Vec<LinkEntry> = serde_json::from_value(doc.raw_links().clone()).unwrap();
        let [LinkEntry::Group(group)] = links.as_slice() else {
            panic!("expected a single link group, got {links:?}");
        };
        assert!(!group.exclusive);
        assert!(group.required);
        let names: Vec<&str> = group.subgroup.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["samples", "core_metadata_collections"]);
        assert_eq!(group.subgroup[0].backref, "reads_files");
        assert_eq!(group.subgroup[0].multiplicity, Multiplicity::OneToMany);
        assert!(group.subgroup[0].required);
        assert_eq!(group.subgroup[1].multiplicity, Multiplicity::OneToOne);
        assert!(!group.subgroup[1].required);

        let props = doc.properties();
        assert_eq!(props["samples"], json!({"$ref": "_definitions.yaml#/to_many"}));
        assert_eq!(
            props["core_metadata_collections"],
            json!({"$ref": "_definitions.yaml#/to_one"})
        );
    }

    #[test]
    fn property_kinds_render_as_expected() {
        let built = populate("reads_file", &file_model(), &Template::builtin().unwrap()).unwrap();
        let props = built.document.properties();
        assert_eq!(props["read_length"], json!({"type": "integer", "description": ""}));
        assert_eq!(props["sequenced_on"], json!({"$ref": "_definitions.yaml#/datetime"}));
        assert_eq!(props["platform"]["enum"], json!(["illumina", "pacbio"]));
        assert!(props["platform"].get("type").is_none());
        assert_eq!(
            props["platform"]["enumDef"],
            json!([
                {"enumeration": "illumina"},
                {"enumeration": "pacbio", "source": "NCIt", "term_id": "C125894"}
            ])
        );
    }

    #[test]
    fn sets_identity_and_required() {
        let built = populate("reads_file", &file_model(), &Template::builtin().unwrap()).unwrap();
        let doc = built.document;
        assert_eq!(doc.id(), "reads_file");
        assert_eq!(doc.category_str(), Some("data_file"));
        assert_eq!(doc.fields()["description"], "Sequencing reads.");
        assert_eq!(doc.required(), ["type", "submitter_id", "data_type"]);
    }

    #[test]
    fn single_link_stays_flat() {
        let built = populate("sample", &model(json!({
            "entities": [
                {"name": "subject", "category": "clinical"},
                {"name": "sample", "category": "biospecimen"}
            ],
            "links": [{"parent": "subject", "child": "sample", "multiplicity": "many_to_one"}]
        })), &Template::builtin().unwrap()).unwrap();
        let links: Vec<LinkEntry> = serde_json::from_value(built.document.raw_links().clone()).unwrap();
        assert!(matches!(links.as_slice(), [LinkEntry::Single(l)] if l.name == "subjects"));
        assert_eq!(
            built.document.properties()["subjects"],
            json!({"$ref": "_definitions.yaml#/to_one"})
        );
    }

    #[test]
    fn explicit_collection_link_is_not_duplicated() {
        let m = model(json!({
            "entities": [{"name": "reads_file", "category": "data_file"}],
            "links": [{"parent": "core_metadata_collection", "child": "reads_file",
                       "multiplicity": "many_to_one"}]
        }));
        let built = populate("reads_file", &m, &Template::builtin().unwrap()).unwrap();
        assert_eq!(built.document.link_names(), ["core_metadata_collections"]);
    }

    #[test]
    fn unknown_entity_is_an_error() {
        let err = populate("aliquot", &file_model(), &Template::builtin().unwrap()).unwrap_err();
        assert!(matches!(err, BuildError::Model(ModelError::EntityNotFound(n)) if n == "aliquot"));
    }

    #[test]
    fn extra_keys_pass_through_or_warn() {
        let m = model(json!({"entities": [{
            "name": "subject", "category": "clinical",
            "namespace": "http://example.org", "color": "blue"
        }]}));
        let built = populate("subject", &m, &Template::builtin().unwrap()).unwrap();
        assert_eq!(built.document.fields()["namespace"], "http://example.org");
        assert!(built.document.fields().get("color").is_none());
        assert_eq!(built.diagnostics.len(), 1);
        assert_eq!(built.diagnostics[0].key, "color");
        assert!(built.diagnostics[0].to_string().starts_with("subject.color:"));
    }

    #[test]
    fn reserved_property_names_are_refused() {
        let m = model(json!({"entities": [{
            "name": "demographic", "category": "clinical",
            "properties": [{"name": "state", "type": "string"}]
        }]}));
        let err = populate("demographic", &m, &Template::builtin().unwrap()).unwrap_err();
        assert!(matches!(err, BuildError::Document(_)));
    }

    #[test]
    fn generate_adds_auxiliary_documents() {
        let out = generate(&file_model(), &Template::builtin().unwrap()).unwrap();
        let names: Vec<&str> = out.documents.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            [
                "_definitions.yaml",
                "_settings.yaml",
                "_terms.yaml",
                "core_metadata_collection.yaml",
                "reads_file.yaml",
                "sample.yaml"
            ]
        );
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn generate_validates_the_model() {
        let m = model(json!({"entities": [
            {"name": "a", "category": "clinical"}, {"name": "a", "category": "clinical"}
        ]}));
        assert!(matches!(
            generate(&m, &Template::builtin().unwrap()),
            Err(BuildError::Model(ModelError::DuplicateEntity(_)))
        ));
    }
}
