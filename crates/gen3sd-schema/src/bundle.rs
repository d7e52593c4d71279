//! # Document Store
//!
//! A [`Bundle`] maps file names (extension included) to parsed documents.
//! It is read from a directory of per-entity files with [`bundle`], or from
//! one aggregate JSON file with [`load_bundle`], and can be written back in
//! either shape.
//!
//! Names starting with `_` are shared singletons (`_definitions.yaml`,
//! `_terms.yaml`, `_settings.yaml`). Every other document is an entity whose
//! logical name is the file stem.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsStr;
use std::path::Path;

use gen3sd_core::parser::{load_document, load_mapping, write_document, Format};
use serde_json::{Map, Value};

use crate::error::BundleError;

/// Stem of a meta-schema that may sit next to the entity files.
const METASCHEMA_STEM: &str = "metaschema";

/// Options for reading a directory.
#[derive(Debug, Clone, Default)]
pub struct BundleOptions {
    /// Read `.json` files alongside `.yaml`/`.yml`.
    pub include_json: bool,
}

/// A set of named documents, iterated in file-name order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bundle {
    documents: BTreeMap<String, Value>,
}

impl Bundle {
    /// An empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a document.
    pub fn insert(&mut self, file_name: impl Into<String>, document: Value) {
        self.documents.insert(file_name.into(), document);
    }

    /// The document stored under `file_name`.
    pub fn get(&self, file_name: &str) -> Option<&Value> {
        self.documents.get(file_name)
    }

    /// All documents keyed by file name.
    pub fn documents(&self) -> &BTreeMap<String, Value> {
        &self.documents
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the bundle holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Logical names of the entity documents, sorted.
    pub fn entity_names(&self) -> Vec<String> {
        self.documents
            .keys()
            .filter(|name| !is_shared(name))
            .map(|name| file_stem(name).to_string())
            .filter(|stem| stem != METASCHEMA_STEM)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// File name holding entity `name`. YAML wins over JSON when both exist.
    pub fn entity_file(&self, name: &str) -> Option<&str> {
        ["yaml", "yml", "json"]
            .iter()
            .map(|ext| format!("{name}.{ext}"))
            .find_map(|file| self.documents.get_key_value(&file).map(|(k, _)| k.as_str()))
    }

    /// The document of entity `name`.
    pub fn entity(&self, name: &str) -> Option<&Value> {
        self.entity_file(name).and_then(|file| self.documents.get(file))
    }

    /// The shared singleton documents (names starting with `_`).
    pub fn shared(&self) -> BTreeMap<String, Value> {
        self.documents
            .iter()
            .filter(|(name, _)| is_shared(name))
            .map(|(name, doc)| (name.clone(), doc.clone()))
            .collect()
    }

    /// The bundle as one mapping `{file_name: document}`.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.documents
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Map<String, Value>>(),
        )
    }
}

impl FromIterator<(String, Value)> for Bundle {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            documents: iter.into_iter().collect(),
        }
    }
}

/// Whether `file_name` names a shared singleton document.
pub fn is_shared(file_name: &str) -> bool {
    file_name.starts_with('_')
}

/// Whether `name` is a bare `.yaml`, `.yml` or `.json` file name, with no
/// directory part.
pub fn is_document_name(name: &str) -> bool {
    let path = Path::new(name);
    path.file_name() == Some(OsStr::new(name)) && Format::from_path(path).is_some()
}

fn check_name(name: &str) -> Result<(), BundleError> {
    if is_document_name(name) {
        Ok(())
    } else {
        Err(BundleError::InvalidName {
            name: name.to_string(),
        })
    }
}

/// File name minus its last extension.
pub fn file_stem(file_name: &str) -> &str {
    file_name
        .rsplit_once('.')
        .map_or(file_name, |(stem, _)| stem)
}

/// Read every `.yaml`/`.yml` file in `directory` (not recursive).
pub fn bundle(directory: &Path) -> Result<Bundle, BundleError> {
    bundle_with(directory, &BundleOptions::default())
}

/// Read every document file in `directory` (not recursive).
///
/// # Errors
///
/// [`BundleError::NoDocumentsFound`] if nothing matched; the first load
/// failure otherwise, including a document whose top level is not a
/// mapping.
pub fn bundle_with(directory: &Path, options: &BundleOptions) -> Result<Bundle, BundleError> {
    let mut bundle = Bundle::new();
    for entry in std::fs::read_dir(directory)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let wanted = match Format::from_path(&path) {
            Some(Format::Yaml) => true,
            Some(Format::Json) => options.include_json,
            None => false,
        };
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !wanted {
            tracing::trace!(file = name, "skipping non-document file");
            continue;
        }
        tracing::debug!(file = name, "loading document");
        bundle.insert(name, load_mapping(&path)?);
    }

    if bundle.is_empty() {
        return Err(BundleError::NoDocumentsFound {
            directory: directory.to_path_buf(),
        });
    }
    tracing::info!(documents = bundle.len(), directory = %directory.display(), "bundled");
    Ok(bundle)
}

/// Split an aggregate `{file_name: document}` value into a bundle.
///
/// # Errors
///
/// [`BundleError::NotAMapping`] if the value, or any member, is not a
/// mapping; [`BundleError::InvalidName`] if a member name is not a plain
/// document file name.
pub fn split(bundled: Value) -> Result<Bundle, BundleError> {
    let Value::Object(members) = bundled else {
        return Err(BundleError::NotAMapping {
            name: "<bundle>".to_string(),
        });
    };
    let mut bundle = Bundle::new();
    for (name, document) in members {
        check_name(&name)?;
        if !document.is_object() {
            return Err(BundleError::NotAMapping { name });
        }
        bundle.insert(name, document);
    }
    Ok(bundle)
}

/// Read an aggregate bundle file (JSON, or YAML by extension) and split it.
pub fn load_bundle(path: &Path) -> Result<Bundle, BundleError> {
    split(load_document(path)?)
}

/// Write the bundle to `path` as pretty-printed JSON.
pub fn write_bundle(bundle: &Bundle, path: &Path) -> Result<(), BundleError> {
    let text = serde_json::to_string_pretty(&bundle.to_value()).map_err(|e| {
        BundleError::Serialize {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;
    std::fs::write(path, text + "\n")?;
    Ok(())
}

/// Write each document to `<directory>/<file_name>`, creating the directory.
///
/// YAML for `.yaml`/`.yml` names, JSON for `.json`. Nothing is written
/// unless every name is a plain document file name.
pub fn write_split(bundle: &Bundle, directory: &Path) -> Result<(), BundleError> {
    for name in bundle.documents().keys() {
        check_name(name)?;
    }
    std::fs::create_dir_all(directory)?;
    for (name, document) in bundle.documents() {
        let target = directory.join(name);
        match Format::from_path(&target) {
            Some(Format::Yaml) => write_document(&target, document)?,
            _ => {
                let text = serde_json::to_string_pretty(document).map_err(|e| {
                    BundleError::Serialize {
                        path: target.clone(),
                        reason: e.to_string(),
                    }
                })?;
                std::fs::write(&target, text + "\n")?;
            }
        }
    }
    Ok(())
}
