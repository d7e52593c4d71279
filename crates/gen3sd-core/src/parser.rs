//! Shared YAML/JSON parsing infrastructure.
//!
//! Every document in the toolchain is held as a `serde_json::Value`. YAML
//! input is parsed with `serde_yaml` and converted through
//! [`yaml_to_json_value`], which stringifies scalar mapping keys and strips
//! tags, so the resolver and validators see one value model regardless of the
//! on-disk format. Mapping order is preserved.

use std::path::Path;

use serde_json::Value;

use crate::error::LoadError;

/// Document format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `.yaml` / `.yml`
    Yaml,
    /// `.json`
    Json,
}

impl Format {
    /// Infer the format from a file name. Unknown extensions are `None`.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Some(Self::Yaml),
            Some("json") => Some(Self::Json),
            _ => None,
        }
    }
}

fn read_file(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            LoadError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            LoadError::Io(e)
        }
    })
}

/// Load a YAML file and return it as a `serde_json::Value`.
pub fn load_yaml_as_value(path: &Path) -> Result<Value, LoadError> {
    let content = read_file(path)?;
    parse_yaml_str(&content, path)
}

/// Load a JSON file and return it as a `serde_json::Value`.
pub fn load_json_value(path: &Path) -> Result<Value, LoadError> {
    let content = read_file(path)?;
    serde_json::from_str(&content).map_err(|e| LoadError::JsonParse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load a document, picking the parser from the extension.
///
/// Anything that is not `.json` goes through the YAML parser, which also
/// accepts JSON text.
pub fn load_document(path: &Path) -> Result<Value, LoadError> {
    match Format::from_path(path) {
        Some(Format::Json) => load_json_value(path),
        _ => load_yaml_as_value(path),
    }
}

/// Load a document whose top level must be a mapping.
///
/// Empty files parse to `null` and are refused like any other scalar.
pub fn load_mapping(path: &Path) -> Result<Value, LoadError> {
    let value = load_document(path)?;
    if !value.is_object() {
        return Err(LoadError::NotAMapping {
            path: path.to_path_buf(),
        });
    }
    Ok(value)
}

/// Parse YAML text. `origin` is only used for error context.
pub fn parse_yaml_str(content: &str, origin: &Path) -> Result<Value, LoadError> {
    let yaml_value: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| LoadError::YamlParse {
            path: origin.to_path_buf(),
            source: e,
        })?;
    yaml_to_json_value(yaml_value).map_err(|detail| LoadError::NotJsonCompatible {
        path: origin.to_path_buf(),
        detail,
    })
}

/// Serialize a value as YAML text.
pub fn to_yaml_string(value: &Value) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(value)
}

/// Write a document to `path` in the format its extension names
/// (YAML unless the extension is `.json`).
pub fn write_document(path: &Path, value: &Value) -> Result<(), LoadError> {
    let text = match Format::from_path(path) {
        Some(Format::Json) => {
            serde_json::to_string_pretty(value).map_err(|e| LoadError::Serialize {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })? + "\n"
        }
        _ => to_yaml_string(value).map_err(|e| LoadError::Serialize {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?,
    };
    std::fs::write(path, text)?;
    Ok(())
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// Scalar keys are stringified. Tags are stripped. Non-finite floats and
/// composite mapping keys have no JSON form and are rejected.
pub fn yaml_to_json_value(yaml: serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(serde_json::Number::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(serde_json::Number::from(u)))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s)),
        serde_yaml::Value::Sequence(seq) => {
            let items: Result<Vec<Value>, String> =
                seq.into_iter().map(yaml_to_json_value).collect();
            Ok(Value::Array(items?))
        }
        serde_yaml::Value::Mapping(map) => {
            let mut obj = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s,
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    serde_yaml::Value::Null => "null".to_string(),
                    other => return Err(format!("unsupported YAML map key: {other:?}")),
                };
                obj.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(obj))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(tagged.value),
    }
}
