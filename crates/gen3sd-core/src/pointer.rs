//! # Reference Pointers
//!
//! A pointer is the string value of a `$ref` key: `<file>#/<path/to/key>`.
//! An empty `<file>` means "the document being resolved". The path is a
//! JSON Pointer: segments are separated by `/`, with `~1` and `~0` standing
//! for `/` and `~`. Numeric segments index into sequences.

use serde_json::Value;

use crate::error::PointerError;

/// The mapping key that marks a node as a pointer.
pub const POINTER_KEY: &str = "$ref";

/// A parsed `$ref` value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pointer {
    file: String,
    segments: Vec<String>,
}

impl Pointer {
    /// Parse a pointer string.
    pub fn parse(raw: &str) -> Result<Self, PointerError> {
        let (file, path) = raw
            .split_once('#')
            .ok_or_else(|| PointerError::MissingFragment(raw.to_string()))?;

        let segments = match path {
            "" | "/" => Vec::new(),
            p if p.starts_with('/') => p[1..].split('/').map(unescape).collect(),
            _ => return Err(PointerError::RelativePath(raw.to_string())),
        };

        Ok(Self {
            file: file.trim().to_string(),
            segments,
        })
    }

    /// The referenced file, or `None` for a same-document pointer.
    pub fn file(&self) -> Option<&str> {
        if self.file.is_empty() {
            None
        } else {
            Some(&self.file)
        }
    }

    /// Whether the pointer targets the document being resolved.
    pub fn is_local(&self) -> bool {
        self.file.is_empty()
    }

    /// Unescaped path segments, root first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Follow the path from `root`.
    ///
    /// On failure returns the first segment that could not be found.
    pub fn lookup<'v>(&self, root: &'v Value) -> Result<&'v Value, String> {
        let mut node = root;
        for segment in &self.segments {
            let next = match node {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            node = next.ok_or_else(|| segment.clone())?;
        }
        Ok(node)
    }
}

impl std::fmt::Display for Pointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#", self.file)?;
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment.replace('~', "~0").replace('/', "~1"))?;
        }
        Ok(())
    }
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}
