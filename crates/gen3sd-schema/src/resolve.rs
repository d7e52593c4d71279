//! # Reference Resolver
//!
//! Replaces every `$ref` pointer in a document with the content it points
//! to, producing a new, pointer-free document. Inputs are never mutated.
//!
//! ## Merge Rule
//!
//! A mapping holding a pointer resolves to the (resolved) target's keys,
//! overwritten by each sibling key of the pointer, itself resolved:
//!
//! ```text
//! {"$ref": "_definitions.yaml#/x", "extra": 1}   with x = {"a": 1, "extra": 0}
//!   => {"a": 1, "extra": 1}
//! ```
//!
//! ## Contexts
//!
//! A pointer with an empty file part resolves against the *current* context:
//! the entity document for pointers written in the entity, the shared
//! document for pointers reached through it. External pointers look their
//! file up in the pool.
//!
//! ## Cycles
//!
//! The chain of pointers being expanded is tracked; re-entering one raises
//! [`ResolveError::CircularReference`]. [`ResolverConfig::max_depth`] caps
//! the chain length.

use std::collections::BTreeMap;

use gen3sd_core::{Pointer, POINTER_KEY};
use serde_json::{Map, Value};

use crate::bundle::Bundle;
use crate::error::{BundleError, DictionaryError, ResolveError};
use crate::graph::order_bundle;

/// Tunables for the resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Maximum number of pointers expanded inside one another.
    pub max_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { max_depth: 64 }
    }
}

/// Resolves documents against a pool of named documents.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'p> {
    pool: &'p BTreeMap<String, Value>,
    max_depth: usize,
}

#[derive(Clone, Copy)]
struct Context<'a> {
    name: &'a str,
    root: &'a Value,
}

impl<'p> Resolver<'p> {
    /// A resolver over `pool` with default settings.
    pub fn new(pool: &'p BTreeMap<String, Value>) -> Self {
        Self::with_config(pool, &ResolverConfig::default())
    }

    /// A resolver over `pool`.
    pub fn with_config(pool: &'p BTreeMap<String, Value>, config: &ResolverConfig) -> Self {
        Self {
            pool,
            max_depth: config.max_depth,
        }
    }

    /// Resolve `document`, using the document itself as same-file context.
    ///
    /// `name` identifies the document in errors and in cycle chains.
    pub fn resolve(&self, name: &str, document: &Value) -> Result<Value, ResolveError> {
        self.resolve_in(name, document, document)
    }

    /// Resolve `document`, resolving same-file pointers against `context`.
    pub fn resolve_in(
        &self,
        name: &str,
        document: &Value,
        context: &Value,
    ) -> Result<Value, ResolveError> {
        let ctx = Context {
            name,
            root: context,
        };
        let mut chain = Vec::new();
        self.walk(name, document, ctx, &mut chain)
    }

    fn walk(
        &self,
        origin: &str,
        node: &Value,
        ctx: Context<'_>,
        chain: &mut Vec<String>,
    ) -> Result<Value, ResolveError> {
        match node {
            Value::Object(map) if map.contains_key(POINTER_KEY) => {
                self.expand(origin, map, ctx, chain)
            }
            Value::Object(map) => {
                let mut out = Map::with_capacity(map.len());
                for (key, value) in map {
                    out.insert(key.clone(), self.walk(origin, value, ctx, chain)?);
                }
                Ok(Value::Object(out))
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.walk(origin, item, ctx, chain))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            scalar => Ok(scalar.clone()),
        }
    }

    fn expand(
        &self,
        origin: &str,
        map: &Map<String, Value>,
        ctx: Context<'_>,
        chain: &mut Vec<String>,
    ) -> Result<Value, ResolveError> {
        let raw = map
            .get(POINTER_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| ResolveError::InvalidPointer {
                document: origin.to_string(),
                reason: format!("{POINTER_KEY} value must be a string"),
            })?;
        let pointer = Pointer::parse(raw).map_err(|e| ResolveError::InvalidPointer {
            document: origin.to_string(),
            reason: e.to_string(),
        })?;

        let target_ctx = match pointer.file() {
            None => ctx,
            Some(file) => {
                let (name, root) = self.pool.get_key_value(file).ok_or_else(|| {
                    ResolveError::MissingDocument {
                        document: origin.to_string(),
                        pointer: raw.to_string(),
                        file: file.to_string(),
                    }
                })?;
                Context { name, root }
            }
        };

        let key = format!("{}#/{}", target_ctx.name, pointer.segments().join("/"));
        if chain.contains(&key) {
            let mut cycle = chain.clone();
            cycle.push(key);
            return Err(ResolveError::CircularReference {
                document: origin.to_string(),
                chain: cycle,
            });
        }
        if chain.len() >= self.max_depth {
            return Err(ResolveError::DepthExceeded {
                document: origin.to_string(),
                limit: self.max_depth,
            });
        }

        let target = pointer
            .lookup(target_ctx.root)
            .map_err(|segment| ResolveError::BrokenReference {
                document: origin.to_string(),
                pointer: raw.to_string(),
                target: target_ctx.name.to_string(),
                segment,
            })?;

        chain.push(key);
        let resolved = self.walk(origin, target, target_ctx, chain);
        chain.pop();
        let resolved = resolved?;

        let mut siblings = map.iter().filter(|(k, _)| k.as_str() != POINTER_KEY).peekable();
        if siblings.peek().is_none() {
            return Ok(resolved);
        }
        let Value::Object(mut merged) = resolved else {
            return Err(ResolveError::UnmergeableTarget {
                document: origin.to_string(),
                pointer: raw.to_string(),
            });
        };
        for (key, value) in siblings {
            merged.insert(key.clone(), self.walk(origin, value, ctx, chain)?);
        }
        Ok(Value::Object(merged))
    }
}

/// Resolve `document` against `context` for same-file pointers and `pool`
/// for external ones, with default settings.
pub fn resolve(
    name: &str,
    document: &Value,
    context: &Value,
    pool: &BTreeMap<String, Value>,
) -> Result<Value, ResolveError> {
    Resolver::new(pool).resolve_in(name, document, context)
}

/// Resolve every shared document of `bundle` against itself and the other
/// shared documents.
pub fn resolve_shared(
    bundle: &Bundle,
    config: &ResolverConfig,
) -> Result<BTreeMap<String, Value>, ResolveError> {
    let raw = bundle.shared();
    let resolver = Resolver::with_config(&raw, config);
    raw.iter()
        .map(|(name, doc)| {
            tracing::debug!(document = %name, "resolving shared document");
            resolver.resolve(name, doc).map(|r| (name.clone(), r))
        })
        .collect()
}

/// The pool entity documents resolve against: the resolved shared documents
/// plus every raw entity document, so entities may point into each other.
pub fn entity_pool(bundle: &Bundle, shared: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    let mut pool = shared.clone();
    for (name, doc) in bundle.documents() {
        pool.entry(name.clone()).or_insert_with(|| doc.clone());
    }
    pool
}

/// One resolved entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEntity {
    /// Logical entity name.
    pub name: String,
    /// File name the entity was read from.
    pub file: String,
    /// The pointer-free document.
    pub document: Value,
}

/// A fully resolved bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBundle {
    /// Entities in dependency order.
    pub entities: Vec<ResolvedEntity>,
    /// Resolved shared documents by file name.
    pub shared: BTreeMap<String, Value>,
}

impl ResolvedBundle {
    /// Back to a plain bundle of resolved documents.
    pub fn to_bundle(&self) -> Bundle {
        self.shared
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .chain(self.entities.iter().map(|e| (e.file.clone(), e.document.clone())))
            .collect()
    }
}

/// Resolve a whole bundle: shared documents first, then every entity in
/// dependency order.
pub fn resolve_bundle(
    bundle: &Bundle,
    config: &ResolverConfig,
) -> Result<ResolvedBundle, DictionaryError> {
    let shared = resolve_shared(bundle, config)?;
    let pool = entity_pool(bundle, &shared);
    let resolver = Resolver::with_config(&pool, config);

    let mut entities = Vec::new();
    for name in order_bundle(bundle)? {
        let (Some(file), Some(raw)) = (bundle.entity_file(&name), bundle.entity(&name)) else {
            return Err(BundleError::MissingEntity { name }.into());
        };
        tracing::debug!(entity = %name, "resolving entity");
        entities.push(ResolvedEntity {
            document: resolver.resolve(file, raw)?,
            file: file.to_string(),
            name,
        });
    }
    tracing::info!(entities = entities.len(), shared = shared.len(), "resolved bundle");
    Ok(ResolvedBundle { entities, shared })
}

/// Whether any mapping in `value` still holds a pointer key.
pub fn contains_pointer(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.contains_key(POINTER_KEY) || map.values().any(contains_pointer),
        Value::Array(items) => items.iter().any(contains_pointer),
        _ => false,
    }
}
