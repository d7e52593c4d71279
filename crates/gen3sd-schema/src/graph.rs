//! # Dependency Ordering
//!
//! Entities depend on the parents their links target. [`order`] runs Kahn's
//! algorithm over `(parent, child)` edges so every parent precedes its
//! children, breaking ties by name. The shared metadata-collection entity
//! is always moved to the end.
//!
//! [`graph_edges`] exports the same relationships as an edge list for
//! external visualization tools.

use std::collections::{BTreeMap, BTreeSet};

use gen3sd_core::link::flatten_raw_links;
use gen3sd_core::{Multiplicity, METADATA_COLLECTION};
use serde::Serialize;
use serde_json::Value;

use crate::bundle::Bundle;
use crate::error::OrderError;

/// A `(parent, child)` dependency edge.
pub type Edge = (String, String);

/// Declared links of an entity document as `(name, target_type, multiplicity)`.
fn declared_links(document: &Value) -> impl Iterator<Item = (&str, &str, Option<&str>)> {
    flatten_raw_links(document.get("links").unwrap_or(&Value::Null))
        .into_iter()
        .filter_map(|link| {
            let target = link.get("target_type").and_then(Value::as_str)?;
            let name = link.get("name").and_then(Value::as_str).unwrap_or("");
            let multiplicity = link.get("multiplicity").and_then(Value::as_str);
            Some((name, target, multiplicity))
        })
}

/// Dependency edges of every entity in `bundle`.
///
/// Self-links do not constrain ordering and are ignored. Links to entities
/// the bundle does not hold are dropped with a warning.
pub fn dependency_edges(bundle: &Bundle) -> BTreeSet<Edge> {
    let names: BTreeSet<String> = bundle.entity_names().into_iter().collect();
    let mut edges = BTreeSet::new();
    for child in &names {
        let Some(document) = bundle.entity(child) else {
            continue;
        };
        for (_, parent, _) in declared_links(document) {
            if parent == child.as_str() {
                continue;
            }
            if !names.contains(parent) {
                tracing::warn!(entity = %child, target = parent, "link targets an entity missing from the bundle");
                continue;
            }
            edges.insert((parent.to_string(), child.clone()));
        }
    }
    edges
}

/// Topological order of `names` under `edges`, with the metadata-collection
/// entity last.
pub fn order<S: AsRef<str>>(names: &[S], edges: &BTreeSet<Edge>) -> Result<Vec<String>, OrderError> {
    order_with(names, edges, Some(METADATA_COLLECTION))
}

/// Topological order of `names` under `edges`; `pinned_last`, if present
/// among `names`, is moved to the end.
///
/// Parents precede children. Among entities whose parents have all been
/// emitted, the lexicographically smallest goes first. Edges touching a
/// name outside `names` are ignored.
///
/// # Errors
///
/// [`OrderError::CyclicDependency`] listing the entities left over when the
/// ready set drains.
pub fn order_with<S: AsRef<str>>(
    names: &[S],
    edges: &BTreeSet<Edge>,
    pinned_last: Option<&str>,
) -> Result<Vec<String>, OrderError> {
    let mut in_degree: BTreeMap<&str, usize> =
        names.iter().map(|n| (n.as_ref(), 0)).collect();
    let mut children: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for (parent, child) in edges {
        if parent == child || !in_degree.contains_key(parent.as_str()) {
            continue;
        }
        let Some(degree) = in_degree.get_mut(child.as_str()) else {
            continue;
        };
        *degree += 1;
        children.entry(parent.as_str()).or_default().push(child.as_str());
    }

    let mut ready: BTreeSet<&str> = in_degree
        .iter()
        .filter(|(_, &d)| d == 0)
        .map(|(&n, _)| n)
        .collect();
    let mut sorted = Vec::with_capacity(in_degree.len());

    while let Some(next) = ready.pop_first() {
        sorted.push(next.to_string());
        for &child in children.get(next).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(child) {
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(child);
                }
            }
        }
    }

    if sorted.len() != in_degree.len() {
        let remaining = in_degree
            .iter()
            .filter(|(_, &d)| d > 0)
            .map(|(&n, _)| n.to_string())
            .collect();
        return Err(OrderError::CyclicDependency { remaining });
    }

    if let Some(pinned) = pinned_last {
        if let Some(pos) = sorted.iter().position(|n| n == pinned) {
            let entity = sorted.remove(pos);
            sorted.push(entity);
        }
    }
    Ok(sorted)
}

/// Dependency order of every entity in `bundle`.
pub fn order_bundle(bundle: &Bundle) -> Result<Vec<String>, OrderError> {
    order(&bundle.entity_names(), &dependency_edges(bundle))
}

/// One relationship in the exported edge list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    /// The declaring (child) entity.
    pub source: String,
    /// The targeted (parent) entity.
    pub target: String,
    /// Link name.
    pub name: String,
    /// Link multiplicity.
    pub multiplicity: Multiplicity,
    /// Short cardinality label: `1:1`, `1:N`, `N:1` or `N:N`.
    pub cardinality: &'static str,
}

/// Every declared link of every entity, in entity then link order.
///
/// Links with a missing or unknown multiplicity are skipped with a warning.
pub fn graph_edges(bundle: &Bundle) -> Vec<GraphEdge> {
    let mut out = Vec::new();
    for source in bundle.entity_names() {
        let Some(document) = bundle.entity(&source) else {
            continue;
        };
        for (name, target, multiplicity) in declared_links(document) {
            let Some(multiplicity) = multiplicity.and_then(|m| m.parse::<Multiplicity>().ok()) else {
                tracing::warn!(entity = %source, link = name, "skipping link without a valid multiplicity");
                continue;
            };
            out.push(GraphEdge {
                source: source.clone(),
                target: target.to_string(),
                name: name.to_string(),
                multiplicity,
                cardinality: multiplicity.cardinality(),
            });
        }
    }
    out
}

/// Render edges as CSV with a `source,target,name,multiplicity,cardinality`
/// header.
pub fn edges_to_csv(edges: &[GraphEdge]) -> String {
    let mut out = String::from("source,target,name,multiplicity,cardinality\n");
    for e in edges {
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            e.source, e.target, e.name, e.multiplicity, e.cardinality
        ));
    }
    out
}

/// Render edges as a pretty-printed JSON array.
pub fn edges_to_json(edges: &[GraphEdge]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn edge(parent: &str, child: &str) -> Edge {
        (parent.to_string(), child.to_string())
    }

    fn entity(id: &str, targets: &[(&str, &str)]) -> Value {
        let links: Vec<Value> = targets
            .iter()
            .map(|(t, m)| json!({"name": format!("{t}s"), "target_type": t, "multiplicity": m}))
            .collect();
        json!({"id": id, "links": links})
    }

    fn dictionary() -> Bundle {
        let mut b = Bundle::new();
        b.insert("_definitions.yaml", json!({}));
        b.insert("project.yaml", entity("project", &[]));
        b.insert("core_metadata_collection.yaml", entity("core_metadata_collection", &[("project", "many_to_one")]));
        b.insert("subject.yaml", entity("subject", &[("project", "many_to_one")]));
        b.insert("sample.yaml", entity("sample", &[("subject", "many_to_one")]));
        b.insert(
            "reads_file.yaml",
            json!({"id": "reads_file", "links": [{"exclusive": false, "required": true, "subgroup": [
                {"name": "samples", "target_type": "sample", "multiplicity": "one_to_many"},
                {"name": "core_metadata_collections", "target_type": "core_metadata_collection",
                 "multiplicity": "one_to_one"}
            ]}]}),
        );
        b
    }

    #[test]
    fn edges_flatten_groups_and_skip_shared_documents() {
        let edges = dependency_edges(&dictionary());
        assert!(edges.contains(&edge("sample", "reads_file")));
        assert!(edges.contains(&edge("core_metadata_collection", "reads_file")));
        assert_eq!(edges.len(), 5);
    }

    #[test]
    fn self_links_and_unknown_targets_are_dropped() {
        let mut b = Bundle::new();
        b.insert("node.yaml", entity("node", &[("node", "many_to_many"), ("ghost", "many_to_one")]));
        assert!(dependency_edges(&b).is_empty());
    }

    #[test]
    fn parents_come_first_and_metadata_collection_last() {
        let ordered = order_bundle(&dictionary()).unwrap();
        assert_eq!(
            ordered,
            ["project", "subject", "sample", "reads_file", "core_metadata_collection"]
        );
    }

    #[test]
    fn ties_break_by_name() {
        let names = ["c", "a", "b"];
        assert_eq!(order(&names, &BTreeSet::new()).unwrap(), ["a", "b", "c"]);
    }

    #[test]
    fn cycles_raise_with_leftovers() {
        let names = ["a", "b", "c", "root"];
        let edges = [edge("a", "b"), edge("b", "c"), edge("c", "a"), edge("root", "a")]
            .into_iter()
            .collect();
        assert_eq!(
            order(&names, &edges).unwrap_err(),
            OrderError::CyclicDependency {
                remaining: vec!["a".to_string(), "b".to_string(), "c".to_string()]
            }
        );
    }

    #[test]
    fn pinning_can_be_disabled() {
        let names = ["core_metadata_collection", "x"];
        let edges = [edge("x", "core_metadata_collection")].into_iter().collect();
        assert_eq!(
            order_with(&names, &edges, None).unwrap(),
            ["x", "core_metadata_collection"]
        );
        let edges = BTreeSet::new();
        assert_eq!(
            order_with(&names, &edges, None).unwrap(),
            ["core_metadata_collection", "x"]
        );
        assert_eq!(order(&names, &edges).unwrap(), ["x", "core_metadata_collection"]);
    }

    #[test]
    fn graph_edges_carry_cardinality() {
        let edges = graph_edges(&dictionary());
        let reads: Vec<&GraphEdge> = edges.iter().filter(|e| e.source == "reads_file").collect();
        assert_eq!(reads.len(), 2);
        assert_eq!(reads[0].target, "sample");
        assert_eq!(reads[0].cardinality, "1:N");
        assert_eq!(reads[1].cardinality, "1:1");
    }

    #[test]
    fn csv_has_header_and_one_row_per_edge() {
        let csv = edges_to_csv(&graph_edges(&dictionary()));
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "source,target,name,multiplicity,cardinality");
        assert_eq!(lines.len(), 6);
        assert!(lines.contains(&"sample,subject,subjects,many_to_one,N:1"));
    }

    #[test]
    fn json_export_is_an_array() {
        let text = edges_to_json(&graph_edges(&dictionary())).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 5);
        assert_eq!(parsed[0]["multiplicity"], "many_to_one");
    }

    // Random DAGs: edges only run from a lower index to a higher one.
    fn arb_dag() -> impl Strategy<Value = (Vec<String>, BTreeSet<Edge>)> {
        (2usize..12).prop_flat_map(|n| {
            let names: Vec<String> = (0..n).map(|i| format!("e{i:02}")).collect();
            let pairs = prop::collection::btree_set((0..n, 0..n), 0..(n * 2));
            (Just(names), pairs)
        })
        .prop_map(|(mut names, pairs)| {
            let edges = pairs
                .into_iter()
                .filter(|(a, b)| a < b)
                .map(|(a, b)| (names[a].clone(), names[b].clone()))
                .collect();
            names.push(METADATA_COLLECTION.to_string());
            (names, edges)
        })
    }

    proptest! {
        #[test]
        fn order_respects_every_edge((names, edges) in arb_dag()) {
            let ordered = order(&names, &edges).unwrap();
            prop_assert_eq!(ordered.len(), names.len());
            prop_assert_eq!(ordered.last().map(String::as_str), Some(METADATA_COLLECTION));
            let pos = |n: &str| ordered.iter().position(|o| o == n).unwrap();
            for (parent, child) in &edges {
                prop_assert!(pos(parent.as_str()) < pos(child.as_str()));
            }
        }
    }
}
