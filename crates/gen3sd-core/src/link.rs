//! # Links and Link Groups
//!
//! A [`Link`] points from the entity that declares it (the child) to a
//! parent entity named by `target_type`. A [`LinkGroup`] bundles alternative
//! links under shared `exclusive`/`required` flags.
//!
//! An entity's `links` field is either a flat sequence of links, or a
//! single-element sequence holding one group. [`LinkEntry`] models one
//! element of that sequence.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Cardinality of a link, read as `<child side>_to_<parent side>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Multiplicity {
    /// One child to one parent.
    OneToOne,
    /// One child to many parents.
    OneToMany,
    /// Many children to one parent.
    ManyToOne,
    /// Many children to many parents.
    ManyToMany,
}

impl Multiplicity {
    /// All multiplicities.
    pub fn all() -> &'static [Multiplicity] {
        &[
            Self::OneToOne,
            Self::OneToMany,
            Self::ManyToOne,
            Self::ManyToMany,
        ]
    }

    /// The raw string used in entity documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneToOne => "one_to_one",
            Self::OneToMany => "one_to_many",
            Self::ManyToOne => "many_to_one",
            Self::ManyToMany => "many_to_many",
        }
    }

    /// Whether the second half of the multiplicity is "many".
    ///
    /// Decides whether the link property is encoded as `to_many` or `to_one`.
    pub fn is_to_many(&self) -> bool {
        matches!(self, Self::OneToMany | Self::ManyToMany)
    }

    /// Short cardinality label for graph exports: `1:1`, `1:N`, `N:1`, `N:N`.
    pub fn cardinality(&self) -> &'static str {
        match self {
            Self::OneToOne => "1:1",
            Self::OneToMany => "1:N",
            Self::ManyToOne => "N:1",
            Self::ManyToMany => "N:N",
        }
    }
}

impl std::fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Multiplicity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown multiplicity \"{s}\""))
    }
}

/// A directed relationship from the declaring entity to a parent entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Property key encoding this link; conventionally the pluralized parent name.
    pub name: String,
    /// Pluralized child name, used on the parent side.
    pub backref: String,
    /// Human-readable label.
    pub label: String,
    /// The parent entity.
    pub target_type: String,
    /// Cardinality.
    pub multiplicity: Multiplicity,
    /// Whether instances must populate this link.
    pub required: bool,
}

/// Mutually related links sharing exclusivity and requiredness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkGroup {
    /// At most one member may be populated on an instance.
    pub exclusive: bool,
    /// At least one member must be populated on an instance.
    pub required: bool,
    /// Member links, in display order.
    pub subgroup: Vec<Link>,
}

/// One element of an entity document's `links` sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkEntry {
    /// A link group.
    Group(LinkGroup),
    /// A standalone link.
    Single(Link),
}

impl LinkEntry {
    /// Iterate the links this entry contributes, descending into groups.
    pub fn links(&self) -> Box<dyn Iterator<Item = &Link> + '_> {
        match self {
            Self::Group(g) => Box::new(g.subgroup.iter()),
            Self::Single(l) => Box::new(std::iter::once(l)),
        }
    }
}

/// Wrap links the way the builder emits them: more than one link becomes a
/// single non-exclusive, required group; otherwise the flat list stays as is.
pub fn group_links(links: Vec<Link>) -> Vec<LinkEntry> {
    if links.len() > 1 {
        vec![LinkEntry::Group(LinkGroup {
            exclusive: false,
            required: true,
            subgroup: links,
        })]
    } else {
        links.into_iter().map(LinkEntry::Single).collect()
    }
}

/// Flatten a raw `links` value into the link mappings it contains.
///
/// Tolerates malformed input: non-mapping elements are skipped and any
/// element with a `subgroup` sequence is descended into, recursively.
pub fn flatten_raw_links(links: &Value) -> Vec<&Map<String, Value>> {
    let mut out = Vec::new();
    if let Some(items) = links.as_array() {
        for item in items {
            collect_raw_link(item, &mut out);
        }
    }
    out
}

fn collect_raw_link<'a>(item: &'a Value, acc: &mut Vec<&'a Map<String, Value>>) {
    let Some(map) = item.as_object() else {
        return;
    };
    match map.get("subgroup").and_then(Value::as_array) {
        Some(members) => {
            for member in members {
                collect_raw_link(member, acc);
            }
        }
        None => acc.push(map),
    }
}
