//! # Entity Categories
//!
//! Defines the [`Category`] enum: the fixed set of categories a Gen3 entity
//! may belong to. The meta-schema carries the same list as an `enum`, and
//! the rule validator keys the data-file checks off [`Category::DataFile`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The category of an entity document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Programs, projects and the metadata-collection entity.
    Administrative,
    /// Analysis workflows and their outputs.
    Analysis,
    /// Samples, aliquots and other physical material.
    Biospecimen,
    /// Subjects, demographics, diagnoses.
    Clinical,
    /// Submitted data files. Must link to the metadata collection.
    DataFile,
    /// Assays, protocols, instruments.
    ExperimentalMethods,
    /// Index files accompanying data files.
    IndexFile,
    /// Metadata files (manifests, sample sheets).
    MetadataFile,
    /// Free-form annotation entities.
    Notation,
    /// Studies, publications, acknowledgements.
    StudyAdministration,
}

impl Category {
    /// Return all categories in declaration order.
    pub fn all() -> &'static [Category] {
        &[
            Self::Administrative,
            Self::Analysis,
            Self::Biospecimen,
            Self::Clinical,
            Self::DataFile,
            Self::ExperimentalMethods,
            Self::IndexFile,
            Self::MetadataFile,
            Self::Notation,
            Self::StudyAdministration,
        ]
    }

    /// The number of categories.
    pub const COUNT: usize = 10;

    /// The raw string stored in an entity document's `category` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Administrative => "administrative",
            Self::Analysis => "analysis",
            Self::Biospecimen => "biospecimen",
            Self::Clinical => "clinical",
            Self::DataFile => "data_file",
            Self::ExperimentalMethods => "experimental_methods",
            Self::IndexFile => "index_file",
            Self::MetadataFile => "metadata_file",
            Self::Notation => "notation",
            Self::StudyAdministration => "study_administration",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::all().iter().map(|c| c.as_str()).collect();
                format!("unknown category \"{s}\" (expected one of: {})", allowed.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_has_count_entries() {
        assert_eq!(Category::all().len(), Category::COUNT);
    }

    #[test]
    fn display_matches_serde() {
        for c in Category::all() {
            let json = serde_json::to_value(c).unwrap();
            assert_eq!(json.as_str().unwrap(), c.to_string());
        }
    }

    #[test]
    fn from_str_round_trips() {
        for c in Category::all() {
            assert_eq!(c.as_str().parse::<Category>().unwrap(), *c);
        }
    }

    #[test]
    fn from_str_rejects_unknown() {
        let err = "datafile".parse::<Category>().unwrap_err();
        assert!(err.contains("datafile"));
        assert!(err.contains("data_file"));
    }
}
