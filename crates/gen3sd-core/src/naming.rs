//! Naming helpers for entity and link identifiers.

/// Pluralize an entity name the way link names and backrefs are spelled.
///
/// Only the ending is inspected: `study` -> `studies`, `batch` -> `batches`,
/// and irregular nouns come out regular (`analysis` -> `analysises`).
pub fn pluralize(name: &str) -> String {
    if let Some(stem) = name.strip_suffix('y') {
        let before = stem.chars().last();
        if before.is_some_and(|c| !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')) {
            return format!("{stem}ies");
        }
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|end| name.ends_with(end)) {
        return format!("{name}es");
    }
    format!("{name}s")
}

/// Whether `name` is lowercase snake_case: starts with a letter, then
/// lowercase letters, digits or single underscores.
pub fn is_snake_case(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_lowercase() {
        return false;
    }
    !name.ends_with('_')
        && !name.contains("__")
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pluralizes_regular_names() {
        assert_eq!(pluralize("sample"), "samples");
        assert_eq!(pluralize("lipidomics_file"), "lipidomics_files");
        assert_eq!(pluralize("core_metadata_collection"), "core_metadata_collections");
    }

    #[test]
    fn pluralizes_consonant_y() {
        assert_eq!(pluralize("study"), "studies");
        assert_eq!(pluralize("assay"), "assays");
    }

    #[test]
    fn pluralizes_sibilant_endings() {
        assert_eq!(pluralize("batch"), "batches");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("analysis"), "analysises");
    }

    #[test]
    fn snake_case_accepts_identifiers() {
        assert!(is_snake_case("sample"));
        assert!(is_snake_case("lipidomics_file"));
        assert!(is_snake_case("assay2"));
    }

    #[test]
    fn snake_case_rejects_other_shapes() {
        assert!(!is_snake_case(""));
        assert!(!is_snake_case("Sample"));
        assert!(!is_snake_case("_definitions"));
        assert!(!is_snake_case("two__underscores"));
        assert!(!is_snake_case("trailing_"));
        assert!(!is_snake_case("kebab-case"));
        assert!(!is_snake_case("1st"));
    }
}
