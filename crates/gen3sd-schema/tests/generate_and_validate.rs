//! Integration test: generate a dictionary from a model, write it to disk,
//! read it back, resolve it and validate every entity.

use std::path::{Path, PathBuf};

use gen3sd_core::{DataModel, METADATA_COLLECTION};
use gen3sd_schema::{
    bundle, contains_pointer, generate, graph_edges, load_bundle, resolve_bundle, split,
    validate_bundle, write_bundle, write_split, Bundle, DictionaryError, EntityFailure,
    MetaSchemaValidator, PipelineConfig, ResolverConfig, Rule, Template,
};
use serde_json::json;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn generated_dir() -> (tempfile::TempDir, Bundle) {
    let model = DataModel::load(&fixture("model.yaml")).expect("fixture model loads");
    let generated = generate(&model, &Template::builtin().unwrap()).expect("model generates");
    assert!(generated.diagnostics.is_empty(), "{:?}", generated.diagnostics);

    let dir = tempfile::tempdir().unwrap();
    let written: Bundle = generated.documents.into_iter().collect();
    write_split(&written, dir.path()).unwrap();
    let loaded = bundle(dir.path()).unwrap();
    (dir, loaded)
}

#[test]
fn generated_dictionary_is_valid() {
    let (_dir, dictionary) = generated_dir();
    let meta = MetaSchemaValidator::builtin().unwrap();
    let report = validate_bundle(&dictionary, &meta, &PipelineConfig::default()).unwrap();

    for entity in report.failures() {
        eprintln!("{}: {:?}", entity.name, entity.failure);
    }
    assert!(report.is_success(), "{report}");
    assert_eq!(report.total(), 6);
    assert_eq!(report.entities.last().unwrap().name, METADATA_COLLECTION);
}

#[test]
fn resolved_bundle_has_no_pointers_and_respects_links() {
    let (_dir, dictionary) = generated_dir();
    let resolved = resolve_bundle(&dictionary, &ResolverConfig::default()).unwrap();

    let order: Vec<&str> = resolved.entities.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(
        order,
        ["program", "project", "subject", "sample", "reads_file", METADATA_COLLECTION]
    );
    for entity in &resolved.entities {
        assert!(!contains_pointer(&entity.document), "{} kept a pointer", entity.name);
    }

    let reads = &resolved.entities[4].document;
    assert_eq!(reads["properties"]["samples"]["type"], "array");
    assert_eq!(
        reads["properties"]["core_metadata_collections"]["properties"]["id"]["type"],
        "string"
    );
    let sample = &resolved.entities[3].document;
    assert_eq!(sample["namespace"], "http://example.org");
    assert_eq!(
        sample["properties"]["collected_on"]["term"]["termDef"]["term_id"],
        "C37939"
    );
}

#[test]
fn resolving_twice_changes_nothing() {
    let (_dir, dictionary) = generated_dir();
    let once = resolve_bundle(&dictionary, &ResolverConfig::default()).unwrap();
    let twice = resolve_bundle(&once.to_bundle(), &ResolverConfig::default()).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn bundle_round_trips_through_one_file() {
    let (dir, dictionary) = generated_dir();
    let path = dir.path().join("bundle.json");
    write_bundle(&dictionary, &path).unwrap();
    assert_eq!(load_bundle(&path).unwrap(), dictionary);
    assert_eq!(split(dictionary.to_value()).unwrap(), dictionary);
}

#[test]
fn edge_export_covers_every_link() {
    let (_dir, dictionary) = generated_dir();
    let edges = graph_edges(&dictionary);
    assert_eq!(edges.len(), 6);
    assert!(edges
        .iter()
        .any(|e| e.source == "reads_file" && e.target == METADATA_COLLECTION && e.cardinality == "1:1"));
}

#[test]
fn hand_broken_entity_is_reported_without_stopping_others() {
    let (_dir, mut dictionary) = generated_dir();
    let mut sample = dictionary.get("sample.yaml").unwrap().clone();
    sample["properties"]["aliases"] = json!({"type": "array"});
    dictionary.insert("sample.yaml", sample);

    let meta = MetaSchemaValidator::builtin().unwrap();
    let report = validate_bundle(&dictionary, &meta, &PipelineConfig::default()).unwrap();
    assert_eq!(report.total(), 6);
    assert_eq!(report.failed(), 1);
    let failed = report.failures().next().unwrap();
    assert_eq!(failed.name, "sample");
    match &failed.failure {
        Some(EntityFailure::Rules(v)) => {
            assert_eq!(v.count(), 1);
            assert_eq!(v.first().rule, Rule::TypeArrayNeedsItems);
            assert_eq!(v.first().field, "aliases");
        }
        other => panic!("expected a rule failure, got {other:?}"),
    }
}

#[test]
fn missing_shared_definitions_break_every_entity_pointer() {
    let (_dir, dictionary) = generated_dir();
    let without: Bundle = dictionary
        .documents()
        .iter()
        .filter(|(name, _)| name.as_str() != "_definitions.yaml")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let err = resolve_bundle(&without, &ResolverConfig::default()).unwrap_err();
    assert!(matches!(err, DictionaryError::Resolve(_)), "{err}");
}
