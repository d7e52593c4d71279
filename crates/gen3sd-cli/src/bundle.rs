//! # Bundle and Split Subcommands
//!
//! `bundle` collects a directory of entity documents into one JSON file
//! keyed by file name; `split` writes such a file back out as one document
//! per file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use gen3sd_schema::{bundle_with, load_bundle, write_bundle, write_split, BundleOptions};

/// Arguments for the `gen3sd bundle` subcommand.
#[derive(Args, Debug)]
pub struct BundleArgs {
    /// Directory of entity documents.
    #[arg(short, long, value_name = "DIR")]
    pub input: PathBuf,

    /// Bundled JSON file to write.
    #[arg(short = 'f', long = "file", value_name = "OUTPUT_JSON")]
    pub output: PathBuf,

    /// Also read `.json` documents from the directory.
    #[arg(long)]
    pub include_json: bool,
}

/// Arguments for the `gen3sd split` subcommand.
#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Bundled JSON file to read.
    #[arg(short = 'b', long = "bundle", value_name = "BUNDLE_JSON")]
    pub bundled: PathBuf,

    /// Directory the documents are written to.
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,
}

/// Execute the bundle subcommand.
pub fn run_bundle(args: &BundleArgs) -> Result<u8> {
    let options = BundleOptions {
        include_json: args.include_json,
    };
    let dictionary = bundle_with(&args.input, &options)
        .with_context(|| format!("failed to bundle {}", args.input.display()))?;
    write_bundle(&dictionary, &args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    println!(
        "Bundled {} documents into {}",
        dictionary.len(),
        args.output.display()
    );
    Ok(0)
}

/// Execute the split subcommand.
pub fn run_split(args: &SplitArgs) -> Result<u8> {
    let dictionary = load_bundle(&args.bundled)
        .with_context(|| format!("failed to load bundle {}", args.bundled.display()))?;
    write_split(&dictionary, &args.output)
        .with_context(|| format!("failed to write documents to {}", args.output.display()))?;
    println!(
        "Split {} documents into {}",
        dictionary.len(),
        args.output.display()
    );
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gen3sd_core::parser::load_document;
    use serde_json::json;

    #[test]
    fn bundle_then_split_restores_documents() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        std::fs::create_dir(&source).unwrap();
        std::fs::write(source.join("subject.yaml"), "id: subject\ncategory: clinical\n").unwrap();
        std::fs::write(source.join("_terms.yaml"), "UUID: {description: id}\n").unwrap();
        std::fs::write(source.join("notes.txt"), "ignored").unwrap();

        let file = dir.path().join("dictionary.json");
        let code = run_bundle(&BundleArgs {
            input: source,
            output: file.clone(),
            include_json: false,
        })
        .unwrap();
        assert_eq!(code, 0);
        let bundled = load_document(&file).unwrap();
        assert_eq!(bundled["subject.yaml"], json!({"id": "subject", "category": "clinical"}));
        assert!(bundled.get("notes.txt").is_none());

        let out = dir.path().join("out");
        run_split(&SplitArgs {
            bundled: file,
            output: out.clone(),
        })
        .unwrap();
        assert_eq!(
            load_document(&out.join("subject.yaml")).unwrap(),
            json!({"id": "subject", "category": "clinical"})
        );
        assert!(out.join("_terms.yaml").is_file());
    }

    #[test]
    fn json_documents_are_opt_in() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), r#"{"id": "a"}"#).unwrap();
        let args = BundleArgs {
            input: dir.path().to_path_buf(),
            output: dir.path().join("out.json"),
            include_json: false,
        };
        let err = run_bundle(&args).unwrap_err();
        assert!(err.to_string().starts_with("failed to bundle"));

        run_bundle(&BundleArgs {
            include_json: true,
            ..args
        })
        .unwrap();
        assert_eq!(load_document(&dir.path().join("out.json")).unwrap()["a.json"]["id"], "a");
    }

    #[test]
    fn split_rejects_non_mapping_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bad.json");
        std::fs::write(&file, "[1, 2]").unwrap();
        assert!(run_split(&SplitArgs {
            bundled: file,
            output: dir.path().join("out"),
        })
        .is_err());
    }
}
