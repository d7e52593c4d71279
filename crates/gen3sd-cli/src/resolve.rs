//! # Resolve Subcommand
//!
//! Writes the dictionary with every `$ref` pointer replaced, as one bundled
//! JSON file: resolved shared documents plus each entity in dependency order.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use gen3sd_schema::{resolve_bundle, write_bundle, ResolverConfig};

use crate::{load_or_usage, SourceArgs};

/// Arguments for the `gen3sd resolve` subcommand.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Resolved bundle to write.
    #[arg(short, long, value_name = "OUTPUT_JSON")]
    pub output: PathBuf,

    /// Maximum pointer nesting before resolution gives up.
    #[arg(long, default_value_t = ResolverConfig::default().max_depth)]
    pub max_depth: usize,
}

/// Execute the resolve subcommand.
///
/// Returns exit code 1 when no source was given.
pub fn run_resolve(args: &ResolveArgs) -> Result<u8> {
    let dictionary = match load_or_usage(
        &args.source,
        "gen3sd resolve [-b <bundle.json> | -y <dir>] -o <out.json>",
    )? {
        Ok(d) => d,
        Err(code) => return Ok(code),
    };

    let config = ResolverConfig {
        max_depth: args.max_depth,
    };
    let resolved = resolve_bundle(&dictionary, &config).context("failed to resolve dictionary")?;
    write_bundle(&resolved.to_bundle(), &args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    println!(
        "Resolved {} entities into {}",
        resolved.entities.len(),
        args.output.display()
    );
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gen3sd_core::parser::load_document;
    use serde_json::json;

    fn write_dictionary(dir: &std::path::Path) {
        std::fs::write(
            dir.join("_definitions.yaml"),
            "UUID: {type: string}\nto_one: {type: object, properties: {id: {$ref: '#/UUID'}}}\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("sample.yaml"),
            "id: sample\nproperties:\n  subjects: {$ref: '_definitions.yaml#/to_one', description: parent}\n",
        )
        .unwrap();
    }

    #[test]
    fn writes_pointer_free_bundle() {
        let dir = tempfile::tempdir().unwrap();
        write_dictionary(dir.path());
        let out = dir.path().join("resolved.json");

        let code = run_resolve(&ResolveArgs {
            source: SourceArgs {
                yaml_dir: Some(dir.path().to_path_buf()),
                ..Default::default()
            },
            output: out.clone(),
            max_depth: 64,
        })
        .unwrap();
        assert_eq!(code, 0);

        let resolved = load_document(&out).unwrap();
        assert_eq!(
            resolved["sample.yaml"]["properties"]["subjects"],
            json!({
                "type": "object",
                "properties": {"id": {"type": "string"}},
                "description": "parent"
            })
        );
        assert_eq!(resolved["_definitions.yaml"]["to_one"]["properties"]["id"]["type"], "string");
    }

    #[test]
    fn no_source_is_exit_code_one() {
        let dir = tempfile::tempdir().unwrap();
        let code = run_resolve(&ResolveArgs {
            source: SourceArgs::default(),
            output: dir.path().join("out.json"),
            max_depth: 64,
        })
        .unwrap();
        assert_eq!(code, 1);
    }

    #[test]
    fn broken_pointer_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("sample.yaml"),
            "id: sample\nproperties:\n  x: {$ref: '_definitions.yaml#/nothing'}\n",
        )
        .unwrap();
        let err = run_resolve(&ResolveArgs {
            source: SourceArgs {
                yaml_dir: Some(dir.path().to_path_buf()),
                ..Default::default()
            },
            output: dir.path().join("out.json"),
            max_depth: 64,
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "failed to resolve dictionary");
    }
}
