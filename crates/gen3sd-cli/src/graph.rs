//! # Graph Subcommand
//!
//! Exports every declared entity link as an edge list, for visualization
//! tools or review.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use gen3sd_schema::{edges_to_csv, edges_to_json, graph_edges};

use crate::{load_or_usage, SourceArgs};

/// Edge list encoding.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GraphFormat {
    /// `source,target,name,multiplicity,cardinality` rows.
    #[default]
    Csv,
    /// Pretty-printed JSON array.
    Json,
}

/// Arguments for the `gen3sd graph` subcommand.
#[derive(Args, Debug)]
pub struct GraphArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output encoding.
    #[arg(long, value_enum, default_value_t = GraphFormat::Csv)]
    pub format: GraphFormat,

    /// Write to this file instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Execute the graph subcommand.
pub fn run_graph(args: &GraphArgs) -> Result<u8> {
    let dictionary = match load_or_usage(
        &args.source,
        "gen3sd graph [-b <bundle.json> | -y <dir>] [--format csv|json] [-o <file>]",
    )? {
        Ok(d) => d,
        Err(code) => return Ok(code),
    };

    let edges = graph_edges(&dictionary);
    tracing::info!(edges = edges.len(), "collected link edges");

    let mut text = match args.format {
        GraphFormat::Csv => edges_to_csv(&edges),
        GraphFormat::Json => edges_to_json(&edges).context("failed to encode edges as JSON")?,
    };
    if !text.ends_with('\n') {
        text.push('\n');
    }

    match &args.output {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{text}"),
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn dictionary(dir: &std::path::Path) -> SourceArgs {
        std::fs::write(dir.join("subject.yaml"), "id: subject\nlinks: []\n").unwrap();
        std::fs::write(
            dir.join("sample.yaml"),
            "id: sample\nlinks:\n  - {name: subjects, target_type: subject, multiplicity: many_to_one}\n",
        )
        .unwrap();
        SourceArgs {
            yaml_dir: Some(dir.to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn writes_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("edges.csv");
        let code = run_graph(&GraphArgs {
            source: dictionary(dir.path()),
            format: GraphFormat::Csv,
            output: Some(out.clone()),
        })
        .unwrap();
        assert_eq!(code, 0);
        assert_eq!(
            std::fs::read_to_string(out).unwrap(),
            "source,target,name,multiplicity,cardinality\nsample,subject,subjects,many_to_one,N:1\n"
        );
    }

    #[test]
    fn writes_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("edges.json");
        run_graph(&GraphArgs {
            source: dictionary(dir.path()),
            format: GraphFormat::Json,
            output: Some(out.clone()),
        })
        .unwrap();
        let edges: Value = serde_json::from_str(&std::fs::read_to_string(out).unwrap()).unwrap();
        assert_eq!(edges[0]["source"], "sample");
        assert_eq!(edges[0]["cardinality"], "N:1");
    }
}
