//! # gen3sd-cli: Command Line for Gen3 Schema Dictionaries
//!
//! Provides the `gen3sd` binary. Each subcommand is a thin layer over
//! `gen3sd-schema`: it loads inputs, calls one library operation, prints a
//! human-readable outcome and maps it to an exit code.
//!
//! ## Subcommands
//!
//! - `gen3sd generate`: entity documents from a structured model.
//! - `gen3sd bundle` / `gen3sd split`: directory to single JSON file and back.
//! - `gen3sd resolve`: write the pointer-free bundle.
//! - `gen3sd graph`: export the entity link graph as CSV or JSON.
//! - `gen3sd validate`: meta-schema and rule validation of every entity.
//!
//! ```bash
//! gen3sd generate -i model.yaml -o dictionary/
//! gen3sd validate -y dictionary/
//! gen3sd bundle -i dictionary/ -f dictionary.json
//! gen3sd graph -b dictionary.json --format json
//! ```
//!
//! Handlers return `anyhow::Result<u8>`: `Ok(0)` on success, `Ok(1)` on a
//! reported failure. `main` turns any `Err` into exit code 1.

pub mod bundle;
pub mod generate;
pub mod graph;
pub mod resolve;
pub mod validate;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use gen3sd_schema::{bundle as bundle_dir, load_bundle, Bundle};

/// Where a command reads its dictionary from. At most one may be given.
#[derive(Args, Debug, Clone, Default)]
#[group(multiple = false)]
pub struct SourceArgs {
    /// Bundled dictionary: one JSON file mapping file names to documents.
    #[arg(short = 'b', long = "bundle", value_name = "BUNDLE_JSON")]
    pub bundled: Option<PathBuf>,

    /// Directory of entity YAML documents.
    #[arg(short = 'y', long = "yaml-dir", value_name = "DIR")]
    pub yaml_dir: Option<PathBuf>,
}

impl SourceArgs {
    /// Load the dictionary, or `None` when neither source was given.
    pub fn load(&self) -> Result<Option<Bundle>> {
        if let Some(path) = &self.bundled {
            let loaded = load_bundle(path)
                .with_context(|| format!("failed to load bundle {}", path.display()))?;
            return Ok(Some(loaded));
        }
        if let Some(dir) = &self.yaml_dir {
            let loaded =
                bundle_dir(dir).with_context(|| format!("failed to bundle {}", dir.display()))?;
            return Ok(Some(loaded));
        }
        Ok(None)
    }
}

/// Load `source`, or print `usage` and yield exit code 1.
pub(crate) fn load_or_usage(source: &SourceArgs, usage: &str) -> Result<Result<Bundle, u8>> {
    match source.load()? {
        Some(dictionary) => {
            tracing::info!(documents = dictionary.len(), "loaded dictionary");
            Ok(Ok(dictionary))
        }
        None => {
            println!("Usage: {usage}");
            Ok(Err(1))
        }
    }
}
