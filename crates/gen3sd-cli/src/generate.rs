//! # Generate Subcommand
//!
//! Builds raw entity documents from a structured data model and writes them,
//! with the shipped auxiliary documents, as YAML into an output directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use gen3sd_core::parser::load_document;
use gen3sd_core::DataModel;
use gen3sd_schema::{generate, write_split, Bundle, Template};

/// Arguments for the `gen3sd generate` subcommand.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Structured model (YAML or JSON).
    #[arg(short, long, value_name = "MODEL")]
    pub input: PathBuf,

    /// Directory the entity documents are written to.
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    /// Take template defaults from this meta-schema instead of the embedded one.
    #[arg(long, value_name = "PATH")]
    pub metaschema: Option<PathBuf>,
}

fn load_template(metaschema: Option<&Path>) -> Result<Template> {
    match metaschema {
        Some(path) => {
            let meta = load_document(path)
                .with_context(|| format!("failed to load meta-schema {}", path.display()))?;
            Template::from_metaschema(&meta).context("meta-schema does not yield a template")
        }
        None => Template::builtin().context("embedded meta-schema does not yield a template"),
    }
}

/// Execute the generate subcommand.
///
/// Returns exit code 0; model and I/O problems are errors.
pub fn run_generate(args: &GenerateArgs) -> Result<u8> {
    let model = DataModel::load(&args.input)
        .with_context(|| format!("failed to load model {}", args.input.display()))?;
    tracing::info!(entities = model.entities.len(), links = model.links.len(), "loaded model");

    let template = load_template(args.metaschema.as_deref())?;
    let generated = generate(&model, &template).context("failed to generate entity documents")?;

    for diagnostic in &generated.diagnostics {
        println!("WARN: {diagnostic}");
    }

    let documents: Bundle = generated.documents.into_iter().collect();
    write_split(&documents, &args.output)
        .with_context(|| format!("failed to write documents to {}", args.output.display()))?;

    println!(
        "Generated {} documents in {}",
        documents.len(),
        args.output.display()
    );
    Ok(0)
}
