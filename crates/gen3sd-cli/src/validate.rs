//! # Validate Subcommand
//!
//! Resolves the dictionary and checks every entity against the meta-schema,
//! then against the domain rules. Prints one `OK`/`FAIL` line per entity in
//! dependency order followed by a summary.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use gen3sd_schema::{
    validate_bundle, EntityFailure, EntityReport, FailurePolicy, MetaSchemaValidator,
    PipelineConfig, ResolverConfig, ValidationReport,
};

use crate::{load_or_usage, SourceArgs};

/// Arguments for the `gen3sd validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Meta-schema to validate against instead of the embedded one.
    #[arg(long, value_name = "PATH")]
    pub metaschema: Option<PathBuf>,

    /// Stop at the first failing entity.
    #[arg(long)]
    pub fail_fast: bool,

    /// Only run the meta-schema check.
    #[arg(long)]
    pub skip_rules: bool,

    /// Maximum pointer nesting before resolution gives up.
    #[arg(long, default_value_t = ResolverConfig::default().max_depth)]
    pub max_depth: usize,
}

impl ValidateArgs {
    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            run_rules: !self.skip_rules,
            policy: if self.fail_fast {
                FailurePolicy::FailFast
            } else {
                FailurePolicy::CollectAll
            },
            resolver: ResolverConfig {
                max_depth: self.max_depth,
            },
            ..PipelineConfig::default()
        }
    }
}

fn load_metaschema(path: Option<&Path>) -> Result<MetaSchemaValidator> {
    match path {
        Some(path) => MetaSchemaValidator::from_path(path)
            .with_context(|| format!("failed to load meta-schema {}", path.display())),
        None => MetaSchemaValidator::builtin().context("failed to compile embedded meta-schema"),
    }
}

/// One line per entity; a rule failure adds an indented line for each
/// further violation.
fn render(entity: &EntityReport) -> String {
    match &entity.failure {
        None => format!("OK: {}", entity.name),
        Some(EntityFailure::Rules(violations)) => {
            let mut lines = violations.iter().map(ToString::to_string);
            let mut text = format!(
                "FAIL: {} ({}): {}",
                entity.name,
                entity.file,
                lines.next().unwrap_or_default()
            );
            for line in lines {
                text.push_str("\n      ");
                text.push_str(&line);
            }
            text
        }
        Some(failure) => format!("FAIL: {} ({}): {failure}", entity.name, entity.file),
    }
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 when every entity passed, 1 on any failure or when
/// no source was given.
pub fn run_validate(args: &ValidateArgs) -> Result<u8> {
    let dictionary = match load_or_usage(
        &args.source,
        "gen3sd validate [-b <bundle.json> | -y <dir>] [--metaschema <path>] [--fail-fast] [--skip-rules]",
    )? {
        Ok(d) => d,
        Err(code) => return Ok(code),
    };

    let meta = load_metaschema(args.metaschema.as_deref())?;
    let report = validate_bundle(&dictionary, &meta, &args.pipeline_config())
        .context("failed to validate dictionary")?;

    print_report(&report);
    Ok(if report.is_success() { 0 } else { 1 })
}

fn print_report(report: &ValidationReport) {
    for entity in &report.entities {
        println!("{}", render(entity));
    }
    println!();
    println!("{report}");
}
