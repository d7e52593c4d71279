//! # gen3sd CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gen3sd_cli::bundle::{run_bundle, run_split, BundleArgs, SplitArgs};
use gen3sd_cli::generate::{run_generate, GenerateArgs};
use gen3sd_cli::graph::{run_graph, GraphArgs};
use gen3sd_cli::resolve::{run_resolve, ResolveArgs};
use gen3sd_cli::validate::{run_validate, ValidateArgs};

/// Gen3 schema dictionary toolchain.
///
/// Generates entity documents from a structured model, bundles and splits
/// dictionaries, resolves `$ref` pointers, exports the link graph and
/// validates every entity against the meta-schema and the domain rules.
#[derive(Parser, Debug)]
#[command(name = "gen3sd", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build entity documents from a structured model.
    Generate(GenerateArgs),

    /// Collect a directory of documents into one JSON file.
    Bundle(BundleArgs),

    /// Write a bundled JSON file back out as one document per file.
    Split(SplitArgs),

    /// Write the dictionary with every pointer resolved.
    Resolve(ResolveArgs),

    /// Export entity links as CSV or JSON.
    Graph(GraphArgs),

    /// Validate every entity against the meta-schema and the rules.
    Validate(ValidateArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG takes precedence over -v.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "gen3sd starting");

    let result = match cli.command {
        Commands::Generate(args) => run_generate(&args),
        Commands::Bundle(args) => run_bundle(&args),
        Commands::Split(args) => run_split(&args),
        Commands::Resolve(args) => run_resolve(&args),
        Commands::Graph(args) => run_graph(&args),
        Commands::Validate(args) => run_validate(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
