//! InfraBench - verification of generated multi-domain infrastructure
//!
//! ## Commands
//!
//! - `validate`: score a generated results tree against a scenario
//! - `order`: print the domain execution order of a scenario
//! - `refs`: resolve every cross-domain reference against an output manifest

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use infrabench_core::render::{render as render_report, write_report, ReportFormat};
use infrabench_core::{
    dependencies_of, scenario_order, validate_refs, OutputManifest, ScenarioModel, Validator,
    ValidatorConfig,
};

#[derive(Parser)]
#[command(name = "infrabench")]
#[command(author = "Stevedores Org")]
#[command(version = infrabench_core::VERSION)]
#[command(about = "Verification engine for generated infrastructure", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true, env = "INFRABENCH_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a generated results tree against a scenario
    Validate {
        /// Scenario document (YAML)
        scenario: PathBuf,

        /// Root of the generated files
        results: PathBuf,

        /// Directory of expected templates for structural comparison
        #[arg(long, env = "INFRABENCH_EXPECTED_DIR")]
        expected: Option<PathBuf>,

        /// Output manifest for exact cross-domain reference resolution
        #[arg(long, env = "INFRABENCH_MANIFEST")]
        manifest: Option<PathBuf>,

        /// Report format: text, markdown or json
        #[arg(short, long, default_value = "text")]
        format: ReportFormat,

        /// Write the report to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print nothing; the exit code carries the verdict
        #[arg(short, long)]
        quiet: bool,

        /// Bound on file-system walks, in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Print the order in which a scenario's domains run
    Order {
        /// Scenario document (YAML)
        scenario: PathBuf,
    },

    /// Resolve every required reference against an output manifest
    Refs {
        /// Scenario document (YAML)
        scenario: PathBuf,

        /// Output manifest (JSON or YAML)
        #[arg(long, env = "INFRABENCH_MANIFEST")]
        manifest: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    infrabench_core::init_tracing(cli.log_json, level);

    let outcome = match cli.command {
        Commands::Validate {
            scenario,
            results,
            expected,
            manifest,
            format,
            output,
            quiet,
            timeout_secs,
        } => cmd_validate(ValidateArgs {
            scenario: &scenario,
            results: &results,
            expected,
            manifest,
            format,
            output: output.as_deref(),
            quiet,
            timeout: timeout_secs.map(Duration::from_secs),
        }),
        Commands::Order { scenario } => cmd_order(&scenario),
        Commands::Refs { scenario, manifest } => cmd_refs(&scenario, &manifest),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Load a scenario; loading also rejects structurally invalid documents.
fn load_scenario(path: &Path) -> Result<ScenarioModel> {
    ScenarioModel::load(path)
        .with_context(|| format!("Failed to load scenario {}", path.display()))
}

struct ValidateArgs<'a> {
    scenario: &'a Path,
    results: &'a Path,
    expected: Option<PathBuf>,
    manifest: Option<PathBuf>,
    format: ReportFormat,
    output: Option<&'a Path>,
    quiet: bool,
    timeout: Option<Duration>,
}

fn build_config(args: &ValidateArgs<'_>) -> ValidatorConfig {
    let mut config = ValidatorConfig::new(args.results);
    if let Some(dir) = &args.expected {
        config = config.with_expected_dir(dir);
    }
    if let Some(path) = &args.manifest {
        config = config.with_manifest(path);
    }
    if let Some(timeout) = args.timeout {
        config = config.with_walk_timeout(timeout);
    }
    config
}

fn cmd_validate(args: ValidateArgs<'_>) -> Result<bool> {
    let scenario = load_scenario(args.scenario)?;
    if !args.results.is_dir() {
        anyhow::bail!("Results directory not found: {}", args.results.display());
    }

    let report = Validator::new(build_config(&args))
        .validate(&scenario)
        .context("Validation failed")?;
    info!(
        scenario = %report.scenario,
        score = report.score,
        passed = report.passed,
        "validation complete"
    );

    if let Some(path) = args.output {
        write_report(path, &report, args.format)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        if !args.quiet {
            println!("Report written to {}", path.display());
        }
    } else if !args.quiet {
        print!(
            "{}",
            render_report(&report, args.format).context("Failed to render report")?
        );
        if args.format == ReportFormat::Json {
            println!();
        }
    }

    Ok(report.passed)
}

fn cmd_order(scenario_path: &Path) -> Result<bool> {
    let scenario = load_scenario(scenario_path)?;
    let order = scenario_order(&scenario).context("Failed to resolve domain order")?;

    for (i, name) in order.iter().enumerate() {
        let deps = dependencies_of(&scenario, name);
        if deps.is_empty() {
            println!("{}. {}", i + 1, name);
        } else {
            println!("{}. {} (after {})", i + 1, name, deps.join(", "));
        }
    }
    Ok(true)
}

fn cmd_refs(scenario_path: &Path, manifest_path: &Path) -> Result<bool> {
    let scenario = load_scenario(scenario_path)?;
    let manifest = OutputManifest::open(manifest_path)
        .with_context(|| format!("Failed to load manifest {}", manifest_path.display()))?;

    let total: usize = scenario
        .cross_domain
        .iter()
        .map(|rel| rel.required_refs().len())
        .sum();
    let errors = validate_refs(&manifest, &scenario);

    if errors.is_empty() {
        println!("✓ All {} references resolved", total);
        return Ok(true);
    }
    for e in &errors {
        println!("✗ {}", e);
    }
    println!("{} of {} references failed to resolve", errors.len(), total);
    Ok(false)
}
