//! Command-line front end for structmap.
//!
//! Runs every configured generation job against a project root and exits
//! non-zero when any job fails.
//!
//! # Usage
//!
//! ```bash
//! # Generate the built-in repository and service converters
//! structmap -C path/to/hex-microservice
//!
//! # Print generated code instead of writing it
//! structmap --dry-run -c structmap.toml
//!
//! # Show the effective configuration
//! structmap --print-config
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG` (optional): tracing filter, overrides `-v`

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use structmap::config::Config;
use structmap::emit::EmitMode;
use structmap::generator::Generator;

/// Generate struct-to-struct conversion functions for Go packages.
#[derive(Parser)]
#[command(name = "structmap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Print generated code to stdout instead of writing files
    #[arg(long)]
    dry_run: bool,

    /// Configuration file (.json or .toml); built-in jobs when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Project root that job paths are relative to
    #[arg(short = 'C', long, default_value = ".")]
    root: PathBuf,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<bool> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if cli.print_config {
        println!("{}", config.to_json()?);
        return Ok(true);
    }

    config.validate()?;

    let registry = config.registry();
    let generator =
        Generator::new(&cli.root, &registry).context("failed to initialize Go parser")?;
    let mode = if cli.dry_run {
        EmitMode::DryRun
    } else {
        EmitMode::Write
    };

    info!(
        "Running {} job(s) in {}",
        config.jobs.len(),
        cli.root.display()
    );
    let report = generator.run(&config.jobs, mode);

    let mut stdout = std::io::stdout().lock();
    for text in report.rendered() {
        stdout
            .write_all(text.as_bytes())
            .context("failed to write to stdout")?;
    }

    if report.has_failures() {
        let names: Vec<&str> = report.failures().map(|(o, _)| o.name.as_str()).collect();
        error!("{} job(s) failed: {}", names.len(), names.join(", "));
        return Ok(false);
    }
    Ok(true)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
