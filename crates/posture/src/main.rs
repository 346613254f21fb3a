use std::io;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Result;
use clap::builder::{PossibleValue, PossibleValuesParser};
use clap::{CommandFactory, FromArgMatches, Parser};
use tracing_subscriber::EnvFilter;

use posture_core::config::Config;
use posture_core::dispatch::{Dispatcher, Outcome, Request};
use posture_core::error::PostureError;
use posture_core::registry::Registry;

mod commands;

#[derive(Parser)]
#[command(name = "posture")]
#[command(about = "Summaries, POA&M ledgers, and status reports from OSCAL documents and Nessus scans")]
#[command(version)]
struct Cli {
    /// OSCAL JSON document (or the scan file for `ports`)
    file_path: PathBuf,
    /// Operation to run
    command: String,
    /// Verbose logging and full error chains
    #[arg(long)]
    debug: bool,
    /// Nessus scan file, required by generate-poam and monthly-report
    #[arg(long)]
    scan: Option<PathBuf>,
    /// Config file path (defaults to .posture.toml in the working directory or an ancestor)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Trend series JSON for monthly-report
    #[arg(long)]
    trends: Option<PathBuf>,
}

fn main() {
    let registry = commands::build_registry();
    let cli = parse_cli(&registry);
    init_tracing(cli.debug);

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    };
    if let Some(trends) = cli.trends {
        config.report.trends = Some(trends);
    }

    let dispatcher = Dispatcher::new(registry, config).verbose(cli.debug);
    let request = Request {
        operation: cli.command,
        primary: cli.file_path,
        scan: cli.scan,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match dispatcher.run(&request, &mut out) {
        Ok(Outcome::Completed) => {}
        Ok(outcome @ Outcome::NotApplicable { .. }) => eprintln!("{outcome}"),
        Err(e) => {
            report_error(&e, cli.debug);
            process::exit(1);
        }
    }
}

/// Parse arguments with the command restricted to registered names, so an
/// unknown name is rejected by clap before anything is read.
fn parse_cli(registry: &Registry) -> Cli {
    let values: Vec<PossibleValue> = registry
        .iter()
        .map(|(name, binding)| PossibleValue::new(name.to_string()).help(binding.about))
        .collect();
    let matches = Cli::command()
        .mut_arg("command", |arg| {
            arg.value_parser(PossibleValuesParser::new(values))
        })
        .get_matches();
    Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(p) => Config::load(p),
        None => {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            Ok(Config::load_or_default(&cwd))
        }
    }
}

fn report_error(err: &PostureError, debug: bool) {
    match err {
        PostureError::Handler { operation, .. } if !debug => {
            eprintln!(
                "Error: command '{operation}' failed. Re-run with --debug for details."
            );
        }
        _ => eprintln!("Error: {err}"),
    }
}
