//! grid-runner - Remote Browser Grid Test Runner
//!
//! A CLI tool that runs a local Cypress-style end-to-end suite on a
//! remote browser grid: one remote session per spec file, polled to a
//! verdict under a bounded concurrency cap.
//!
//! ## Features
//!
//! - Bounded parallel session dispatch with per-spec poll loops
//! - Suite packaging and upload to the grid control plane
//! - Per-session report collection merged into one consolidated report
//! - Multiple output formats (Table, JSON, CSV)
//!
//! ## Usage
//!
//! ```bash
//! # Run the whole suite with 4 parallel runners
//! grid-runner run --org my-org --parallel 4
//!
//! # List the spec files a run would submit
//! grid-runner list
//!
//! # Inspect the merged report of the last run
//! grid-runner results
//!
//! # Create a starter configuration file
//! grid-runner config init
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};

mod cli;
mod client;
mod config;
mod models;
mod output;
mod report;
mod runner;
mod suite;
mod utils;

use cli::Args;
use client::{HttpSessionClient, UploadClient};
use config::{ConfigFile, EnvConfig, RunSettings};
use output::{OutputFormat, SummaryFormatter};
use report::{ReportAggregator, ReportStore};
use runner::{Dispatcher, DispatcherConfig, PollConfig, ResultCollector, RunRequest};
use suite::{SpecDiscovery, SuiteArchiver};
use utils::{init_logger, LogLevel};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logger(if args.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    });

    match args.command {
        cli::Command::Run(run_args) => {
            run_suite(run_args).await?;
        }
        cli::Command::List(list_args) => {
            list_specs(list_args)?;
        }
        cli::Command::Results(results_args) => {
            show_results(results_args)?;
        }
        cli::Command::Config(config_args) => {
            manage_config(config_args)?;
        }
    }

    Ok(())
}

/// Load the config file and layer environment overrides on top
fn load_settings(config_path: Option<&str>, env: &EnvConfig) -> Result<RunSettings> {
    let file = match config_path.or(env.config_file.as_deref()) {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::load_default()?,
    };

    let mut settings = RunSettings::from_file(file);
    settings.apply_env(env);
    Ok(settings)
}

async fn run_suite(args: cli::RunArgs) -> Result<()> {
    let env = EnvConfig::load();
    let mut settings = load_settings(args.config.as_deref(), &env)?;

    // CLI flags win over environment and file settings
    if let Some(org) = args.org {
        settings.org = Some(org);
    }
    if let Some(path) = args.path {
        settings.suite_path = path;
    }
    if let Some(specs) = args.specs {
        settings.specs_dir = specs;
    }
    if let Some(parallel) = args.parallel {
        settings.parallel = parallel;
    }
    if let Some(timeout) = args.timeout {
        settings.timeout_secs = timeout;
    }
    if let Some(dir) = args.reports_dir {
        settings.reports_dir = Some(dir);
    }
    if !args.dependencies.is_empty() {
        settings.dependencies = args.dependencies;
    }

    let org = settings
        .org
        .clone()
        .context("No org specified, please check your config and try again")?;

    let archiver = SuiteArchiver::new(&settings.suite_path);

    info!("Looking for spec files...");
    let discovery = SpecDiscovery::new(archiver.suite_dir(), &settings.specs_dir);
    let specs = discovery.discover()?;
    if specs.is_empty() {
        anyhow::bail!(
            "Unable to find any spec files in {}",
            discovery.spec_root().display()
        );
    }
    info!("Found {} spec files", specs.len());

    info!("Bundling suite...");
    let archive = archiver.archive()?;

    info!("Uploading suite to the grid...");
    let uploader = UploadClient::new(settings.endpoints.upload_url())?;
    let suite_url = uploader.upload(&org, archive.path()).await?;

    let service = Arc::new(HttpSessionClient::new(
        &settings.endpoints,
        &org,
        settings.timeout_secs,
    )?);
    let collector = Arc::new(ResultCollector::new());
    let reports = Arc::new(match &settings.reports_dir {
        Some(dir) => ReportStore::new(dir),
        None => ReportStore::default_dir()?,
    });

    let dispatcher = Dispatcher::new(
        service,
        collector,
        reports.clone(),
        DispatcherConfig {
            concurrency: settings.parallel,
            poll: PollConfig::default(),
            show_progress: true,
        },
    );

    let run = RunRequest {
        suite_url,
        org,
        dependencies: settings.dependencies.clone(),
    };
    let summary = dispatcher.run(specs, &run).await;

    let format = OutputFormat::from_str(&args.format).unwrap_or(OutputFormat::Table);
    let mut formatter = SummaryFormatter::new(format, settings.endpoints.clone());
    if args.no_color {
        formatter = formatter.no_color();
    }
    println!("{}", formatter.format_summary(&summary));

    // Per-session errors never reach the exit code; only the pre-flight
    // steps above can fail the process.
    let aggregator = ReportAggregator::new(reports);
    match aggregator.merge_all() {
        Ok(merged) => info!(
            "Merged {} session reports into {}",
            merged.sessions,
            merged.path.display()
        ),
        Err(e) => warn!("Could not merge session reports: {e}"),
    }

    Ok(())
}

fn list_specs(args: cli::ListArgs) -> Result<()> {
    let env = EnvConfig::load();
    let mut settings = load_settings(args.config.as_deref(), &env)?;

    if let Some(path) = args.path {
        settings.suite_path = path;
    }
    if let Some(specs) = args.specs {
        settings.specs_dir = specs;
    }

    let archiver = SuiteArchiver::new(&settings.suite_path);
    let discovery = SpecDiscovery::new(archiver.suite_dir(), &settings.specs_dir);
    let specs = discovery.discover()?;

    println!(
        "\nSpec files under {} ({} total)\n",
        discovery.spec_root().display(),
        specs.len()
    );
    for spec in &specs {
        println!("  {spec}");
    }
    println!();

    Ok(())
}

fn show_results(args: cli::ResultsArgs) -> Result<()> {
    let store = match &args.dir {
        Some(dir) => ReportStore::new(dir),
        None => ReportStore::default_dir()?,
    };

    match store.load_merged()? {
        Some(document) => {
            if args.format == "json" {
                println!("{}", serde_json::to_string_pretty(&document)?);
            } else {
                println!("\nMerged report: {}", store.merged_path().display());
                if let Some(stats) = document.get("stats").and_then(|s| s.as_object()) {
                    for (key, value) in stats {
                        println!("  {key:12} {value}");
                    }
                }
                let records = document
                    .get("results")
                    .and_then(|r| r.as_array())
                    .map(|r| r.len())
                    .unwrap_or(0);
                println!("  {:12} {records}", "records");
                println!();
            }
        }
        None => {
            let raw = store.list_raw()?;
            if raw.is_empty() {
                println!("\nNo stored reports found.");
                println!("Run the suite first: grid-runner run --org <org>\n");
            } else {
                println!(
                    "\n{} session reports awaiting merge in {}:\n",
                    raw.len(),
                    store.dir().display()
                );
                for path in raw {
                    println!("  {}", path.display());
                }
                println!();
            }
        }
    }

    Ok(())
}

fn manage_config(args: cli::ConfigArgs) -> Result<()> {
    use std::path::Path;

    match args.action {
        cli::ConfigAction::Init { output, force } => {
            let path = Path::new(&output);
            if path.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {output}. Use --force to overwrite."
                );
            }

            let config = ConfigFile::example();
            config.save(path)?;
            println!("✓ Configuration file created: {output}");
            println!("\nEdit the file to customize your settings.");
        }

        cli::ConfigAction::Show { env, format } => {
            if env {
                EnvConfig::load().print_summary();
            } else {
                let config = ConfigFile::load_default()?;
                let output = if format == "json" {
                    serde_json::to_string_pretty(&config)?
                } else {
                    serde_yaml::to_string(&config)?
                };
                println!("{output}");
            }
        }

        cli::ConfigAction::Validate { file } => {
            let path = file
                .or_else(|| ConfigFile::find().map(|p| p.to_string_lossy().to_string()))
                .unwrap_or_else(|| "./grid-runner.yaml".to_string());

            match ConfigFile::load(&path) {
                Ok(_) => {
                    println!("✓ Configuration file is valid: {path}");
                }
                Err(e) => {
                    println!("✗ Configuration file is invalid: {path}");
                    println!("  Error: {e}");
                    return Err(e);
                }
            }
        }

        cli::ConfigAction::Env => {
            config::env::print_env_help();
        }
    }

    Ok(())
}
