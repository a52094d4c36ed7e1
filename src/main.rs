//! feature-runner - Parallel behave feature execution
//!
//! A CLI tool that runs every feature file of a behave suite in its own
//! runner process, bounded by a worker pool, and merges the results.
//!
//! ## Features
//!
//! - Tag filtering of feature files
//! - Per-feature timeout with process cleanup
//! - Merged JSON results and Allure artifacts
//! - Run statistics, summary file, and optional HTML report
//!
//! ## Usage
//!
//! ```bash
//! # Run every feature with the default worker count
//! feature-runner
//!
//! # Run smoke features on 4 workers with Allure output
//! feature-runner --workers 4 --tag smoke --format allure
//!
//! # Start from a clean slate and render the HTML report
//! feature-runner --clean --generate-report
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info, warn};

mod cli;
mod config;
mod discovery;
mod executor;
mod models;
mod output;
mod results;
mod utils;

use cli::Args;
use config::{EnvConfig, RunnerConfig};
use discovery::{discover_features, DiscoveryError};
use executor::ParallelExecutor;
use models::{OutputFormat, RunStatistics, WorkerAssignment};
use output::SummaryFormatter;
use results::{MergeOutcome, ReportFormat, ReportGenerator, ResultMerger, RunSummary};
use utils::{init_logger, Stopwatch};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let env = EnvConfig::load();
    let config = match build_config(&args, &env) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    init_logger(args.verbose, &config.log_level);
    if env.has_any() {
        debug!("Environment overrides applied: {:?}", env);
    }

    let cpu_count = num_cpus::get();
    let options = RunOptions {
        workers: config.worker_count(cpu_count),
        cpu_count,
        format: args.format,
        tag: args.tag.clone(),
        clean: args.clean,
        generate_report: args.generate_report,
        colorize: !args.no_color,
    };

    match run_features(Arc::new(config), &options).await {
        Ok(outcome) => {
            debug!(
                "Merged {} documents from {} result files",
                outcome.merged.documents, outcome.merged.sources
            );
            if let Some(path) = &outcome.report {
                info!("HTML report: {}", path.display());
            }
            ExitCode::from(outcome.exit_status())
        }
        Err(e) => {
            println!("ERROR: {e}");
            if let Some(hint) = e.downcast_ref::<DiscoveryError>().and_then(|d| d.hint()) {
                println!("Hint: {hint}");
            }
            debug!("{e:?}");
            ExitCode::FAILURE
        }
    }
}

/// Layer configuration: file, then environment, then command-line flags
fn build_config(args: &Args, env: &EnvConfig) -> Result<RunnerConfig> {
    let mut config = RunnerConfig::discover(args.config.as_deref())?.apply_env(env);

    if let Some(root) = &args.project_root {
        config.project_root = root.clone();
    }
    if let Some(workers) = args.workers {
        config.workers = Some(workers);
    }

    config.validate()?;
    config.canonicalize_root()
}

/// Per-run choices taken from the command line
#[derive(Clone, Debug)]
struct RunOptions {
    workers: usize,
    cpu_count: usize,
    format: OutputFormat,
    tag: Option<String>,
    clean: bool,
    generate_report: bool,
    colorize: bool,
}

/// What a completed run produced
#[derive(Debug)]
struct RunOutcome {
    statistics: RunStatistics,
    merged: MergeOutcome,
    report: Option<PathBuf>,
}

impl RunOutcome {
    /// Process exit status: non-zero iff any feature failed
    fn exit_status(&self) -> u8 {
        if self.statistics.failed_features > 0 {
            1
        } else {
            0
        }
    }
}

async fn run_features(config: Arc<RunnerConfig>, options: &RunOptions) -> Result<RunOutcome> {
    let formatter = if options.colorize {
        SummaryFormatter::new()
    } else {
        SummaryFormatter::new().no_color()
    };
    let mut stopwatch = Stopwatch::new();

    println!(
        "{}",
        formatter.header(
            options.cpu_count,
            options.workers,
            options.format,
            options.tag.as_deref()
        )
    );

    let partial_results = config.parallel_results_path();
    if options.clean && partial_results.exists() {
        println!("Cleaning previous results...");
        fs::remove_dir_all(&partial_results)
            .with_context(|| format!("Failed to clean {}", partial_results.display()))?;
    }
    fs::create_dir_all(&partial_results)
        .with_context(|| format!("Failed to create {}", partial_results.display()))?;

    let features = discover_features(&config.features_path(), options.tag.as_deref())?;
    println!("Found {} feature files to run\n", features.len());
    stopwatch.lap("discovery");

    if options.format.has_artifacts() {
        clear_worker_artifacts(&config, options.workers)?;
    }

    let assignments = WorkerAssignment::round_robin(features, options.workers, options.format);
    let executor = ParallelExecutor::new(config.clone(), options.workers);

    println!(
        "Starting parallel execution with {} workers...",
        executor.max_concurrent()
    );
    println!("{}\n", "=".repeat(80));

    let report = executor
        .run(assignments, |result, completed, total| {
            println!("{}", formatter.progress(result, completed, total));
        })
        .await;
    stopwatch.lap("execution");
    let all_passed = report.all_passed();
    let wall_clock = report.wall_clock;

    println!("{}", formatter.completion(&report.statistics));

    println!("{}", formatter.banner("Merging Results"));
    let merger = ResultMerger::new(&config);
    println!("Merging JSON results...");
    let merged = merger.merge_json(&report.results)?;
    println!("Merged results saved to: {}", merged.path.display());

    if options.format.has_artifacts() {
        println!("\nMerging Allure results...");
        merger.merge_artifacts(&report.results)?;
        println!(
            "Merged Allure results saved to: {}",
            merger.artifacts_path().display()
        );
    }
    stopwatch.lap("merge");

    println!("{}", formatter.results(&report.results, &report.statistics));

    let mut html_report = None;
    if options.generate_report {
        if merged.is_empty() {
            warn!("No merged results available, skipping HTML report");
        } else {
            println!("{}", formatter.banner("Generating HTML Report"));
            match generate_report(&config, &merged) {
                Ok(path) => {
                    println!("HTML report generated: {}", path.display());
                    html_report = Some(path);
                }
                Err(e) => {
                    warn!("Could not generate HTML report: {:#}", e);
                    println!("Warning: Could not generate HTML report: {e:#}");
                }
            }
        }
        stopwatch.lap("report");
    }

    let summary_path = config.summary_path();
    RunSummary::new(
        options.workers,
        report.statistics.clone(),
        report.results,
    )
    .save(&summary_path)?;
    println!("\nExecution summary saved to: {}", summary_path.display());

    println!("{}", formatter.verdict(&report.statistics));

    debug!("Run phases: {}", stopwatch.format());
    if all_passed {
        info!(
            "Run finished in {:.1}s: all {} features passed",
            wall_clock.as_secs_f64(),
            report.statistics.total_features
        );
    } else {
        warn!(
            "Run finished in {:.1}s: {}/{} features failed",
            wall_clock.as_secs_f64(),
            report.statistics.failed_features,
            report.statistics.total_features
        );
    }

    Ok(RunOutcome {
        statistics: report.statistics,
        merged,
        report: html_report,
    })
}

/// Remove artifacts left in the worker slots by an earlier run, so the merge
/// only sees what this run produced
fn clear_worker_artifacts(config: &RunnerConfig, workers: usize) -> Result<()> {
    for slot in 0..workers {
        let dir = config.worker_artifacts_path(slot);
        if dir.exists() {
            debug!("Clearing stale artifacts in {}", dir.display());
            fs::remove_dir_all(&dir)
                .with_context(|| format!("Failed to clear {}", dir.display()))?;
        }
    }
    Ok(())
}

fn generate_report(config: &RunnerConfig, merged: &MergeOutcome) -> Result<PathBuf> {
    let mut generator = ReportGenerator::load(&merged.path)?;
    if let Some(project) = config.project_root.file_name() {
        generator = generator.with_project(project.to_string_lossy());
    }
    let stats = generator.statistics();
    debug!(
        "Report covers {} scenarios in {} features",
        stats.total_scenarios, stats.total_features
    );

    let path = config.html_report_path();
    generator.write_html(&path)?;
    println!("{}", generator.render(ReportFormat::Text)?);
    Ok(path)
}
