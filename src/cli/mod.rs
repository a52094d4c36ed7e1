//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::Parser;
use std::path::PathBuf;

use crate::config::ENV_HELP;
use crate::models::OutputFormat;

/// Run behave feature files in parallel and merge their results
#[derive(Parser, Debug)]
#[command(name = "feature-runner")]
#[command(version)]
#[command(about = "Run behave feature files in parallel and merge their results")]
#[command(after_help = ENV_HELP)]
pub struct Args {
    /// Number of parallel workers (default: half the CPU cores, 2 to 6)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Only run features tagged with this tag (with or without '@')
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Result format requested from the runner
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Remove previous per-worker results before running
    #[arg(long)]
    pub clean: bool,

    /// Render an HTML report from the merged results
    #[arg(long)]
    pub generate_report: bool,

    /// Configuration file (YAML or JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Project directory containing the features and reports directories
    #[arg(long)]
    pub project_root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_verify_cli() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["feature-runner"]);
        assert_eq!(args.workers, None);
        assert_eq!(args.tag, None);
        assert_eq!(args.format, OutputFormat::Json);
        assert!(!args.clean);
        assert!(!args.generate_report);
        assert!(!args.verbose);
    }

    #[test]
    fn test_all_flags() {
        let args = Args::parse_from([
            "feature-runner",
            "-w",
            "4",
            "--tag",
            "smoke",
            "--format",
            "allure",
            "--clean",
            "--generate-report",
            "-c",
            "runner.yaml",
            "--project-root",
            "/srv/site",
            "-v",
            "--no-color",
        ]);
        assert_eq!(args.workers, Some(4));
        assert_eq!(args.tag.as_deref(), Some("smoke"));
        assert_eq!(args.format, OutputFormat::Allure);
        assert!(args.clean && args.generate_report && args.verbose && args.no_color);
        assert_eq!(args.config, Some(PathBuf::from("runner.yaml")));
        assert_eq!(args.project_root, Some(PathBuf::from("/srv/site")));
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Args::try_parse_from(["feature-runner", "--format", "xml"]).is_err());
    }
}
