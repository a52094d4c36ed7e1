//! Configuration module
//!
//! Handles loading, layering, and validating runner configuration.
//! The resolved [`RunnerConfig`] is built once at start-up and passed to
//! every component that needs it.

mod env;

pub use env::{EnvConfig, ENV_HELP};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration file locations (in order of precedence)
const CONFIG_LOCATIONS: &[&str] = &[
    "./feature-runner.yaml",
    "./feature-runner.yml",
    "./.feature-runner.yaml",
    "~/.config/feature-runner/config.yaml",
];

/// Default per-feature ceiling: 15 minutes
pub const DEFAULT_TIMEOUT_SECS: u64 = 900;

/// Upper bound on the default worker count
pub const DEFAULT_MAX_WORKERS: usize = 6;

/// Characters of stdout/stderr kept per task
pub const DEFAULT_OUTPUT_TAIL: usize = 500;

/// External runner invocation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerCommand {
    /// Runner executable
    pub program: String,
    /// Arguments placed before the feature path
    pub base_args: Vec<String>,
    /// Arguments placed after the output options
    pub extra_args: Vec<String>,
}

impl Default for RunnerCommand {
    fn default() -> Self {
        Self {
            program: "behave".to_string(),
            base_args: Vec::new(),
            extra_args: vec!["--no-capture".to_string(), "--no-skipped".to_string()],
        }
    }
}

impl RunnerCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
            extra_args: Vec::new(),
        }
    }

    pub fn with_base_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.base_args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// Runner configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Working directory for runner processes; relative paths resolve here
    pub project_root: PathBuf,

    /// Directory containing `*.feature` files
    pub features_dir: PathBuf,

    /// Directory receiving merged results, summaries, and reports
    pub reports_dir: PathBuf,

    /// External test runner
    pub runner: RunnerCommand,

    /// Per-feature wall-clock ceiling in seconds
    pub timeout_secs: u64,

    /// Cap applied to the CPU-derived default worker count
    pub max_workers: usize,

    /// Explicit worker count (overrides the CPU-derived default)
    pub workers: Option<usize>,

    /// Characters of captured stdout/stderr kept per task
    pub output_tail_chars: usize,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            features_dir: PathBuf::from("features"),
            reports_dir: PathBuf::from("reports"),
            runner: RunnerCommand::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_workers: DEFAULT_MAX_WORKERS,
            workers: None,
            output_tail_chars: DEFAULT_OUTPUT_TAIL,
            log_level: "info".to_string(),
        }
    }
}

impl RunnerConfig {
    /// Create a configuration rooted at a project directory
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Default::default()
        }
    }

    pub fn with_runner(mut self, runner: RunnerCommand) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Find configuration file in standard locations
    pub fn find() -> Option<PathBuf> {
        CONFIG_LOCATIONS
            .iter()
            .map(|location| expand_path(location))
            .find(|path| path.exists())
    }

    /// Load from an explicit path, or the first standard location, or defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => match Self::find() {
                Some(path) => Self::load(&path),
                None => Ok(Self::default()),
            },
        }
    }

    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env(mut self, env: &EnvConfig) -> Self {
        if let Some(root) = &env.project_root {
            self.project_root = PathBuf::from(root);
        }
        if let Some(dir) = &env.features_dir {
            self.features_dir = PathBuf::from(dir);
        }
        if let Some(dir) = &env.reports_dir {
            self.reports_dir = PathBuf::from(dir);
        }
        if let Some(program) = &env.runner {
            self.runner.program = program.clone();
        }
        if let Some(timeout) = env.timeout {
            self.timeout_secs = timeout;
        }
        if let Some(workers) = env.workers {
            self.workers = Some(workers);
        }
        if let Some(level) = &env.log_level {
            self.log_level = level.clone();
        }
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.runner.program.trim().is_empty() {
            anyhow::bail!("Runner program must not be empty");
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be greater than zero");
        }
        if self.max_workers == 0 {
            anyhow::bail!("max_workers must be greater than zero");
        }
        if self.workers == Some(0) {
            anyhow::bail!("Worker count must be at least 1");
        }
        Ok(())
    }

    /// Make the project root absolute; runner processes start inside it
    pub fn canonicalize_root(mut self) -> Result<Self> {
        self.project_root = self.project_root.canonicalize().with_context(|| {
            format!("Project root not found: {}", self.project_root.display())
        })?;
        Ok(self)
    }

    /// Worker count: explicit override, or `min(max_workers, max(2, cpus / 2))`
    pub fn worker_count(&self, cpu_count: usize) -> usize {
        self.workers
            .unwrap_or_else(|| default_worker_count(cpu_count, self.max_workers))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    pub fn features_path(&self) -> PathBuf {
        self.resolve(&self.features_dir)
    }

    pub fn reports_path(&self) -> PathBuf {
        self.resolve(&self.reports_dir)
    }

    /// Root of the per-worker partial results
    pub fn parallel_results_path(&self) -> PathBuf {
        self.reports_path().join("parallel-results")
    }

    /// Output directory owned by one worker slot
    pub fn worker_dir(&self, worker_id: usize) -> PathBuf {
        self.parallel_results_path().join(format!("worker_{worker_id}"))
    }

    /// Rich-trace artifacts written by one worker slot
    pub fn worker_artifacts_path(&self, worker_id: usize) -> PathBuf {
        self.worker_dir(worker_id).join("allure-results")
    }

    /// Merged structured-result document
    pub fn merged_results_path(&self) -> PathBuf {
        self.reports_path().join("test_results.json")
    }

    /// Merged rich-trace artifact directory
    pub fn merged_artifacts_path(&self) -> PathBuf {
        self.reports_path().join("allure-results")
    }

    pub fn summary_path(&self) -> PathBuf {
        self.reports_path().join("parallel_execution_summary.json")
    }

    pub fn html_report_path(&self) -> PathBuf {
        self.reports_path().join("test_report.html")
    }
}

/// Default pool size for a machine with `cpu_count` cores
pub fn default_worker_count(cpu_count: usize, max_workers: usize) -> usize {
    max_workers.min((cpu_count / 2).max(2))
}

/// Check if file is YAML based on extension
fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

/// Expand ~ to home directory
fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = RunnerConfig::default();
        assert_eq!(config.timeout_secs, 900);
        assert_eq!(config.runner.program, "behave");
        assert_eq!(config.output_tail_chars, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_worker_count() {
        assert_eq!(default_worker_count(1, 6), 2);
        assert_eq!(default_worker_count(4, 6), 2);
        assert_eq!(default_worker_count(8, 6), 4);
        assert_eq!(default_worker_count(32, 6), 6);
    }

    #[test]
    fn test_explicit_workers_override() {
        let config = RunnerConfig {
            workers: Some(9),
            ..Default::default()
        };
        assert_eq!(config.worker_count(2), 9);
    }

    #[test]
    fn test_paths_resolve_against_project_root() {
        let config = RunnerConfig::new("/srv/suite");
        assert_eq!(config.features_path(), PathBuf::from("/srv/suite/features"));
        assert_eq!(
            config.worker_dir(2),
            PathBuf::from("/srv/suite/reports/parallel-results/worker_2")
        );
        assert_eq!(
            config.worker_artifacts_path(0),
            PathBuf::from("/srv/suite/reports/parallel-results/worker_0/allure-results")
        );
        assert_eq!(
            config.summary_path(),
            PathBuf::from("/srv/suite/reports/parallel_execution_summary.json")
        );
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        assert!(RunnerConfig::default().with_timeout(0).validate().is_err());
        let zero_workers = RunnerConfig {
            workers: Some(0),
            ..Default::default()
        };
        assert!(zero_workers.validate().is_err());
        let no_program = RunnerConfig::default().with_runner(RunnerCommand::new(" "));
        assert!(no_program.validate().is_err());
    }

    #[test]
    fn test_config_load_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("feature-runner.yaml");

        let config = RunnerConfig::new("/tmp/suite")
            .with_runner(RunnerCommand::new("python").with_base_args(["-m", "behave"]))
            .with_timeout(120);
        std::fs::write(&path, serde_yaml::to_string(&config).unwrap()).unwrap();

        let loaded = RunnerConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_json_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"timeout_secs": 60, "runner": {"program": "behave-x"}}"#)
            .unwrap();

        let loaded = RunnerConfig::discover(Some(&path)).unwrap();
        assert_eq!(loaded.timeout_secs, 60);
        assert_eq!(loaded.runner.program, "behave-x");
        assert_eq!(loaded.reports_dir, PathBuf::from("reports"));
    }

    #[test]
    fn test_apply_env() {
        let env = EnvConfig {
            timeout: Some(30),
            workers: Some(3),
            runner: Some("stub".to_string()),
            ..Default::default()
        };
        let config = RunnerConfig::default().apply_env(&env);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.workers, Some(3));
        assert_eq!(config.runner.program, "stub");
    }

    #[test]
    fn test_canonicalize_root() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("suite")).unwrap();

        let relative = dir.path().join("suite/../suite");
        let config = RunnerConfig::new(relative).canonicalize_root().unwrap();
        assert_eq!(
            config.project_root,
            dir.path().join("suite").canonicalize().unwrap()
        );

        assert!(RunnerConfig::new(dir.path().join("missing"))
            .canonicalize_root()
            .is_err());
    }

    #[test]
    fn test_expand_path() {
        assert_eq!(expand_path("./test.yaml"), PathBuf::from("./test.yaml"));
    }
}
