//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "FEATURE_RUNNER";

/// Help text listing the recognised environment variables
pub const ENV_HELP: &str = "\
Environment Variables:
  FEATURE_RUNNER_PROJECT_ROOT   Working directory for runner processes
  FEATURE_RUNNER_FEATURES_DIR   Directory containing *.feature files
  FEATURE_RUNNER_REPORTS_DIR    Directory for merged results and reports
  FEATURE_RUNNER_RUNNER         Runner executable (default: behave)
  FEATURE_RUNNER_TIMEOUT        Per-feature timeout in seconds (default: 900)
  FEATURE_RUNNER_WORKERS        Number of parallel workers
  FEATURE_RUNNER_LOG            Log level (trace, debug, info, warn, error)";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// From FEATURE_RUNNER_PROJECT_ROOT
    pub project_root: Option<String>,
    /// From FEATURE_RUNNER_FEATURES_DIR
    pub features_dir: Option<String>,
    /// From FEATURE_RUNNER_REPORTS_DIR
    pub reports_dir: Option<String>,
    /// From FEATURE_RUNNER_RUNNER
    pub runner: Option<String>,
    /// From FEATURE_RUNNER_TIMEOUT
    pub timeout: Option<u64>,
    /// From FEATURE_RUNNER_WORKERS
    pub workers: Option<usize>,
    /// From FEATURE_RUNNER_LOG
    pub log_level: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            project_root: get_env("PROJECT_ROOT"),
            features_dir: get_env("FEATURES_DIR"),
            reports_dir: get_env("REPORTS_DIR"),
            runner: get_env("RUNNER"),
            timeout: get_env_parse("TIMEOUT"),
            workers: get_env_parse("WORKERS"),
            log_level: get_env("LOG"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.project_root.is_some()
            || self.features_dir.is_some()
            || self.reports_dir.is_some()
            || self.runner.is_some()
            || self.timeout.is_some()
            || self.workers.is_some()
            || self.log_level.is_some()
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}"))
        .ok()
        .filter(|v| !v.trim().is_empty())
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.trim().parse().ok())
}
