//! Single-feature worker
//!
//! Runs one feature file through the external runner process and converts
//! whatever happens into a [`TaskResult`]. Nothing escapes this boundary:
//! spawn failures, IO errors and timeouts all become failed results.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::config::RunnerConfig;
use crate::models::{tail_chars, OutputFormat, TaskResult, WorkerAssignment, NO_EXIT_CODE};
use crate::utils::Timer;

/// Formatter used for Allure rich-trace output
const ALLURE_FORMATTER: &str = "allure_behave.formatter:AllureFormatter";

/// Failures while running a feature; converted to data by [`FeatureWorker::run`]
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Failed to prepare output path {path}: {source}")]
    OutputPath {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to collect runner output: {0}")]
    Wait(#[source] io::Error),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),
}

/// Captured output of a runner process that exited on its own
#[derive(Debug)]
struct ProcessOutput {
    exit_code: i32,
    stdout: String,
    stderr: String,
}

/// Executes feature files through the configured runner
#[derive(Clone, Debug)]
pub struct FeatureWorker {
    config: Arc<RunnerConfig>,
}

impl FeatureWorker {
    pub fn new(config: Arc<RunnerConfig>) -> Self {
        Self { config }
    }

    /// Per-task structured-result file inside the worker's directory
    pub fn json_output_path(&self, assignment: &WorkerAssignment) -> PathBuf {
        self.config
            .worker_dir(assignment.worker_id)
            .join(format!("{}_results.json", assignment.feature.name()))
    }

    /// Rich-trace artifact directory inside the worker's directory
    pub fn artifact_dir(&self, assignment: &WorkerAssignment) -> PathBuf {
        self.config.worker_artifacts_path(assignment.worker_id)
    }

    /// Runner arguments for one assignment
    pub fn build_args(&self, assignment: &WorkerAssignment) -> Vec<OsString> {
        let runner = &self.config.runner;
        let mut args: Vec<OsString> = runner.base_args.iter().map(OsString::from).collect();

        args.push(assignment.feature.path().as_os_str().to_owned());
        args.push("-f".into());
        args.push("json".into());
        args.push("-o".into());
        args.push(self.json_output_path(assignment).into_os_string());
        args.extend(runner.extra_args.iter().map(OsString::from));

        if assignment.format == OutputFormat::Allure {
            args.push("-f".into());
            args.push(ALLURE_FORMATTER.into());
            args.push("-o".into());
            args.push(self.artifact_dir(assignment).into_os_string());
        }

        args
    }

    /// Run one assignment to completion. Always returns a result.
    pub async fn run(&self, assignment: &WorkerAssignment) -> TaskResult {
        info!(
            "[Worker {}] Running: {}",
            assignment.worker_id, assignment.feature
        );

        let timer = Timer::start(format!("feature {}", assignment.feature));

        match self.execute(assignment).await {
            Ok(output) => {
                let duration = timer.stop().as_secs_f64();
                let json_path = self.json_output_path(assignment);
                let json_output = if json_path.exists() {
                    Some(json_path)
                } else {
                    debug!(
                        "{} produced no JSON output at {}",
                        assignment.feature,
                        json_path.display()
                    );
                    None
                };
                let allure_output = assignment
                    .format
                    .has_artifacts()
                    .then(|| self.artifact_dir(assignment));

                let tail = self.config.output_tail_chars;
                TaskResult::completed(assignment, output.exit_code, duration)
                    .with_json_output(json_output)
                    .with_allure_output(allure_output)
                    .with_output(
                        tail_chars(&output.stdout, tail),
                        tail_chars(&output.stderr, tail),
                    )
            }
            Err(WorkerError::Timeout(secs)) => {
                warn!(
                    "[Worker {}] TIMEOUT: {} after {}s",
                    assignment.worker_id, assignment.feature, secs
                );
                TaskResult::timeout(assignment, secs)
            }
            Err(e) => {
                error!(
                    "[Worker {}] ERROR: {} - {}",
                    assignment.worker_id, assignment.feature, e
                );
                TaskResult::error(assignment, e.to_string())
            }
        }
    }

    async fn execute(&self, assignment: &WorkerAssignment) -> Result<ProcessOutput, WorkerError> {
        let worker_dir = self.config.worker_dir(assignment.worker_id);
        create_dir(&worker_dir).await?;

        // A file left by an earlier run must not count as this run's output
        let json_path = self.json_output_path(assignment);
        match tokio::fs::remove_file(&json_path).await {
            Ok(()) => debug!("Removed stale output {}", json_path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(WorkerError::OutputPath {
                    path: json_path,
                    source,
                })
            }
        }

        if assignment.format.has_artifacts() {
            create_dir(&self.artifact_dir(assignment)).await?;
        }

        let program = &self.config.runner.program;
        let mut command = Command::new(program);
        command
            .args(self.build_args(assignment))
            .current_dir(&self.config.project_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("Spawning {:?}", command);

        let child = command.spawn().map_err(|source| WorkerError::Spawn {
            program: program.clone(),
            source,
        })?;

        // Dropping the child on timeout kills the process
        let ceiling = Duration::from_secs(self.config.timeout_secs);
        let output = tokio::time::timeout(ceiling, child.wait_with_output())
            .await
            .map_err(|_| WorkerError::Timeout(self.config.timeout_secs))?
            .map_err(WorkerError::Wait)?;

        Ok(ProcessOutput {
            exit_code: exit_code(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

async fn create_dir(path: &std::path::Path) -> Result<(), WorkerError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| WorkerError::OutputPath {
            path: path.to_path_buf(),
            source,
        })
}

/// Exit code, or the negated signal number for a signalled process
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }

    NO_EXIT_CODE
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::RunnerCommand;
    use crate::models::FeatureUnit;
    use std::path::Path;
    use std::time::Instant;
    use tempfile::tempdir;

    /// Worker whose runner is `sh -c <script>`; the feature path is `$1`
    /// and the JSON output path is `$5`.
    fn stub_worker(root: &Path, script: &str) -> FeatureWorker {
        let runner = RunnerCommand::new("sh").with_base_args(["-c", script, "stub-runner"]);
        FeatureWorker::new(Arc::new(RunnerConfig::new(root).with_runner(runner)))
    }

    fn assignment(root: &Path, name: &str, format: OutputFormat) -> WorkerAssignment {
        let path = root.join("features").join(format!("{name}.feature"));
        WorkerAssignment::new(FeatureUnit::new(path), 1, format)
    }

    #[tokio::test]
    async fn test_successful_run_records_output() {
        let dir = tempdir().unwrap();
        let worker = stub_worker(
            dir.path(),
            r#"echo '[{"name": "Home"}]' > "$5"; echo "ran $1""#,
        );
        let task = assignment(dir.path(), "home", OutputFormat::Json);

        let result = worker.run(&task).await;
        assert!(result.success);
        assert_eq!(result.returncode, 0);
        assert_eq!(result.feature, "home");
        assert_eq!(result.worker_id, 1);
        assert_eq!(result.json_output, Some(worker.json_output_path(&task)));
        assert!(result.stdout.contains("home.feature"));
        assert!(result.error.is_none());
        assert!(result.allure_output.is_none());
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_failure() {
        let dir = tempdir().unwrap();
        let worker = stub_worker(dir.path(), "echo boom >&2; exit 3");
        let task = assignment(dir.path(), "about", OutputFormat::Json);

        let result = worker.run(&task).await;
        assert!(!result.success);
        assert_eq!(result.returncode, 3);
        assert!(result.json_output.is_none());
        assert_eq!(result.stderr.trim(), "boom");
    }

    #[tokio::test]
    async fn test_zero_exit_without_file_records_no_output() {
        let dir = tempdir().unwrap();
        let worker = stub_worker(dir.path(), "exit 0");
        let task = assignment(dir.path(), "quiet", OutputFormat::Json);

        let result = worker.run(&task).await;
        assert!(result.success);
        assert!(result.json_output.is_none());
    }

    #[tokio::test]
    async fn test_stale_output_is_not_reported() {
        let dir = tempdir().unwrap();
        let worker = stub_worker(dir.path(), "exit 1");
        let task = assignment(dir.path(), "stale", OutputFormat::Json);

        let stale = worker.json_output_path(&task);
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, "[]").unwrap();

        let result = worker.run(&task).await;
        assert!(result.json_output.is_none());
        assert!(!stale.exists());
    }

    #[tokio::test]
    async fn test_timeout_kills_runner() {
        let dir = tempdir().unwrap();
        let runner = RunnerCommand::new("sh").with_base_args(["-c", "sleep 5", "stub-runner"]);
        let config = RunnerConfig::new(dir.path())
            .with_runner(runner)
            .with_timeout(1);
        let worker = FeatureWorker::new(Arc::new(config));
        let task = assignment(dir.path(), "slow", OutputFormat::Json);

        let started = Instant::now();
        let result = worker.run(&task).await;

        assert!(started.elapsed() < Duration::from_secs(4));
        assert!(!result.success);
        assert_eq!(result.returncode, -1);
        assert_eq!(result.duration, 1.0);
        assert!(!result.error.as_deref().unwrap_or_default().is_empty());
        assert!(result.json_output.is_none());
    }

    #[tokio::test]
    async fn test_missing_runner_is_captured() {
        let dir = tempdir().unwrap();
        let config = RunnerConfig::new(dir.path())
            .with_runner(RunnerCommand::new("feature-runner-missing-binary"));
        let worker = FeatureWorker::new(Arc::new(config));
        let task = assignment(dir.path(), "home", OutputFormat::Json);

        let result = worker.run(&task).await;
        assert!(!result.success);
        assert_eq!(result.returncode, -1);
        assert_eq!(result.duration, 0.0);
        assert!(result
            .error
            .as_deref()
            .unwrap_or_default()
            .contains("feature-runner-missing-binary"));
    }

    #[tokio::test]
    async fn test_output_tail_is_truncated() {
        let dir = tempdir().unwrap();
        let mut config = RunnerConfig::new(dir.path()).with_runner(
            RunnerCommand::new("sh").with_base_args(["-c", "printf '0123456789abcdef'", "stub"]),
        );
        config.output_tail_chars = 6;
        let worker = FeatureWorker::new(Arc::new(config));

        let result = worker
            .run(&assignment(dir.path(), "long", OutputFormat::Json))
            .await;
        assert_eq!(result.stdout, "abcdef");
    }

    #[tokio::test]
    async fn test_allure_run_creates_artifact_dir() {
        let dir = tempdir().unwrap();
        let worker = stub_worker(dir.path(), r#"touch "$9/result-1.json""#);
        let task = assignment(dir.path(), "trace", OutputFormat::Allure);

        let result = worker.run(&task).await;
        let artifacts = worker.artifact_dir(&task);
        assert_eq!(result.allure_output, Some(artifacts.clone()));
        assert!(artifacts.join("result-1.json").exists());
    }

    #[test]
    fn test_build_args() {
        let root = Path::new("/suite");
        let config = RunnerConfig::new(root);
        let worker = FeatureWorker::new(Arc::new(config));

        let json = worker.build_args(&assignment(root, "home", OutputFormat::Json));
        let json: Vec<String> = json.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            json,
            vec![
                "/suite/features/home.feature",
                "-f",
                "json",
                "-o",
                "/suite/reports/parallel-results/worker_1/home_results.json",
                "--no-capture",
                "--no-skipped",
            ]
        );

        let allure = worker.build_args(&assignment(root, "home", OutputFormat::Allure));
        assert_eq!(allure.len(), json.len() + 4);
        assert_eq!(allure[allure.len() - 3], ALLURE_FORMATTER);
    }
}
