//! Task result models
//!
//! Outcome of running one feature file through the external runner.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use super::WorkerAssignment;

/// Exit code recorded when the runner never produced one
pub const NO_EXIT_CODE: i32 = -1;

/// Result of a single feature execution
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskResult {
    pub feature: String,
    pub worker_id: usize,
    pub success: bool,
    pub returncode: i32,
    /// Wall-clock duration in seconds
    pub duration: f64,
    pub json_output: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allure_output: Option<PathBuf>,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskResult {
    /// Result of a runner process that ran to completion
    pub fn completed(assignment: &WorkerAssignment, returncode: i32, duration: f64) -> Self {
        Self {
            feature: assignment.feature.name().to_string(),
            worker_id: assignment.worker_id,
            success: returncode == 0,
            returncode,
            duration,
            json_output: None,
            allure_output: None,
            stdout: String::new(),
            stderr: String::new(),
            error: None,
        }
    }

    /// Result of a runner process killed at the timeout ceiling
    pub fn timeout(assignment: &WorkerAssignment, timeout_secs: u64) -> Self {
        Self::error(assignment, timeout_message(timeout_secs)).with_duration(timeout_secs as f64)
    }

    /// Result of a runner that could not be run at all
    pub fn error(assignment: &WorkerAssignment, error: impl Into<String>) -> Self {
        Self {
            feature: assignment.feature.name().to_string(),
            worker_id: assignment.worker_id,
            success: false,
            returncode: NO_EXIT_CODE,
            duration: 0.0,
            json_output: None,
            allure_output: None,
            stdout: String::new(),
            stderr: String::new(),
            error: Some(error.into()),
        }
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_json_output(mut self, path: Option<PathBuf>) -> Self {
        self.json_output = path;
        self
    }

    pub fn with_allure_output(mut self, path: Option<PathBuf>) -> Self {
        self.allure_output = path;
        self
    }

    pub fn with_output(mut self, stdout: String, stderr: String) -> Self {
        self.stdout = stdout;
        self.stderr = stderr;
        self
    }

    pub fn status_label(&self) -> &'static str {
        if self.success {
            "PASSED"
        } else {
            "FAILED"
        }
    }
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({:.2}s)",
            self.feature,
            self.status_label(),
            self.duration
        )?;
        if let Some(err) = &self.error {
            write!(f, " - {err}")?;
        }
        Ok(())
    }
}

/// Describe a timeout in minutes when it divides evenly
fn timeout_message(timeout_secs: u64) -> String {
    if timeout_secs >= 60 && timeout_secs % 60 == 0 {
        format!("Timeout after {} minutes", timeout_secs / 60)
    } else {
        format!("Timeout after {timeout_secs} seconds")
    }
}

/// Keep the last `max_chars` characters of captured output
pub fn tail_chars(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    if count <= max_chars {
        text.to_string()
    } else {
        text.chars().skip(count - max_chars).collect()
    }
}
