//! Console formatting for parallel runs
//!
//! Banners, live progress lines, and the end-of-run summary.

use std::fmt::Write;

use crate::discovery::normalize_tag;
use crate::models::{OutputFormat, RunStatistics, TaskResult};

const BANNER_WIDTH: usize = 80;

/// Passed features listed in the summary
const TOP_PASSED: usize = 10;

/// Characters of captured stderr shown per failed feature
const STDERR_PREVIEW: usize = 200;

/// Formats run progress and summaries for the terminal
pub struct SummaryFormatter {
    colorize: bool,
}

impl SummaryFormatter {
    pub fn new() -> Self {
        Self { colorize: true }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    /// Framed section title
    pub fn banner(&self, message: &str) -> String {
        let rule = "=".repeat(BANNER_WIDTH);
        format!("\n{rule}\n  {message}\n{rule}\n")
    }

    /// Run header printed before discovery
    pub fn header(
        &self,
        cpu_count: usize,
        workers: usize,
        format: OutputFormat,
        tag: Option<&str>,
    ) -> String {
        let mut output = self.banner("Parallel Test Execution");
        output.push_str(&format!("CPU Cores Available: {cpu_count}\n"));
        output.push_str(&format!("Parallel Workers:    {workers}\n"));
        output.push_str(&format!("Output Format:       {format}\n"));
        if let Some(tag) = tag {
            let tag = normalize_tag(tag);
            output.push_str(&format!("Tag Filter:          @{tag}\n"));
        }
        output
    }

    /// One line per completed task
    pub fn progress(&self, result: &TaskResult, completed: usize, total: usize) -> String {
        format!(
            "[{}/{}] {}: {} ({:.2}s)",
            completed,
            total,
            result.feature,
            self.status(result),
            result.duration
        )
    }

    /// Wall-clock completion and speedup lines
    pub fn completion(&self, stats: &RunStatistics) -> String {
        let rule = "=".repeat(BANNER_WIDTH);
        format!(
            "\n{rule}\nParallel execution completed in {:.2}s ({:.2}m)\n{rule}\n\n\
             Speedup: {:.2}x faster than sequential\n(Sequential would take: {:.2}m)",
            stats.parallel_duration,
            stats.parallel_duration / 60.0,
            stats.speedup,
            stats.total_duration / 60.0
        )
    }

    /// Statistics block followed by failed and slowest passed features
    pub fn results(&self, results: &[TaskResult], stats: &RunStatistics) -> String {
        let mut output = self.banner("Parallel Execution Results");

        let failed = if self.colorize && stats.failed_features > 0 {
            format!("\x1b[31m{}\x1b[0m", stats.failed_features)
        } else {
            stats.failed_features.to_string()
        };

        let _ = writeln!(output, "Total Features:     {}", stats.total_features);
        let _ = writeln!(output, "Passed:             {}", stats.passed_features);
        let _ = writeln!(output, "Failed:             {failed}");
        let _ = writeln!(output, "Success Rate:       {:.1}%", stats.success_rate());
        let _ = writeln!(
            output,
            "\nTotal Duration:     {:.2}s ({:.2}m)",
            stats.total_duration,
            stats.total_duration / 60.0
        );
        let _ = writeln!(output, "Longest Feature:    {:.2}s", stats.max_duration);
        let _ = writeln!(output, "Shortest Feature:   {:.2}s", stats.min_duration);
        let _ = writeln!(output, "Average Duration:   {:.2}s", stats.avg_duration);
        let _ = writeln!(
            output,
            "Percentiles:        p50={:.2}s p90={:.2}s p95={:.2}s",
            stats.percentiles.p50, stats.percentiles.p90, stats.percentiles.p95
        );

        let failed: Vec<&TaskResult> = results.iter().filter(|r| !r.success).collect();
        if !failed.is_empty() {
            output.push_str(&self.banner("Failed Features"));
            for result in failed {
                let _ = writeln!(output, "\n- {}", result.feature);
                let _ = writeln!(output, "  Worker: {}", result.worker_id);
                let _ = writeln!(output, "  Duration: {:.2}s", result.duration);
                if let Some(error) = &result.error {
                    let _ = writeln!(output, "  Error: {error}");
                }
                if !result.stderr.is_empty() {
                    let preview: String = result.stderr.chars().take(STDERR_PREVIEW).collect();
                    let _ = writeln!(output, "  Stderr: {preview}");
                }
            }
        }

        let mut passed: Vec<&TaskResult> = results.iter().filter(|r| r.success).collect();
        if !passed.is_empty() {
            passed.sort_by(|a, b| {
                b.duration
                    .partial_cmp(&a.duration)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            output.push_str(&self.banner("Passed Features"));
            for result in passed.into_iter().take(TOP_PASSED) {
                let _ = writeln!(output, "- {}: {:.2}s", result.feature, result.duration);
            }
        }

        output
    }

    /// Closing verdict
    pub fn verdict(&self, stats: &RunStatistics) -> String {
        match (stats.all_passed(), self.colorize) {
            (true, true) => "\n\x1b[32mAll tests passed!\x1b[0m".to_string(),
            (true, false) => "\nAll tests passed!".to_string(),
            (false, true) => "\n\x1b[31mSome tests failed!\x1b[0m".to_string(),
            (false, false) => "\nSome tests failed!".to_string(),
        }
    }

    fn status(&self, result: &TaskResult) -> String {
        let label = result.status_label();
        if !self.colorize {
            return label.to_string();
        }

        if result.success {
            format!("\x1b[32m{label}\x1b[0m")
        } else {
            format!("\x1b[31m{label}\x1b[0m")
        }
    }
}

impl Default for SummaryFormatter {
    fn default() -> Self {
        Self::new()
    }
}
