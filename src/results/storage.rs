//! Run summary persistence
//!
//! Stores the statistics and task results of one run as JSON.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::models::{RunStatistics, TaskResult};

/// Persisted record of a complete run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    /// When the summary was recorded
    pub timestamp: DateTime<Local>,

    /// Worker pool size used for the run
    pub workers: usize,

    pub statistics: RunStatistics,

    /// Task results in completion order
    pub results: Vec<TaskResult>,
}

impl RunSummary {
    pub fn new(workers: usize, statistics: RunStatistics, results: Vec<TaskResult>) -> Self {
        Self {
            timestamp: Local::now(),
            workers,
            statistics,
            results,
        }
    }

    /// Save the summary, replacing any previous one
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let file = File::create(path).context("Failed to create summary file")?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self).context("Failed to write summary")?;
        writer.flush().context("Failed to flush summary")?;

        info!("Saved execution summary to {}", path.display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open summary file: {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file)).context("Failed to parse summary")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeatureUnit, OutputFormat, WorkerAssignment};
    use serde_json::Value;
    use std::time::Duration;
    use tempfile::tempdir;

    fn sample_results() -> Vec<TaskResult> {
        let passed = WorkerAssignment::new(FeatureUnit::new("features/home.feature"), 0, OutputFormat::Json);
        let failed = WorkerAssignment::new(FeatureUnit::new("features/cart.feature"), 1, OutputFormat::Json);
        vec![
            TaskResult::completed(&passed, 0, 12.5),
            TaskResult::timeout(&failed, 900),
        ]
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reports/parallel_execution_summary.json");

        let results = sample_results();
        let stats = RunStatistics::compute(&results, Duration::from_secs(900));
        let summary = RunSummary::new(2, stats.clone(), results);
        summary.save(&path).unwrap();

        let loaded = RunSummary::load(&path).unwrap();
        assert_eq!(loaded.workers, 2);
        assert_eq!(loaded.statistics, stats);
        assert_eq!(loaded.results.len(), 2);
        assert_eq!(loaded.results[1].error.as_deref(), Some("Timeout after 15 minutes"));
    }

    #[test]
    fn test_summary_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.json");

        let results = sample_results();
        let stats = RunStatistics::compute(&results, Duration::from_secs(900));
        RunSummary::new(2, stats, results).save(&path).unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let keys: Vec<&str> = raw.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 4);
        for key in ["timestamp", "workers", "statistics", "results"] {
            assert!(keys.contains(&key), "missing {key}");
        }
        assert_eq!(raw["statistics"]["failed_features"], 1);
        assert_eq!(raw["results"][0]["feature"], "home");
    }
}
