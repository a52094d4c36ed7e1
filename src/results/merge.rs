//! Merging of per-worker outputs into the canonical result documents

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::RunnerConfig;
use crate::models::TaskResult;

/// Outcome of a JSON merge
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Per-task files that were read successfully
    pub sources: usize,
    /// Documents written to the merged array
    pub documents: usize,
    pub path: PathBuf,
}

impl MergeOutcome {
    pub fn is_empty(&self) -> bool {
        self.documents == 0
    }
}

/// Combines per-task outputs after all tasks have returned
pub struct ResultMerger {
    results_path: PathBuf,
    artifacts_path: PathBuf,
}

impl ResultMerger {
    pub fn new(config: &RunnerConfig) -> Self {
        Self {
            results_path: config.merged_results_path(),
            artifacts_path: config.merged_artifacts_path(),
        }
    }

    pub fn artifacts_path(&self) -> &Path {
        &self.artifacts_path
    }

    /// Concatenate every readable per-task JSON document, in arrival order,
    /// into one pretty-printed array.
    pub fn merge_json(&self, results: &[TaskResult]) -> Result<MergeOutcome> {
        let mut merged: Vec<Value> = Vec::new();
        let mut sources = 0;

        for result in results {
            let Some(path) = &result.json_output else {
                continue;
            };

            match read_document(path) {
                Ok(Value::Array(items)) => {
                    merged.extend(items);
                    sources += 1;
                }
                Ok(document) => {
                    merged.push(document);
                    sources += 1;
                }
                Err(e) => warn!("Skipping results of {}: {:#}", result.feature, e),
            }
        }

        if let Some(parent) = self.results_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let file = File::create(&self.results_path)
            .with_context(|| format!("Failed to create {}", self.results_path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &merged)
            .context("Failed to write merged results")?;
        writer.flush().context("Failed to flush merged results")?;

        info!(
            "Merged {} documents from {} files into {}",
            merged.len(),
            sources,
            self.results_path.display()
        );

        Ok(MergeOutcome {
            sources,
            documents: merged.len(),
            path: self.results_path.clone(),
        })
    }

    /// Rebuild the merged artifact directory from every distinct per-task
    /// artifact directory. Returns the number of files copied.
    pub fn merge_artifacts(&self, results: &[TaskResult]) -> Result<usize> {
        if self.artifacts_path.exists() {
            fs::remove_dir_all(&self.artifacts_path).with_context(|| {
                format!("Failed to clear {}", self.artifacts_path.display())
            })?;
        }
        fs::create_dir_all(&self.artifacts_path)
            .with_context(|| format!("Failed to create {}", self.artifacts_path.display()))?;

        let mut seen = HashSet::new();
        let mut copied = 0;

        for dir in results.iter().filter_map(|r| r.allure_output.as_deref()) {
            if !seen.insert(dir.to_path_buf()) {
                continue;
            }
            if !dir.is_dir() {
                warn!("Artifact directory {} not found", dir.display());
                continue;
            }

            copied += self.copy_files(dir)?;
        }

        info!(
            "Merged {} artifact files into {}",
            copied,
            self.artifacts_path.display()
        );
        Ok(copied)
    }

    fn copy_files(&self, dir: &Path) -> Result<usize> {
        let mut copied = 0;

        let entries =
            fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?;
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }

            let target = self.artifacts_path.join(entry.file_name());
            fs::copy(entry.path(), &target)
                .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
            copied += 1;
        }

        debug!("Copied {} files from {}", copied, dir.display());
        Ok(copied)
    }
}

fn read_document(path: &Path) -> Result<Value> {
    let file = File::open(path).with_context(|| format!("{} not found", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("{} is not valid JSON", path.display()))
}
