//! Feature file models
//!
//! Defines feature units, output formats, and worker assignments.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Result format requested from the external runner
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain structured JSON
    #[default]
    Json,
    /// JSON plus Allure rich-trace artifacts
    Allure,
}

impl OutputFormat {
    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Allure => "allure",
        }
    }

    /// Whether a rich-trace artifact directory is produced
    pub fn has_artifacts(&self) -> bool {
        matches!(self, OutputFormat::Allure)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single feature file selected for execution
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureUnit {
    path: PathBuf,
    name: String,
    tags: BTreeSet<String>,
}

impl FeatureUnit {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self {
            path,
            name,
            tags: BTreeSet::new(),
        }
    }

    /// Build a feature unit, collecting `@tag` tokens from the file content
    pub fn from_content(path: impl Into<PathBuf>, content: &str) -> Self {
        let mut unit = Self::new(path);
        unit.tags = extract_tags(content);
        unit
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Feature identifier (file stem)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }
}

impl fmt::Display for FeatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Collect the `@tag` tokens appearing in feature text
fn extract_tags(content: &str) -> BTreeSet<String> {
    content
        .lines()
        .map(str::trim_start)
        .filter(|line| line.starts_with('@'))
        .flat_map(|line| line.split_whitespace())
        .filter_map(|token| token.strip_prefix('@'))
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// A feature paired with its worker slot and requested format
#[derive(Clone, Debug)]
pub struct WorkerAssignment {
    pub feature: FeatureUnit,
    pub worker_id: usize,
    pub format: OutputFormat,
}

impl WorkerAssignment {
    pub fn new(feature: FeatureUnit, worker_id: usize, format: OutputFormat) -> Self {
        Self {
            feature,
            worker_id,
            format,
        }
    }

    /// Assign features to worker slots round-robin (`index mod workers`)
    pub fn round_robin(
        features: Vec<FeatureUnit>,
        workers: usize,
        format: OutputFormat,
    ) -> Vec<WorkerAssignment> {
        let workers = workers.max(1);
        features
            .into_iter()
            .enumerate()
            .map(|(i, feature)| WorkerAssignment::new(feature, i % workers, format))
            .collect()
    }
}
