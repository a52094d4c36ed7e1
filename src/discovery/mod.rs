//! Feature discovery
//!
//! Enumerates `*.feature` files, optionally filtered by tag.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::models::FeatureUnit;

/// Extension of feature files
const FEATURE_EXTENSION: &str = "feature";

/// Configuration errors detected before any worker is dispatched
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Features directory not found: {0}")]
    MissingDirectory(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No feature files found in {dir}")]
    NoFeatures { dir: PathBuf, tag: Option<String> },
}

impl DiscoveryError {
    /// Operator hint shown with the error
    pub fn hint(&self) -> Option<String> {
        match self {
            DiscoveryError::NoFeatures { tag: Some(tag), .. } => {
                Some(format!("Make sure features are tagged with @{tag}"))
            }
            _ => None,
        }
    }
}

/// Normalise a user-supplied tag (`smoke` or `@smoke`)
pub fn normalize_tag(tag: &str) -> &str {
    tag.trim().trim_start_matches('@')
}

/// Find feature files in `dir`, keeping those whose text contains `@<tag>`
///
/// Files are returned sorted by path so dispatch order is deterministic.
pub fn discover_features(
    dir: &Path,
    tag: Option<&str>,
) -> Result<Vec<FeatureUnit>, DiscoveryError> {
    if !dir.is_dir() {
        return Err(DiscoveryError::MissingDirectory(dir.to_path_buf()));
    }

    let io_err = |source| DiscoveryError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && path.extension().map(|e| e == FEATURE_EXTENSION).unwrap_or(false) {
            paths.push(path);
        }
    }
    paths.sort();

    let tag = tag.map(normalize_tag).filter(|t| !t.is_empty());
    let needle = tag.map(|t| format!("@{t}"));

    let mut features = Vec::new();
    for path in paths {
        // Feature files are not guaranteed to be UTF-8
        let bytes = fs::read(&path).map_err(|source| DiscoveryError::Io {
            path: path.clone(),
            source,
        })?;
        let content = String::from_utf8_lossy(&bytes);

        if let Some(needle) = &needle {
            if !content.contains(needle.as_str()) {
                debug!("Skipping {} (no {})", path.display(), needle);
                continue;
            }
        }

        let feature = FeatureUnit::from_content(path, &content);
        debug!("Selected {} (tags: {:?})", feature, feature.tags());
        features.push(feature);
    }

    if features.is_empty() {
        return Err(DiscoveryError::NoFeatures {
            dir: dir.to_path_buf(),
            tag: tag.map(str::to_string),
        });
    }

    debug!("Discovered {} feature files in {}", features.len(), dir.display());
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_discover_all_sorted() {
        let dir = tempdir().unwrap();
        write(dir.path(), "b_contact.feature", "Feature: Contact\n");
        write(dir.path(), "a_home.feature", "Feature: Home\n");
        write(dir.path(), "notes.txt", "@smoke\n");

        let features = discover_features(dir.path(), None).unwrap();
        let names: Vec<&str> = features.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["a_home", "b_contact"]);
    }

    #[test]
    fn test_tag_filter_selects_tagged_file() {
        let dir = tempdir().unwrap();
        write(dir.path(), "home.feature", "@smoke\nFeature: Home\n");
        write(dir.path(), "about.feature", "@regression\nFeature: About\n");

        let features = discover_features(dir.path(), Some("smoke")).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].name(), "home");
        assert!(features[0].tags().contains("smoke"));

        let with_at = discover_features(dir.path(), Some("@smoke")).unwrap();
        assert_eq!(with_at.len(), 1);
    }

    #[test]
    fn test_non_utf8_feature_is_still_discovered() {
        let dir = tempdir().unwrap();
        write(dir.path(), "home.feature", "Feature: Home\n");
        fs::write(dir.path().join("latin1.feature"), b"@smoke\nFeature: Caf\xe9\n").unwrap();

        let features = discover_features(dir.path(), None).unwrap();
        let names: Vec<&str> = features.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["home", "latin1"]);

        let tagged = discover_features(dir.path(), Some("smoke")).unwrap();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].name(), "latin1");
    }

    #[test]
    fn test_no_match_is_configuration_error() {
        let dir = tempdir().unwrap();
        write(dir.path(), "home.feature", "Feature: Home\n");

        let err = discover_features(dir.path(), Some("smoke")).unwrap_err();
        assert!(matches!(err, DiscoveryError::NoFeatures { .. }));
        assert_eq!(
            err.hint().as_deref(),
            Some("Make sure features are tagged with @smoke")
        );
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempdir().unwrap();
        let err = discover_features(dir.path(), None).unwrap_err();
        assert!(matches!(err, DiscoveryError::NoFeatures { tag: None, .. }));
        assert!(err.hint().is_none());
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempdir().unwrap();
        let err = discover_features(&dir.path().join("nope"), None).unwrap_err();
        assert!(matches!(err, DiscoveryError::MissingDirectory(_)));
    }
}
