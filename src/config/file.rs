//! Optional TOML configuration file

use crate::types::{CompareProperty, ConflictPolicy, FerryError, SearchTarget, SyncMode, SyncPreference};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Settings read from `--config <file>`.
///
/// Keys mirror the long CLI flags. Anything set on the command line wins.
#[derive(Debug, Default, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    pub target: Option<PathBuf>,
    pub dry_run: Option<bool>,
    pub flatten: Option<bool>,
    pub structure_only: Option<bool>,
    pub compare: Option<Vec<CompareProperty>>,
    pub conflict: Option<ConflictPolicy>,
    pub mode: Option<SyncMode>,
    pub prefer_newer: Option<bool>,
    pub prefer: Option<SyncPreference>,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    pub kind: Option<SearchTarget>,
    pub ignore_files: Option<bool>,
    pub quiet: Option<bool>,
    pub hide_skipped: Option<bool>,
    pub summary_json: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, FerryError> {
        let content = fs::read_to_string(path).map_err(|e| {
            FerryError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content)
            .map_err(|e| FerryError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(content: &str) -> Result<Self, FerryError> {
        toml::from_str(content).map_err(|e| FerryError::Config(e.to_string()))
    }
}
