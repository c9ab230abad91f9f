//! Configuration management

mod cli;
mod file;

pub use cli::{Cli, Command, CommonArgs, CopyArgs, SyncArgs};
pub use file::FileConfig;

use crate::diff::check_roots_disjoint;
use crate::types::{
    CompareSpec, ConflictPolicy, FerryError, SearchTarget, SyncMode, SyncPreference, Transfer,
};
use std::path::PathBuf;

/// Which command is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operation {
    #[default]
    Copy,
    Move,
    Sync,
}

impl Operation {
    pub fn transfer(self) -> Transfer {
        match self {
            Operation::Move => Transfer::Move,
            Operation::Copy | Operation::Sync => Transfer::Copy,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Operation::Copy => "copy",
            Operation::Move => "move",
            Operation::Sync => "sync",
        }
    }
}

/// Global configuration for ferry
#[derive(Debug, Clone)]
pub struct Config {
    pub operation: Operation,

    /// Source roots (exactly one for sync)
    pub sources: Vec<PathBuf>,

    /// Destination root
    pub target: PathBuf,

    /// Report intended changes without touching storage
    pub dry_run: bool,

    /// Copy matched files directly into the target root
    pub flatten: bool,

    /// Copy directory skeletons and individually matched files only
    pub structure_only: bool,

    /// When an existing destination file counts as equal
    pub compare: CompareSpec,

    pub conflict_policy: ConflictPolicy,

    pub sync_mode: SyncMode,

    /// In two-way sync, let the newer file win before consulting the preference
    pub prefer_newer: bool,

    pub sync_preference: SyncPreference,

    /// Include globs, matched against paths relative to the source root
    pub include_patterns: Vec<String>,

    /// Exclude globs (gitignore syntax)
    pub exclude_patterns: Vec<String>,

    pub search_target: SearchTarget,

    /// Honor .gitignore, .ignore and git excludes in addition to .ferryignore
    pub respect_ignore_files: bool,

    /// Suppress per-entry lines
    pub quiet: bool,

    /// Suppress SKP lines
    pub omit_skipped: bool,

    /// Print the final counters as JSON
    pub json_summary: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            operation: Operation::Copy,
            sources: Vec::new(),
            target: PathBuf::new(),
            dry_run: false,
            flatten: false,
            structure_only: false,
            compare: CompareSpec::default(),
            conflict_policy: ConflictPolicy::Ask,
            sync_mode: SyncMode::Contribute,
            prefer_newer: false,
            sync_preference: SyncPreference::Ask,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            search_target: SearchTarget::All,
            respect_ignore_files: false,
            quiet: false,
            omit_skipped: false,
            json_summary: false,
        }
    }
}

impl Config {
    /// Sync never copies whole directories
    pub fn effective_structure_only(&self) -> bool {
        self.structure_only || self.operation == Operation::Sync
    }

    /// Validate configuration.
    ///
    /// Runs before any traversal; a failure means nothing was touched.
    pub fn validate(&self) -> Result<(), FerryError> {
        if self.sources.is_empty() {
            return Err(FerryError::Validation(
                "At least one source directory is required".to_string(),
            ));
        }

        if self.target.as_os_str().is_empty() {
            return Err(FerryError::Validation(
                "A target directory is required (--target)".to_string(),
            ));
        }

        if self.operation == Operation::Sync {
            if self.sources.len() != 1 {
                return Err(FerryError::Validation(format!(
                    "Sync takes exactly one source directory, got {}",
                    self.sources.len()
                )));
            }

            if self.flatten {
                return Err(FerryError::Validation(
                    "Flatten cannot be used with sync".to_string(),
                ));
            }
        }

        for source in &self.sources {
            if !source.exists() {
                return Err(FerryError::Validation(format!(
                    "Source path does not exist: {}",
                    source.display()
                )));
            }

            if !source.is_dir() {
                return Err(FerryError::Validation(format!(
                    "Source path is not a directory: {}",
                    source.display()
                )));
            }

            check_roots_disjoint(source, &self.target)?;
        }

        if self.target.is_file() {
            return Err(FerryError::Validation(format!(
                "Target path is a file: {}",
                self.target.display()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_for(source: PathBuf, target: PathBuf) -> Config {
        Config {
            sources: vec![source],
            target,
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_accepts_disjoint_roots() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let src = temp_dir.path().join("src");
        fs::create_dir(&src).expect("create src");

        let config = config_for(src, temp_dir.path().join("dst"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_source() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let config = config_for(temp_dir.path().join("missing"), temp_dir.path().join("dst"));

        let err = config.validate().expect_err("missing source must fail");
        assert!(err.is_validation_error());
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_validate_rejects_nested_target() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let src = temp_dir.path().join("src");
        fs::create_dir(&src).expect("create src");

        let config = config_for(src.clone(), src.join("inner"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_sync_needs_single_source() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let a = temp_dir.path().join("a");
        let b = temp_dir.path().join("b");
        fs::create_dir(&a).expect("create a");
        fs::create_dir(&b).expect("create b");

        let config = Config {
            operation: Operation::Sync,
            sources: vec![a, b],
            target: temp_dir.path().join("dst"),
            ..Default::default()
        };
        let err = config.validate().expect_err("two sources must fail");
        assert!(err.to_string().contains("exactly one"));
    }

    #[test]
    fn test_validate_sync_rejects_flatten() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let src = temp_dir.path().join("src");
        fs::create_dir(&src).expect("create src");

        let config = Config {
            operation: Operation::Sync,
            flatten: true,
            ..config_for(src, temp_dir.path().join("dst"))
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sync_is_always_structure_only() {
        let config = Config {
            operation: Operation::Sync,
            ..Default::default()
        };
        assert!(config.effective_structure_only());
        assert!(!Config::default().effective_structure_only());
    }
}
