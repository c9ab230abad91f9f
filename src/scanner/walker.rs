//! Sequential directory walker

use super::Enumerator;
use crate::config::Config;
use crate::types::{Attributes, Entry, FerryError, SearchTarget};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Name of the per-directory ignore file that is always honored
pub const IGNORE_FILE_NAME: &str = ".ferryignore";

/// Enumerator backed by the `ignore` crate.
///
/// Siblings are yielded in file-name order so runs are reproducible.
/// Symlinks are not followed; a symlink to a directory is skipped.
#[derive(Debug, Clone)]
pub struct WalkEnumerator {
    include: Option<GlobSet>,
    exclude_patterns: Vec<String>,
    search_target: SearchTarget,
    respect_ignore_files: bool,
}

impl WalkEnumerator {
    pub fn new(
        include_patterns: &[String],
        exclude_patterns: &[String],
        search_target: SearchTarget,
        respect_ignore_files: bool,
    ) -> Result<Self, FerryError> {
        let include = if include_patterns.is_empty() {
            None
        } else {
            let mut builder = GlobSetBuilder::new();
            for pattern in include_patterns {
                let glob = Glob::new(pattern).map_err(|e| {
                    FerryError::Config(format!("Invalid include pattern '{}': {}", pattern, e))
                })?;
                builder.add(glob);
            }
            Some(builder.build().map_err(|e| {
                FerryError::Config(format!("Failed to build include patterns: {}", e))
            })?)
        };

        Ok(Self {
            include,
            exclude_patterns: exclude_patterns.to_vec(),
            search_target,
            respect_ignore_files,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, FerryError> {
        Self::new(
            &config.include_patterns,
            &config.exclude_patterns,
            config.search_target,
            config.respect_ignore_files,
        )
    }

    fn build_walker(&self, root: &Path) -> Result<ignore::Walk, FerryError> {
        // The ignore crate's OverrideBuilder uses ! for exclusion
        let mut override_builder = ignore::overrides::OverrideBuilder::new(root);
        for pattern in &self.exclude_patterns {
            override_builder
                .add(&format!("!{}", pattern))
                .map_err(|e| {
                    FerryError::Config(format!("Invalid exclude pattern '{}': {}", pattern, e))
                })?;
        }
        let overrides = override_builder
            .build()
            .map_err(|e| FerryError::Config(format!("Failed to build exclude overrides: {}", e)))?;

        Ok(ignore::WalkBuilder::new(root)
            .standard_filters(self.respect_ignore_files)
            .hidden(false)
            .add_custom_ignore_filename(IGNORE_FILE_NAME)
            .overrides(overrides)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build())
    }

    fn accepts(&self, relative: &Path, is_dir: bool) -> bool {
        if !self.search_target.accepts(is_dir) {
            return false;
        }
        match &self.include {
            Some(include) => include.is_match(relative),
            None => true,
        }
    }
}

impl Enumerator for WalkEnumerator {
    fn entries<'a>(
        &'a self,
        root: &Path,
    ) -> Result<Box<dyn Iterator<Item = Result<Entry, FerryError>> + 'a>, FerryError> {
        let walker = self.build_walker(root)?;
        let root: PathBuf = root.to_path_buf();

        let iter = walker.filter_map(move |result| {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Error during directory traversal: {}. Continuing.", e);
                    return Some(Err(walk_error(e, &root)));
                }
            };

            if entry.depth() == 0 {
                return None;
            }

            let file_type = entry.file_type()?;
            if file_type.is_symlink() && entry.path().is_dir() {
                tracing::debug!(path = %entry.path().display(), "skipping directory symlink");
                return None;
            }
            let is_dir = file_type.is_dir();

            let relative = entry.path().strip_prefix(&root).ok()?;
            if !self.accepts(relative, is_dir) {
                return None;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => return Some(Err(walk_error(e, entry.path()))),
            };

            Some(Ok(Entry::new(
                entry.path().to_path_buf(),
                is_dir,
                Attributes::from_metadata(&metadata),
            )))
        });

        Ok(Box::new(iter))
    }
}

/// Everything found under a root by [`list_tree`]
#[derive(Debug, Default)]
pub struct TreeListing {
    pub directories: Vec<PathBuf>,
    pub files: Vec<PathBuf>,

    /// Subtrees that could not be read; the listing goes on without them
    pub errors: Vec<FerryError>,
}

/// Every directory and every non-directory under `root`, unfiltered.
///
/// No ignore files, overrides or hidden-file rules apply. Both lists come out
/// sorted, parents before children. Symlinks are listed as files.
pub fn list_tree(root: &Path) -> TreeListing {
    let walker = ignore::WalkBuilder::new(root)
        .standard_filters(false)
        .hidden(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut listing = TreeListing::default();
    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                listing.errors.push(walk_error(e, root));
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }
        match entry.file_type() {
            Some(file_type) if file_type.is_dir() => listing.directories.push(entry.into_path()),
            Some(_) => listing.files.push(entry.into_path()),
            None => {}
        }
    }

    listing
}

/// Attach the failing path to a walk error, falling back to `fallback`
fn walk_error(error: ignore::Error, fallback: &Path) -> FerryError {
    let path = error_path(&error).unwrap_or(fallback).to_path_buf();
    match error.io_error().map(|e| e.kind()) {
        Some(ErrorKind::PermissionDenied) => FerryError::PermissionDenied { path },
        Some(ErrorKind::NotFound) => FerryError::NotFound { path },
        _ => FerryError::Walk {
            path,
            message: error.to_string(),
        },
    }
}

fn error_path(error: &ignore::Error) -> Option<&Path> {
    match error {
        ignore::Error::WithPath { path, .. } => Some(path.as_path()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        ignore::Error::Loop { child, .. } => Some(child.as_path()),
        _ => None,
    }
}
