//! Destination path mapping

use crate::types::FerryError;
use std::env;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Destination of `source` when copying from `source_root` into `target_root`.
///
/// Directories always keep their relative position. Files keep it too unless
/// `flatten` is set, in which case they land directly in `target_root`.
pub fn map_destination(
    source: &Path,
    is_dir: bool,
    source_root: &Path,
    target_root: &Path,
    flatten: bool,
) -> Result<PathBuf, FerryError> {
    if flatten && !is_dir {
        let name = source.file_name().ok_or_else(|| {
            FerryError::Validation(format!("Entry has no file name: {}", source.display()))
        })?;
        return Ok(target_root.join(name));
    }

    let relative = source.strip_prefix(source_root).map_err(|_| {
        FerryError::Validation(format!(
            "{} is not under {}",
            source.display(),
            source_root.display()
        ))
    })?;
    Ok(target_root.join(relative))
}

/// First free variant of `path`, numbered from 2.
///
/// Files get the counter right before the extension (`a.txt` -> `a2.txt`);
/// a name without extension, a dot-file such as `.env` and every directory
/// get it appended (`.env2`, `dir2`). `is_taken` decides whether a candidate
/// is occupied.
pub fn unique_path(path: &Path, is_dir: bool, is_taken: impl Fn(&Path) -> bool) -> PathBuf {
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let name = path.file_name().map(OsString::from).unwrap_or_default();

    // Path::file_stem treats a leading dot as part of the stem, so `.env`
    // already has no extension here.
    let (stem, extension) = if is_dir {
        (name, None)
    } else {
        match (path.file_stem(), path.extension()) {
            (Some(stem), Some(ext)) => (stem.to_os_string(), Some(ext.to_os_string())),
            _ => (name, None),
        }
    };

    let mut counter: u64 = 2;
    loop {
        let mut candidate = stem.clone();
        candidate.push(counter.to_string());
        if let Some(ext) = &extension {
            candidate.push(".");
            candidate.push(ext);
        }

        let candidate = parent.join(candidate);
        if !is_taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Absolute, lexically normalized form of `path`.
///
/// `.` and `..` are resolved without touching the file system, so paths that
/// do not exist yet normalize too. Symlinks are not followed.
pub fn normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Fail when the two roots are equal or one contains the other
pub fn check_roots_disjoint(source: &Path, target: &Path) -> Result<(), FerryError> {
    let source_norm = normalize(source);
    let target_norm = normalize(target);

    if source_norm == target_norm {
        return Err(FerryError::Validation(format!(
            "Source and target are the same directory: {}",
            source_norm.display()
        )));
    }

    if source_norm.starts_with(&target_norm) || target_norm.starts_with(&source_norm) {
        return Err(FerryError::Validation(format!(
            "Source directory cannot be a subdirectory of the target or vice versa: {} / {}",
            source_norm.display(),
            target_norm.display()
        )));
    }

    Ok(())
}
