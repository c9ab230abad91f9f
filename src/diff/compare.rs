//! File comparison logic

use crate::hash::same_content;
use crate::types::{map_io_error, Attributes, CompareSpec, FerryError};
use std::cmp::Ordering;
use std::fs;
use std::path::Path;

/// Whether an existing destination file is equal to the source under `spec`.
///
/// Checks run cheapest first and stop at the first difference:
///
/// 1. Attribute bits
/// 2. Size
/// 3. Modification time
/// 4. Content (blake3); files of different length are unequal without hashing
///
/// An empty spec compares by name only, so an existing file is never equal.
pub fn files_equal(source: &Path, dest: &Path, spec: &CompareSpec) -> Result<bool, FerryError> {
    if spec.is_empty() {
        return Ok(false);
    }

    let src_meta = fs::metadata(source).map_err(|e| map_io_error(source, e))?;
    let dest_meta = fs::metadata(dest).map_err(|e| map_io_error(dest, e))?;

    if spec.attributes
        && Attributes::from_metadata(&src_meta) != Attributes::from_metadata(&dest_meta)
    {
        return Ok(false);
    }

    if (spec.size || spec.content) && src_meta.len() != dest_meta.len() {
        return Ok(false);
    }

    if spec.modified_time {
        let src_mtime = src_meta.modified().map_err(|e| map_io_error(source, e))?;
        let dest_mtime = dest_meta.modified().map_err(|e| map_io_error(dest, e))?;
        if src_mtime != dest_mtime {
            return Ok(false);
        }
    }

    if spec.content {
        return same_content(source, dest);
    }

    Ok(true)
}

/// Whether an existing destination directory carries the source's attribute bits
pub fn directories_equal(source: &Attributes, dest: &Path) -> Result<bool, FerryError> {
    let dest_attrs = Attributes::read(dest).map_err(|e| map_io_error(dest, e))?;
    Ok(*source == dest_attrs)
}

/// Order two files by modification time (`Greater` means `source` is newer)
pub fn compare_modified(source: &Path, dest: &Path) -> Result<Ordering, FerryError> {
    let src_mtime = fs::metadata(source)
        .and_then(|m| m.modified())
        .map_err(|e| map_io_error(source, e))?;
    let dest_mtime = fs::metadata(dest)
        .and_then(|m| m.modified())
        .map_err(|e| map_io_error(dest, e))?;
    Ok(src_mtime.cmp(&dest_mtime))
}
