//! Atomic file copy and move

use crate::types::{map_io_error, Attributes, FerryError};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

/// Copy a file atomically using the write-then-rename strategy
///
/// 1. Write to a temporary `<name>.ferry-part` file next to the destination
/// 2. Flush and sync to disk
/// 3. Preserve metadata (permissions, mtime)
/// 4. Rename onto the final destination
///
/// Returns the number of bytes copied.
///
/// # Example
/// ```no_run
/// use ferry::executor::copy_file_atomic;
/// use std::path::Path;
///
/// let bytes = copy_file_atomic(Path::new("source.txt"), Path::new("dest.txt"))?;
/// # Ok::<(), ferry::types::FerryError>(())
/// ```
pub fn copy_file_atomic(src: &Path, dest: &Path) -> Result<u64, FerryError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| map_io_error(parent, e))?;
    }

    let part_path = part_path_for(dest);

    let result = write_part(src, &part_path).and_then(|bytes| {
        fs::rename(&part_path, dest).map_err(|e| map_io_error(dest, e))?;
        Ok(bytes)
    });

    if result.is_err() {
        let _ = fs::remove_file(&part_path);
    }
    result
}

fn write_part(src: &Path, part_path: &Path) -> Result<u64, FerryError> {
    let mut src_file = File::open(src).map_err(|e| map_io_error(src, e))?;
    let mut part_file = File::create(part_path).map_err(|e| map_io_error(part_path, e))?;

    let mut buffer = vec![0u8; 128 * 1024];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = src_file.read(&mut buffer).map_err(|e| map_io_error(src, e))?;

        if bytes_read == 0 {
            break;
        }

        part_file
            .write_all(&buffer[0..bytes_read])
            .map_err(|e| map_io_error(part_path, e))?;
        total_bytes += bytes_read as u64;
    }

    part_file.sync_all().map_err(|e| map_io_error(part_path, e))?;

    // Drop the file handle before rename (required on Windows)
    drop(part_file);

    let src_metadata = fs::metadata(src).map_err(|e| map_io_error(src, e))?;
    fs::set_permissions(part_path, src_metadata.permissions())
        .map_err(|e| map_io_error(part_path, e))?;

    let mtime = src_metadata.modified().map_err(|e| map_io_error(src, e))?;
    filetime::set_file_mtime(part_path, filetime::FileTime::from_system_time(mtime))
        .map_err(|e| map_io_error(part_path, e))?;

    Ok(total_bytes)
}

fn part_path_for(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(OsString::from).unwrap_or_default();
    name.push(".ferry-part");
    dest.with_file_name(name)
}

/// Move a file, preferring a rename.
///
/// When source and destination live on different devices the file is copied
/// atomically and the source removed afterwards; the source is never removed
/// if the copy fails.
pub fn move_file(src: &Path, dest: &Path) -> Result<(), FerryError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| map_io_error(parent, e))?;
    }

    match fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            copy_file_atomic(src, dest)?;
            fs::remove_file(src).map_err(|e| map_io_error(src, e))
        }
        Err(e) => Err(map_io_error(src, e)),
    }
}

/// Copy the attribute bits of `src` onto `dest`
pub fn copy_attributes(src: &Path, dest: &Path) -> Result<(), FerryError> {
    let attributes = Attributes::read(src).map_err(|e| map_io_error(src, e))?;
    attributes
        .apply_to(dest)
        .map_err(|e| map_io_error(dest, e))
}

/// Remove any filesystem entry at `path`.
///
/// Directories are removed recursively; files and symlinks are removed as files.
pub fn remove_path_any(path: &Path) -> Result<(), FerryError> {
    let metadata = fs::symlink_metadata(path).map_err(|e| map_io_error(path, e))?;
    if metadata.file_type().is_dir() {
        fs::remove_dir_all(path).map_err(|e| map_io_error(path, e))
    } else {
        fs::remove_file(path).map_err(|e| map_io_error(path, e))
    }
}
