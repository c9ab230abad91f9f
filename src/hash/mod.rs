//! Hashing utilities

use crate::types::{map_io_error, FerryError};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Compute Blake3 hash of a file
///
/// The file is streamed in 64KB chunks so large files never sit in memory.
///
/// # Example
/// ```no_run
/// use ferry::hash::compute_hash;
/// use std::path::Path;
///
/// let hash = compute_hash(Path::new("file.txt"))?;
/// # Ok::<(), ferry::types::FerryError>(())
/// ```
pub fn compute_hash(file_path: &Path) -> Result<[u8; 32], FerryError> {
    let mut file = File::open(file_path).map_err(|e| map_io_error(file_path, e))?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; 64 * 1024];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| map_io_error(file_path, e))?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[0..bytes_read]);
    }

    Ok(*hasher.finalize().as_bytes())
}

/// Whether two files hash to the same content
pub fn same_content(a: &Path, b: &Path) -> Result<bool, FerryError> {
    Ok(compute_hash(a)? == compute_hash(b)?)
}
