//! Error types for ferry

use std::io::{Error as IoError, ErrorKind};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error types for ferry operations
#[derive(Debug, Error)]
pub enum FerryError {
    /// Standard IO error (automatically converted via #[from])
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error (checked before any mutation)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Permission denied for specific path
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Entry vanished between enumeration and processing
    #[error("Not found: {path}")]
    NotFound { path: PathBuf },

    /// Disk full error
    #[error("Disk full while writing {path}")]
    DiskFull { path: PathBuf },

    /// Directory traversal failed below `path`
    #[error("Traversal error at {path}: {message}")]
    Walk { path: PathBuf, message: String },
}

impl FerryError {
    /// Check if this error is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(self, FerryError::Validation(_) | FerryError::Config(_))
    }

    /// Path the error is about, when it carries one
    pub fn path(&self) -> Option<&Path> {
        match self {
            FerryError::PermissionDenied { path }
            | FerryError::NotFound { path }
            | FerryError::DiskFull { path }
            | FerryError::Walk { path, .. } => Some(path),
            FerryError::Io(_) | FerryError::Config(_) | FerryError::Validation(_) => None,
        }
    }

    /// Short label used when grouping errors in the run summary.
    pub fn kind_label(&self) -> &'static str {
        match self {
            FerryError::Io(_) => "I/O error",
            FerryError::Config(_) => "Configuration error",
            FerryError::Validation(_) => "Validation error",
            FerryError::PermissionDenied { .. } => "Permission denied",
            FerryError::NotFound { .. } => "Not found",
            FerryError::DiskFull { .. } => "Disk full",
            FerryError::Walk { .. } => "Traversal error",
        }
    }
}

/// Attach the offending path to a raw I/O error.
pub fn map_io_error(path: &Path, error: IoError) -> FerryError {
    if matches!(error.kind(), ErrorKind::PermissionDenied) {
        FerryError::PermissionDenied {
            path: path.to_path_buf(),
        }
    } else if matches!(error.kind(), ErrorKind::NotFound) {
        FerryError::NotFound {
            path: path.to_path_buf(),
        }
    } else if matches!(error.kind(), ErrorKind::StorageFull)
        || matches!(error.raw_os_error(), Some(28 | 122))
    {
        FerryError::DiskFull {
            path: path.to_path_buf(),
        }
    } else {
        FerryError::Io(error)
    }
}
