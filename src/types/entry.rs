//! Entry - a single matched file or directory

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Basic attribute bits of a file system entry.
///
/// On unix these are the permission mode bits (`0o7777`); elsewhere only the
/// read-only flag is tracked.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Attributes {
    pub mode: u32,
    pub readonly: bool,
}

impl Attributes {
    /// Build attributes from already-fetched metadata
    pub fn from_metadata(metadata: &fs::Metadata) -> Self {
        let permissions = metadata.permissions();

        #[cfg(unix)]
        let mode = {
            use std::os::unix::fs::PermissionsExt;
            permissions.mode() & 0o7777
        };

        #[cfg(not(unix))]
        let mode = 0;

        Self {
            mode,
            readonly: permissions.readonly(),
        }
    }

    /// Read the attributes of `path` (symlinks are followed)
    pub fn read(path: &Path) -> io::Result<Self> {
        fs::metadata(path).map(|m| Self::from_metadata(&m))
    }

    /// Write these attribute bits onto `path`
    pub fn apply_to(&self, path: &Path) -> io::Result<()> {
        let mut permissions = fs::metadata(path)?.permissions();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            permissions.set_mode(self.mode);
        }

        #[cfg(not(unix))]
        permissions.set_readonly(self.readonly);

        fs::set_permissions(path, permissions)
    }
}

/// A source entry produced by the enumerator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    /// Full path of the entry (under its enumeration root)
    pub path: PathBuf,

    /// Whether the entry is a directory
    pub is_dir: bool,

    /// Attribute bits at enumeration time
    pub attributes: Attributes,
}

impl Entry {
    pub fn new(path: PathBuf, is_dir: bool, attributes: Attributes) -> Self {
        Self {
            path,
            is_dir,
            attributes,
        }
    }
}

/// What currently occupies a destination path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestState {
    Absent,
    FileExists,
    DirectoryExists,
}

impl DestState {
    /// Probe `path` without following a final symlink.
    ///
    /// A symlink counts as a file: replacing it never touches its target.
    pub fn probe(path: &Path) -> Self {
        match fs::symlink_metadata(path) {
            Ok(metadata) if metadata.is_dir() => DestState::DirectoryExists,
            Ok(_) => DestState::FileExists,
            Err(_) => DestState::Absent,
        }
    }

    pub fn exists(self) -> bool {
        self != DestState::Absent
    }
}
