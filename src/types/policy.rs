//! Policies and modes chosen once per run

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How to treat a destination that is already occupied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Prompt for every conflict until an "all" answer is given
    #[default]
    Ask,
    Overwrite,
    Skip,
    /// Place the entry next to the existing one under a numbered name
    Rename,
}

/// Which side wins a two-way conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncPreference {
    Source,
    Target,
    #[default]
    Ask,
}

impl SyncPreference {
    /// Preference as seen after source and target swap roles
    pub fn flipped(self) -> Self {
        match self {
            SyncPreference::Source => SyncPreference::Target,
            SyncPreference::Target => SyncPreference::Source,
            SyncPreference::Ask => SyncPreference::Ask,
        }
    }
}

/// Sync flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    /// One-way, additive; never deletes
    #[default]
    Contribute,
    /// One-way; target entries missing from source are deleted
    Mirror,
    /// Two-way reconciliation
    Synchronize,
}

/// How file content travels to the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transfer {
    #[default]
    Copy,
    Move,
}

/// Which entry kinds the enumerator yields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchTarget {
    #[default]
    All,
    Files,
    Directories,
}

impl SearchTarget {
    pub fn accepts(self, is_dir: bool) -> bool {
        match self {
            SearchTarget::All => true,
            SearchTarget::Files => !is_dir,
            SearchTarget::Directories => is_dir,
        }
    }
}

/// One property that can take part in file comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompareProperty {
    /// Compare files by name only
    None,
    Attributes,
    Size,
    #[value(alias = "mt")]
    ModifiedTime,
    Content,
}

/// Properties that decide whether an existing destination file is already equal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareSpec {
    pub attributes: bool,
    pub size: bool,
    pub modified_time: bool,
    pub content: bool,
}

impl CompareSpec {
    /// Compare by name only: an existing file is never "equal"
    pub const fn none() -> Self {
        Self {
            attributes: false,
            size: false,
            modified_time: false,
            content: false,
        }
    }

    /// Build a spec from a property list; `none` clears everything listed before it
    pub fn from_properties(properties: &[CompareProperty]) -> Self {
        let mut spec = Self::none();
        for property in properties {
            match property {
                CompareProperty::None => spec = Self::none(),
                CompareProperty::Attributes => spec.attributes = true,
                CompareProperty::Size => spec.size = true,
                CompareProperty::ModifiedTime => spec.modified_time = true,
                CompareProperty::Content => spec.content = true,
            }
        }
        spec
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::none()
    }
}

impl Default for CompareSpec {
    fn default() -> Self {
        Self {
            size: true,
            modified_time: true,
            ..Self::none()
        }
    }
}
