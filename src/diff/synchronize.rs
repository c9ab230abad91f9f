//! Two-way arbitration: which side of a pair wins

use super::compare::{compare_modified, directories_equal, files_equal};
use crate::context::RunContext;
use crate::types::{CompareSpec, DestState, Entry, FerryError, SyncPreference};
use crate::ui::PreferenceAnswer;
use std::cmp::Ordering;
use std::path::Path;

/// Side whose content is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    Source,
    Target,
}

/// Result of arbitrating one pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Both sides already agree, or the operator declined to choose
    Unchanged,
    Win(Winner),
    Cancel,
}

/// Per-entry decision maker for `synchronize` mode.
///
/// Holds the escalating [`SyncPreference`]: an "always" answer fixes the
/// preference for the rest of the run.
#[derive(Debug, Clone)]
pub struct SyncArbiter {
    preference: SyncPreference,
    prefer_newer: bool,
    compare: CompareSpec,
}

impl SyncArbiter {
    pub fn new(preference: SyncPreference, prefer_newer: bool, compare: CompareSpec) -> Self {
        Self {
            preference,
            prefer_newer,
            compare,
        }
    }

    #[cfg(test)]
    pub(crate) fn preference(&self) -> SyncPreference {
        self.preference
    }

    /// Swap the meaning of source and target for the reverse pass
    pub fn flip(&mut self) {
        self.preference = self.preference.flipped();
    }

    pub fn arbitrate(
        &mut self,
        ctx: &mut RunContext,
        entry: &Entry,
        dest: &Path,
        dest_state: DestState,
    ) -> Result<Verdict, FerryError> {
        let source = entry.path.as_path();
        if dest_state == DestState::Absent {
            return Ok(Verdict::Win(Winner::Source));
        }

        match (entry.is_dir, dest_state) {
            (true, DestState::DirectoryExists) if directories_equal(&entry.attributes, dest)? => {
                return Ok(Verdict::Unchanged);
            }
            (false, DestState::FileExists) => {
                if files_equal(source, dest, &self.compare)? {
                    return Ok(Verdict::Unchanged);
                }

                if self.prefer_newer {
                    match compare_modified(source, dest)? {
                        Ordering::Greater => return Ok(Verdict::Win(Winner::Source)),
                        Ordering::Less => return Ok(Verdict::Win(Winner::Target)),
                        Ordering::Equal => {}
                    }
                }
            }
            _ => {}
        }

        let verdict = match self.preference {
            SyncPreference::Source => Verdict::Win(Winner::Source),
            SyncPreference::Target => Verdict::Win(Winner::Target),
            SyncPreference::Ask => match ctx.prompter().ask_preference(source, dest) {
                PreferenceAnswer::Source => Verdict::Win(Winner::Source),
                PreferenceAnswer::AlwaysSource => {
                    self.preference = SyncPreference::Source;
                    Verdict::Win(Winner::Source)
                }
                PreferenceAnswer::Target => Verdict::Win(Winner::Target),
                PreferenceAnswer::AlwaysTarget => {
                    self.preference = SyncPreference::Target;
                    Verdict::Win(Winner::Target)
                }
                PreferenceAnswer::Cancel => {
                    ctx.cancel();
                    Verdict::Cancel
                }
                PreferenceAnswer::None => Verdict::Unchanged,
            },
        };

        tracing::debug!(
            source = %source.display(),
            dest = %dest.display(),
            ?verdict,
            "sync arbitrated"
        );
        Ok(verdict)
    }
}
