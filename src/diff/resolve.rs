//! Conflict resolution for copy, move and one-way sync

use super::compare::{directories_equal, files_equal};
use super::path::unique_path;
use crate::context::RunContext;
use crate::types::{CompareSpec, ConflictPolicy, Decision, DestState, Entry, FerryError};
use crate::ui::ConflictAnswer;
use std::path::{Path, PathBuf};

/// Outcome of resolving one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub decision: Decision,

    /// Where the entry goes; differs from the mapped path only for `Rename`
    pub destination: PathBuf,

    /// For directories: whether traversal should still visit the children
    pub descend: bool,
}

/// Decides what happens to an entry whose destination may already exist.
///
/// The policy escalates: a yes-to-all or no-to-all answer turns `Ask` into
/// `Overwrite` or `Skip` for the rest of the run.
#[derive(Debug, Clone)]
pub struct ConflictResolver {
    policy: ConflictPolicy,
    compare: CompareSpec,
    structure_only: bool,
}

impl ConflictResolver {
    pub fn new(policy: ConflictPolicy, compare: CompareSpec, structure_only: bool) -> Self {
        Self {
            policy,
            compare,
            structure_only,
        }
    }

    #[cfg(test)]
    pub(crate) fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    pub fn resolve(
        &mut self,
        ctx: &mut RunContext,
        entry: &Entry,
        dest: &Path,
        dest_state: DestState,
    ) -> Result<Resolution, FerryError> {
        let (source, is_dir) = (entry.path.as_path(), entry.is_dir);
        let resolution = |decision: Decision, destination: PathBuf, descend: bool| Resolution {
            decision,
            destination,
            descend,
        };

        if dest_state == DestState::Absent {
            return Ok(resolution(Decision::Add, dest.to_path_buf(), self.structure_only));
        }

        if is_dir
            && dest_state == DestState::DirectoryExists
            && directories_equal(&entry.attributes, dest)?
        {
            // Children still need their own decisions.
            return Ok(resolution(Decision::Skip, dest.to_path_buf(), true));
        }

        if !is_dir
            && dest_state == DestState::FileExists
            && files_equal(source, dest, &self.compare)?
        {
            return Ok(resolution(Decision::Skip, dest.to_path_buf(), false));
        }

        let decision = self.dispatch(ctx, is_dir, dest, dest_state);
        let destination = if decision == Decision::Rename {
            let renamed = unique_path(dest, is_dir, |candidate| {
                DestState::probe(candidate).exists() || ctx.is_reserved(candidate)
            });
            ctx.reserve(renamed.clone());
            renamed
        } else {
            dest.to_path_buf()
        };

        // A full-mode decision covers the whole subtree. A declined attribute
        // update leaves the children to their own decisions; a declined type
        // mismatch does not.
        let descend = match decision {
            Decision::Add | Decision::Overwrite | Decision::Rename => self.structure_only,
            Decision::Skip => {
                self.structure_only && is_dir && dest_state == DestState::DirectoryExists
            }
            Decision::Delete | Decision::Cancel => false,
        };

        tracing::debug!(
            source = %source.display(),
            dest = %destination.display(),
            ?decision,
            "conflict resolved"
        );
        Ok(resolution(decision, destination, descend))
    }

    fn dispatch(
        &mut self,
        ctx: &mut RunContext,
        is_dir: bool,
        dest: &Path,
        dest_state: DestState,
    ) -> Decision {
        match self.policy {
            ConflictPolicy::Overwrite => Decision::Overwrite,
            ConflictPolicy::Skip => Decision::Skip,
            ConflictPolicy::Rename => Decision::Rename,
            ConflictPolicy::Ask => {
                let question = self.question(is_dir, dest_state);
                match ctx.prompter().ask_conflict(question, dest) {
                    ConflictAnswer::Yes => Decision::Overwrite,
                    ConflictAnswer::YesToAll => {
                        self.policy = ConflictPolicy::Overwrite;
                        Decision::Overwrite
                    }
                    ConflictAnswer::No | ConflictAnswer::None => Decision::Skip,
                    ConflictAnswer::NoToAll => {
                        self.policy = ConflictPolicy::Skip;
                        Decision::Skip
                    }
                    ConflictAnswer::Cancel => {
                        ctx.cancel();
                        Decision::Cancel
                    }
                }
            }
        }
    }

    fn question(&self, is_dir: bool, dest_state: DestState) -> &'static str {
        match dest_state {
            DestState::DirectoryExists if is_dir && self.structure_only => {
                "Update directory attributes?"
            }
            DestState::DirectoryExists => "Overwrite directory?",
            _ => "Overwrite file?",
        }
    }
}
