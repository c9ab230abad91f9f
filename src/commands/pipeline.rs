//! Per-entry pipeline shared by every command
//!
//! enumerate -> map -> probe -> decide -> apply, one entry at a time.

use crate::context::RunContext;
use crate::diff::{map_destination, ConflictResolver};
use crate::executor::Executor;
use crate::scanner::Enumerator;
use crate::types::{Decision, DestState, Entry, FerryError};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// What a handler did with one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handled {
    /// Where the entry ended up (or would have)
    pub destination: PathBuf,

    /// For directories: keep visiting the children
    pub descend: bool,
}

/// Decides and applies one entry
pub trait EntryHandler {
    fn handle(
        &mut self,
        ctx: &mut RunContext,
        entry: &Entry,
        dest: &Path,
    ) -> Result<Handled, FerryError>;
}

/// One enumeration of a source root against a target root
pub struct Pass<'a> {
    pub source_root: &'a Path,
    pub target_root: &'a Path,
    pub flatten: bool,

    /// Source paths to leave alone (the reverse pass of a two-way sync)
    pub ignored: Option<&'a HashSet<PathBuf>>,
}

impl Pass<'_> {
    /// Run the pass, optionally recording every destination it reconciled.
    ///
    /// Per-entry failures, unreadable subtrees included, are reported to the
    /// context and the pass goes on; only a failure to start enumerating is
    /// returned.
    pub fn run(
        &self,
        ctx: &mut RunContext,
        enumerator: &dyn Enumerator,
        handler: &mut dyn EntryHandler,
        mut visited: Option<&mut HashSet<PathBuf>>,
    ) -> Result<(), FerryError> {
        let entries = enumerator.entries(self.source_root)?;

        // Entries arrive depth-first, so a pruned subtree is contiguous.
        let mut pruned: Option<PathBuf> = None;
        let mut redirects: Vec<(PathBuf, PathBuf)> = Vec::new();

        for entry in entries {
            if ctx.is_canceled() {
                break;
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    let path = error.path().unwrap_or(self.source_root).to_path_buf();
                    ctx.record_error(&path, error);
                    continue;
                }
            };

            if let Some(prefix) = &pruned {
                if entry.path.starts_with(prefix) {
                    continue;
                }
                pruned = None;
            }

            if self.ignored.is_some_and(|ignored| ignored.contains(&entry.path)) {
                continue;
            }

            ctx.telemetry.matched += 1;

            let dest = match self.destination_for(&entry, &redirects) {
                Ok(dest) => dest,
                Err(error) => {
                    ctx.record_error(&entry.path, error);
                    continue;
                }
            };

            match handler.handle(ctx, &entry, &dest) {
                Ok(handled) => {
                    if entry.is_dir {
                        if !handled.descend {
                            pruned = Some(entry.path.clone());
                        } else if handled.destination != dest {
                            redirects.push((entry.path.clone(), handled.destination.clone()));
                        }
                    }
                    if let Some(visited) = visited.as_deref_mut() {
                        visited.insert(handled.destination);
                    }
                }
                Err(error) => {
                    ctx.record_error(&entry.path, error);
                    if entry.is_dir {
                        pruned = Some(entry.path.clone());
                    }
                }
            }
        }

        Ok(())
    }

    fn destination_for(
        &self,
        entry: &Entry,
        redirects: &[(PathBuf, PathBuf)],
    ) -> Result<PathBuf, FerryError> {
        let flattened = self.flatten && !entry.is_dir;
        if !flattened {
            let redirect = redirects
                .iter()
                .rev()
                .find(|(source_dir, _)| entry.path.starts_with(source_dir));
            if let Some((source_dir, dest_dir)) = redirect {
                if let Ok(relative) = entry.path.strip_prefix(source_dir) {
                    return Ok(dest_dir.join(relative));
                }
            }
        }

        map_destination(
            &entry.path,
            entry.is_dir,
            self.source_root,
            self.target_root,
            self.flatten,
        )
    }
}

/// Conflict-resolving handler used by copy, move, contribute and mirror
pub struct CopyHandler {
    resolver: ConflictResolver,
    executor: Executor,
}

impl CopyHandler {
    pub fn new(resolver: ConflictResolver, executor: Executor) -> Self {
        Self { resolver, executor }
    }
}

impl EntryHandler for CopyHandler {
    fn handle(
        &mut self,
        ctx: &mut RunContext,
        entry: &Entry,
        dest: &Path,
    ) -> Result<Handled, FerryError> {
        let dest_state = DestState::probe(dest);
        let resolution = self
            .resolver
            .resolve(ctx, entry, dest, dest_state)?;

        match resolution.decision {
            Decision::Cancel => {}
            Decision::Skip => ctx.record_skip(&resolution.destination),
            decision => self.executor.apply(
                ctx,
                decision,
                &entry.path,
                &resolution.destination,
                entry.is_dir,
                dest_state,
            )?,
        }

        Ok(Handled {
            destination: resolution.destination,
            descend: resolution.descend,
        })
    }
}
