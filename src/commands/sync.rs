//! Sync command: contribute, mirror and two-way synchronize

use super::pipeline::{CopyHandler, EntryHandler, Handled, Pass};
use crate::config::Config;
use crate::context::RunContext;
use crate::diff::{ConflictResolver, SyncArbiter, Verdict, Winner};
use crate::executor::Executor;
use crate::scanner::{list_tree, Enumerator};
use crate::types::{Action, DestState, Entry, FerryError, SyncMode, Transfer};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Run one sync between the single source root and the target
pub fn run(
    config: &Config,
    ctx: &mut RunContext,
    enumerator: &dyn Enumerator,
) -> Result<(), FerryError> {
    let [source] = config.sources.as_slice() else {
        return Err(FerryError::Validation(
            "sync takes exactly one source directory".to_string(),
        ));
    };
    let target = config.target.as_path();
    let executor = Executor::new(Transfer::Copy, true);

    tracing::debug!(
        source = %source.display(),
        target = %target.display(),
        mode = ?config.sync_mode,
        "starting sync"
    );

    let forward = Pass {
        source_root: source,
        target_root: target,
        flatten: false,
        ignored: None,
    };

    match config.sync_mode {
        SyncMode::Contribute => {
            let mut handler = contribute_handler(config, executor);
            forward.run(ctx, enumerator, &mut handler, None)
        }
        SyncMode::Mirror => {
            let mut handler = contribute_handler(config, executor);
            let mut visited = HashSet::new();
            forward.run(ctx, enumerator, &mut handler, Some(&mut visited))?;
            if ctx.is_canceled() {
                return Ok(());
            }
            remove_orphans(ctx, &executor, source, target, &visited)
        }
        SyncMode::Synchronize => {
            let mut handler = TwoWayHandler {
                arbiter: SyncArbiter::new(
                    config.sync_preference,
                    config.prefer_newer,
                    config.compare,
                ),
                executor,
            };
            let mut visited = HashSet::new();
            forward.run(ctx, enumerator, &mut handler, Some(&mut visited))?;
            if ctx.is_canceled() || !target.is_dir() {
                return Ok(());
            }

            handler.arbiter.flip();
            let reverse = Pass {
                source_root: target,
                target_root: source,
                flatten: false,
                ignored: Some(&visited),
            };
            reverse.run(ctx, enumerator, &mut handler, None)
        }
    }
}

fn contribute_handler(config: &Config, executor: Executor) -> CopyHandler {
    CopyHandler::new(
        ConflictResolver::new(config.conflict_policy, config.compare, true),
        executor,
    )
}

/// Delete target entries that no longer have a counterpart in the source.
///
/// Directories go first so files under a deleted directory are not
/// reported twice. Unreadable target subtrees are reported and left alone.
fn remove_orphans(
    ctx: &mut RunContext,
    executor: &Executor,
    source: &Path,
    target: &Path,
    visited: &HashSet<PathBuf>,
) -> Result<(), FerryError> {
    if !target.is_dir() {
        return Ok(());
    }

    let listing = list_tree(target);
    for error in listing.errors {
        let path = error.path().unwrap_or(target).to_path_buf();
        ctx.record_error(&path, error);
    }
    let mut deleted: HashSet<PathBuf> = HashSet::new();

    for dir in listing.directories {
        if ctx.is_canceled() {
            return Ok(());
        }
        if visited.contains(&dir) || is_covered_by_delete(&dir, &deleted) {
            continue;
        }
        let Some(counterpart) = counterpart(source, target, &dir) else {
            continue;
        };
        if counterpart.is_dir() {
            continue;
        }
        remove_orphan(ctx, executor, &dir, true);
        deleted.insert(dir);
    }

    for file in listing.files {
        if ctx.is_canceled() {
            return Ok(());
        }
        if visited.contains(&file) || is_covered_by_delete(&file, &deleted) {
            continue;
        }
        if !DestState::probe(&file).exists() {
            continue;
        }
        let Some(counterpart) = counterpart(source, target, &file) else {
            continue;
        };
        if counterpart.is_file() {
            continue;
        }
        remove_orphan(ctx, executor, &file, false);
    }

    Ok(())
}

fn remove_orphan(ctx: &mut RunContext, executor: &Executor, path: &Path, is_dir: bool) {
    match executor.delete(ctx, path) {
        Ok(()) => {
            ctx.record_action(Action::Delete, path, is_dir);
            ctx.record_processed(is_dir);
        }
        Err(error) => ctx.record_error(path, error),
    }
}

fn counterpart(source: &Path, target: &Path, path: &Path) -> Option<PathBuf> {
    path.strip_prefix(target)
        .ok()
        .map(|relative| source.join(relative))
}

fn is_covered_by_delete(path: &Path, deleted: &HashSet<PathBuf>) -> bool {
    path.ancestors()
        .skip(1)
        .any(|ancestor| deleted.contains(ancestor))
}

/// Arbitrating handler for `synchronize` mode
struct TwoWayHandler {
    arbiter: SyncArbiter,
    executor: Executor,
}

impl EntryHandler for TwoWayHandler {
    fn handle(
        &mut self,
        ctx: &mut RunContext,
        entry: &Entry,
        dest: &Path,
    ) -> Result<Handled, FerryError> {
        let dest_state = DestState::probe(dest);
        let verdict = self
            .arbiter
            .arbitrate(ctx, entry, dest, dest_state)?;

        let descend = match verdict {
            Verdict::Cancel => false,
            Verdict::Unchanged => {
                ctx.record_skip(dest);
                true
            }
            Verdict::Win(winner) => self.apply_winner(ctx, winner, entry, dest, dest_state)?,
        };

        Ok(Handled {
            destination: dest.to_path_buf(),
            descend,
        })
    }
}

impl TwoWayHandler {
    /// Make the losing side match the winner; returns whether the source
    /// directory is still there to descend into.
    fn apply_winner(
        &self,
        ctx: &mut RunContext,
        winner: Winner,
        entry: &Entry,
        dest: &Path,
        dest_state: DestState,
    ) -> Result<bool, FerryError> {
        let source = entry.path.as_path();
        let executor = &self.executor;

        match (entry.is_dir, winner, dest_state) {
            (true, Winner::Source, DestState::DirectoryExists) => {
                executor.update_attributes(ctx, source, dest)?;
                ctx.record_action(Action::Update, dest, true);
            }
            (true, Winner::Source, DestState::FileExists) => {
                executor.delete(ctx, dest)?;
                ctx.record_action(Action::Delete, dest, false);
                executor.create_directory(ctx, source, dest)?;
                ctx.record_action(Action::Add, dest, true);
            }
            (true, Winner::Source, DestState::Absent) => {
                executor.create_directory(ctx, source, dest)?;
                ctx.record_action(Action::Add, dest, true);
            }
            (true, Winner::Target, DestState::DirectoryExists) => {
                executor.update_attributes(ctx, dest, source)?;
                ctx.record_action(Action::Update, source, true);
            }
            (true, Winner::Target, DestState::FileExists) => {
                executor.delete(ctx, source)?;
                ctx.record_action(Action::Delete, source, true);
                executor.copy_file(ctx, dest, source)?;
                ctx.record_action(Action::Add, source, false);
                ctx.record_processed(false);
                return Ok(false);
            }
            (false, Winner::Source, DestState::FileExists) => {
                executor.copy_file(ctx, source, dest)?;
                ctx.record_action(Action::Update, dest, false);
            }
            (false, Winner::Source, DestState::DirectoryExists) => {
                executor.delete(ctx, dest)?;
                ctx.record_action(Action::Delete, dest, true);
                executor.copy_file(ctx, source, dest)?;
                ctx.record_action(Action::Add, dest, false);
            }
            (false, Winner::Source, DestState::Absent) => {
                executor.copy_file(ctx, source, dest)?;
                ctx.record_action(Action::Add, dest, false);
            }
            (false, Winner::Target, DestState::FileExists) => {
                executor.copy_file(ctx, dest, source)?;
                ctx.record_action(Action::Update, source, false);
            }
            (false, Winner::Target, DestState::DirectoryExists) => {
                executor.delete(ctx, source)?;
                ctx.record_action(Action::Delete, source, false);
                executor.create_directory(ctx, dest, source)?;
                ctx.record_action(Action::Add, source, true);
                ctx.record_processed(true);
                return Ok(true);
            }
            (_, Winner::Target, DestState::Absent) => {
                // The arbiter always lets the present side win.
                return Ok(entry.is_dir);
            }
        }

        ctx.record_processed(entry.is_dir);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_covered_by_delete() {
        let deleted: HashSet<PathBuf> = [PathBuf::from("/t/old")].into_iter().collect();

        assert!(is_covered_by_delete(Path::new("/t/old/a.txt"), &deleted));
        assert!(is_covered_by_delete(Path::new("/t/old/x/y"), &deleted));
        assert!(!is_covered_by_delete(Path::new("/t/old"), &deleted));
        assert!(!is_covered_by_delete(Path::new("/t/older/a.txt"), &deleted));
    }

    #[test]
    fn test_counterpart_maps_relative_path() {
        assert_eq!(
            counterpart(Path::new("/s"), Path::new("/t"), Path::new("/t/a/b.txt")),
            Some(PathBuf::from("/s/a/b.txt"))
        );
        assert_eq!(
            counterpart(Path::new("/s"), Path::new("/t"), Path::new("/elsewhere")),
            None
        );
    }
}
