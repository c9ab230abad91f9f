//! Executor module for file operations

pub mod copy;

use crate::context::RunContext;
use crate::types::{map_io_error, Attributes, Decision, DestState, FerryError, Transfer};
use std::fs;
use std::path::{Path, PathBuf};

pub use copy::{copy_attributes, copy_file_atomic, move_file, remove_path_any};

/// Applies decisions to storage.
///
/// Every mutating call is skipped in dry-run; reporting and telemetry are
/// identical either way.
#[derive(Debug, Clone, Copy)]
pub struct Executor {
    transfer: Transfer,
    structure_only: bool,
}

impl Executor {
    pub fn new(transfer: Transfer, structure_only: bool) -> Self {
        Self {
            transfer,
            structure_only,
        }
    }

    /// Apply a mutating decision to one entry, then report it.
    ///
    /// `Skip` and `Cancel` are never passed here.
    pub fn apply(
        &self,
        ctx: &mut RunContext,
        decision: Decision,
        source: &Path,
        dest: &Path,
        is_dir: bool,
        dest_state: DestState,
    ) -> Result<(), FerryError> {
        match decision {
            Decision::Add | Decision::Rename => {
                // A renamed destination is free by construction.
                let state = if decision == Decision::Rename {
                    DestState::Absent
                } else {
                    dest_state
                };
                if is_dir {
                    self.add_directory(ctx, source, dest, state)?;
                } else {
                    self.write_file(ctx, source, dest, state)?;
                }
            }
            Decision::Overwrite => {
                if is_dir {
                    self.overwrite_directory(ctx, source, dest, dest_state)?;
                } else {
                    self.write_file(ctx, source, dest, dest_state)?;
                }
            }
            Decision::Delete => self.delete(ctx, dest)?,
            Decision::Skip | Decision::Cancel => return Ok(()),
        }

        if let Some(action) = decision.action() {
            ctx.record_action(action, dest, is_dir);
        }
        ctx.record_processed(is_dir);
        Ok(())
    }

    /// Remove a file, or a directory recursively
    pub fn delete(&self, ctx: &RunContext, path: &Path) -> Result<(), FerryError> {
        if ctx.dry_run {
            return Ok(());
        }
        remove_path_any(path)
    }

    /// Create `dest` as an empty directory that takes the attributes of
    /// `template` once the run is done filling it
    pub fn create_directory(
        &self,
        ctx: &mut RunContext,
        template: &Path,
        dest: &Path,
    ) -> Result<(), FerryError> {
        if ctx.dry_run {
            return Ok(());
        }
        fs::create_dir_all(dest).map_err(|e| map_io_error(dest, e))?;
        defer_attributes(ctx, template, dest)
    }

    /// Copy one file over whatever file sits at `dest`; never moves
    pub fn copy_file(&self, ctx: &RunContext, source: &Path, dest: &Path) -> Result<(), FerryError> {
        if ctx.dry_run {
            return Ok(());
        }
        copy_file_atomic(source, dest).map(|_| ())
    }

    /// Give the directory `dest` the attributes of `source` at the end of the run
    pub fn update_attributes(
        &self,
        ctx: &mut RunContext,
        source: &Path,
        dest: &Path,
    ) -> Result<(), FerryError> {
        if ctx.dry_run {
            return Ok(());
        }
        defer_attributes(ctx, source, dest)
    }

    fn add_directory(
        &self,
        ctx: &mut RunContext,
        source: &Path,
        dest: &Path,
        dest_state: DestState,
    ) -> Result<(), FerryError> {
        if dest_state == DestState::FileExists && !ctx.dry_run {
            fs::remove_file(dest).map_err(|e| map_io_error(dest, e))?;
        }

        if self.structure_only {
            if !ctx.dry_run {
                fs::create_dir_all(dest).map_err(|e| map_io_error(dest, e))?;
                defer_attributes(ctx, source, dest)?;
            }
            Ok(())
        } else {
            self.populate(ctx, source, dest)
        }
    }

    fn overwrite_directory(
        &self,
        ctx: &mut RunContext,
        source: &Path,
        dest: &Path,
        dest_state: DestState,
    ) -> Result<(), FerryError> {
        if self.structure_only {
            if ctx.dry_run {
                return Ok(());
            }
            if dest_state == DestState::FileExists {
                fs::remove_file(dest).map_err(|e| map_io_error(dest, e))?;
                fs::create_dir_all(dest).map_err(|e| map_io_error(dest, e))?;
            }
            return defer_attributes(ctx, source, dest);
        }

        if dest_state.exists() && !ctx.dry_run {
            remove_path_any(dest)?;
        }
        self.populate(ctx, source, dest)
    }

    fn write_file(
        &self,
        ctx: &RunContext,
        source: &Path,
        dest: &Path,
        dest_state: DestState,
    ) -> Result<(), FerryError> {
        if ctx.dry_run {
            return Ok(());
        }

        if dest_state.exists() {
            remove_path_any(dest)?;
        }
        self.transfer_file(source, dest)
    }

    fn transfer_file(&self, source: &Path, dest: &Path) -> Result<(), FerryError> {
        match self.transfer {
            Transfer::Copy => copy_file_atomic(source, dest).map(|_| ()),
            Transfer::Move => move_file(source, dest),
        }
    }

    /// Copy (or move) a whole directory tree into a destination that is free.
    ///
    /// Walks with an explicit stack. The source is walked even in dry-run so
    /// processed counts match a live run. Failures of single descendants are
    /// reported and skipped. Directory attributes are applied bottom-up once
    /// the content is in place; moving removes source directories left empty.
    fn populate(
        &self,
        ctx: &mut RunContext,
        source: &Path,
        dest: &Path,
    ) -> Result<(), FerryError> {
        let mut stack: Vec<(PathBuf, PathBuf)> = vec![(source.to_path_buf(), dest.to_path_buf())];
        let mut created: Vec<(PathBuf, PathBuf)> = Vec::new();

        while let Some((src_dir, dest_dir)) = stack.pop() {
            if !ctx.dry_run {
                fs::create_dir_all(&dest_dir).map_err(|e| map_io_error(&dest_dir, e))?;
            }
            if src_dir != source {
                ctx.record_processed(true);
            }

            let read_dir = match fs::read_dir(&src_dir) {
                Ok(read_dir) => read_dir,
                Err(e) if src_dir == source => return Err(map_io_error(&src_dir, e)),
                Err(e) => {
                    ctx.record_error(&src_dir, map_io_error(&src_dir, e));
                    continue;
                }
            };

            let mut children: Vec<fs::DirEntry> = Vec::new();
            for child in read_dir {
                match child {
                    Ok(child) => children.push(child),
                    Err(e) => ctx.record_error(&src_dir, map_io_error(&src_dir, e)),
                }
            }
            children.sort_by_key(|entry| entry.file_name());

            // Popped in reverse, so siblings come out in name order.
            for child in children.into_iter().rev() {
                let child_src = child.path();
                let child_dest = dest_dir.join(child.file_name());
                let file_type = match child.file_type() {
                    Ok(file_type) => file_type,
                    Err(e) => {
                        ctx.record_error(&child_src, map_io_error(&child_src, e));
                        continue;
                    }
                };

                if file_type.is_dir() {
                    stack.push((child_src, child_dest));
                } else if file_type.is_symlink() && child_src.is_dir() {
                    tracing::debug!(path = %child_src.display(), "not following directory symlink");
                } else {
                    let result = if ctx.dry_run {
                        Ok(())
                    } else {
                        self.transfer_file(&child_src, &child_dest)
                    };
                    match result {
                        Ok(()) => ctx.record_processed(false),
                        Err(error) => ctx.record_error(&child_src, error),
                    }
                }
            }

            created.push((src_dir, dest_dir));
        }

        if ctx.dry_run {
            return Ok(());
        }

        for (src_dir, dest_dir) in created.iter().rev() {
            if let Err(error) = copy_attributes(src_dir, dest_dir) {
                tracing::warn!(path = %dest_dir.display(), %error, "could not copy directory attributes");
            }
            if self.transfer == Transfer::Move {
                // Only succeeds when every child moved out.
                let _ = fs::remove_dir(src_dir);
            }
        }

        Ok(())
    }
}

/// Read `template`'s attributes now and apply them to `dest` when the run
/// ends, so a read-only directory does not block writes into it.
fn defer_attributes(ctx: &mut RunContext, template: &Path, dest: &Path) -> Result<(), FerryError> {
    let attributes = Attributes::read(template).map_err(|e| map_io_error(template, e))?;
    ctx.defer_attributes(dest.to_path_buf(), attributes);
    Ok(())
}

/// Apply every queued directory attribute change, last queued first.
///
/// Parents are queued before their children, so children are settled
/// before a parent can turn read-only.
pub fn apply_deferred_attributes(ctx: &mut RunContext) {
    for (dest, attributes) in ctx.take_deferred_attributes().into_iter().rev() {
        if let Err(e) = attributes.apply_to(&dest) {
            ctx.record_error(&dest, map_io_error(&dest, e));
        }
    }
}
