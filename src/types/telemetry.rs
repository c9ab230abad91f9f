//! Run counters

use super::Action;
use serde::Serialize;

/// Counters accumulated over one run.
///
/// `added`, `updated`, `deleted` and `skipped` count top-level entries only;
/// the processed counters also include descendants copied while populating
/// a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Telemetry {
    pub added: u64,
    pub updated: u64,
    pub deleted: u64,
    pub skipped: u64,
    pub processed_files: u64,
    pub processed_directories: u64,
    /// Entries yielded by the enumerator
    pub matched: u64,
}

impl Telemetry {
    pub fn record(&mut self, action: Action) {
        match action {
            Action::Add => self.added += 1,
            Action::Update => self.updated += 1,
            Action::Delete => self.deleted += 1,
        }
    }

    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    pub fn record_processed(&mut self, is_dir: bool) {
        if is_dir {
            self.processed_directories += 1;
        } else {
            self.processed_files += 1;
        }
    }

    /// Whether the run changed (or, in dry-run, would change) anything
    pub fn has_changes(&self) -> bool {
        self.added + self.updated + self.deleted > 0
    }
}
