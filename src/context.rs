//! Per-run state shared by every stage of the pipeline

use crate::types::{Action, Attributes, FerryError, Telemetry};
use crate::ui::Prompter;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Events emitted while a run progresses.
#[derive(Debug)]
pub enum EngineEvent {
    /// A mutating action was applied (or would be, in dry-run)
    Entry {
        action: Action,
        path: PathBuf,
        is_dir: bool,
    },
    /// An entry was left alone
    Skipped { path: PathBuf },
    /// Processing an entry failed; the run continues
    Error { path: PathBuf, error: FerryError },
    /// The operator canceled the run
    Canceled,
}

/// Optional callback used to receive engine events.
pub type EventCallback = dyn Fn(&EngineEvent) + Send + Sync;

/// Final outcome of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    /// The enumerator yielded nothing
    NoMatch,
    Canceled,
    /// At least one entry failed
    Failed,
}

impl RunStatus {
    pub fn exit_code(self) -> u8 {
        match self {
            RunStatus::Success => 0,
            RunStatus::NoMatch => 1,
            RunStatus::Canceled | RunStatus::Failed => 2,
        }
    }
}

/// Mutable state of one command invocation.
///
/// Everything the pipeline mutates while walking lives here: counters,
/// termination state, the prompt capability and the event sink.
pub struct RunContext {
    pub dry_run: bool,
    pub telemetry: Telemetry,
    canceled: bool,
    failures: u64,
    cancel_flag: Arc<AtomicBool>,
    prompter: Box<dyn Prompter>,
    on_event: Option<Box<EventCallback>>,
    reserved: HashSet<PathBuf>,
    deferred_attributes: Vec<(PathBuf, Attributes)>,
}

impl RunContext {
    pub fn new(dry_run: bool, prompter: Box<dyn Prompter>) -> Self {
        Self {
            dry_run,
            telemetry: Telemetry::default(),
            canceled: false,
            failures: 0,
            cancel_flag: Arc::new(AtomicBool::new(false)),
            prompter,
            on_event: None,
            reserved: HashSet::new(),
            deferred_attributes: Vec::new(),
        }
    }

    pub fn with_events(mut self, on_event: Box<EventCallback>) -> Self {
        self.on_event = Some(on_event);
        self
    }

    /// Flag another thread may set to stop the run between entries
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel_flag)
    }

    pub fn prompter(&mut self) -> &mut dyn Prompter {
        self.prompter.as_mut()
    }

    /// Record a canceled termination. Idempotent.
    pub fn cancel(&mut self) {
        if !self.canceled {
            self.canceled = true;
            self.cancel_flag.store(true, Ordering::SeqCst);
            tracing::debug!("run canceled");
            self.emit(EngineEvent::Canceled);
        }
    }

    /// Checked between entries
    pub fn is_canceled(&mut self) -> bool {
        if !self.canceled && self.cancel_flag.load(Ordering::SeqCst) {
            self.cancel();
        }
        self.canceled
    }

    pub fn record_action(&mut self, action: Action, path: &Path, is_dir: bool) {
        self.telemetry.record(action);
        self.emit(EngineEvent::Entry {
            action,
            path: path.to_path_buf(),
            is_dir,
        });
    }

    pub fn record_skip(&mut self, path: &Path) {
        self.telemetry.record_skip();
        self.emit(EngineEvent::Skipped {
            path: path.to_path_buf(),
        });
    }

    pub fn record_error(&mut self, path: &Path, error: FerryError) {
        self.failures += 1;
        tracing::warn!(path = %path.display(), %error, "entry failed");
        self.emit(EngineEvent::Error {
            path: path.to_path_buf(),
            error,
        });
    }

    pub fn record_processed(&mut self, is_dir: bool) {
        self.telemetry.record_processed(is_dir);
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Claim a destination path that dry-run will not actually create
    pub fn reserve(&mut self, path: PathBuf) {
        self.reserved.insert(path);
    }

    pub fn is_reserved(&self, path: &Path) -> bool {
        self.reserved.contains(path)
    }

    /// Queue attributes for a directory that may still receive children
    pub fn defer_attributes(&mut self, dest: PathBuf, attributes: Attributes) {
        self.deferred_attributes.push((dest, attributes));
    }

    /// Drain the queue in the order it was filled
    pub fn take_deferred_attributes(&mut self) -> Vec<(PathBuf, Attributes)> {
        std::mem::take(&mut self.deferred_attributes)
    }

    pub fn status(&self) -> RunStatus {
        if self.canceled {
            RunStatus::Canceled
        } else if self.failures > 0 {
            RunStatus::Failed
        } else if self.telemetry.matched == 0 {
            RunStatus::NoMatch
        } else {
            RunStatus::Success
        }
    }

    fn emit(&self, event: EngineEvent) {
        if let Some(callback) = &self.on_event {
            callback(&event);
        }
    }
}
