//! Console reporting of per-entry actions and the run summary

use crate::context::{EngineEvent, RunStatus};
use crate::types::{Action, FerryError, Telemetry};
use console::{style, StyledObject, Term};
use indicatif::HumanDuration;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Subscriber turning engine events into console lines
pub struct Reporter {
    quiet: bool,
    omit_skipped: bool,
    out: Term,
    err: Term,
    started_at: Instant,
    errors: Vec<ErrorRecord>,
}

impl Reporter {
    pub fn new(quiet: bool, omit_skipped: bool) -> Self {
        Self {
            quiet,
            omit_skipped,
            out: Term::stdout(),
            err: Term::stderr(),
            started_at: Instant::now(),
            errors: Vec::new(),
        }
    }

    pub fn handle(&mut self, event: &EngineEvent) {
        match event {
            EngineEvent::Entry { action, path, .. } => {
                if !self.quiet {
                    let prefix = match action {
                        Action::Add => style(action.prefix()).green(),
                        Action::Update => style(action.prefix()).yellow(),
                        Action::Delete => style(action.prefix()).red(),
                    };
                    let _ = self.out.write_line(&entry_line(prefix, path));
                }
            }
            EngineEvent::Skipped { path } => {
                if !self.quiet && !self.omit_skipped {
                    let _ = self.out.write_line(&entry_line(style("SKP").dim(), path));
                }
            }
            EngineEvent::Error { path, error } => {
                let _ = self.err.write_line(&format!(
                    "{} {}: {}",
                    style("ERR").red().bold(),
                    path.display(),
                    error
                ));
                self.errors.push(ErrorRecord::new(path, error));
            }
            EngineEvent::Canceled => {
                let _ = self.err.write_line(&style("Canceled.").yellow().to_string());
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn errors(&self) -> &[ErrorRecord] {
        &self.errors
    }

    /// Print the closing summary (and the JSON document when asked for)
    pub fn finish(&self, telemetry: &Telemetry, status: RunStatus, dry_run: bool, json: bool) {
        if !self.errors.is_empty() {
            let _ = self.err.write_line(&format_error_summary(&self.errors));
        }

        if json {
            let summary = JsonSummary {
                status: status_label(status),
                dry_run,
                telemetry,
                errors: &self.errors,
            };
            match serde_json::to_string_pretty(&summary) {
                Ok(text) => {
                    let _ = self.out.write_line(&text);
                }
                Err(e) => tracing::warn!("Failed to serialize summary: {}", e),
            }
            return;
        }

        let _ = self.out.write_line(&format_summary(
            telemetry,
            self.started_at.elapsed(),
            dry_run,
        ));
        if status == RunStatus::NoMatch {
            let _ = self.out.write_line("No entries matched.");
        }
    }
}

fn entry_line(prefix: StyledObject<&str>, path: &Path) -> String {
    format!("{} {}", prefix, path.display())
}

fn status_label(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Success => "success",
        RunStatus::NoMatch => "no-match",
        RunStatus::Canceled => "canceled",
        RunStatus::Failed => "failed",
    }
}

#[derive(Serialize)]
struct JsonSummary<'a> {
    status: &'static str,
    dry_run: bool,
    telemetry: &'a Telemetry,
    errors: &'a [ErrorRecord],
}

fn format_summary(telemetry: &Telemetry, elapsed: Duration, dry_run: bool) -> String {
    let mut lines = vec![
        format!(
            "Added: {}  Updated: {}  Deleted: {}  Skipped: {}",
            telemetry.added, telemetry.updated, telemetry.deleted, telemetry.skipped
        ),
        format!(
            "Matched: {}  Files: {}  Directories: {}  Elapsed: {}",
            telemetry.matched,
            telemetry.processed_files,
            telemetry.processed_directories,
            HumanDuration(elapsed)
        ),
    ];
    if dry_run {
        lines.push("Dry-run mode: no changes were made.".to_string());
    }
    lines.join("\n")
}

/// One failed entry, kept for the grouped summary
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub kind: &'static str,
    pub path: PathBuf,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<&'static str>,
}

impl ErrorRecord {
    pub fn new(path: &Path, error: &FerryError) -> Self {
        Self {
            kind: error.kind_label(),
            path: path.to_path_buf(),
            message: error.to_string(),
            suggestion: suggestion_for(error),
        }
    }
}

fn suggestion_for(error: &FerryError) -> Option<&'static str> {
    match error {
        FerryError::PermissionDenied { .. } => {
            Some("Check file permissions or run with a user that has access.")
        }
        FerryError::DiskFull { .. } => Some("Free disk space on the destination and retry."),
        FerryError::NotFound { .. } => {
            Some("The entry disappeared while the run was in progress; retry.")
        }
        _ => None,
    }
}

fn format_error_summary(records: &[ErrorRecord]) -> String {
    let mut groups: BTreeMap<&'static str, Vec<&ErrorRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.kind).or_default().push(record);
    }

    let mut lines = Vec::new();
    lines.push("Error summary:".to_string());
    for (kind, items) in groups {
        lines.push(format!("  {} ({}):", kind, items.len()));
        for record in items.iter().take(3) {
            lines.push(format!("    - {}", record.message));
            lines.push(format!("      Path: {}", record.path.display()));
            if let Some(suggestion) = record.suggestion {
                lines.push(format!("      Try: {}", suggestion));
            }
        }
        if items.len() > 3 {
            lines.push(format!("    - ... {} more", items.len() - 3));
        }
    }
    lines.join("\n")
}
