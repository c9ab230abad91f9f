//! Interactive questions asked while resolving conflicts

use chrono::{DateTime, Local};
use console::{style, Term};
use std::collections::VecDeque;
use std::fs;
use std::io::{self, BufRead};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Answer to "overwrite?"-style questions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictAnswer {
    Yes,
    YesToAll,
    No,
    NoToAll,
    Cancel,
    /// Empty, unreadable or unrecognized input
    None,
}

impl ConflictAnswer {
    /// Parse a typed answer (`y`, `ya`, `n`, `na`, `c`; case-insensitive)
    pub fn parse(input: &str) -> Self {
        match input.trim().to_ascii_lowercase().as_str() {
            "y" => ConflictAnswer::Yes,
            "ya" => ConflictAnswer::YesToAll,
            "n" => ConflictAnswer::No,
            "na" => ConflictAnswer::NoToAll,
            "c" => ConflictAnswer::Cancel,
            _ => ConflictAnswer::None,
        }
    }
}

/// Answer to "prefer source or target?"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceAnswer {
    Source,
    AlwaysSource,
    Target,
    AlwaysTarget,
    Cancel,
    /// Empty, unreadable or unrecognized input
    None,
}

impl PreferenceAnswer {
    /// Parse a typed answer (`s`, `sa`, `t`, `ta`, `c`; case-insensitive)
    pub fn parse(input: &str) -> Self {
        match input.trim().to_ascii_lowercase().as_str() {
            "s" => PreferenceAnswer::Source,
            "sa" => PreferenceAnswer::AlwaysSource,
            "t" => PreferenceAnswer::Target,
            "ta" => PreferenceAnswer::AlwaysTarget,
            "c" => PreferenceAnswer::Cancel,
            _ => PreferenceAnswer::None,
        }
    }
}

/// Source of operator answers.
///
/// Implementations block until an answer is available.
pub trait Prompter {
    /// Ask a yes/no/all/cancel question about `path`
    fn ask_conflict(&mut self, question: &str, path: &Path) -> ConflictAnswer;

    /// Ask which side of a two-way conflict should win
    fn ask_preference(&mut self, source: &Path, target: &Path) -> PreferenceAnswer;
}

/// Prompter reading answers from stdin, questions written to stderr
pub struct ConsolePrompter {
    term: Term,
}

impl ConsolePrompter {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    fn read_answer(&self) -> Option<String> {
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => {
                if let Err(e) = self.term.write_line("") {
                    tracing::debug!(%e, "could not end prompt line");
                }
                None
            }
            Ok(_) => Some(line),
        }
    }

    /// Print the context lines, then the question on a line of its own
    /// waiting for the answer
    fn show(&self, lines: &[String], question: &str) {
        let written = lines
            .iter()
            .try_for_each(|line| self.term.write_line(line))
            .and_then(|()| self.term.write_str(question))
            .and_then(|()| self.term.flush());
        if let Err(e) = written {
            tracing::debug!(%e, "could not write prompt");
        }
    }

    fn describe(&self, label: &str, path: &Path) -> String {
        let detail = match fs::symlink_metadata(path) {
            Ok(metadata) if metadata.is_dir() => "directory".to_string(),
            Ok(metadata) => {
                let modified = metadata
                    .modified()
                    .map(|time| {
                        DateTime::<Local>::from(time)
                            .format("%Y-%m-%d %H:%M:%S")
                            .to_string()
                    })
                    .unwrap_or_else(|_| "unknown".to_string());
                format!("{} bytes, modified {}", metadata.len(), modified)
            }
            Err(_) => "missing".to_string(),
        };
        format!("  {:<7}{} ({})", label, path.display(), style(detail).dim())
    }
}

impl Default for ConsolePrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for ConsolePrompter {
    fn ask_conflict(&mut self, question: &str, path: &Path) -> ConflictAnswer {
        self.show(
            &[],
            &format!("{} {} (Y/YA/N/NA/C): ", style(path.display()).bold(), question),
        );

        self.read_answer()
            .map(|answer| ConflictAnswer::parse(&answer))
            .unwrap_or(ConflictAnswer::None)
    }

    fn ask_preference(&mut self, source: &Path, target: &Path) -> PreferenceAnswer {
        self.show(
            &[self.describe("source", source), self.describe("target", target)],
            "Prefer source or target? (S[A]/T[A]/C): ",
        );

        self.read_answer()
            .map(|answer| PreferenceAnswer::parse(&answer))
            .unwrap_or(PreferenceAnswer::None)
    }
}

/// Prompter replaying a fixed queue of answers.
///
/// Once a queue runs dry every further question gets `None`. The number of
/// questions asked is shared through [`ScriptedPrompter::asked`] so callers
/// can inspect it after handing the prompter to a run.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    conflicts: VecDeque<ConflictAnswer>,
    preferences: VecDeque<PreferenceAnswer>,
    asked: Arc<AtomicUsize>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conflicts(mut self, answers: impl IntoIterator<Item = ConflictAnswer>) -> Self {
        self.conflicts.extend(answers);
        self
    }

    pub fn with_preferences(
        mut self,
        answers: impl IntoIterator<Item = PreferenceAnswer>,
    ) -> Self {
        self.preferences.extend(answers);
        self
    }

    /// Counter of questions asked so far
    pub fn asked(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.asked)
    }
}

impl Prompter for ScriptedPrompter {
    fn ask_conflict(&mut self, question: &str, path: &Path) -> ConflictAnswer {
        self.asked.fetch_add(1, Ordering::SeqCst);
        let answer = self.conflicts.pop_front().unwrap_or(ConflictAnswer::None);
        tracing::debug!(question, path = %path.display(), ?answer, "scripted answer");
        answer
    }

    fn ask_preference(&mut self, source: &Path, _target: &Path) -> PreferenceAnswer {
        self.asked.fetch_add(1, Ordering::SeqCst);
        let answer = self.preferences.pop_front().unwrap_or(PreferenceAnswer::None);
        tracing::debug!(path = %source.display(), ?answer, "scripted preference");
        answer
    }
}
